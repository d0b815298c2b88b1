//! Additive Scroll Demo
//!
//! Simulates a scroll view that gets a second "scroll to" request while the
//! first one is still running. The rendered position bends toward the new
//! target instead of jumping.
//!
//! Run with: RUST_LOG=debug cargo run -p additive_animation --example scroll_demo

use additive_animation::{
    AnimationConfig, AnimationController, ControllerSettings, Easing, Result, StateVector,
};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SETTINGS: &str = r#"
scheduling_mode = "fixed_interval"
fps = 30
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = ControllerSettings::from_toml_str(SETTINGS)?;
    let (done_tx, done_rx) = mpsc::channel();
    let done_tx = Mutex::new(done_tx);

    let controller = AnimationController::new(
        AnimationConfig::new()
            .with_settings(&settings)
            .on_render(|state| {
                let y = state["y"];
                let bar = "#".repeat((y / 40.0).clamp(0.0, 80.0) as usize);
                tracing::info!("y = {:7.1} {}", y, bar);
            })
            .on_finish(move |state| {
                tracing::info!("finished at y = {}", state["y"]);
                let _ = done_tx.lock().map(|tx| tx.send(()));
            }),
    );

    let scroll = |y: f64| StateVector::from([("y", y)]);

    controller.animate(scroll(0.0), scroll(1000.0), 600.0, "easeInOutQuad")?;
    thread::sleep(Duration::from_millis(300));
    controller.animate(scroll(1000.0), scroll(2000.0), 600.0, Easing::EaseOutCubic)?;

    if done_rx.recv_timeout(Duration::from_secs(5)).is_err() {
        tracing::warn!("animation did not finish in time");
    }
    Ok(())
}

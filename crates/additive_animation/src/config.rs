//! Controller configuration
//!
//! [`AnimationConfig`] is built in code with chained setters. The plain-data
//! part ([`ControllerSettings`]) can also come from a TOML file:
//!
//! ```toml
//! scheduling_mode = "fixed_interval"
//! fps = 30
//! ```

use crate::clock::Clock;
use crate::error::{AnimationError, Result};
use crate::scheduler::{FrameScheduler, DEFAULT_FPS};
use crate::state::StateVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Called every tick with the composed state
pub type RenderCallback = Arc<dyn Fn(&StateVector) + Send + Sync>;

/// Called once with the exact requested target when all records decay
pub type FinishCallback = Arc<dyn Fn(&StateVector) + Send + Sync>;

/// Called once on explicit cancel
pub type CancelCallback = Arc<dyn Fn() + Send + Sync>;

/// How ticks are scheduled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Host frame callbacks; falls back to `FixedInterval` without a frame source
    #[default]
    FrameCallback,
    /// Background timer at the configured fps
    FixedInterval,
}

/// Serializable controller settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub scheduling_mode: SchedulingMode,
    pub fps: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            scheduling_mode: SchedulingMode::default(),
            fps: DEFAULT_FPS,
        }
    }
}

impl ControllerSettings {
    /// Parse settings from TOML, filling missing fields with defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(source).map_err(|e| AnimationError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(AnimationError::InvalidSettings("fps must be at least 1".into()));
        }
        Ok(())
    }
}

/// Configuration bundle for an [`AnimationController`](crate::AnimationController)
///
/// Every option is optional; callbacks default to no-ops.
///
/// ```ignore
/// let config = AnimationConfig::new()
///     .on_render(|state| println!("{:?}", state))
///     .on_finish(|state| println!("done at {:?}", state))
///     .fps(30);
/// ```
#[derive(Clone, Default)]
pub struct AnimationConfig {
    pub(crate) on_render: Option<RenderCallback>,
    pub(crate) on_finish: Option<FinishCallback>,
    pub(crate) on_cancel: Option<CancelCallback>,
    pub(crate) settings: ControllerSettings,
    pub(crate) frame_source: Option<Arc<dyn FrameScheduler>>,
    pub(crate) clock: Option<Arc<dyn Clock>>,
}

impl AnimationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_render<F>(mut self, callback: F) -> Self
    where
        F: Fn(&StateVector) + Send + Sync + 'static,
    {
        self.on_render = Some(Arc::new(callback));
        self
    }

    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: Fn(&StateVector) + Send + Sync + 'static,
    {
        self.on_finish = Some(Arc::new(callback));
        self
    }

    pub fn on_cancel<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_cancel = Some(Arc::new(callback));
        self
    }

    pub fn scheduling_mode(mut self, mode: SchedulingMode) -> Self {
        self.settings.scheduling_mode = mode;
        self
    }

    /// Tick rate for the fixed-interval timer (0 is treated as 1)
    pub fn fps(mut self, fps: u32) -> Self {
        self.settings.fps = fps;
        self
    }

    /// Host frame-callback source used in [`SchedulingMode::FrameCallback`]
    pub fn frame_source(mut self, source: Arc<dyn FrameScheduler>) -> Self {
        self.frame_source = Some(source);
        self
    }

    /// Time source (defaults to [`MonotonicClock`](crate::MonotonicClock))
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Apply loaded settings, keeping callbacks and injected collaborators
    pub fn with_settings(mut self, settings: &ControllerSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }
}

impl fmt::Debug for AnimationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationConfig")
            .field("on_render", &self.on_render.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .field("settings", &self.settings)
            .field("frame_source", &self.frame_source.is_some())
            .field("clock", &self.clock.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.scheduling_mode, SchedulingMode::FrameCallback);
        assert_eq!(settings.fps, 60);
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = ControllerSettings::from_toml_str(
            r#"
            scheduling_mode = "fixed_interval"
            fps = 30
            "#,
        )
        .unwrap();
        assert_eq!(settings.scheduling_mode, SchedulingMode::FixedInterval);
        assert_eq!(settings.fps, 30);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = ControllerSettings::from_toml_str("fps = 24").unwrap();
        assert_eq!(settings.scheduling_mode, SchedulingMode::FrameCallback);
        assert_eq!(settings.fps, 24);

        let empty = ControllerSettings::from_toml_str("").unwrap();
        assert_eq!(empty, ControllerSettings::default());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(matches!(
            ControllerSettings::from_toml_str("scheduling_mode = \"vsync\""),
            Err(AnimationError::InvalidSettings(_))
        ));
        assert!(matches!(
            ControllerSettings::from_toml_str("fps = 0"),
            Err(AnimationError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_with_settings_keeps_callbacks() {
        let settings = ControllerSettings {
            scheduling_mode: SchedulingMode::FixedInterval,
            fps: 120,
        };
        let config = AnimationConfig::new()
            .on_cancel(|| {})
            .with_settings(&settings);

        assert!(config.on_cancel.is_some());
        assert_eq!(config.settings().fps, 120);
        assert_eq!(
            config.settings().scheduling_mode,
            SchedulingMode::FixedInterval
        );
    }
}

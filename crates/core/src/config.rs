//! Render configuration.
//!
//! A [`RenderConfig`] is built once on the platform thread and moved into the
//! render thread by value. Nothing is shared back after the handoff.

use std::time::Duration;

use crate::{Error, Result};

const ENV_SLOT_TIMEOUT_MS: &str = "MODELER_SLOT_TIMEOUT_MS";
const ENV_OVERLAY: &str = "MODELER_OVERLAY";
const ENV_VALIDATION: &str = "MODELER_VALIDATION";
const ENV_FRAME_TIME_SMOOTHING: &str = "MODELER_FRAME_TIME_SMOOTHING";

/// Immutable settings for the render thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Upper bound on a frame slot wait. Exceeding it is treated as device loss.
    pub slot_timeout: Duration,
    /// Draw the debug overlay (frame time, fullscreen toggle).
    pub overlay_enabled: bool,
    /// Enable the Vulkan validation layer.
    pub validation: bool,
    /// Clear colour of the presentable image, RGBA.
    pub clear_color: [f32; 4],
    /// Weight given to each new sample in the frame-time moving average.
    pub frame_time_smoothing: f32,
    /// How long the loop sleeps between polls while the surface is degenerate.
    pub paused_poll_interval: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            slot_timeout: Duration::from_secs(10),
            overlay_enabled: true,
            validation: cfg!(debug_assertions),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            frame_time_smoothing: 0.1,
            paused_poll_interval: Duration::from_millis(16),
        }
    }
}

impl RenderConfig {
    /// Build a configuration from the defaults overlaid with `MODELER_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from the defaults overlaid with values returned by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SLOT_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{ENV_SLOT_TIMEOUT_MS}={raw:?} is not a number: {e}"))
            })?;
            config.slot_timeout = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup(ENV_OVERLAY) {
            config.overlay_enabled = parse_flag(ENV_OVERLAY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_VALIDATION) {
            config.validation = parse_flag(ENV_VALIDATION, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FRAME_TIME_SMOOTHING) {
            config.frame_time_smoothing = raw.trim().parse::<f32>().map_err(|e| {
                Error::Config(format!(
                    "{ENV_FRAME_TIME_SMOOTHING}={raw:?} is not a number: {e}"
                ))
            })?;
        }

        config.validate()?;
        tracing::debug!("Render configuration: {:?}", config);
        Ok(config)
    }

    /// Reject values the render loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.slot_timeout.is_zero() {
            return Err(Error::Config("slot timeout must be non-zero".into()));
        }
        if !(self.frame_time_smoothing > 0.0 && self.frame_time_smoothing <= 1.0) {
            return Err(Error::Config(format!(
                "frame time smoothing must be in (0, 1], got {}",
                self.frame_time_smoothing
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key}={other:?} is not a boolean"))),
    }
}

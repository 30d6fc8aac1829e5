//! Session configuration
//!
//! Every knob has a built-in default and an optional `ZSCAN_*` environment
//! override, read by [`SessionConfig::from_env`]. Unparseable values fall back
//! to the default.

use std::time::Duration;

/// Default name of the decode thread
pub const DEFAULT_WORKER_THREAD_NAME: &str = "zscan-decode";

/// Default inactivity timeout before the watchdog quits the session (5 minutes)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

fn parse_env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

fn parse_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn stack_size_from_kb(kb: u64) -> usize {
    usize::try_from(kb).unwrap_or(usize::MAX).saturating_mul(1024)
}

/// Tunables for one scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name given to the decode thread (`ZSCAN_WORKER_NAME`)
    pub worker_thread_name: String,
    /// Stack size for the decode thread; platform default when `None`
    /// (`ZSCAN_WORKER_STACK_KB`, in KiB)
    pub worker_stack_size: Option<usize>,
    /// Hand the decoder only the scan rect instead of the full frame
    /// (`ZSCAN_CROP_TO_RECT`, 0/1)
    pub crop_to_rect: bool,
    /// Delay used by `restart_default` (`ZSCAN_RESTART_DELAY_MS`)
    pub restart_delay: Duration,
    /// Silence interval after which an installed watchdog quits the session
    /// (`ZSCAN_IDLE_TIMEOUT_SECS`)
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            worker_stack_size: None,
            crop_to_rect: false,
            restart_delay: Duration::ZERO,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by any `ZSCAN_*` variables present in the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            worker_thread_name: parse_env_string("ZSCAN_WORKER_NAME")
                .unwrap_or(defaults.worker_thread_name),
            worker_stack_size: parse_env_u64("ZSCAN_WORKER_STACK_KB")
                .filter(|kb| *kb > 0)
                .map(stack_size_from_kb)
                .or(defaults.worker_stack_size),
            crop_to_rect: parse_env_bool_u8("ZSCAN_CROP_TO_RECT", defaults.crop_to_rect),
            restart_delay: parse_env_u64("ZSCAN_RESTART_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.restart_delay),
            idle_timeout: parse_env_u64("ZSCAN_IDLE_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
        }
    }

    /// Set the decode thread name
    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    /// Set the decode thread stack size in bytes
    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    /// Enable or disable cropping to the scan rect before decode
    pub fn with_crop_to_rect(mut self, crop: bool) -> Self {
        self.crop_to_rect = crop;
        self
    }

    /// Set the default restart delay
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Set the watchdog idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

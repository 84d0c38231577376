//! Monitor configuration.

use std::time::Duration;

use ocppmon_protocol::DEFAULT_MAX_BUFFER_SIZE;

/// Configuration for the monitor pipeline and read loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between disconnecting and retrying after a connection error.
    pub reconnect_delay: Duration,

    /// How recent a StatusNotification must be to refine a stop reason.
    pub status_match_window: Duration,

    /// Cap on the frame extractor's accumulation buffer.
    pub max_buffer_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(100),
            status_match_window: Duration::from_millis(5000),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl MonitorConfig {
    /// Creates a configuration with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Builder: set the status-notification match window.
    pub fn with_status_match_window(mut self, window: Duration) -> Self {
        self.status_match_window = window;
        self
    }

    /// Builder: set the extraction buffer cap.
    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }
}

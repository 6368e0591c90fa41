use std::time::Duration;

/// Default time to wait for console input before dumping the whole file.
pub const DEFAULT_INPUT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default time to wait for a file that's temporarily unavailable for mapping.
pub const DEFAULT_MAP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runtime settings of a viewer session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How long the query loop waits for a request before dumping every line
    pub input_timeout: Duration,
    /// Upper bound for waiting on the file when mapping it is temporarily impossible
    pub map_timeout: Duration,
}

impl Config {
    #[inline]
    pub fn with_input_timeout(mut self, timeout: Duration) -> Self {
        self.input_timeout = timeout;
        self
    }

    #[inline]
    pub fn with_map_timeout(mut self, timeout: Duration) -> Self {
        self.map_timeout = timeout;
        self
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            input_timeout: DEFAULT_INPUT_TIMEOUT,
            map_timeout: DEFAULT_MAP_TIMEOUT,
        }
    }
}

/// Rule deciding when a client write has completely replaced a value and the
/// change callback should run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// A write completes the value when its range ends exactly at the value
    /// capacity (`offset + len == capacity`). Partial writes that cover the
    /// whole value but end earlier never complete it.
    #[default]
    EndOfValue,
    /// A write completes the value once every byte has been written since the
    /// last completion or [`set_parameter`](super::Service::set_parameter)
    /// call, regardless of write order.
    FullyWritten,
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Number of subscription slots per notifiable characteristic. Uses
    /// [`Runtime::max_connections`](super::Runtime::max_connections) if
    /// `None`.
    pub max_connections: Option<usize>,
    /// Encryption key size in bytes required by the registered attributes.
    pub key_len: u8,
    /// Write completion rule.
    pub completion: Completion,
    /// Whether [`set_parameter`](super::Service::set_parameter) also invokes
    /// the change callback.
    pub callback_on_set: bool,
}

impl Config {
    /// Maximum encryption key size ([Vol 3] Part H, Section 2.3.4).
    pub const MAX_KEY_LEN: u8 = 16;

    /// Sets the number of subscription slots.
    #[inline(always)]
    #[must_use]
    pub const fn with_max_connections(mut self, n: usize) -> Self {
        self.max_connections = Some(n);
        self
    }

    /// Sets the write completion rule.
    #[inline(always)]
    #[must_use]
    pub const fn with_completion(mut self, c: Completion) -> Self {
        self.completion = c;
        self
    }

    /// Enables or disables change callbacks for local value updates.
    #[inline(always)]
    #[must_use]
    pub const fn with_callback_on_set(mut self, enable: bool) -> Self {
        self.callback_on_set = enable;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_connections: None,
            key_len: Self::MAX_KEY_LEN,
            completion: Completion::EndOfValue,
            callback_on_set: false,
        }
    }
}

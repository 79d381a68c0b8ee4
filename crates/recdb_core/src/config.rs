//! Server configuration.

/// Where the server gets its encryption key.
#[derive(Debug, Clone, Default)]
pub enum KeySource {
    /// Load the key from the root `KEY` file, creating a random key on
    /// first run.
    #[default]
    KeyFile,
    /// Derive the key from a passphrase with HKDF-SHA256, salted by
    /// the root `SALT` file (created on first run).
    Passphrase(String),
}

/// Configuration for opening a server root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the root directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the root directory already exists.
    pub error_if_exists: bool,

    /// Encryption key source.
    pub key_source: KeySource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            key_source: KeySource::KeyFile,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the root directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the root directory exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Derives the encryption key from a passphrase instead of the
    /// `KEY` file.
    #[must_use]
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.key_source = KeySource::Passphrase(passphrase.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.error_if_exists);
        assert!(matches!(config.key_source, KeySource::KeyFile));
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .error_if_exists(true)
            .passphrase("hunter2");

        assert!(!config.create_if_missing);
        assert!(config.error_if_exists);
        assert!(matches!(config.key_source, KeySource::Passphrase(_)));
    }
}

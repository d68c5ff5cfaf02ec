/// Errors raised while loading or validating service configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field `database_url` reads
/// `DATABASE_URL`. Call `Config::from_env()` once at startup.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn load() -> Result<Self, ConfigError> {
        Ok(envy::from_env()?)
    }

    /// Load from explicit `(NAME, value)` pairs instead of the process env.
    fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// # Panics
    ///
    /// Panics if any required env var is missing or cannot be deserialized.
    fn from_env() -> Self {
        Self::load().expect("failed to load config from environment")
    }
}

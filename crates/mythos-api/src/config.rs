//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use mythos_narrator::backend::MessagesBackend;
use mythos_narrator::generative::GenerativeNarrator;
use mythos_narrator::scripted::ScriptedNarrator;
use mythos_session::application::narrator::Narrator;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_NARRATOR_TIMEOUT_SECS: u64 = 30;

/// Which narrator drives new sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarratorKind {
    /// The built-in deterministic script.
    #[default]
    Scripted,
    /// A language model behind the Messages API.
    Generative,
}

impl FromStr for NarratorKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scripted" => Ok(Self::Scripted),
            "generative" => Ok(Self::Generative),
            other => Err(AppError::Config(format!(
                "NARRATOR must be `scripted` or `generative`, got `{other}`"
            ))),
        }
    }
}

/// Runtime configuration for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Narrator used for new sessions.
    pub narrator: NarratorKind,
    /// Messages API key, required for the generative narrator.
    pub api_key: Option<String>,
    /// Model override for the generative narrator.
    pub model: Option<String>,
    /// Upper bound on a single narrator attempt.
    pub narrator_timeout: Duration,
    /// Base seed for session dice. Entropy-seeded when absent.
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            narrator: NarratorKind::Scripted,
            api_key: None,
            model: None,
            narrator_timeout: Duration::from_secs(DEFAULT_NARRATOR_TIMEOUT_SECS),
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value, or
    /// if the generative narrator is selected without an API key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => defaults.port,
        };
        let narrator = match non_empty("NARRATOR") {
            Some(raw) => raw.parse()?,
            None => defaults.narrator,
        };
        let narrator_timeout = match non_empty("NARRATOR_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|e| {
                AppError::Config(format!("NARRATOR_TIMEOUT_SECS must be whole seconds: {e}"))
            })?),
            None => defaults.narrator_timeout,
        };
        let rng_seed = non_empty("RNG_SEED")
            .map(|raw| {
                raw.parse()
                    .map_err(|e| AppError::Config(format!("RNG_SEED must be a valid u64: {e}")))
            })
            .transpose()?;
        let api_key = non_empty("ANTHROPIC_API_KEY");

        if narrator == NarratorKind::Generative && api_key.is_none() {
            return Err(AppError::Config(
                "ANTHROPIC_API_KEY must be set for the generative narrator".to_owned(),
            ));
        }

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            narrator,
            api_key,
            model: non_empty("NARRATOR_MODEL"),
            narrator_timeout,
            rng_seed,
        })
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Builds the configured narrator.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the generative backend cannot be
    /// constructed.
    pub fn build_narrator(&self) -> Result<Arc<dyn Narrator>, AppError> {
        match self.narrator {
            NarratorKind::Scripted => Ok(Arc::new(ScriptedNarrator::new())),
            NarratorKind::Generative => {
                let api_key = self.api_key.clone().ok_or_else(|| {
                    AppError::Config("ANTHROPIC_API_KEY must be set".to_owned())
                })?;
                let mut backend = MessagesBackend::new(api_key)
                    .map_err(|e| AppError::Config(format!("narrator backend: {e}")))?;
                if let Some(model) = &self.model {
                    backend = backend.with_model(model.clone());
                }
                Ok(Arc::new(GenerativeNarrator::new(backend)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("NARRATOR", "Generative"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("NARRATOR_MODEL", "claude-haiku"),
            ("NARRATOR_TIMEOUT_SECS", "10"),
            ("RNG_SEED", "42"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.narrator, NarratorKind::Generative);
        assert_eq!(config.model.as_deref(), Some("claude-haiku"));
        assert_eq!(config.narrator_timeout, Duration::from_secs(10));
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_narrator_is_config_error() {
        let result = ServerConfig::from_lookup(lookup(&[("NARRATOR", "oracle")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_generative_requires_api_key() {
        let result = ServerConfig::from_lookup(lookup(&[("NARRATOR", "generative")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_builds_scripted_narrator_by_default() {
        let config = ServerConfig::default();

        assert!(config.build_narrator().is_ok());
    }
}

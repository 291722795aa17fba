#![forbid(unsafe_code)]

//! Proxy configuration.
//!
//! [`ProxyConfig`] selects which change channels a proxy built with
//! [`ReadOnly::with_config`](crate::ReadOnly::with_config) forwards.
//! Defaults can be overridden through the environment:
//!
//! | Variable                    | Values                               |
//! |-----------------------------|--------------------------------------|
//! | `FTUI_READONLY_PROPAGATION` | `none`, `fine`, `coarse`, `both`     |

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::logging::TARGET;

/// Environment variable read by [`ProxyConfig::from_env`].
pub const PROPAGATION_ENV: &str = "FTUI_READONLY_PROPAGATION";

/// Which change channels a proxy forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropagationMode {
    /// Inert: nothing is forwarded.
    #[default]
    Off,
    /// Forward fine-grained change events verbatim.
    FineGrained,
    /// Forward will-change signals as bare `()`.
    Coarse,
    /// Forward both channels.
    Both,
}

impl PropagationMode {
    /// Whether the fine-grained channel is forwarded.
    #[must_use]
    pub const fn fine_grained(self) -> bool {
        matches!(self, Self::FineGrained | Self::Both)
    }

    /// Whether the coarse channel is forwarded.
    #[must_use]
    pub const fn coarse(self) -> bool {
        matches!(self, Self::Coarse | Self::Both)
    }

    /// Stable lowercase name, accepted back by `FromStr`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "none",
            Self::FineGrained => "fine",
            Self::Coarse => "coarse",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a [`PropagationMode`] cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseModeError {
    /// The input was empty or whitespace.
    Empty,
    /// The input named no known mode.
    Unknown(String),
}

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty propagation mode"),
            Self::Unknown(s) => write!(
                f,
                "unknown propagation mode {s:?} (expected none, fine, coarse, or both)"
            ),
        }
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for PropagationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseModeError::Empty);
        }
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::Off),
            "fine" | "fine-grained" => Ok(Self::FineGrained),
            "coarse" => Ok(Self::Coarse),
            "both" | "all" => Ok(Self::Both),
            _ => Err(ParseModeError::Unknown(s.to_string())),
        }
    }
}

/// Construction-time options for [`ReadOnly`](crate::ReadOnly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProxyConfig {
    /// Channels forwarded immediately after construction.
    pub propagation: PropagationMode,
}

impl ProxyConfig {
    /// Create a config with every channel off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            propagation: PropagationMode::Off,
        }
    }

    /// Set the propagation mode.
    #[must_use]
    pub const fn with_propagation(mut self, mode: PropagationMode) -> Self {
        self.propagation = mode;
        self
    }

    /// Defaults overridden by `FTUI_READONLY_PROPAGATION`, if set and valid.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().apply_env_value(env::var(PROPAGATION_ENV).ok().as_deref())
    }

    /// Apply a raw environment value. Invalid values leave the config
    /// unchanged and log a warning.
    fn apply_env_value(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.parse::<PropagationMode>() {
                Ok(mode) => self.propagation = mode,
                Err(err) => {
                    tracing::warn!(target: TARGET, var = PROPAGATION_ENV, %err, "ignoring invalid value");
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_modes() {
        assert_eq!("none".parse::<PropagationMode>(), Ok(PropagationMode::Off));
        assert_eq!("off".parse::<PropagationMode>(), Ok(PropagationMode::Off));
        assert_eq!("fine".parse::<PropagationMode>(), Ok(PropagationMode::FineGrained));
        assert_eq!("Fine-Grained".parse::<PropagationMode>(), Ok(PropagationMode::FineGrained));
        assert_eq!(" COARSE ".parse::<PropagationMode>(), Ok(PropagationMode::Coarse));
        assert_eq!("both".parse::<PropagationMode>(), Ok(PropagationMode::Both));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<PropagationMode>(), Err(ParseModeError::Empty));
        assert_eq!(
            "sometimes".parse::<PropagationMode>(),
            Err(ParseModeError::Unknown("sometimes".to_string()))
        );
    }

    #[test]
    fn display_round_trips() {
        for mode in [
            PropagationMode::Off,
            PropagationMode::FineGrained,
            PropagationMode::Coarse,
            PropagationMode::Both,
        ] {
            assert_eq!(mode.to_string().parse::<PropagationMode>(), Ok(mode));
        }
    }

    #[test]
    fn mode_predicates() {
        assert!(!PropagationMode::Off.fine_grained());
        assert!(!PropagationMode::Off.coarse());
        assert!(PropagationMode::FineGrained.fine_grained());
        assert!(!PropagationMode::FineGrained.coarse());
        assert!(PropagationMode::Coarse.coarse());
        assert!(PropagationMode::Both.fine_grained() && PropagationMode::Both.coarse());
    }

    #[test]
    fn default_is_inert() {
        assert_eq!(ProxyConfig::default(), ProxyConfig::new());
        assert_eq!(ProxyConfig::default().propagation, PropagationMode::Off);
    }

    #[test]
    fn env_value_overrides_default() {
        let config = ProxyConfig::new().apply_env_value(Some("coarse"));
        assert_eq!(config.propagation, PropagationMode::Coarse);
    }

    #[test]
    fn invalid_env_value_is_ignored() {
        let config = ProxyConfig::new()
            .with_propagation(PropagationMode::FineGrained)
            .apply_env_value(Some("bogus"));
        assert_eq!(config.propagation, PropagationMode::FineGrained);

        let unset = ProxyConfig::new().apply_env_value(None);
        assert_eq!(unset, ProxyConfig::new());
    }

    #[test]
    fn error_messages() {
        assert_eq!(ParseModeError::Empty.to_string(), "empty propagation mode");
        assert!(
            ParseModeError::Unknown("x".into())
                .to_string()
                .contains("unknown propagation mode \"x\"")
        );
    }
}

//! CLI error type.

use std::fmt;

use sectionstream::config::ConfigError;

/// Errors surfaced to the terminal, each with a user-actionable message.
///
/// The binary prints these as `error: <message>` and exits nonzero; variants
/// exist so commands can phrase the message for their own context.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or key problem.
    Config(String),

    /// A scenario file could not be read, parsed, or validated.
    Scenario(String),

    /// The simulation could not be built or run.
    Simulation(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(message) => write!(f, "{message}"),
            CliError::Scenario(message) => write!(f, "{message}"),
            CliError::Simulation(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_with_message() {
        let err: CliError = ConfigError::UnknownKey("nope.key".to_string()).into();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("nope.key"));
    }

    #[test]
    fn test_display_passes_message_through() {
        let err = CliError::Scenario("demo.json is not a valid scenario".to_string());
        assert_eq!(err.to_string(), "demo.json is not a valid scenario");
    }
}

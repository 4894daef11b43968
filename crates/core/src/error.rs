use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scriptdeck-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for scriptdeck
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value or dot path
    #[error("configuration error: {0}")]
    Config(String),

    /// Read/parse/write failure on a configuration layer
    #[error("configuration file error: {0}")]
    ConfigIo(#[from] ConfigIoError),

    /// Malformed script manifest
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Caller-supplied argument could not be coerced
    #[error("argument error: {0}")]
    Argument(String),

    /// Script entry point failed
    #[error("invocation error: {0}")]
    Invocation(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Which step of a configuration file access failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOp {
    Read,
    Parse,
    Validate,
    Write,
}

impl ConfigOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigOp::Read => "read",
            ConfigOp::Parse => "parse",
            ConfigOp::Validate => "validate",
            ConfigOp::Write => "write",
        }
    }
}

impl fmt::Display for ConfigOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A non-fatal failure on an optional configuration layer.
///
/// The store keeps these around as load warnings instead of aborting startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to {op} {}: {message}", .path.display())]
pub struct ConfigIoError {
    pub path: PathBuf,
    pub op: ConfigOp,
    pub message: String,
}

impl ConfigIoError {
    pub fn new(path: impl Into<PathBuf>, op: ConfigOp, message: impl ToString) -> Self {
        Self { path: path.into(), op, message: message.to_string() }
    }

    pub fn read(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::new(path, ConfigOp::Read, err)
    }

    pub fn parse(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::new(path, ConfigOp::Parse, err)
    }

    pub fn validate(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::new(path, ConfigOp::Validate, err)
    }

    pub fn write(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::new(path, ConfigOp::Write, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io_err: Error = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        assert_eq!(io_err.to_string(), "I/O error: file not found");

        let config_err = Error::Config("empty dot path".to_string());
        assert_eq!(config_err.to_string(), "configuration error: empty dot path");

        let manifest_err = Error::Manifest("parameter #1 is missing a name".to_string());
        assert_eq!(manifest_err.to_string(), "manifest error: parameter #1 is missing a name");

        let argument_err = Error::Argument("count: 'abc' is not a valid int".to_string());
        assert_eq!(argument_err.to_string(), "argument error: count: 'abc' is not a valid int");

        let invocation_err = Error::Invocation("boom".to_string());
        assert_eq!(invocation_err.to_string(), "invocation error: boom");

        let other_err = Error::Other("something went wrong".to_string());
        assert_eq!(other_err.to_string(), "something went wrong");
    }

    #[test]
    fn test_config_io_error_display() {
        let err = ConfigIoError::parse("/tmp/config.json", "expected value at line 1 column 1");
        assert_eq!(
            err.to_string(),
            "failed to parse /tmp/config.json: expected value at line 1 column 1"
        );

        let err = ConfigIoError::write("/tmp/config.json", "permission denied");
        assert_eq!(err.op, ConfigOp::Write);
        assert!(err.to_string().starts_with("failed to write"));
    }

    #[test]
    fn test_error_from_config_io_error() {
        let err: Error = ConfigIoError::read("/etc/app.json", "denied").into();
        assert_eq!(err.to_string(), "configuration file error: failed to read /etc/app.json: denied");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_err.into();
        assert_eq!(error.to_string(), "I/O error: denied");
    }

    #[test]
    fn test_config_op_as_str() {
        assert_eq!(ConfigOp::Read.as_str(), "read");
        assert_eq!(ConfigOp::Parse.as_str(), "parse");
        assert_eq!(ConfigOp::Validate.as_str(), "validate");
        assert_eq!(ConfigOp::Write.as_str(), "write");
    }
}

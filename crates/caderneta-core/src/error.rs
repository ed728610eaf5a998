use thiserror::Error;

/// Top-level error type for the Caderneta system.
///
/// Subsystem crates define their own error types and implement
/// `From<CadernetaError>` where they need to surface configuration or
/// serialization faults through `?`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CadernetaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CadernetaError {
    fn from(err: toml::de::Error) -> Self {
        CadernetaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CadernetaError {
    fn from(err: serde_json::Error) -> Self {
        CadernetaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Caderneta operations.
pub type Result<T> = std::result::Result<T, CadernetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CadernetaError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = CadernetaError::Ledger("rejected".to_string());
        assert_eq!(err.to_string(), "Ledger error: rejected");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CadernetaError = io_err.into();
        assert!(matches!(err, CadernetaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CadernetaError = json_err.into();
        assert!(matches!(err, CadernetaError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: CadernetaError = toml_err.into();
        assert!(matches!(err, CadernetaError::Config(_)));
    }

    #[test]
    fn test_result_alias() {
        fn returns_ok() -> Result<u32> {
            Ok(42)
        }
        fn returns_err() -> Result<u32> {
            Err(CadernetaError::Api("bind failed".into()))
        }
        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }
}

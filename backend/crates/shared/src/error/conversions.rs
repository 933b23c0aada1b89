//! Error conversions - From implementations for common error types
//!
//! Record files are read from disk and parsed with serde_json, so those two
//! error families convert straight into [`AppError`].

use super::app_error::AppError;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let app_err = match err.kind() {
            std::io::ErrorKind::NotFound => AppError::not_found("Record file not found"),
            std::io::ErrorKind::InvalidData => AppError::bad_request("Record file is not valid UTF-8"),
            _ => AppError::internal("I/O operation failed"),
        };
        app_err.with_source(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::bad_request(format!("JSON parse error: {}", err)).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

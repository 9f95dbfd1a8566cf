//! Simulation error types.
//!
//! Внутри тика ничего не падает: отсутствующие коллабораторы деградируют в no-op.
//! `SimError` возвращают только операции вне тика: загрузка конфига,
//! построение weighted таблиц, flush save store.

use std::fmt;

#[derive(Debug)]
pub enum SimError {
    /// Config file could not be read from disk.
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected schema.
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    /// Config parsed but a value is outside its allowed range.
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Weighted table weights are negative, NaN or sum above 1.0.
    InvalidWeights {
        total: f32,
    },

    /// Save store could not be read or flushed.
    SaveIo {
        path: String,
        source: std::io::Error,
    },

    /// Save file exists but is not a flat `{ key: int }` JSON object.
    SaveFormat {
        path: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::ConfigRead { path, source } => {
                write!(f, "failed to read config file '{}': {}", path, source)
            }
            SimError::ConfigParse { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path, source)
            }
            SimError::InvalidConfig { field, reason } => {
                write!(f, "invalid config value '{}': {}", field, reason)
            }
            SimError::InvalidWeights { total } => write!(
                f,
                "weighted table is invalid: weights must be finite, non-negative and sum to <= 1.0 (got {})",
                total
            ),
            SimError::SaveIo { path, source } => {
                write!(f, "save store I/O failed for '{}': {}", path, source)
            }
            SimError::SaveFormat { path, source } => {
                write!(f, "save file '{}' is malformed: {}", path, source)
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::ConfigRead { source, .. } | SimError::SaveIo { source, .. } => Some(source),
            SimError::ConfigParse { source, .. } | SimError::SaveFormat { source, .. } => {
                Some(source)
            }
            SimError::InvalidConfig { .. } | SimError::InvalidWeights { .. } => None,
        }
    }
}

use pricebook_core::{CoreError, ValidationError, WarehouseError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Core(CoreError::Validation(_)) => 2,
            Self::Warehouse(_) | Self::Core(_) => 3,
            Self::Serialization(_) => 4,
            Self::Logging(_) => 1,
            Self::Io(_) => 10,
        }
    }
}

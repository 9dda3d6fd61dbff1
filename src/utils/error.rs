use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Validation error on `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("{entity} {id} not found")]
    NotFoundError { entity: &'static str, id: u64 },

    #[error("Pool {pool_id} is not accepting requests (state: {state})")]
    PoolClosedError { pool_id: u64, state: String },

    #[error("Buyer {email} already holds a request in pool {pool_id}")]
    DuplicateCommitmentError { pool_id: u64, email: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// 給傳輸層用的錯誤分類，方便對應 HTTP 狀態碼或 exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    PoolClosed,
    DuplicateCommitment,
    Storage,
    Config,
}

impl PoolError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        PoolError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: u64) -> Self {
        PoolError::NotFoundError { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::ValidationError { .. } => ErrorKind::Validation,
            PoolError::NotFoundError { .. } => ErrorKind::NotFound,
            PoolError::PoolClosedError { .. } => ErrorKind::PoolClosed,
            PoolError::DuplicateCommitmentError { .. } => ErrorKind::DuplicateCommitment,
            PoolError::StorageError { .. }
            | PoolError::IoError(_)
            | PoolError::SerializationError(_) => ErrorKind::Storage,
            PoolError::ConfigError { .. } => ErrorKind::Config,
        }
    }

    /// 使用者看得懂的訊息 (不含內部細節)
    pub fn user_friendly_message(&self) -> String {
        match self {
            PoolError::ValidationError { field, message } => {
                format!("Invalid value for {}: {}", field, message)
            }
            PoolError::NotFoundError { entity, id } => {
                format!("{} #{} does not exist", entity, id)
            }
            PoolError::PoolClosedError { state, .. } => {
                format!("This pool is {} and cannot take new requests", state)
            }
            PoolError::DuplicateCommitmentError { email, .. } => {
                format!("{} has already joined this pool", email)
            }
            PoolError::StorageError { .. }
            | PoolError::IoError(_)
            | PoolError::SerializationError(_) => "The data store is unavailable".to_string(),
            PoolError::ConfigError { message } => format!("Configuration problem: {}", message),
        }
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PoolError::validation("quantity", "must be positive").kind(),
            ErrorKind::Validation
        );
        assert_eq!(PoolError::not_found("Pool", 3).kind(), ErrorKind::NotFound);

        let io = PoolError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_display_messages() {
        let err = PoolError::DuplicateCommitmentError {
            pool_id: 7,
            email: "a@x.com".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Buyer a@x.com already holds a request in pool 7"
        );
        assert_eq!(PoolError::not_found("Product", 2).to_string(), "Product 2 not found");
    }
}

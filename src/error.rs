use crate::domain::money::Money;
use crate::domain::settings::Feature;
use thiserror::Error;

/// Failures raised by the ledger store backends and the I/O boundary.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} is no longer pending")]
    Conflict(String),
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: Money, required: Money },
    #[error("balance overflow: {balance} + {delta}")]
    BalanceOverflow { balance: Money, delta: Money },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Business-rule rejections produced by the workflows.
///
/// Every variant is turned into an outbound notice by the engine; none of them
/// leave `LedgerEngine::handle` as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid format, expected `{usage}`")]
    InvalidFormat { usage: &'static str },
    #[error("invalid amount")]
    InvalidAmount,
    #[error("invalid game id")]
    InvalidGameId,
    #[error("invalid server id")]
    InvalidServerId,
    #[error("invalid player id")]
    InvalidPlayerId,
    #[error("not authorized")]
    NotAuthorized,
    #[error("admin only")]
    NotAdmin,
    #[error("{0} is under maintenance")]
    MaintenanceActive(Feature),
    #[error("insufficient balance: price {price}, balance {balance}")]
    InsufficientBalance { price: Money, balance: Money },
    #[error("game account {0} is banned")]
    BannedAccount(String),
    #[error("a top-up is already awaiting review")]
    PendingTopup,
    #[error("no top-up in progress")]
    NoPendingIntent,
    #[error("{0} was already resolved")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("store unavailable")]
    StoreUnavailable,
    #[error("ledger inconsistency: {0}")]
    Inconsistent(String),
}

impl WorkflowError {
    /// How much the caller is missing for an `InsufficientBalance` rejection.
    pub fn shortfall(&self) -> Option<Money> {
        match self {
            WorkflowError::InsufficientBalance { price, balance } => Some(*price - *balance),
            _ => None,
        }
    }
}

impl From<LedgerError> for WorkflowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(what) => WorkflowError::NotFound(what),
            LedgerError::Conflict(what) => WorkflowError::Conflict(what),
            LedgerError::InsufficientBalance { balance, required } => {
                WorkflowError::InsufficientBalance {
                    price: required,
                    balance,
                }
            }
            LedgerError::BalanceOverflow { .. } => WorkflowError::InvalidAmount,
            LedgerError::StoreUnavailable(reason) => {
                tracing::error!(%reason, "ledger store unavailable");
                WorkflowError::StoreUnavailable
            }
            other => {
                tracing::error!(error = %other, "ledger store failure");
                WorkflowError::StoreUnavailable
            }
        }
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

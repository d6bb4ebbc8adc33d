use crate::domain::task::TaskState;
use crate::domain::{AccountId, TaskId, UserId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketError>;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("insufficient funds on account {account}")]
    InsufficientFunds { account: AccountId },
    #[error("task is not in {required} state: {command} rejected")]
    InvalidStateTransition {
        command: &'static str,
        required: TaskState,
    },
    #[error("not authorized: {0}")]
    NotAuthorized(&'static str),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

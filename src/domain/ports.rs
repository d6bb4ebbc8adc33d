use super::account::Account;
use super::task::{Task, TaskState};
use super::user::UserProfile;
use super::{AccountId, TaskId, UserId};
use crate::error::Result;
use async_trait::async_trait;

pub type UserStoreBox = Box<dyn UserStore>;
pub type AccountStoreBox = Box<dyn AccountStore>;
pub type TaskStoreBox = Box<dyn TaskStore>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new profile under the next free id and returns it.
    async fn insert(&self, user: UserProfile) -> Result<UserProfile>;
    async fn put(&self, user: UserProfile) -> Result<()>;
    async fn get(&self, id: UserId) -> Result<Option<UserProfile>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>>;
    async fn remove(&self, id: UserId) -> Result<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn put(&self, account: Account) -> Result<()>;
    async fn get(&self, id: AccountId) -> Result<Option<Account>>;
    async fn remove(&self, id: AccountId) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task under the next free id and returns it.
    async fn insert(&self, task: Task) -> Result<Task>;
    async fn put(&self, task: Task) -> Result<()>;
    async fn get(&self, id: TaskId) -> Result<Option<Task>>;
    async fn remove(&self, id: TaskId) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Task>>;

    /// Atomically persists a transitioned task together with the accounts it
    /// touched, provided the stored task is still in `expected` state.
    ///
    /// Returns `Ok(false)` without writing anything when the state check
    /// fails; either every row commits or none does. This is the commit-time
    /// guard re-validation that keeps two concurrent acquisitions of the same
    /// task from both freezing funds.
    async fn commit_transition(
        &self,
        expected: TaskState,
        task: Task,
        accounts: Vec<Account>,
    ) -> Result<bool>;
}

use crate::domain::account::Account;
use crate::domain::ports::{AccountStore, TaskStore, UserStore};
use crate::domain::task::{Task, TaskState};
use crate::domain::user::UserProfile;
use crate::domain::{AccountId, TaskId, UserId};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserProfile>,
    accounts: HashMap<AccountId, Account>,
    tasks: HashMap<TaskId, Task>,
    next_user_id: UserId,
    next_task_id: TaskId,
}

/// A thread-safe in-memory store backing all three repository ports.
///
/// One `Arc<RwLock<..>>` arena keyed by numeric id; `Clone` shares the arena,
/// so the same store can be boxed once per port. The single write lock is
/// what makes `commit_transition` an atomic all-rows-or-nothing write.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, mut user: UserProfile) -> Result<UserProfile> {
        let mut inner = self.inner.write().await;
        inner.next_user_id += 1;
        user.id = inner.next_user_id;
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn put(&self, user: UserProfile) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn remove(&self, id: UserId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.remove(&id).is_some())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn put(&self, account: Account) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.accounts.insert(account.id, account);
        Ok(())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn remove(&self, id: AccountId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.accounts.remove(&id).is_some())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().cloned().collect())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert(&self, mut task: Task) -> Result<Task> {
        let mut inner = self.inner.write().await;
        inner.next_task_id += 1;
        task.id = inner.next_task_id;
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn put(&self, task: Task) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.tasks.insert(task.id, task);
        Ok(())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.get(&id).cloned())
    }

    async fn remove(&self, id: TaskId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.tasks.remove(&id).is_some())
    }

    async fn all(&self) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.values().cloned().collect())
    }

    async fn commit_transition(
        &self,
        expected: TaskState,
        task: Task,
        accounts: Vec<Account>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let current = inner
            .tasks
            .get(&task.id)
            .ok_or(MarketError::TaskNotFound(task.id))?;
        if current.state != expected {
            return Ok(false);
        }
        inner.tasks.insert(task.id, task);
        for account in accounts {
            inner.accounts.insert(account.id, account);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::MoneyValue;
    use rust_decimal_macros::dec;

    fn sample_task(customer: AccountId) -> Task {
        Task::new(
            customer,
            "Create dating site".to_string(),
            MoneyValue::from_decimal(dec!(321.000000123)).unwrap(),
            String::new(),
        )
    }

    #[tokio::test]
    async fn test_user_round_trip_and_lookup() {
        let store = InMemoryStore::new();
        let user = UserStore::insert(
            &store,
            UserProfile {
                id: 0,
                username: "emil".to_string(),
                password_hash: "hash".to_string(),
                email: "emilasanbekov@gmail.com".to_string(),
                is_admin: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(user.id, 1);

        let by_id = UserStore::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(by_id, user);
        let by_name = store.find_by_username("emil").await.unwrap().unwrap();
        assert_eq!(by_name, user);

        assert!(store.find_by_username("nobody").await.unwrap().is_none());
        assert!(UserStore::remove(&store, 1).await.unwrap());
        assert!(!UserStore::remove(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_account_round_trip() {
        let store = InMemoryStore::new();
        let mut account = Account::new(1);
        account.balance = MoneyValue::from_decimal(dec!(100.12)).unwrap();

        AccountStore::put(&store, account.clone()).await.unwrap();
        let retrieved = AccountStore::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(retrieved, account);

        assert!(AccountStore::get(&store, 2).await.unwrap().is_none());
        assert_eq!(AccountStore::all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_task_insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let first = TaskStore::insert(&store, sample_task(2)).await.unwrap();
        let second = TaskStore::insert(&store, sample_task(3)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let retrieved = TaskStore::get(&store, 2).await.unwrap().unwrap();
        assert_eq!(retrieved, second);
    }

    #[tokio::test]
    async fn test_commit_transition_applies_all_rows() {
        let store = InMemoryStore::new();
        let mut task = TaskStore::insert(&store, sample_task(2)).await.unwrap();
        let mut account = Account::new(2);
        account.balance = MoneyValue::from_decimal(dec!(400)).unwrap();
        AccountStore::put(&store, account.clone()).await.unwrap();

        task.state = TaskState::Executing;
        task.executioner = 2;
        account.frozen = task.cost;
        let committed = store
            .commit_transition(TaskState::Free, task.clone(), vec![account.clone()])
            .await
            .unwrap();
        assert!(committed);

        assert_eq!(
            TaskStore::get(&store, task.id).await.unwrap().unwrap().state,
            TaskState::Executing
        );
        assert_eq!(
            AccountStore::get(&store, 2).await.unwrap().unwrap(),
            account
        );
    }

    #[tokio::test]
    async fn test_commit_transition_rejects_stale_state() {
        let store = InMemoryStore::new();
        let mut task = TaskStore::insert(&store, sample_task(2)).await.unwrap();
        let mut closed = task.clone();
        closed.state = TaskState::Closed;
        TaskStore::put(&store, closed).await.unwrap();

        task.state = TaskState::Executing;
        let mut account = Account::new(2);
        account.frozen = task.cost;
        let committed = store
            .commit_transition(TaskState::Free, task, vec![account])
            .await
            .unwrap();
        assert!(!committed);

        // Nothing was written, not even the account row.
        assert!(AccountStore::get(&store, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_transition_unknown_task() {
        let store = InMemoryStore::new();
        let mut task = sample_task(2);
        task.id = 42;
        let result = store
            .commit_transition(TaskState::Free, task, vec![])
            .await;
        assert!(matches!(result, Err(MarketError::TaskNotFound(42))));
    }
}

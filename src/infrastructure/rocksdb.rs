use crate::domain::account::Account;
use crate::domain::ports::{AccountStore, TaskStore, UserStore};
use crate::domain::task::{Task, TaskState};
use crate::domain::user::UserProfile;
use crate::domain::{AccountId, TaskId, UserId};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for user profiles.
pub const CF_USERS: &str = "users";
/// Column Family for accounts.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for tasks.
pub const CF_TASKS: &str = "tasks";
/// Column Family for id counters.
const CF_META: &str = "meta";

const NEXT_USER_ID: &[u8] = b"next_user_id";
const NEXT_TASK_ID: &[u8] = b"next_task_id";

/// A persistent store implementation using RocksDB.
///
/// Entities are kept in separate column families as JSON values keyed by
/// their big-endian id. Id allocation and `commit_transition` serialize on a
/// commit mutex so the read-check-write sequence stays atomic; the batched
/// write makes the row updates all-or-nothing on disk.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

fn storage_err(error: impl std::fmt::Display) -> MarketError {
    MarketError::Storage(error.to_string())
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_USERS, CF_ACCOUNTS, CF_TASKS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(storage_err)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| MarketError::Storage(format!("{} column family not found", name)))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, id: u64) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self
            .db
            .get_cf(cf, id.to_be_bytes())
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(storage_err)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, id: u64, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(storage_err)?;
        self.db
            .put_cf(cf, id.to_be_bytes(), bytes)
            .map_err(storage_err)
    }

    fn delete(&self, cf_name: &str, id: u64) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        let existed = self
            .db
            .get_pinned_cf(cf, id.to_be_bytes())
            .map_err(storage_err)?
            .is_some();
        self.db
            .delete_cf(cf, id.to_be_bytes())
            .map_err(storage_err)?;
        Ok(existed)
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut items = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = entry.map_err(storage_err)?;
            items.push(serde_json::from_slice(&value).map_err(storage_err)?);
        }
        Ok(items)
    }

    /// Bumps and returns an id counter. Callers hold the commit lock.
    fn next_id(&self, counter: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_cf(cf, counter).map_err(storage_err)? {
            Some(bytes) => u64::from_be_bytes(bytes.as_slice().try_into().map_err(storage_err)?),
            None => 0,
        };
        let next = current + 1;
        self.db
            .put_cf(cf, counter, next.to_be_bytes())
            .map_err(storage_err)?;
        Ok(next)
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn insert(&self, mut user: UserProfile) -> Result<UserProfile> {
        let _guard = self.commit_lock.lock().await;
        user.id = self.next_id(NEXT_USER_ID)?;
        self.write(CF_USERS, user.id, &user)?;
        Ok(user)
    }

    async fn put(&self, user: UserProfile) -> Result<()> {
        self.write(CF_USERS, user.id, &user)
    }

    async fn get(&self, id: UserId) -> Result<Option<UserProfile>> {
        self.read(CF_USERS, id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let users: Vec<UserProfile> = self.scan(CF_USERS)?;
        Ok(users.into_iter().find(|user| user.username == username))
    }

    async fn remove(&self, id: UserId) -> Result<bool> {
        self.delete(CF_USERS, id)
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn put(&self, account: Account) -> Result<()> {
        self.write(CF_ACCOUNTS, account.id, &account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.read(CF_ACCOUNTS, id)
    }

    async fn remove(&self, id: AccountId) -> Result<bool> {
        self.delete(CF_ACCOUNTS, id)
    }

    async fn all(&self) -> Result<Vec<Account>> {
        self.scan(CF_ACCOUNTS)
    }
}

#[async_trait]
impl TaskStore for RocksDbStore {
    async fn insert(&self, mut task: Task) -> Result<Task> {
        let _guard = self.commit_lock.lock().await;
        task.id = self.next_id(NEXT_TASK_ID)?;
        self.write(CF_TASKS, task.id, &task)?;
        Ok(task)
    }

    async fn put(&self, task: Task) -> Result<()> {
        self.write(CF_TASKS, task.id, &task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        self.read(CF_TASKS, id)
    }

    async fn remove(&self, id: TaskId) -> Result<bool> {
        self.delete(CF_TASKS, id)
    }

    async fn all(&self) -> Result<Vec<Task>> {
        self.scan(CF_TASKS)
    }

    async fn commit_transition(
        &self,
        expected: TaskState,
        task: Task,
        accounts: Vec<Account>,
    ) -> Result<bool> {
        let _guard = self.commit_lock.lock().await;
        let current: Task = self
            .read(CF_TASKS, task.id)?
            .ok_or(MarketError::TaskNotFound(task.id))?;
        if current.state != expected {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_TASKS)?,
            task.id.to_be_bytes(),
            serde_json::to_vec(&task).map_err(storage_err)?,
        );
        for account in accounts {
            batch.put_cf(
                self.cf(CF_ACCOUNTS)?,
                account.id.to_be_bytes(),
                serde_json::to_vec(&account).map_err(storage_err)?,
            );
        }
        self.db.write(batch).map_err(storage_err)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::MoneyValue;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_user(username: &str) -> UserProfile {
        UserProfile {
            id: 0,
            username: username.to_string(),
            password_hash: "hash".to_string(),
            email: format!("{}@domain.com", username),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in [CF_USERS, CF_ACCOUNTS, CF_TASKS, CF_META] {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_user_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let user = UserStore::insert(&store, sample_user("nurbek")).await.unwrap();
        assert_eq!(user.id, 1);
        let second = UserStore::insert(&store, sample_user("emil")).await.unwrap();
        assert_eq!(second.id, 2);

        let retrieved = UserStore::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(retrieved, user);
        let by_name = store.find_by_username("emil").await.unwrap().unwrap();
        assert_eq!(by_name, second);

        assert!(UserStore::remove(&store, 1).await.unwrap());
        assert!(UserStore::get(&store, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_account_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let mut account = Account::new(1);
        account.balance = MoneyValue::from_decimal(dec!(100.12)).unwrap();

        AccountStore::put(&store, account.clone()).await.unwrap();
        let retrieved = AccountStore::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(retrieved, account);

        let all = AccountStore::all(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(AccountStore::get(&store, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_transition_is_atomic_and_checked() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let task = Task::new(
            2,
            "Create company logo".to_string(),
            MoneyValue::from_decimal(dec!(412.512)).unwrap(),
            String::new(),
        );
        let mut task = TaskStore::insert(&store, task).await.unwrap();
        let mut account = Account::new(3);
        account.balance = MoneyValue::from_decimal(dec!(500)).unwrap();
        AccountStore::put(&store, account.clone()).await.unwrap();

        task.state = TaskState::Executing;
        task.executioner = 3;
        account.frozen = task.cost;
        assert!(store
            .commit_transition(TaskState::Free, task.clone(), vec![account.clone()])
            .await
            .unwrap());

        // Stale expectation: nothing is overwritten.
        let mut stale = task.clone();
        stale.state = TaskState::Closed;
        assert!(!store
            .commit_transition(TaskState::Free, stale, vec![Account::new(3)])
            .await
            .unwrap());

        let stored = TaskStore::get(&store, task.id).await.unwrap().unwrap();
        assert_eq!(stored.state, TaskState::Executing);
        let stored = AccountStore::get(&store, 3).await.unwrap().unwrap();
        assert_eq!(stored, account);
    }
}

use crate::domain::account::Account;
use crate::domain::money::MoneyValue;
use crate::domain::ports::{
    AccountStore, AccountStoreBox, TaskStore, TaskStoreBox, UserStore, UserStoreBox,
};
use crate::domain::user::{hash_password, Identity, UserProfile};
use crate::domain::{AccountId, UserId};
use crate::error::{MarketError, Result};
use tracing::info;

/// A registration request.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub is_admin: bool,
}

/// Profile edits. Admin flag, balance and frozen amount are administrative
/// fields and require the admin flag on the caller.
#[derive(Debug, Clone, Default)]
pub struct UserEdit {
    pub password: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
    pub balance: Option<MoneyValue>,
    pub frozen: Option<MoneyValue>,
}

/// User and account administration.
pub struct Directory {
    users: UserStoreBox,
    accounts: AccountStoreBox,
    tasks: TaskStoreBox,
}

impl Directory {
    pub fn new(users: UserStoreBox, accounts: AccountStoreBox, tasks: TaskStoreBox) -> Self {
        Self {
            users,
            accounts,
            tasks,
        }
    }

    /// Registers a new user and their empty account. Admin only.
    pub async fn register(&self, caller: Identity, new: NewUser) -> Result<UserProfile> {
        if !caller.is_admin {
            return Err(MarketError::NotAuthorized(
                "only admins can register new users",
            ));
        }
        if self.users.find_by_username(&new.username).await?.is_some() {
            return Err(MarketError::Validation(format!(
                "username {} is already taken",
                new.username
            )));
        }
        let user = self
            .users
            .insert(UserProfile {
                id: 0,
                username: new.username,
                password_hash: hash_password(&new.password),
                email: new.email,
                is_admin: new.is_admin,
            })
            .await?;
        self.accounts.put(Account::new(user.id)).await?;
        info!(user = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Fetches a profile. Visible to its owner and to admins.
    pub async fn get(&self, caller: Identity, user_id: UserId) -> Result<UserProfile> {
        if caller.account != user_id && !caller.is_admin {
            return Err(MarketError::NotAuthorized(
                "profiles are only visible to their owner or an admin",
            ));
        }
        self.load(user_id).await
    }

    /// Applies profile and account edits subject to the caller's permissions.
    pub async fn update(
        &self,
        caller: Identity,
        user_id: UserId,
        edit: UserEdit,
    ) -> Result<UserProfile> {
        let mut user = self.load(user_id).await?;
        if caller.account != user.id && !caller.is_admin {
            return Err(MarketError::NotAuthorized(
                "profile can only be edited by its owner or an admin",
            ));
        }
        if (edit.is_admin.is_some() || edit.balance.is_some() || edit.frozen.is_some())
            && !caller.is_admin
        {
            return Err(MarketError::NotAuthorized(
                "admin flag and balances can only be edited by an admin",
            ));
        }

        if let Some(password) = edit.password {
            user.password_hash = hash_password(&password);
        }
        if let Some(email) = edit.email {
            user.email = email;
        }
        if let Some(is_admin) = edit.is_admin {
            user.is_admin = is_admin;
        }

        if edit.balance.is_some() || edit.frozen.is_some() {
            let mut account = self
                .accounts
                .get(user_id)
                .await?
                .ok_or(MarketError::AccountNotFound(user_id))?;
            if let Some(balance) = edit.balance {
                account.balance = balance;
            }
            if let Some(frozen) = edit.frozen {
                account.frozen = frozen;
            }
            if account.frozen.is_greater_than(account.balance) {
                return Err(MarketError::Validation(
                    "frozen amount may not exceed balance".to_string(),
                ));
            }
            self.accounts.put(account).await?;
        }

        self.users.put(user.clone()).await?;
        Ok(user)
    }

    /// Administrative balance edit used by the batch interface: sets the
    /// account's balance to `amount`.
    pub async fn set_balance(
        &self,
        caller: Identity,
        account_id: AccountId,
        amount: MoneyValue,
    ) -> Result<Account> {
        if !caller.is_admin {
            return Err(MarketError::NotAuthorized(
                "balances can only be edited by an admin",
            ));
        }
        let mut account = self
            .accounts
            .get(account_id)
            .await?
            .ok_or(MarketError::AccountNotFound(account_id))?;
        if account.frozen.is_greater_than(amount) {
            return Err(MarketError::Validation(
                "frozen amount may not exceed balance".to_string(),
            ));
        }
        account.balance = amount;
        self.accounts.put(account.clone()).await?;
        info!(account = account_id, "balance edited");
        Ok(account)
    }

    /// Deletes a user and their account. Admin only; admins cannot delete
    /// themselves, and users referenced by a non-terminal task stay.
    pub async fn remove(&self, caller: Identity, user_id: UserId) -> Result<()> {
        if !caller.is_admin {
            return Err(MarketError::NotAuthorized("only admins can delete users"));
        }
        if caller.account == user_id {
            return Err(MarketError::NotAuthorized("users cannot delete themselves"));
        }
        self.load(user_id).await?;

        let referenced = self.tasks.all().await?.iter().any(|task| {
            !task.state.is_terminal()
                && (task.customer == user_id || task.executioner == user_id)
        });
        if referenced {
            return Err(MarketError::Validation(
                "user is referenced by an active task".to_string(),
            ));
        }

        self.users.remove(user_id).await?;
        self.accounts.remove(user_id).await?;
        info!(user = user_id, "user deleted");
        Ok(())
    }

    async fn load(&self, user_id: UserId) -> Result<UserProfile> {
        self.users
            .get(user_id)
            .await?
            .ok_or(MarketError::UserNotFound(user_id))
    }
}

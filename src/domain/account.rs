use super::money::MoneyValue;
use super::AccountId;
use serde::{Deserialize, Serialize};

/// The funds held for a single user.
///
/// `frozen` is the portion of `balance` committed to in-progress tasks; it is
/// a subset of the balance, not a separate pot. Accounts are mutated only by
/// the ledger operations and administrative edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: MoneyValue,
    pub frozen: MoneyValue,
}

impl Account {
    /// Creates an empty account, as done at user registration.
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            balance: MoneyValue::ZERO,
            frozen: MoneyValue::ZERO,
        }
    }

    /// Funds not committed to an in-progress task.
    pub fn available(&self) -> MoneyValue {
        self.balance.subtract(self.frozen)
    }
}

//! Balance operations applied to account pairs during task transitions.
//!
//! All operations take already-loaded accounts and return updated copies;
//! persisting the results atomically is the caller's job. Freeze and
//! unfreeze only move funds between the available and committed sub-balances
//! of one account; [`settle`] is the single point where money changes net
//! ownership.

use super::account::Account;
use super::money::MoneyValue;
use crate::error::{MarketError, Result};

/// Commits `amount` of the account's available funds.
///
/// Fails with `InsufficientFunds` when the available balance
/// (`balance - frozen`) cannot cover the amount.
pub fn freeze(account: &Account, amount: MoneyValue) -> Result<Account> {
    if amount.is_greater_than(account.available()) {
        return Err(MarketError::InsufficientFunds {
            account: account.id,
        });
    }
    Ok(Account {
        frozen: account.frozen.add(amount),
        ..account.clone()
    })
}

/// Releases previously frozen funds back to the available balance.
///
/// Callers guarantee the amount was frozen earlier; under correct sequencing
/// the frozen amount never goes negative.
pub fn unfreeze(account: &Account, amount: MoneyValue) -> Account {
    Account {
        frozen: account.frozen.subtract(amount),
        ..account.clone()
    }
}

/// Transfers committed funds from `payer` to `payee`.
pub fn settle(payer: &Account, payee: &Account, amount: MoneyValue) -> (Account, Account) {
    let payer = Account {
        id: payer.id,
        balance: payer.balance.subtract(amount),
        frozen: payer.frozen.subtract(amount),
    };
    let payee = Account {
        balance: payee.balance.add(amount),
        ..payee.clone()
    };
    (payer, payee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(id: u64, balance: &str, frozen: &str) -> Account {
        Account {
            id,
            balance: MoneyValue::from_decimal(balance.parse().unwrap()).unwrap(),
            frozen: MoneyValue::from_decimal(frozen.parse().unwrap()).unwrap(),
        }
    }

    #[test]
    fn test_freeze_commits_available_funds() {
        let before = account(1, "500.00", "0");
        let after = freeze(&before, MoneyValue::from_decimal(dec!(200.0001)).unwrap()).unwrap();

        assert_eq!(after.balance, before.balance);
        assert_eq!(after.frozen.to_decimal(), dec!(200.0001));
        assert_eq!(after.available().to_decimal(), dec!(299.9999));
    }

    #[test]
    fn test_freeze_rejects_insufficient_available() {
        let before = account(2, "1.000000123", "0");
        let result = freeze(&before, MoneyValue::from_decimal(dec!(100.12)).unwrap());
        assert!(matches!(
            result,
            Err(MarketError::InsufficientFunds { account: 2 })
        ));
    }

    #[test]
    fn test_freeze_counts_already_frozen_funds() {
        // 100 in balance, 80 already committed: only 20 is available.
        let before = account(1, "100", "80");
        let result = freeze(&before, MoneyValue::from_decimal(dec!(30)).unwrap());
        assert!(matches!(result, Err(MarketError::InsufficientFunds { .. })));

        let ok = freeze(&before, MoneyValue::from_decimal(dec!(20)).unwrap()).unwrap();
        assert_eq!(ok.frozen.to_decimal(), dec!(100));
    }

    #[test]
    fn test_unfreeze_restores_frozen_amount() {
        let before = account(1, "100", "0");
        let amount = MoneyValue::from_decimal(dec!(42.5)).unwrap();

        let frozen = freeze(&before, amount).unwrap();
        let released = unfreeze(&frozen, amount);
        assert_eq!(released, before);
    }

    #[test]
    fn test_settle_moves_funds_and_clears_freeze() {
        let payer = account(1, "500.00", "200.0001");
        let payee = account(2, "100.12", "0");
        let amount = MoneyValue::from_decimal(dec!(200.0001)).unwrap();

        let (payer, payee) = settle(&payer, &payee, amount);

        assert_eq!(payer.balance.to_decimal(), dec!(299.9999));
        assert_eq!(payer.frozen.to_decimal(), dec!(0));
        assert_eq!(payee.balance.to_decimal(), dec!(300.1201));
    }

    #[test]
    fn test_settle_conserves_total_money() {
        let payer = account(1, "500.00", "200.0001");
        let payee = account(2, "100.12", "0");
        let amount = MoneyValue::from_decimal(dec!(200.0001)).unwrap();
        let total_before = payer.balance.add(payee.balance);

        let (payer, payee) = settle(&payer, &payee, amount);

        assert!(payer.balance.add(payee.balance).is_equal_to(total_before));
    }
}

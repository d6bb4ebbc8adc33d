//! Sample fixture data for demos and manual runs.

use crate::domain::account::Account;
use crate::domain::money::MoneyValue;
use crate::domain::ports::{AccountStore, TaskStore, UserStore};
use crate::domain::task::Task;
use crate::domain::user::{hash_password, UserProfile};
use crate::error::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

/// Fills an empty store with three users (one admin) and four free tasks.
///
/// All sample users share the password `password123`. Ids are assigned
/// sequentially, so the admin lands on id 1.
pub async fn seed_sample_data(
    users: &dyn UserStore,
    accounts: &dyn AccountStore,
    tasks: &dyn TaskStore,
) -> Result<()> {
    let fixtures = [
        ("admin", "admin@domain.com", true, dec!(0.0)),
        ("nurbek", "nasanbekov@gmail.com", false, dec!(1.000000123)),
        ("emil", "emilasanbekov@gmail.com", false, dec!(100.12)),
    ];
    for (username, email, is_admin, balance) in fixtures {
        let user = users
            .insert(UserProfile {
                id: 0,
                username: username.to_string(),
                password_hash: hash_password("password123"),
                email: email.to_string(),
                is_admin,
            })
            .await?;
        accounts
            .put(Account {
                id: user.id,
                balance: MoneyValue::from_decimal(balance)?,
                frozen: MoneyValue::ZERO,
            })
            .await?;
    }

    let postings: [(u64, &str, Decimal); 4] = [
        (2, "Make online shop", dec!(100.12)),
        (3, "Fix bug in network library", dec!(200.0001)),
        (2, "Create dating site", dec!(321.000000123)),
        (3, "Create company logo", dec!(412.512)),
    ];
    for (customer, title, cost) in postings {
        tasks
            .insert(Task::new(
                customer,
                title.to_string(),
                MoneyValue::from_decimal(cost)?,
                String::new(),
            ))
            .await?;
    }

    info!("store has been filled with sample data");
    Ok(())
}

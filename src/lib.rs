//! Freelance-marketplace backend: accounts with escrowed balances and tasks
//! moving through a post/acquire/finish/accept lifecycle.
//!
//! The core lives in `domain` (fixed-point money, ledger operations, the task
//! state machine types) and `application` (command processing, user
//! administration, sessions); storage is abstracted behind async ports with
//! in-memory and RocksDB adapters under `infrastructure`.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

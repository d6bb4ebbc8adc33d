//! Application layer orchestrating the domain against the storage ports.
//!
//! `TaskLifecycle` is the command entry point for tasks; `Directory` covers
//! user and account administration; `SessionService` is the authentication
//! collaborator resolving tokens to caller identities.

pub mod directory;
pub mod lifecycle;
pub mod sessions;

//! Inbound and outbound adapters for the batch command interface.

pub mod csv;

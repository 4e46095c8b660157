//! Domain building blocks for the admin dashboard client.
//!
//! Everything in this crate is pure: entity records and their status
//! toggle, the resource-table query engine, branch-permission scopes,
//! and the CSV bulk-replace import state machine with its retry policy.
//! HTTP lives in `adminboard-client`.

pub mod branch_permissions;
pub mod error;
pub mod import;
pub mod records;
pub mod resource_table;
pub mod types;

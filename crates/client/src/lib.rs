//! HTTP client for the admin dashboard's REST backend.
//!
//! Exposes the configuration, error handling, generic resource and
//! branch-permission clients, the presigned-upload stager, and the CSV
//! bulk-replace importer so front ends and integration tests share one
//! implementation.

pub mod config;
pub mod error;
pub mod http;
pub mod import;
pub mod permissions;
pub mod resources;
pub mod telemetry;
pub mod upload;

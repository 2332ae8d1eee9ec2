//! Multi-tenant leave management backend.
//!
//! The crate is organized around two HR process areas: `leave` holds the
//! application intake pipeline (rule validation, policy selection, approval
//! workflows, balance ledger), and `policy` holds the versioned policy
//! documents that drive that validation. Both sit on top of tenant-scoped
//! storage traits in `store`.

pub mod config;
pub mod error;
pub mod leave;
pub mod policy;
pub mod store;
pub mod telemetry;

//! Shared identifiers and configuration for GitMarket.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for users, bounties, submissions, and ledger entries
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LogConfig, MarketConfig};
pub use types::{BountyId, LedgerEntryId, SubmissionId, UserId};

//! String-backed enums stored in status and kind columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored bounty status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BountyStatus {
    /// `open`
    #[sea_orm(string_value = "open")]
    Open,
    /// `claimed`
    #[sea_orm(string_value = "claimed")]
    Claimed,
    /// `paid`
    #[sea_orm(string_value = "paid")]
    Paid,
    /// `cancelled`
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Stored submission status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SubmissionStatus {
    /// `pending`
    #[sea_orm(string_value = "pending")]
    Pending,
    /// `approved`
    #[sea_orm(string_value = "approved")]
    Approved,
    /// `rejected`
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Stored ledger entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EntryKind {
    /// `signup_bonus`
    #[sea_orm(string_value = "signup_bonus")]
    SignupBonus,
    /// `bounty_placed`
    #[sea_orm(string_value = "bounty_placed")]
    BountyPlaced,
    /// `bounty_earned`
    #[sea_orm(string_value = "bounty_earned")]
    BountyEarned,
    /// `bounty_cancelled`
    #[sea_orm(string_value = "bounty_cancelled")]
    BountyCancelled,
    /// `bounty_refund`
    #[sea_orm(string_value = "bounty_refund")]
    BountyRefund,
}

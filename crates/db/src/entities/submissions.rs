//! `SeaORM` Entity for submissions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SubmissionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bounty_id: Uuid,
    pub solver_id: Uuid,
    pub pr_url: String,
    pub comment: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bounties::Entity",
        from = "Column::BountyId",
        to = "super::bounties::Column::Id"
    )]
    Bounties,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SolverId",
        to = "super::accounts::Column::Id"
    )]
    Solver,
}

impl Related<super::bounties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bounties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

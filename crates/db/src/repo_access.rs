//! Team-based repository access grant.
//!
//! Before GitHub supported outside collaborators with per-repository
//! permissions, each student was added to a single-person team. Repo access
//! records keep track of those teams, and are still referenced by assignment
//! repositories created at that time.

use sea_orm::entity::prelude::*;

/// Repo access model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_accesses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub organization_id: i64,

    /// GitHub identifier of the single-person team.
    pub github_team_id: Option<i64>,
}

/// Repo access model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Get the user the access was granted to.
    pub async fn user<C: ConnectionTrait>(&self, db: &C) -> Result<Option<super::user::Model>, DbErr> {
        self.find_related(super::user::Entity).one(db).await
    }
}

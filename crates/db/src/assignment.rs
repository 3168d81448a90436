//! Classroom assignment.

use sea_orm::entity::prelude::*;

/// Assignment model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,

    /// User that created the assignment.
    pub creator_id: i64,

    pub title: String,

    /// GitHub identifier of a repository with starter code, if any.
    pub starter_code_repo_id: Option<i64>,

    pub created_at: TimeDateTime,
}

/// Assignment model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id"
    )]
    Creator,

    #[sea_orm(has_many = "super::assignment_repo::Entity")]
    AssignmentRepos,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::assignment_repo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentRepos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Get the user that created the assignment.
    pub async fn creator<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<super::user::Model>, DbErr> {
        super::user::Entity::find_by_id(self.creator_id).one(db).await
    }

    /// Get the assignment organization, unless it was soft-deleted.
    pub async fn organization<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<super::organization::Model>, DbErr> {
        super::organization::Entity::find_active()
            .filter(super::organization::Column::Id.eq(self.organization_id))
            .one(db)
            .await
    }
}

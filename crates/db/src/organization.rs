//! Organization a classroom belongs to.
//!
//! Organizations are soft-deleted: a deleted organization keeps its row with
//! the `deleted_at` timestamp set. Regular lookups should go through
//! [`Entity::find_active`], while cleanup paths that need to reach deleted
//! organizations use the unscoped [`EntityTrait::find_by_id`].

use common::github::{GitHubClient, GitHubError};
use sea_orm::entity::prelude::*;
use tracing::info;

/// Organization model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// GitHub organization identifier.
    pub github_id: i64,

    pub title: String,

    /// Soft deletion timestamp.
    pub deleted_at: Option<TimeDateTime>,
}

/// Organization model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignments,

    #[sea_orm(has_many = "super::repo_access::Entity")]
    RepoAccesses,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::repo_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepoAccesses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Select organizations that were not soft-deleted.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }
}

impl Model {
    /// Check if the organization was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Get a GitHub-side view of the current organization.
    pub fn github_organization<'a>(&self, client: &'a dyn GitHubClient) -> GitHubOrganization<'a> {
        GitHubOrganization {
            github_id: self.github_id,
            client,
        }
    }
}

/// Organization operations executed against GitHub.
pub struct GitHubOrganization<'a> {
    github_id: i64,
    client: &'a dyn GitHubClient,
}

impl GitHubOrganization<'_> {
    /// GitHub organization identifier.
    pub fn id(&self) -> i64 {
        self.github_id
    }

    /// Delete an organization repository.
    pub async fn delete_repository(&self, repo_id: i64) -> Result<(), GitHubError> {
        info!(
            organization = self.id(),
            repo_id, "deleting organization repository"
        );

        self.client.delete_repository(repo_id).await
    }
}

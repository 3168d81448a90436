//! Registered user.
//!
//! Every user is linked to a GitHub account by its numeric identifier,
//! which is used to resolve account details on demand.

use common::github::{GitHubClient, GitHubError};
use sea_orm::entity::prelude::*;

/// User model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// GitHub user identifier.
    pub uid: i64,

    pub created_at: TimeDateTime,
}

/// User model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::assignment_repo::Entity")]
    AssignmentRepos,

    #[sea_orm(has_many = "super::repo_access::Entity")]
    RepoAccesses,
}

impl Related<super::assignment_repo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentRepos.def()
    }
}

impl Related<super::repo_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepoAccesses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Get GitHub account reference of the current user.
    pub fn github_user(&self) -> GitHubUser {
        GitHubUser { uid: self.uid }
    }
}

/// Reference to a GitHub account.
///
/// Account details are not stored locally and are fetched when needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GitHubUser {
    uid: i64,
}

impl GitHubUser {
    /// GitHub user identifier.
    pub fn id(&self) -> i64 {
        self.uid
    }

    /// Fetch the current account login.
    pub async fn login(&self, client: &dyn GitHubClient) -> Result<String, GitHubError> {
        Ok(client.user(self.uid).await?.login)
    }
}

//! Student repository created for an assignment.
//!
//! An assignment repository links a student, an assignment and a repository
//! hosted on GitHub. The student is normally referenced directly, but records
//! created before GitHub supported per-repository outside collaborators
//! reference the student only through a [`repo_access`] grant. Use
//! [`Model::effective_user`] to resolve the owner regardless of which path
//! a record uses.
//!
//! Records must be written through [`create`], [`update`] and [`destroy`],
//! which run validations and keep the search index and GitHub in sync.
//!
//! [`repo_access`]: super::repo_access

use common::github::{Commit, GitHubClient, GitHubError};
use derive_more::{Display, Error, From};
use sea_orm::{entity::prelude::*, ActiveValue, QuerySelect, TransactionTrait};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    assignment, now, organization, repo_access, search::SearchIndex, user, user::GitHubUser,
    SelectExt, TransactionErrorExt,
};

/// Search index name used for assignment repositories.
pub const INDEX_NAME: &str = "assignment_repo#assignment_repo";

/// Validation message used when a user already has a repository for an assignment.
pub const UNIQUENESS_MESSAGE: &str =
    "Should only have one assignment repository for each user-assignment combination";

/// Validation message used when a required reference is missing.
pub const BLANK_MESSAGE: &str = "can't be blank";

/// Assignment repository model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignment_repos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,

    /// Directly assigned student.
    ///
    /// Empty for legacy records, which reference the student with [`Model::repo_access_id`] instead.
    pub user_id: Option<i64>,

    /// Legacy team-based access grant.
    pub repo_access_id: Option<i64>,

    /// GitHub identifier of the student repository.
    pub github_repo_id: i64,

    pub created_at: TimeDateTime,
    pub updated_at: TimeDateTime,
}

/// Assignment repository model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::repo_access::Entity",
        from = "Column::RepoAccessId",
        to = "super::repo_access::Column::Id"
    )]
    RepoAccess,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::repo_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepoAccess.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Attribute validation failure.
#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display(fmt = "{}: {}", field, message)]
pub struct ValidationError {
    /// Name of the invalid attribute.
    pub field: &'static str,

    /// Human-readable error message.
    pub message: &'static str,
}

/// Errors that may occur while working with assignment repositories.
#[derive(Debug, Display, From, Error)]
pub enum AssignmentRepoError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Record did not pass validation.
    Validation(ValidationError),

    /// Referenced assignment does not exist.
    #[display(fmt = "assignment not found")]
    AssignmentNotFound,
}

/// Snapshot of an assignment repository stored in the search index.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AssignmentRepoDocument {
    pub id: i64,
    pub assignment_id: i64,
    pub user_id: Option<i64>,
    pub repo_access_id: Option<i64>,
    pub github_repo_id: i64,
}

impl From<&Model> for AssignmentRepoDocument {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id,
            assignment_id: model.assignment_id,
            user_id: model.user_id,
            repo_access_id: model.repo_access_id,
            github_repo_id: model.github_repo_id,
        }
    }
}

/// Repository hosted on GitHub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GitHubRepository {
    id: i64,
}

impl GitHubRepository {
    /// GitHub repository identifier.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Fetch the repository default branch name.
    pub async fn default_branch(&self, client: &dyn GitHubClient) -> Result<String, GitHubError> {
        Ok(client.repository(self.id).await?.default_branch)
    }

    /// Fetch commits of the repository default branch.
    pub async fn commits(&self, client: &dyn GitHubClient) -> Result<Vec<Commit>, GitHubError> {
        let branch = self.default_branch(client).await?;

        client.commits(self.id, &branch).await
    }
}

impl Model {
    /// Get the assignment this repository was created for.
    pub async fn assignment<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<assignment::Model, AssignmentRepoError> {
        self.find_related(assignment::Entity)
            .one(db)
            .await?
            .ok_or(AssignmentRepoError::AssignmentNotFound)
    }

    /// Get the legacy access grant, if any.
    pub async fn repo_access<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<repo_access::Model>, DbErr> {
        match self.repo_access_id {
            Some(id) => repo_access::Entity::find_by_id(id).one(db).await,
            None => Ok(None),
        }
    }

    /// Resolve the repository owner.
    ///
    /// The directly assigned user takes precedence; records without one fall
    /// back to the user of the legacy access grant. `None` is returned when
    /// neither is available.
    pub async fn effective_user<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<user::Model>, DbErr> {
        resolve_user(db, self.user_id, self.repo_access_id).await
    }

    /// Get the user that created the assignment.
    pub async fn creator<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<user::Model>, AssignmentRepoError> {
        Ok(self.assignment(db).await?.creator(db).await?)
    }

    /// Get the GitHub identifier of the assignment starter code repository.
    pub async fn starter_code_repo_id<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<i64>, AssignmentRepoError> {
        Ok(self.assignment(db).await?.starter_code_repo_id)
    }

    /// Get GitHub account reference of the repository owner.
    pub async fn github_user<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<GitHubUser>, DbErr> {
        Ok(self
            .effective_user(db)
            .await?
            .map(|user| user.github_user()))
    }

    /// Get GitHub team identifier of the legacy access grant.
    pub async fn github_team_id<C: ConnectionTrait>(&self, db: &C) -> Result<Option<i64>, DbErr> {
        Ok(self
            .repo_access(db)
            .await?
            .and_then(|access| access.github_team_id))
    }

    /// Get the organization of the assignment.
    ///
    /// Unlike regular organization lookups, soft-deleted organizations
    /// are returned too, so that their repositories can still be cleaned up.
    pub async fn organization<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<organization::Model>, DbErr> {
        organization::Entity::find()
            .inner_join(assignment::Entity)
            .filter(assignment::Column::Id.eq(self.assignment_id))
            .one(db)
            .await
    }

    /// Get the repository hosted on GitHub.
    pub fn github_repository(&self) -> GitHubRepository {
        GitHubRepository {
            id: self.github_repo_id,
        }
    }

    /// Fetch the default branch name of the hosted repository.
    pub async fn default_branch(&self, client: &dyn GitHubClient) -> Result<String, GitHubError> {
        self.github_repository().default_branch(client).await
    }

    /// Fetch commits of the hosted repository.
    pub async fn commits(&self, client: &dyn GitHubClient) -> Result<Vec<Commit>, GitHubError> {
        self.github_repository().commits(client).await
    }

    /// Attempt to delete the hosted repository.
    ///
    /// Any GitHub error is logged and dropped: the repository may already be
    /// gone or the organization may have revoked access. Only database errors
    /// are returned.
    pub async fn cleanup_github_repository<C: ConnectionTrait>(
        &self,
        db: &C,
        client: &dyn GitHubClient,
    ) -> Result<(), DbErr> {
        let Some(organization) = self.organization(db).await? else {
            info!(
                assignment_repo = self.id,
                "organization is missing, skipping repository cleanup"
            );
            return Ok(());
        };

        if let Err(err) = organization
            .github_organization(client)
            .delete_repository(self.github_repository().id())
            .await
        {
            warn!(
                assignment_repo = self.id,
                repo_id = self.github_repo_id,
                %err,
                "unable to delete GitHub repository"
            );
        }

        Ok(())
    }
}

/// Resolve the effective user from a direct user reference and a legacy access grant.
async fn resolve_user<C: ConnectionTrait>(
    db: &C,
    user_id: Option<i64>,
    repo_access_id: Option<i64>,
) -> Result<Option<user::Model>, DbErr> {
    if let Some(user_id) = user_id {
        if let Some(user) = user::Entity::find_by_id(user_id).one(db).await? {
            return Ok(Some(user));
        }
    }

    let Some(repo_access_id) = repo_access_id else {
        return Ok(None);
    };

    match repo_access::Entity::find_by_id(repo_access_id).one(db).await? {
        Some(access) => access.user(db).await,
        None => Ok(None),
    }
}

/// Extract an attribute value, if it was provided.
fn value<V: Into<Value> + Clone>(value: &ActiveValue<V>) -> Option<V> {
    match value {
        ActiveValue::Set(value) | ActiveValue::Unchanged(value) => Some(value.clone()),
        ActiveValue::NotSet => None,
    }
}

/// Validate an assignment repository before saving it.
///
/// Records loaded from the database (with an unchanged primary key) are
/// treated as persisted and skip the uniqueness check.
pub async fn validate<C: ConnectionTrait + Send>(
    db: &C,
    model: &ActiveModel,
) -> Result<(), AssignmentRepoError> {
    let persisted = matches!(model.id, ActiveValue::Unchanged(_));

    validate_with(db, model, persisted).await
}

async fn validate_with<C: ConnectionTrait + Send>(
    db: &C,
    model: &ActiveModel,
    persisted: bool,
) -> Result<(), AssignmentRepoError> {
    let assignment_id = match value(&model.assignment_id) {
        Some(id) => assignment::Entity::find_by_id(id)
            .select_only()
            .exists(db)
            .await?
            .then_some(id),
        None => None,
    };

    let Some(assignment_id) = assignment_id else {
        return Err(ValidationError {
            field: "assignment",
            message: BLANK_MESSAGE,
        }
        .into());
    };

    // Uniqueness is only enforced for new records, since duplicates
    // created before this rule existed must remain editable.
    if persisted {
        return Ok(());
    }

    let user = resolve_user(
        db,
        value(&model.user_id).flatten(),
        value(&model.repo_access_id).flatten(),
    )
    .await?;

    let user_condition = match user {
        Some(user) => Column::UserId.eq(user.id),
        None => Column::UserId.is_null(),
    };

    let duplicate = Entity::find()
        .filter(Column::AssignmentId.eq(assignment_id))
        .filter(user_condition)
        .select_only()
        .exists(db)
        .await?;

    if duplicate {
        return Err(ValidationError {
            field: "assignment",
            message: UNIQUENESS_MESSAGE,
        }
        .into());
    }

    Ok(())
}

/// Push the current record state to the search index.
async fn update_index(index: &dyn SearchIndex, model: &Model) {
    match serde_json::to_value(AssignmentRepoDocument::from(model)) {
        Ok(document) => index.index(INDEX_NAME, model.id, document).await,
        Err(err) => warn!(assignment_repo = model.id, %err, "unable to serialize index document"),
    }
}

/// Create new assignment repository.
///
/// The uniqueness check and the insertion share a transaction, but are not
/// atomic: concurrent creations for the same user and assignment may both
/// succeed.
pub async fn create<C: TransactionTrait>(
    db: &C,
    index: &dyn SearchIndex,
    model: ActiveModel,
) -> Result<Model, AssignmentRepoError> {
    let model = db
        .transaction(|txn| {
            Box::pin(async move {
                let timestamp = now();

                let model = ActiveModel {
                    id: ActiveValue::NotSet,
                    created_at: ActiveValue::Set(timestamp),
                    updated_at: ActiveValue::Set(timestamp),
                    ..model
                };

                validate_with(txn, &model, false).await?;

                let model = Entity::insert(model).exec_with_returning(txn).await?;

                Ok::<_, AssignmentRepoError>(model)
            })
        })
        .await
        .into_raw_result()?;

    info!(assignment_repo = model.id, "assignment repository created");

    update_index(index, &model).await;

    Ok(model)
}

/// Update an existing assignment repository.
///
/// Attributes that are not set keep their stored values.
pub async fn update<C: ConnectionTrait + Send>(
    db: &C,
    index: &dyn SearchIndex,
    mut model: ActiveModel,
) -> Result<Model, AssignmentRepoError> {
    // Partial updates keep the stored assignment.
    if matches!(model.assignment_id, ActiveValue::NotSet) {
        if let Some(id) = value(&model.id) {
            if let Some(stored) = Entity::find_by_id(id).one(db).await? {
                model.assignment_id = ActiveValue::Unchanged(stored.assignment_id);
            }
        }
    }

    validate_with(db, &model, true).await?;

    model.updated_at = ActiveValue::Set(now());

    let model = model.update(db).await?;

    update_index(index, &model).await;

    Ok(model)
}

/// Destroy an assignment repository.
///
/// The hosted repository is deleted on a best-effort basis first; the local
/// record is removed regardless of the outcome.
pub async fn destroy<C: ConnectionTrait>(
    db: &C,
    client: &dyn GitHubClient,
    index: &dyn SearchIndex,
    model: Model,
) -> Result<(), DbErr> {
    model.cleanup_github_repository(db, client).await?;

    Entity::delete_by_id(model.id).exec(db).await?;

    info!(assignment_repo = model.id, "assignment repository destroyed");

    index.remove(INDEX_NAME, model.id).await;

    Ok(())
}

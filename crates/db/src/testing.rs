use std::sync::Mutex;

use async_trait::async_trait;
use common::github::{Commit, CommitDetails, GitHubClient, GitHubError, Repository, User};
use sea_orm::{
    ActiveValue, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Statement,
};
use serde_json::Value;

use crate::{
    assignment, assignment_repo, now, organization, repo_access,
    search::{IndexUpdate, SearchIndex},
    user,
};

pub(crate) async fn create_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("unable to create test database");

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(organization::Entity),
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(assignment::Entity),
        schema.create_table_from_entity(repo_access::Entity),
        schema.create_table_from_entity(assignment_repo::Entity),
    ];

    for table in tables {
        db.execute(backend.build(&table))
            .await
            .expect("unable to create table");
    }

    db
}

/// Allow dangling references, which is otherwise prevented by SQLite.
pub(crate) async fn disable_foreign_keys(db: &DatabaseConnection) {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        String::from("PRAGMA foreign_keys = OFF"),
    ))
    .await
    .expect("unable to disable foreign keys");
}

pub(crate) async fn create_organization(
    db: &DatabaseConnection,
    deleted: bool,
) -> organization::Model {
    organization::Entity::insert(organization::ActiveModel {
        github_id: ActiveValue::Set(1),
        title: ActiveValue::Set(String::from("Classroom")),
        deleted_at: ActiveValue::Set(deleted.then(now)),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create organization")
}

pub(crate) async fn create_user(db: &DatabaseConnection, uid: i64) -> user::Model {
    user::Entity::insert(user::ActiveModel {
        uid: ActiveValue::Set(uid),
        created_at: ActiveValue::Set(now()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create user")
}

pub(crate) async fn create_assignment(
    db: &DatabaseConnection,
    organization_id: i64,
    creator_id: i64,
) -> assignment::Model {
    assignment::Entity::insert(assignment::ActiveModel {
        organization_id: ActiveValue::Set(organization_id),
        creator_id: ActiveValue::Set(creator_id),
        title: ActiveValue::Set(String::from("Homework")),
        starter_code_repo_id: ActiveValue::Set(Some(300)),
        created_at: ActiveValue::Set(now()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create assignment")
}

pub(crate) async fn create_repo_access(
    db: &DatabaseConnection,
    user_id: i64,
    organization_id: i64,
    github_team_id: Option<i64>,
) -> repo_access::Model {
    repo_access::Entity::insert(repo_access::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        organization_id: ActiveValue::Set(organization_id),
        github_team_id: ActiveValue::Set(github_team_id),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create repo access")
}

/// Insert an assignment repository directly, bypassing validations.
pub(crate) async fn insert_assignment_repo(
    db: &DatabaseConnection,
    assignment_id: i64,
    user_id: Option<i64>,
    repo_access_id: Option<i64>,
) -> assignment_repo::Model {
    let timestamp = now();

    assignment_repo::Entity::insert(assignment_repo::ActiveModel {
        assignment_id: ActiveValue::Set(assignment_id),
        user_id: ActiveValue::Set(user_id),
        repo_access_id: ActiveValue::Set(repo_access_id),
        github_repo_id: ActiveValue::Set(2000 + assignment_id),
        created_at: ActiveValue::Set(timestamp),
        updated_at: ActiveValue::Set(timestamp),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create assignment repository")
}

/// GitHub client which keeps track of deleted repositories.
#[derive(Default)]
pub(crate) struct MockGitHub {
    repositories: Vec<Repository>,
    fail: bool,
    deleted: Mutex<Vec<i64>>,
}

impl MockGitHub {
    pub(crate) fn with_repository(id: i64, default_branch: &str) -> Self {
        Self {
            repositories: vec![Repository {
                id,
                full_name: format!("classroom/repo-{id}"),
                default_branch: String::from(default_branch),
            }],
            ..Default::default()
        }
    }

    /// Client which rejects every repository deletion.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn deleted(&self) -> Vec<i64> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitHubClient for MockGitHub {
    async fn delete_repository(&self, repo_id: i64) -> Result<(), GitHubError> {
        self.deleted.lock().unwrap().push(repo_id);

        if self.fail {
            Err(GitHubError::UnexpectedStatus(403))
        } else {
            Ok(())
        }
    }

    async fn repository(&self, repo_id: i64) -> Result<Repository, GitHubError> {
        self.repositories
            .iter()
            .find(|repository| repository.id == repo_id)
            .cloned()
            .ok_or(GitHubError::NotFound)
    }

    async fn commits(&self, repo_id: i64, branch: &str) -> Result<Vec<Commit>, GitHubError> {
        self.repository(repo_id).await?;

        Ok(vec![Commit {
            sha: String::from("3a4b5c"),
            commit: CommitDetails {
                message: format!("Initial commit on {branch}"),
                author: None,
            },
        }])
    }

    async fn user(&self, uid: i64) -> Result<User, GitHubError> {
        Ok(User {
            id: uid,
            login: format!("user{uid}"),
        })
    }
}

/// Search index which records every update.
#[derive(Default)]
pub(crate) struct RecordingIndex {
    updates: Mutex<Vec<IndexUpdate>>,
}

impl RecordingIndex {
    pub(crate) fn updates(&self) -> Vec<IndexUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn index(&self, name: &'static str, id: i64, document: Value) {
        self.updates.lock().unwrap().push(IndexUpdate::Upsert {
            index: name,
            id,
            document,
        });
    }

    async fn remove(&self, name: &'static str, id: i64) {
        self.updates
            .lock()
            .unwrap()
            .push(IndexUpdate::Remove { index: name, id });
    }
}

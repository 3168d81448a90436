pub use sea_orm_migration::prelude::*;

mod m20230901_000001_create_organizations_table;
mod m20230901_000002_create_users_table;
mod m20230901_000003_create_assignments_table;
mod m20230901_000004_create_repo_accesses_table;
mod m20230901_000005_create_assignment_repos_table;

pub(crate) use m20230901_000001_create_organizations_table::Organizations;
pub(crate) use m20230901_000002_create_users_table::Users;
pub(crate) use m20230901_000003_create_assignments_table::Assignments;
pub(crate) use m20230901_000004_create_repo_accesses_table::RepoAccesses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230901_000001_create_organizations_table::Migration),
            Box::new(m20230901_000002_create_users_table::Migration),
            Box::new(m20230901_000003_create_assignments_table::Migration),
            Box::new(m20230901_000004_create_repo_accesses_table::Migration),
            Box::new(m20230901_000005_create_assignment_repos_table::Migration),
        ]
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssignmentRepos::Table)
                    .col(
                        ColumnDef::new(AssignmentRepos::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssignmentRepos::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentRepos::UserId).big_integer())
                    .col(ColumnDef::new(AssignmentRepos::RepoAccessId).big_integer())
                    .col(
                        ColumnDef::new(AssignmentRepos::GithubRepoId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentRepos::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(AssignmentRepos::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentRepos::Table, AssignmentRepos::AssignmentId)
                            .to(crate::Assignments::Table, crate::Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentRepos::Table, AssignmentRepos::UserId)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentRepos::Table, AssignmentRepos::RepoAccessId)
                            .to(crate::RepoAccesses::Table, crate::RepoAccesses::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: older records may contain duplicate pairs.
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_repos_assignment_id_user_id")
                    .table(AssignmentRepos::Table)
                    .col(AssignmentRepos::AssignmentId)
                    .col(AssignmentRepos::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssignmentRepos::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum AssignmentRepos {
    Table,
    Id,
    AssignmentId,
    UserId,
    RepoAccessId,
    GithubRepoId,
    CreatedAt,
    UpdatedAt,
}

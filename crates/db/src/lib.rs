pub mod assignment;
pub mod assignment_repo;
pub mod organization;
pub mod repo_access;
pub mod search;
pub mod user;

#[cfg(test)]
mod testing;

use std::error::Error;

use async_trait::async_trait;
pub use common::github;
pub use sea_orm::{
    sea_query, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, Database,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, StatementBuilder, TransactionError, TransactionTrait,
};
pub use time::{OffsetDateTime, PrimitiveDateTime};

pub trait TransactionErrorExt<T, E> {
    /// Convert transaction [`Result`] into a [`Result`] with
    /// a custom error.
    fn into_raw_result(self) -> Result<T, E>;
}

impl<T, E> TransactionErrorExt<T, E> for Result<T, TransactionError<E>>
where
    E: Error + From<DbErr>,
{
    fn into_raw_result(self) -> Result<T, E> {
        match self {
            Ok(val) => Ok(val),
            Err(TransactionError::Connection(err)) => Err(err.into()),
            Err(TransactionError::Transaction(err)) => Err(err),
        }
    }
}

#[async_trait]
pub trait SelectExt {
    /// Check if at least one record that satisfies a query.
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr>;
}

#[async_trait]
impl<T> SelectExt for T
where
    T: QueryTrait<QueryStatement = sea_query::SelectStatement> + Send,
{
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr> {
        use sea_query::{Expr, Query};

        let mut query = self.into_query();

        // SQLite rejects subqueries with an empty column list.
        query.expr(1);

        let stmt = StatementBuilder::build(
            Query::select().expr(Expr::exists(query)),
            &db.get_database_backend(),
        );

        db.query_one(stmt)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(String::from("empty EXISTS query result")))?
            .try_get_by_index(0)
    }
}

/// Current UTC time without the offset, as stored in timestamp columns.
pub(crate) fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();

    PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, QuerySelect};

    use crate::{
        organization,
        testing::{create_database, create_organization},
        SelectExt,
    };

    #[tokio::test]
    async fn exists() {
        let db = create_database().await;

        let exists = organization::Entity::find()
            .select_only()
            .exists(&db)
            .await
            .unwrap();

        assert!(!exists);

        create_organization(&db, true).await;

        let exists = organization::Entity::find()
            .select_only()
            .exists(&db)
            .await
            .unwrap();

        assert!(exists);

        let exists = organization::Entity::find_active()
            .select_only()
            .exists(&db)
            .await
            .unwrap();

        assert!(!exists);
    }
}

use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{DbConn, DbErr, EntityTrait, PrimaryKeyTrait, RuntimeErr, sqlx};

use quill_core::error::RepoError;
use quill_core::ports::BaseRepository;

/// Map a SeaORM error onto the repository error, keeping the SQLSTATE code
/// when the driver reported one.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    if let Some(code) = sqlstate(&err) {
        return RepoError::Database {
            code,
            message: err.to_string(),
        };
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))) => {
            db_err.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Delete one row by primary key; `false` when nothing matched.
    pub(crate) async fn delete_by_id<ID>(&self, id: ID) -> Result<bool, RepoError>
    where
        E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: Sync + Send,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Clone + 'static,
    T: From<E::Model> + Send + Sync + 'static,
{
    async fn find_all(&self) -> Result<Vec<T>, RepoError> {
        let rows = E::find().all(&self.db).await.map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

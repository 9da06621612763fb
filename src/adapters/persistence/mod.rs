use sqlx::PgPool;

use crate::app_error::AppError;

pub mod allowlist;
pub mod registration;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::AlreadyExists(
                    db_err
                        .constraint()
                        .map(|c| format!("record violates {c}"))
                        .unwrap_or_else(|| "record already exists".into()),
                )
            }
            _ => {
                // Log the actual error, don't expose details
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}

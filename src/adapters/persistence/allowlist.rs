use sqlx::{PgPool, Row};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::registration::AllowlistBlock,
};

fn row_to_block(row: sqlx::postgres::PgRow) -> AllowlistBlock {
    AllowlistBlock {
        ip_block: row.get("ip_block"),
        org_id: row.get("org_id"),
        created_at: row.get("created_at"),
    }
}

pub(super) async fn insert(pool: &PgPool, block: &AllowlistBlock) -> AppResult<()> {
    sqlx::query("INSERT INTO allowlist (ip_block, org_id) VALUES ($1, $2)")
        .bind(&block.ip_block)
        .bind(&block.org_id)
        .execute(pool)
        .await
        .map_err(AppError::from)?;

    Ok(())
}

pub(super) async fn remove(pool: &PgPool, block: &AllowlistBlock) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM allowlist WHERE ip_block = $1 AND org_id = $2")
        .bind(&block.ip_block)
        .bind(&block.org_id)
        .execute(pool)
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "address {} is not allowlisted",
            block.ip_block
        )));
    }
    Ok(())
}

pub(super) async fn list(pool: &PgPool, org_id: &str) -> AppResult<Vec<AllowlistBlock>> {
    let rows = sqlx::query(
        r#"
        SELECT org_id, ip_block, created_at
        FROM allowlist
        WHERE org_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)?;

    Ok(rows.into_iter().map(row_to_block).collect())
}

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::registration::{RegistrationStore, ip_in_blocks},
    domain::entities::registration::{
        AllowlistBlock, NewRegistration, Registration, RegistrationUpdate, SYSTEM_ORG_ID,
    },
};

const REGISTRATION_COLUMNS: &str = "id, org_id, username, uid, display_name, extra, created_at";

fn row_to_registration(row: sqlx::postgres::PgRow) -> Registration {
    let extra: Option<serde_json::Value> = row.get("extra");
    Registration {
        id: row.get("id"),
        org_id: row.get("org_id"),
        username: row.get("username"),
        uid: row.get("uid"),
        display_name: row.get("display_name"),
        extra: extra.and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }),
        created_at: row.get("created_at"),
    }
}

fn not_found(org_id: &str, uid: &str) -> AppError {
    AppError::NotFound(format!("registration {uid} not found for org {org_id}"))
}

#[async_trait]
impl RegistrationStore for PostgresPersistence {
    async fn all(
        &self,
        org_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Registration>, i64)> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE org_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM registrations WHERE org_id = $1")
            .bind(org_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok((rows.into_iter().map(row_to_registration).collect(), count))
    }

    async fn find(&self, org_id: &str, uid: &str) -> AppResult<Registration> {
        let row = sqlx::query(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE org_id = $1 AND uid = $2 LIMIT 1"
        ))
        .bind(org_id)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.map(row_to_registration)
            .ok_or_else(|| not_found(org_id, uid))
    }

    async fn find_by_uid(&self, uid: &str) -> AppResult<Registration> {
        let row = sqlx::query(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE uid = $1 LIMIT 1"
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.map(row_to_registration)
            .ok_or_else(|| AppError::NotFound(format!("registration {uid} not found")))
    }

    async fn create(&self, registration: &NewRegistration) -> AppResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO registrations (org_id, username, uid, display_name, extra)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&registration.org_id)
        .bind(&registration.username)
        .bind(&registration.uid)
        .bind(&registration.display_name)
        .bind(registration.extra.clone().map(serde_json::Value::Object))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(id)
    }

    async fn update(
        &self,
        registration: &Registration,
        update: &RegistrationUpdate,
    ) -> AppResult<()> {
        sqlx::query("UPDATE registrations SET extra = $1 WHERE org_id = $2 AND uid = $3")
            .bind(update.extra.clone().map(serde_json::Value::Object))
            .bind(&registration.org_id)
            .bind(&registration.uid)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    async fn delete(&self, org_id: &str, uid: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM registrations WHERE org_id = $1 AND uid = $2")
            .bind(org_id)
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() != 1 {
            return Err(not_found(org_id, uid));
        }
        Ok(())
    }

    async fn allowed_ip(&self, ip: &str, org_id: &str) -> AppResult<bool> {
        let blocks: Vec<String> =
            sqlx::query_scalar("SELECT ip_block FROM allowlist WHERE org_id = $1 OR org_id = $2")
                .bind(org_id)
                .bind(SYSTEM_ORG_ID)
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::from)?;

        ip_in_blocks(ip, blocks.iter().map(String::as_str))
    }

    async fn allow_address(&self, block: &AllowlistBlock) -> AppResult<()> {
        super::allowlist::insert(&self.pool, block).await
    }

    async fn deny_address(&self, block: &AllowlistBlock) -> AppResult<()> {
        super::allowlist::remove(&self.pool, block).await
    }

    async fn allowed_addresses(&self, org_id: &str) -> AppResult<Vec<AllowlistBlock>> {
        super::allowlist::list(&self.pool, org_id).await
    }
}

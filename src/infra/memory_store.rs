//! Process-local registration store, selected with `STORE_BACKEND=memory`.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::registration::{RegistrationStore, ip_in_blocks},
    domain::entities::registration::{
        AllowlistBlock, NewRegistration, Registration, RegistrationUpdate, SYSTEM_ORG_ID,
    },
};

#[derive(Default)]
pub struct InMemoryRegistrationStore {
    registrations: Mutex<Vec<Registration>>,
    allowlist: Mutex<Vec<AllowlistBlock>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned<T>(_: T) -> AppError {
    AppError::Internal("in-memory store lock poisoned".into())
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn all(
        &self,
        org_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Registration>, i64)> {
        let registrations = self.registrations.lock().map_err(lock_poisoned)?;

        let mut org: Vec<&Registration> =
            registrations.iter().filter(|r| r.org_id == org_id).collect();
        org.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = org.len() as i64;
        let page = org
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn find(&self, org_id: &str, uid: &str) -> AppResult<Registration> {
        self.registrations
            .lock()
            .map_err(lock_poisoned)?
            .iter()
            .find(|r| r.org_id == org_id && r.uid == uid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("registration {uid} not found for org {org_id}")))
    }

    async fn find_by_uid(&self, uid: &str) -> AppResult<Registration> {
        self.registrations
            .lock()
            .map_err(lock_poisoned)?
            .iter()
            .find(|r| r.uid == uid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("registration {uid} not found")))
    }

    async fn create(&self, registration: &NewRegistration) -> AppResult<Uuid> {
        let mut registrations = self.registrations.lock().map_err(lock_poisoned)?;

        if registrations.iter().any(|r| r.uid == registration.uid) {
            return Err(AppError::AlreadyExists(format!(
                "uid {} is already registered",
                registration.uid
            )));
        }
        if registrations
            .iter()
            .any(|r| r.org_id == registration.org_id && r.display_name == registration.display_name)
        {
            return Err(AppError::AlreadyExists(format!(
                "display name {} is already used in this org",
                registration.display_name
            )));
        }

        let id = Uuid::new_v4();
        registrations.push(Registration {
            id,
            org_id: registration.org_id.clone(),
            username: registration.username.clone(),
            uid: registration.uid.clone(),
            display_name: registration.display_name.clone(),
            extra: registration.extra.clone(),
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn update(
        &self,
        registration: &Registration,
        update: &RegistrationUpdate,
    ) -> AppResult<()> {
        let mut registrations = self.registrations.lock().map_err(lock_poisoned)?;
        if let Some(existing) = registrations
            .iter_mut()
            .find(|r| r.org_id == registration.org_id && r.uid == registration.uid)
        {
            existing.extra = update.extra.clone();
        }
        Ok(())
    }

    async fn delete(&self, org_id: &str, uid: &str) -> AppResult<()> {
        let mut registrations = self.registrations.lock().map_err(lock_poisoned)?;
        let before = registrations.len();
        registrations.retain(|r| !(r.org_id == org_id && r.uid == uid));

        if registrations.len() == before {
            return Err(AppError::NotFound(format!(
                "registration {uid} not found for org {org_id}"
            )));
        }
        Ok(())
    }

    async fn allowed_ip(&self, ip: &str, org_id: &str) -> AppResult<bool> {
        let allowlist = self.allowlist.lock().map_err(lock_poisoned)?;
        ip_in_blocks(
            ip,
            allowlist
                .iter()
                .filter(|b| b.org_id == org_id || b.org_id == SYSTEM_ORG_ID)
                .map(|b| b.ip_block.as_str()),
        )
    }

    async fn allow_address(&self, block: &AllowlistBlock) -> AppResult<()> {
        let mut allowlist = self.allowlist.lock().map_err(lock_poisoned)?;
        if allowlist
            .iter()
            .any(|b| b.ip_block == block.ip_block && b.org_id == block.org_id)
        {
            return Err(AppError::AlreadyExists(format!(
                "address {} is already allowlisted",
                block.ip_block
            )));
        }

        allowlist.push(AllowlistBlock {
            created_at: Some(Utc::now()),
            ..block.clone()
        });
        Ok(())
    }

    async fn deny_address(&self, block: &AllowlistBlock) -> AppResult<()> {
        let mut allowlist = self.allowlist.lock().map_err(lock_poisoned)?;
        let before = allowlist.len();
        allowlist.retain(|b| !(b.ip_block == block.ip_block && b.org_id == block.org_id));

        if allowlist.len() == before {
            return Err(AppError::NotFound(format!(
                "address {} is not allowlisted",
                block.ip_block
            )));
        }
        Ok(())
    }

    async fn allowed_addresses(&self, org_id: &str) -> AppResult<Vec<AllowlistBlock>> {
        Ok(self
            .allowlist
            .lock()
            .map_err(lock_poisoned)?
            .iter()
            .filter(|b| b.org_id == org_id)
            .cloned()
            .collect())
    }
}

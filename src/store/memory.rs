//! Process-local store, used when no `DATABASE_URL` is configured and by the
//! tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdminStore, RecordStore, StoreError};
use crate::models::admin::Admin;
use crate::models::employee::{EmployeeRecord, NewEmployeeRecord};

#[derive(Default)]
pub struct MemoryStore {
    employees: RwLock<HashMap<Uuid, EmployeeRecord>>,
    admins: RwLock<Vec<Admin>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: NewEmployeeRecord) -> Result<EmployeeRecord, StoreError> {
        // Check and insert under one write lock so concurrent creates of the
        // same number cannot both succeed.
        let mut employees = self.employees.write().await;
        if employees
            .values()
            .any(|existing| existing.employee_number == record.employee_number)
        {
            return Err(StoreError::Duplicate("employee_number".to_string()));
        }

        let now = Utc::now();
        let stored = EmployeeRecord {
            record_id: Uuid::new_v4(),
            employee_number: record.employee_number,
            name: record.name,
            role: record.role,
            date_of_joining: record.date_of_joining,
            blood_group: record.blood_group,
            photo_reference: record.photo_reference,
            created_at: now,
            updated_at: now,
        };
        employees.insert(stored.record_id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &EmployeeRecord) -> Result<Option<EmployeeRecord>, StoreError> {
        let mut employees = self.employees.write().await;
        if employees.values().any(|existing| {
            existing.record_id != record.record_id
                && existing.employee_number == record.employee_number
        }) {
            return Err(StoreError::Duplicate("employee_number".to_string()));
        }

        let Some(existing) = employees.get_mut(&record.record_id) else {
            return Ok(None);
        };
        existing.employee_number = record.employee_number.clone();
        existing.name = record.name.clone();
        existing.role = record.role.clone();
        existing.date_of_joining = record.date_of_joining;
        existing.blood_group = record.blood_group;
        existing.photo_reference = record.photo_reference.clone();
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, record_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.employees.write().await.remove(&record_id).is_some())
    }

    async fn find_by_id(&self, record_id: Uuid) -> Result<Option<EmployeeRecord>, StoreError> {
        Ok(self.employees.read().await.get(&record_id).cloned())
    }

    async fn find_by_employee_number(
        &self,
        employee_number: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError> {
        Ok(self
            .employees
            .read()
            .await
            .values()
            .find(|record| record.employee_number.as_str() == employee_number)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        Ok(self.employees.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn insert_admin(&self, email: &str, password_hash: &str) -> Result<Admin, StoreError> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|admin| admin.email.eq_ignore_ascii_case(email)) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let admin = Admin {
            admin_id: Uuid::new_v4(),
            email: email.to_string(),
            password: password_hash.to_string(),
            created_at: Utc::now(),
        };
        admins.push(admin.clone());
        Ok(admin)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self
            .admins
            .read()
            .await
            .iter()
            .find(|admin| admin.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

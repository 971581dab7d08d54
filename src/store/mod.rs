//! Persistence seams for employee records and admin accounts.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::admin::Admin;
use crate::models::employee::{EmployeeRecord, NewEmployeeRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("store error: {0}")]
    Backend(String),
}

/// Record store for employees.
///
/// Implementations must enforce uniqueness of `employee_number` atomically
/// on insert and report a violation as [`StoreError::Duplicate`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: NewEmployeeRecord) -> Result<EmployeeRecord, StoreError>;

    /// Overwrites the mutable fields of an existing record. Returns `None` if
    /// the record is gone.
    async fn update(&self, record: &EmployeeRecord) -> Result<Option<EmployeeRecord>, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, record_id: Uuid) -> Result<bool, StoreError>;

    async fn find_by_id(&self, record_id: Uuid) -> Result<Option<EmployeeRecord>, StoreError>;

    /// Exact, case-sensitive match.
    async fn find_by_employee_number(
        &self,
        employee_number: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError>;

    async fn list_all(&self) -> Result<Vec<EmployeeRecord>, StoreError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Emails are unique ignoring case.
    async fn insert_admin(&self, email: &str, password_hash: &str) -> Result<Admin, StoreError>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;
}

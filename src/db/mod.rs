use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::admin::Admin;
use crate::models::employee::{BloodGroup, EmployeeRecord, NewEmployeeRecord};
use crate::services::identifier::EmployeeNumber;
use crate::store::{AdminStore, RecordStore, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");
    Ok(pool)
}

#[derive(sqlx::FromRow, Debug)]
struct EmployeeRow {
    record_id: Uuid,
    employee_number: String,
    name: String,
    role: String,
    date_of_joining: NaiveDate,
    blood_group: Option<String>,
    photo_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for EmployeeRecord {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let employee_number = EmployeeNumber::parse(&row.employee_number)
            .map_err(|err| StoreError::Backend(format!("stored employee number: {}", err)))?;
        let blood_group = row
            .blood_group
            .as_deref()
            .map(str::parse::<BloodGroup>)
            .transpose()
            .map_err(StoreError::Backend)?;

        Ok(EmployeeRecord {
            record_id: row.record_id,
            employee_number,
            name: row.name,
            role: row.role,
            date_of_joining: row.date_of_joining,
            blood_group,
            photo_reference: row.photo_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_sqlx_error(err: sqlx::Error, field: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Duplicate(field.to_string())
        }
        _ => {
            error!("Database error: {:?}", err);
            StoreError::Backend(err.to_string())
        }
    }
}

/// Postgres-backed store. Uniqueness of employee numbers and admin emails is
/// left to the table constraints.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

const EMPLOYEE_COLUMNS: &str = "record_id, employee_number, name, role, date_of_joining, blood_group, photo_reference, created_at, updated_at";

#[async_trait]
impl RecordStore for PgStore {
    async fn insert(&self, record: NewEmployeeRecord) -> Result<EmployeeRecord, StoreError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO employees ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {}",
            EMPLOYEE_COLUMNS, EMPLOYEE_COLUMNS
        );

        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(record.employee_number.as_str())
            .bind(&record.name)
            .bind(&record.role)
            .bind(record.date_of_joining)
            .bind(record.blood_group.map(|g| g.as_str()))
            .bind(&record.photo_reference)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(err, "employee_number"))?;

        row.try_into()
    }

    async fn update(&self, record: &EmployeeRecord) -> Result<Option<EmployeeRecord>, StoreError> {
        let sql = format!(
            "UPDATE employees SET employee_number = $2, name = $3, role = $4, date_of_joining = $5, \
             blood_group = $6, photo_reference = $7, updated_at = $8 \
             WHERE record_id = $1 RETURNING {}",
            EMPLOYEE_COLUMNS
        );

        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(record.record_id)
            .bind(record.employee_number.as_str())
            .bind(&record.name)
            .bind(&record.role)
            .bind(record.date_of_joining)
            .bind(record.blood_group.map(|g| g.as_str()))
            .bind(&record.photo_reference)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(err, "employee_number"))?;

        row.map(EmployeeRecord::try_from).transpose()
    }

    async fn delete(&self, record_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM employees WHERE record_id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(err, "record_id"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, record_id: Uuid) -> Result<Option<EmployeeRecord>, StoreError> {
        let sql = format!("SELECT {} FROM employees WHERE record_id = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(err, "record_id"))?
            .map(EmployeeRecord::try_from)
            .transpose()
    }

    async fn find_by_employee_number(
        &self,
        employee_number: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError> {
        let sql = format!("SELECT {} FROM employees WHERE employee_number = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(employee_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(err, "employee_number"))?
            .map(EmployeeRecord::try_from)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        let sql = format!("SELECT {} FROM employees ORDER BY created_at DESC", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(err, "employees"))?
            .into_iter()
            .map(EmployeeRecord::try_from)
            .collect()
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn insert_admin(&self, email: &str, password_hash: &str) -> Result<Admin, StoreError> {
        sqlx::query_as::<_, Admin>(
            "INSERT INTO admins (admin_id, email, password, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING admin_id, email, password, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_sqlx_error(err, "email"))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        sqlx::query_as::<_, Admin>(
            "SELECT admin_id, email, password, created_at FROM admins WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_error(err, "email"))
    }
}

use uuid::Uuid;
use chrono::Utc;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Admin {
    pub admin_id: Uuid,
    pub email: String,
    pub password: String,
    pub created_at: chrono::DateTime<Utc>,
}

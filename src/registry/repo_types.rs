use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const ACTIVE_STATUS: &str = "active";

/// Row of the shared tenant registry.
#[derive(Debug, Clone, FromRow)]
pub struct TenantRecord {
    pub id: Uuid,
    pub schema_name: String, // namespace holding the tenant's tables
}

/// Authoritative user row, joined with the schema of its tenant.
#[derive(Debug, Clone, FromRow)]
pub struct RegistryUser {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub username: String, // unique within a tenant
    pub password_hash: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
    pub schema_name: String,
}

impl RegistryUser {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

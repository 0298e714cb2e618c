use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which registry rows are candidates for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    ActiveOnly,
    Any,
}

/// Columns copied from the registry into a tenant schema.
///
/// Update columns are always a subset of the insert columns of the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSet {
    Credential,
    All,
}

impl FieldSet {
    pub fn insert_columns(self) -> &'static [&'static str] {
        match self {
            FieldSet::Credential => &["username", "password_hash", "status", "created_at"],
            FieldSet::All => &[
                "username",
                "password_hash",
                "full_name",
                "email",
                "role",
                "status",
                "created_at",
                "last_login",
            ],
        }
    }

    pub fn update_columns(self) -> &'static [&'static str] {
        match self {
            FieldSet::Credential => &["password_hash"],
            FieldSet::All => &[
                "password_hash",
                "full_name",
                "email",
                "role",
                "status",
                "last_login",
            ],
        }
    }
}

/// What a run is allowed to do for each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub filter: StatusFilter,
    pub create: Option<FieldSet>,
    pub update: Option<FieldSet>,
}

impl Plan {
    pub fn is_read_only(&self) -> bool {
        self.create.is_none() && self.update.is_none()
    }
}

/// The runnable reconciliation jobs. Each one is also a standalone binary
/// with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    CheckUsers,
    SyncTenantUsers,
    MigrateExistingUsers,
    EmergencyPasswordSync,
    ForceSyncPassword,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::CheckUsers,
        Variant::SyncTenantUsers,
        Variant::MigrateExistingUsers,
        Variant::EmergencyPasswordSync,
        Variant::ForceSyncPassword,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::CheckUsers => "check-users",
            Variant::SyncTenantUsers => "sync-tenant-users",
            Variant::MigrateExistingUsers => "migrate-existing-users",
            Variant::EmergencyPasswordSync => "emergency-password-sync",
            Variant::ForceSyncPassword => "force-sync-password",
        }
    }

    pub fn plan(self) -> Plan {
        use FieldSet::*;
        use StatusFilter::*;
        let (filter, create, update) = match self {
            Variant::CheckUsers => (ActiveOnly, None, None),
            Variant::SyncTenantUsers => (ActiveOnly, Some(All), Some(All)),
            Variant::MigrateExistingUsers => (Any, Some(All), Some(All)),
            Variant::EmergencyPasswordSync => (ActiveOnly, Some(Credential), Some(Credential)),
            Variant::ForceSyncPassword => (ActiveOnly, None, Some(Credential)),
        };
        Plan {
            filter,
            create,
            update,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant {0:?}")]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Which registry users a run covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    AllUsers,
    SingleUser(String),
}

impl Scope {
    pub fn from_username(username: Option<String>) -> Self {
        match username {
            Some(name) if !name.trim().is_empty() => Scope::SingleUser(name.trim().to_string()),
            _ => Scope::AllUsers,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Scope::AllUsers => None,
            Scope::SingleUser(name) => Some(name),
        }
    }
}

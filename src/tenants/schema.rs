use std::collections::BTreeSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

/// Table holding tenant-local users inside every tenant schema.
pub const TENANT_USERS_TABLE: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("malformed schema identifier: {0:?}")]
    Malformed(String),
    #[error("schema {0:?} is not registered as a tenant")]
    Unknown(String),
}

pub(crate) fn is_valid_identifier(name: &str) -> bool {
    lazy_static! {
        static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
    }
    IDENT_RE.is_match(name)
        && !name.to_ascii_lowercase().starts_with("pg_")
        && !name.eq_ignore_ascii_case("information_schema")
}

/// A schema name that has been checked and is safe to splice into SQL text.
///
/// Postgres cannot bind identifiers as query parameters, so every statement
/// that addresses a tenant schema builds its table reference through
/// [`TenantSchema::qualify`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TenantSchema(String);

impl TenantSchema {
    pub fn parse(name: &str) -> Result<Self, SchemaError> {
        if is_valid_identifier(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(SchemaError::Malformed(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"schema"."table"`; `table` must be a crate constant.
    pub fn qualify(&self, table: &str) -> String {
        debug_assert!(is_valid_identifier(table));
        format!("\"{}\".\"{}\"", self.0, table)
    }
}

impl fmt::Display for TenantSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Schema names known to the tenant registry at the start of a run.
#[derive(Debug, Clone, Default)]
pub struct SchemaAllowList {
    known: BTreeSet<TenantSchema>,
}

impl SchemaAllowList {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known = BTreeSet::new();
        for name in names {
            match TenantSchema::parse(name.as_ref()) {
                Ok(schema) => {
                    known.insert(schema);
                }
                Err(e) => warn!(error = %e, "skipping tenant with unusable schema name"),
            }
        }
        Self { known }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Result<TenantSchema, SchemaError> {
        let schema = TenantSchema::parse(name)?;
        if self.known.contains(&schema) {
            Ok(schema)
        } else {
            Err(SchemaError::Unknown(name.to_string()))
        }
    }
}

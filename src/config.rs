use anyhow::Context;

use crate::tenants::schema::TenantSchema;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Schema holding the shared `users` and `tenants` tables.
    pub registry_schema: TenantSchema,
    /// Bearer token required by the admin routes; open when unset.
    pub admin_token: Option<String>,
    /// Exit non-zero when any candidate failed.
    pub strict_exit: bool,
    pub host: String,
    pub port: u16,
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS={v:?}"))?,
            None => 5,
        };
        let registry_schema = get("REGISTRY_SCHEMA").unwrap_or_else(|| "public".into());
        let registry_schema =
            TenantSchema::parse(&registry_schema).context("REGISTRY_SCHEMA")?;
        let admin_token = get("ADMIN_TOKEN").filter(|t| !t.is_empty());
        let strict_exit = match get("STRICT_EXIT") {
            Some(v) => parse_bool(&v).with_context(|| format!("STRICT_EXIT={v:?}"))?,
            None => false,
        };
        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match get("APP_PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("APP_PORT={v:?}"))?,
            None => 8080,
        };
        Ok(Self {
            database_url,
            max_connections,
            registry_schema,
            admin_token,
            strict_exit,
            host,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.registry_schema.as_str(), "public");
        assert_eq!(cfg.admin_token, None);
        assert!(!cfg.strict_exit);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn registry_schema_must_be_an_identifier() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("REGISTRY_SCHEMA", "public; drop"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REGISTRY_SCHEMA"));
    }

    #[test]
    fn strict_exit_and_token_are_read() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("STRICT_EXIT", "yes"),
            ("ADMIN_TOKEN", "s3cret"),
        ]))
        .unwrap();
        assert!(cfg.strict_exit);
        assert_eq!(cfg.admin_token.as_deref(), Some("s3cret"));
    }
}

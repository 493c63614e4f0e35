//! Process configuration read from the environment.

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    /// Use Postgres repositories instead of in-memory ones.
    pub use_persistent_stores: bool,
    pub max_connections: u32,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let use_persistent_stores = lookup("USE_PERSISTENT_STORES")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            use_persistent_stores,
            max_connections,
        }
    }

    /// In-memory configuration for tests and local runs.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: jwt_secret.into(),
            database_url: None,
            use_persistent_stores: false,
            max_connections: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ApiConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.database_url, None);
        assert!(!cfg.use_persistent_stores);
    }

    #[test]
    fn values_are_read_and_parsed() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/carshop"),
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]);
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/carshop"));
        assert!(cfg.use_persistent_stores);
        assert_eq!(cfg.max_connections, 4);
    }

    #[test]
    fn garbage_flags_fall_back_to_defaults() {
        let cfg = config(&[("USE_PERSISTENT_STORES", "yes please"), ("DATABASE_URL", "")]);
        assert!(!cfg.use_persistent_stores);
        assert_eq!(cfg.database_url, None);
    }
}

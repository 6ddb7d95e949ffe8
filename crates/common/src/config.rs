use anyhow::{Result, anyhow};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub api_addr: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout_secs: u64,
    pub run_migrations: bool,
    pub audit_in_app: bool,
    pub web_dist_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env early so process env reads pick it up.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("DATABASE_URL is required"))?;

        let port = lookup_u64(&lookup, "PORT", 3000);
        if port == 0 || port > u64::from(u16::MAX) {
            return Err(anyhow!("PORT invalid {}", port));
        }
        let api_addr = lookup("API_ADDR").unwrap_or_else(|| format!("0.0.0.0:{}", port));
        api_addr
            .parse::<SocketAddr>()
            .map_err(|_| anyhow!("API_ADDR invalid address {}", api_addr))?;

        let db_max_connections = lookup_u64(&lookup, "DB_MAX_CONNECTIONS", 10).max(1) as u32;
        let db_min_connections =
            (lookup_u64(&lookup, "DB_MIN_CONNECTIONS", 1) as u32).min(db_max_connections);
        let db_connect_timeout_secs = lookup_u64(&lookup, "DB_CONNECT_TIMEOUT_SECS", 10);

        let run_migrations = lookup_bool(&lookup, "RUN_MIGRATIONS", true);
        let audit_in_app = lookup_bool(&lookup, "AUDIT_IN_APP", true);
        let web_dist_dir = lookup("WEB_DIST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("web/dist"));

        Ok(Self {
            database_url,
            api_addr,
            db_max_connections,
            db_min_connections,
            db_connect_timeout_secs,
            run_migrations,
            audit_in_app,
            web_dist_dir,
        })
    }
}

fn lookup_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"),
        None => default,
    }
}

fn lookup_u64<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/inventario")]).unwrap();
        assert_eq!(config.api_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_min_connections, 1);
        assert!(config.run_migrations);
        assert!(config.audit_in_app);
        assert_eq!(config.web_dist_dir, PathBuf::from("web/dist"));
    }

    #[test]
    fn test_database_url_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("DATABASE_URL", "  ")]).is_err());
    }

    #[test]
    fn test_port_and_addr() {
        let config = config_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.api_addr, "0.0.0.0:8080");

        let config = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("PORT", "8080"),
            ("API_ADDR", "127.0.0.1:4000"),
        ])
        .unwrap();
        assert_eq!(config.api_addr, "127.0.0.1:4000");

        assert!(config_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "0")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "70000")]).is_err());
        assert!(
            config_from(&[("DATABASE_URL", "postgres://db"), ("API_ADDR", "localhost")]).is_err()
        );
    }

    #[test]
    fn test_flags_and_pool_bounds() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("AUDIT_IN_APP", "false"),
            ("RUN_MIGRATIONS", "0"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_MIN_CONNECTIONS", "9"),
            ("DB_CONNECT_TIMEOUT_SECS", "nope"),
        ])
        .unwrap();
        assert!(!config.audit_in_app);
        assert!(!config.run_migrations);
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(config.db_min_connections, 4);
        assert_eq!(config.db_connect_timeout_secs, 10);
    }
}

//! Configuration Module
//!
//! Handles loading worker configuration from environment variables.

use std::env;
use std::path::PathBuf;

use url::Url;

/// Static-asset partition prefix.
pub const STATIC_PREFIX: &str = "static";
/// Runtime page partition prefix.
pub const RUNTIME_PREFIX: &str = "runtime";
/// API response partition prefix.
pub const API_PREFIX: &str = "api";
/// Last-viewed detail page partition prefix.
pub const LAST_VIEWED_PREFIX: &str = "last-viewed";

/// Worker configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Version tag appended to every partition name
    pub cache_version: String,
    /// Origin of the site the worker governs
    pub origin: Url,
    /// Base URL of the remote API (host identifies cross-origin API traffic)
    pub api_base_url: Url,
    /// Application-shell paths seeded on install
    pub app_shell: Vec<String>,
    /// Routes warmed into the runtime partition on activate
    pub warm_routes: Vec<String>,
    /// Path prefix of per-item detail pages
    pub detail_route_prefix: String,
    /// Entry ceiling for the runtime partition
    pub runtime_max_entries: usize,
    /// Entry ceiling for the API partition
    pub api_max_entries: usize,
    /// Location of the durable write queue database
    pub queue_path: PathBuf,
    /// HTTP port of the headless host
    pub server_port: u16,
    /// Seconds between deferred-sync triggers in the headless host
    pub sync_interval: u64,
    /// Default notification title
    pub site_name: String,
    /// Default notification body
    pub push_default_body: String,
    /// Icon and badge used for notifications
    pub notification_icon: String,
}

impl WorkerConfig {
    /// Creates a new WorkerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_VERSION` - Partition version tag (default: v1)
    /// - `SITE_ORIGIN` - Site origin (default: http://localhost:3000)
    /// - `API_BASE_URL` - Remote API base (default: https://api.propertyhub.example)
    /// - `APP_SHELL` - Comma-separated shell paths
    /// - `WARM_ROUTES` - Comma-separated warm routes
    /// - `DETAIL_ROUTE_PREFIX` - Detail page prefix (default: /properties/)
    /// - `RUNTIME_MAX_ENTRIES` - Runtime ceiling (default: 60)
    /// - `API_MAX_ENTRIES` - API ceiling (default: 40)
    /// - `QUEUE_PATH` - Queue database file (default: offline-queue-v1.db)
    /// - `SERVER_PORT` - HTTP port (default: 3001)
    /// - `SYNC_INTERVAL` - Sync trigger interval in seconds (default: 30)
    /// - `SITE_NAME`, `PUSH_DEFAULT_BODY`, `NOTIFICATION_ICON` - Push defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            origin: env::var("SITE_ORIGIN")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.origin),
            api_base_url: env::var("API_BASE_URL")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.api_base_url),
            app_shell: env::var("APP_SHELL")
                .ok()
                .map(|v| split_list(&v))
                .unwrap_or(defaults.app_shell),
            warm_routes: env::var("WARM_ROUTES")
                .ok()
                .map(|v| split_list(&v))
                .unwrap_or(defaults.warm_routes),
            detail_route_prefix: env::var("DETAIL_ROUTE_PREFIX")
                .unwrap_or(defaults.detail_route_prefix),
            runtime_max_entries: env::var("RUNTIME_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.runtime_max_entries),
            api_max_entries: env::var("API_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.api_max_entries),
            queue_path: env::var("QUEUE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.queue_path),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sync_interval: env::var("SYNC_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sync_interval),
            site_name: env::var("SITE_NAME").unwrap_or(defaults.site_name),
            push_default_body: env::var("PUSH_DEFAULT_BODY")
                .unwrap_or(defaults.push_default_body),
            notification_icon: env::var("NOTIFICATION_ICON")
                .unwrap_or(defaults.notification_icon),
        }
    }

    // == Partition Names ==
    pub fn static_partition(&self) -> String {
        format!("{}-{}", STATIC_PREFIX, self.cache_version)
    }

    pub fn runtime_partition(&self) -> String {
        format!("{}-{}", RUNTIME_PREFIX, self.cache_version)
    }

    pub fn api_partition(&self) -> String {
        format!("{}-{}", API_PREFIX, self.cache_version)
    }

    pub fn last_viewed_partition(&self) -> String {
        format!("{}-{}", LAST_VIEWED_PREFIX, self.cache_version)
    }

    /// The full set of partitions allowed to exist after activation.
    pub fn partition_names(&self) -> Vec<String> {
        vec![
            self.static_partition(),
            self.runtime_partition(),
            self.api_partition(),
            self.last_viewed_partition(),
        ]
    }

    /// Host name of the remote API, if the base URL has one.
    pub fn api_host(&self) -> Option<&str> {
        self.api_base_url.host_str()
    }

    /// Resolves a site-relative path against the origin.
    pub fn absolute_url(&self, path: &str) -> Option<Url> {
        self.origin.join(path).ok()
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: "v1".to_string(),
            origin: Url::parse("http://localhost:3000").expect("static origin url"),
            api_base_url: Url::parse("https://api.propertyhub.example")
                .expect("static api url"),
            app_shell: split_list("/,/offline,/manifest.json,/icons/icon-192x192.png"),
            warm_routes: split_list("/dashboard,/properties,/tenants,/maintenance"),
            detail_route_prefix: "/properties/".to_string(),
            runtime_max_entries: 60,
            api_max_entries: 40,
            queue_path: PathBuf::from("offline-queue-v1.db"),
            server_port: 3001,
            sync_interval: 30,
            site_name: "PropertyHub".to_string(),
            push_default_body: "You have a new update".to_string(),
            notification_icon: "/icons/icon-192x192.png".to_string(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.runtime_max_entries, 60);
        assert_eq!(config.api_max_entries, 40);
        assert_eq!(config.server_port, 3001);
        assert_eq!(config.app_shell[0], "/");
    }

    #[test]
    fn test_partition_names_are_version_qualified() {
        let config = WorkerConfig {
            cache_version: "v2".to_string(),
            ..WorkerConfig::default()
        };
        assert_eq!(
            config.partition_names(),
            vec!["static-v2", "runtime-v2", "api-v2", "last-viewed-v2"]
        );
    }

    #[test]
    fn test_api_host() {
        let config = WorkerConfig::default();
        assert_eq!(config.api_host(), Some("api.propertyhub.example"));
    }

    #[test]
    fn test_split_list_ignores_blanks() {
        assert_eq!(split_list(" /a, ,/b,"), vec!["/a", "/b"]);
    }

    #[test]
    fn test_absolute_url() {
        let config = WorkerConfig::default();
        let url = config.absolute_url("/offline").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/offline");
    }
}

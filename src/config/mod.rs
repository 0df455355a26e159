use crate::error::{BinderError, Result};
use crate::binder::join_path;
use dashmap::DashMap;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration service
///
/// Snapshot of the process environment, with `.env` loaded first when present.
/// Values can be overridden with [`ConfigService::set`] before the typed
/// [`ServerConfig`] is derived from it.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// An empty service, not backed by the environment.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!("Failed to load .env file: {}", err),
        }

        Self::from_vars(env::vars_os())
    }

    /// Service holding `vars`; pairs that are not valid UTF-8 are skipped.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let service = Self::default();
        for (key, value) in vars {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => service.set(&key, &value),
                (key, _) => tracing::debug!(key = ?key, "Skipping non UTF-8 environment variable"),
            }
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Server address and routing prefix, read from `API_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `API_PROTO`
    pub proto: String,
    /// `API_HOST`
    pub host: String,
    /// `API_PORT`
    pub port: u16,
    /// `API_PATH`
    pub path: String,
    /// `API_VERISON`, with `API_VERSION` as a fallback
    pub version: String,
    /// `API_DOCS_PATH`
    pub docs_path: String,
    /// `API_SPEC_FILE`
    pub spec_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            proto: "http".to_string(),
            host: "localhost".to_string(),
            port: 3000,
            path: "/api".to_string(),
            version: "v1".to_string(),
            docs_path: "/docs".to_string(),
            spec_file: PathBuf::from("openapi.json"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::from_env())
    }

    pub fn from_service(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();

        let port = match config.get("API_PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| BinderError::config("API_PORT", format!("'{}': {}", raw, e)))?,
            None => defaults.port,
        };

        let version = ["API_VERISON", "API_VERSION"]
            .into_iter()
            .filter_map(|key| config.get(key))
            .find(|v| !v.trim().is_empty())
            .unwrap_or(defaults.version);

        let proto = config.get_or("API_PROTO", &defaults.proto);
        if proto != "http" && proto != "https" {
            return Err(BinderError::config(
                "API_PROTO",
                format!("expected http or https, got '{}'", proto),
            ));
        }

        Ok(Self {
            proto,
            host: config.get_or("API_HOST", &defaults.host),
            port,
            path: config.get_or("API_PATH", &defaults.path),
            version,
            docs_path: join_path(&[&config.get_or("API_DOCS_PATH", &defaults.docs_path)]),
            spec_file: config
                .get("API_SPEC_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.spec_file),
        })
    }

    /// Prefix every controller route is mounted under, e.g. `/api/v1`.
    pub fn route_prefix(&self) -> String {
        join_path(&[&self.path, &self.version])
    }

    fn origin(&self) -> String {
        format!("{}://{}:{}", self.proto, self.host, self.port)
    }

    /// Server URL advertised in the OpenAPI document.
    pub fn public_url(&self) -> String {
        let prefix = self.route_prefix();
        if prefix == "/" {
            self.origin()
        } else {
            format!("{}{}", self.origin(), prefix)
        }
    }

    pub fn docs_url(&self) -> String {
        format!("{}{}", self.origin(), self.docs_path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let service = ConfigService::from_vars([
            (OsString::from("API_PORT"), OsString::from("8080")),
            (OsString::from("API_HOST"), OsString::from_vec(vec![b'h', 0xff])),
            (OsString::from_vec(vec![0xfe]), OsString::from("x")),
        ]);

        assert_eq!(service.get("API_PORT").as_deref(), Some("8080"));
        assert_eq!(service.get("API_HOST"), None);

        let config = ServerConfig::from_service(&service).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = ServerConfig::from_service(&ConfigService::new()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.route_prefix(), "/api/v1");
        assert_eq!(config.public_url(), "http://localhost:3000/api/v1");
        assert_eq!(config.docs_url(), "http://localhost:3000/docs");
        assert_eq!(config.bind_addr(), "localhost:3000");
    }

    #[test]
    fn test_reads_api_variables() {
        let service = ConfigService::new();
        service.set("API_PROTO", "https");
        service.set("API_HOST", "0.0.0.0");
        service.set("API_PORT", "8080");
        service.set("API_PATH", "/service/");
        service.set("API_VERISON", "v2");
        service.set("API_DOCS_PATH", "reference");
        service.set("API_SPEC_FILE", "out/spec.json");

        let config = ServerConfig::from_service(&service).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.route_prefix(), "/service/v2");
        assert_eq!(config.docs_path, "/reference");
        assert_eq!(config.public_url(), "https://0.0.0.0:8080/service/v2");
        assert_eq!(config.spec_file, PathBuf::from("out/spec.json"));
    }

    #[test]
    fn test_misspelled_version_wins_over_fallback() {
        let service = ConfigService::new();
        service.set("API_VERSION", "v3");
        assert_eq!(ServerConfig::from_service(&service).unwrap().version, "v3");

        service.set("API_VERISON", "v4");
        assert_eq!(ServerConfig::from_service(&service).unwrap().version, "v4");
    }

    #[test]
    fn test_empty_path_and_version_mount_at_root() {
        let service = ConfigService::new();
        service.set("API_PATH", "/");
        service.set("API_VERISON", "/");
        let config = ServerConfig::from_service(&service).unwrap();
        assert_eq!(config.route_prefix(), "/");
        assert_eq!(config.public_url(), "http://localhost:3000");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let service = ConfigService::new();
        service.set("API_PORT", "eighty");
        let err = ServerConfig::from_service(&service).unwrap_err();
        assert!(matches!(err, BinderError::Config { ref key, .. } if key == "API_PORT"));
    }

    #[test]
    fn test_invalid_proto_is_rejected() {
        let service = ConfigService::new();
        service.set("API_PROTO", "ftp");
        assert!(ServerConfig::from_service(&service).is_err());
    }
}

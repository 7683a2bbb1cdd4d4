use std::env;
use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] =
    ["https://hrm.info.aipencil.name.vn", "http://localhost:3000"];

const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_FIELD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBackend {
    Disk,
    S3,
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub region: Option<String>,
    pub bucket: String,
    pub root_folder: Option<String>,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub upload_backend: UploadBackend,
    pub upload_dir: PathBuf,
    pub max_file_bytes: usize,
    pub max_field_bytes: usize,
    pub s3: Option<S3Settings>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::ConfigError("DATABASE_URL must be set".to_string()))?;

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::ConfigError(format!("invalid PORT: {}", raw)))?,
            None => 5000,
        };

        let allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let upload_backend = match get("UPLOAD_BACKEND").map(|v| v.to_lowercase()) {
            None => UploadBackend::Disk,
            Some(v) if v == "disk" => UploadBackend::Disk,
            Some(v) if v == "s3" => UploadBackend::S3,
            Some(other) => {
                return Err(AppError::ConfigError(format!(
                    "UPLOAD_BACKEND must be 'disk' or 's3', got '{}'",
                    other
                )))
            }
        };

        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()));

        let max_file_bytes = match get("MAX_FILE_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| AppError::ConfigError(format!("invalid MAX_FILE_BYTES: {}", raw)))?,
            None => DEFAULT_MAX_FILE_BYTES,
        };

        let max_field_bytes = match get("MAX_FIELD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| AppError::ConfigError(format!("invalid MAX_FIELD_BYTES: {}", raw)))?,
            None => DEFAULT_MAX_FIELD_BYTES,
        };

        let s3 = match upload_backend {
            UploadBackend::S3 => {
                let bucket = get("AWS_S3_BUCKET").ok_or_else(|| {
                    AppError::ConfigError("AWS_S3_BUCKET must be set for the s3 backend".to_string())
                })?;
                Some(S3Settings {
                    region: get("AWS_REGION"),
                    bucket,
                    root_folder: get("S3_ROOT_FOLDER"),
                    public_base_url: get("S3_PUBLIC_BASE_URL"),
                })
            }
            UploadBackend::Disk => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            allowed_origins,
            upload_backend,
            upload_dir,
            max_file_bytes,
            max_field_bytes,
            s3,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_original_deployment() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/hrm")]))
            .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_backend, UploadBackend::Disk);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_field_bytes, 1024 * 1024);
        assert_eq!(
            config.allowed_origins,
            vec!["https://hrm.info.aipencil.name.vn", "http://localhost:3000"]
        );
        assert!(config.s3.is_none());
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn s3_backend_requires_a_bucket() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hrm"),
            ("UPLOAD_BACKEND", "s3"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("AWS_S3_BUCKET"));

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hrm"),
            ("UPLOAD_BACKEND", "S3"),
            ("AWS_S3_BUCKET", "hrm-images"),
            ("S3_ROOT_FOLDER", "onboarding"),
        ]))
        .unwrap();
        let s3 = config.s3.unwrap();
        assert_eq!(s3.bucket, "hrm-images");
        assert_eq!(s3.root_folder.as_deref(), Some("onboarding"));
    }

    #[test]
    fn origins_and_port_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hrm"),
            ("PORT", "8081"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.allowed_origins, vec!["https://a.example", "https://b.example"]);

        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hrm"),
            ("PORT", "eighty"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/hrm"),
            ("UPLOAD_BACKEND", "ftp"),
        ]))
        .is_err());
    }
}

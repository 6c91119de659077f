//! Configuration module
//!
//! Disks are declared through environment variables (optionally loaded from a
//! `.env` file):
//!
//! - `FILES_DISK`: name of the default disk (default `local`)
//! - `FILES_DISKS`: comma separated list of declared disks (default `local,public`)
//! - `APP_URL`: site root used to turn site-rooted disk URLs into absolute ones
//! - `FILES_<NAME>_DRIVER`, `FILES_<NAME>_ROOT`, `FILES_<NAME>_URL`,
//!   `FILES_<NAME>_BUCKET`, `FILES_<NAME>_REGION`, `FILES_<NAME>_ENDPOINT`

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::FilesError;
use crate::storage_types::DiskDriver;

const DEFAULT_DISK: &str = "local";
const DEFAULT_DISKS: &str = "local,public";
const DEFAULT_APP_URL: &str = "http://localhost";
const DEFAULT_LOCAL_ROOT: &str = "storage/app";
const DEFAULT_PUBLIC_ROOT: &str = "storage/app/public";
const DEFAULT_DISK_URL: &str = "/storage";

/// Configuration of one named disk
#[derive(Clone, Debug, PartialEq)]
pub struct DiskConfig {
    pub name: String,
    pub driver: DiskDriver,
    pub root: Option<PathBuf>,
    pub url: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl DiskConfig {
    /// A local disk rooted at `root` whose files are served under `url`
    pub fn local(name: impl Into<String>, root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: DiskDriver::Local,
            root: Some(root.into()),
            url: Some(url.into()),
            bucket: None,
            region: None,
            endpoint: None,
        }
    }

    /// An in-process disk, used by tests and throwaway environments
    pub fn memory(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: DiskDriver::Memory,
            root: None,
            url: Some(url.into()),
            bucket: None,
            region: None,
            endpoint: None,
        }
    }

    pub fn validate(&self) -> Result<(), FilesError> {
        match self.driver {
            DiskDriver::Local => {
                if self.root.is_none() {
                    return Err(FilesError::Config(format!(
                        "Disk '{}' uses the local driver but has no root",
                        self.name
                    )));
                }
            }
            DiskDriver::S3 => {
                if self.bucket.is_none() {
                    return Err(FilesError::Config(format!(
                        "Disk '{}' uses the s3 driver but has no bucket",
                        self.name
                    )));
                }
                if self.region.is_none() {
                    return Err(FilesError::Config(format!(
                        "Disk '{}' uses the s3 driver but has no region",
                        self.name
                    )));
                }
            }
            DiskDriver::Memory => {}
        }
        Ok(())
    }
}

/// Top level configuration for file attachments
#[derive(Clone, Debug, PartialEq)]
pub struct FilesConfig {
    /// Disk used when neither the caller nor the record picks one
    pub default_disk: String,
    /// Absolute site root, e.g. `http://localhost`
    pub app_url: String,
    pub disks: Vec<DiskConfig>,
}

#[derive(Debug, Deserialize)]
struct FilesEnv {
    disk: Option<String>,
    disks: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiskEnv {
    driver: Option<String>,
    root: Option<PathBuf>,
    url: Option<String>,
    bucket: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
}

impl FilesConfig {
    pub fn new(default_disk: impl Into<String>, app_url: impl Into<String>) -> Self {
        Self {
            default_disk: default_disk.into(),
            app_url: app_url.into(),
            disks: Vec::new(),
        }
    }

    pub fn with_disk(mut self, disk: DiskConfig) -> Self {
        self.disks.retain(|d| d.name != disk.name);
        self.disks.push(disk);
        self
    }

    pub fn disk(&self, name: &str) -> Option<&DiskConfig> {
        self.disks.iter().find(|d| d.name == name)
    }

    pub fn from_env() -> Result<Self, FilesError> {
        dotenvy::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Build the configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self, FilesError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        let files: FilesEnv = envy::prefixed("FILES_").from_iter(vars.clone())?;
        let app_url = vars
            .iter()
            .find(|(k, _)| k == "APP_URL")
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| DEFAULT_APP_URL.to_string());

        let default_disk = files.disk.unwrap_or_else(|| DEFAULT_DISK.to_string());
        let names = files.disks.unwrap_or_else(|| DEFAULT_DISKS.to_string());

        let mut disks = Vec::new();
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let prefix = format!("FILES_{}_", name.to_uppercase());
            let raw: DiskEnv = envy::prefixed(prefix).from_iter(vars.clone())?;
            disks.push(Self::disk_from_env(name, raw)?);
        }

        let config = Self {
            default_disk,
            app_url,
            disks,
        };
        config.validate()?;
        Ok(config)
    }

    fn disk_from_env(name: &str, raw: DiskEnv) -> Result<DiskConfig, FilesError> {
        let driver = match raw.driver {
            Some(driver) => driver
                .parse::<DiskDriver>()
                .map_err(|e| FilesError::Config(format!("Disk '{}': {}", name, e)))?,
            None => DiskDriver::Local,
        };

        let root = match (driver, raw.root) {
            (_, Some(root)) => Some(root),
            (DiskDriver::Local, None) if name == "public" => Some(PathBuf::from(DEFAULT_PUBLIC_ROOT)),
            (DiskDriver::Local, None) => Some(PathBuf::from(DEFAULT_LOCAL_ROOT)),
            (_, None) => None,
        };

        let url = match (driver, raw.url) {
            (_, Some(url)) => Some(url),
            (DiskDriver::S3, None) => None,
            (_, None) => Some(DEFAULT_DISK_URL.to_string()),
        };

        Ok(DiskConfig {
            name: name.to_string(),
            driver,
            root,
            url,
            bucket: raw.bucket,
            region: raw.region,
            endpoint: raw.endpoint,
        })
    }

    pub fn validate(&self) -> Result<(), FilesError> {
        if !self.app_url.starts_with("http://") && !self.app_url.starts_with("https://") {
            return Err(FilesError::Config(format!(
                "APP_URL must be an absolute http(s) URL, got '{}'",
                self.app_url
            )));
        }

        if self.disk(&self.default_disk).is_none() {
            return Err(FilesError::Config(format!(
                "Default disk '{}' is not declared",
                self.default_disk
            )));
        }

        for disk in &self.disks {
            disk.validate()?;
        }

        Ok(())
    }
}

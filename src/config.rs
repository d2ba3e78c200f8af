use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::model::PaymentMode;
use crate::pdf::PdfDisplay;
use crate::validation::ValidationPolicy;

pub const DEFAULT_API_URL: &str = "https://chaudharymobilesshopserver.onrender.com";
pub const API_URL_ENV: &str = "POS_INVOICE_API_URL";

/// Contents of `settings.toml`. Every key is optional in the file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub payment_modes: Vec<PaymentMode>,
    pub default_payment_mode: PaymentMode,
    pub require_phone_item_name: bool,
    pub pdf_display: PdfDisplay,
    pub download_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = ValidationPolicy::default();
        Settings {
            api_base_url: DEFAULT_API_URL.to_string(),
            payment_modes: policy.payment_modes,
            default_payment_mode: PaymentMode::default(),
            require_phone_item_name: policy.require_phone_item_name,
            pdf_display: PdfDisplay::default(),
            download_dir: "~/Downloads/invoices".to_string(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "pos-invoice", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

impl Settings {
    /// Loads the user's settings, then lets `.env` / the environment
    /// override the service address.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let settings = Self::load_from(&config_path())?;
        settings.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let settings: Settings = toml::from_str(&content)?;
        settings.check()?;
        Ok(settings)
    }

    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            debug!(%url, "service address overridden from environment");
            self.api_base_url = url;
        }
        self.check()?;
        Ok(self)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.check()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|source| ConfigError::Write { path: dir.to_path_buf(), source })?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_path())
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.payment_modes.is_empty() {
            return Err(ConfigError::Invalid("payment_modes must list at least one mode".into()));
        }
        if !self.payment_modes.contains(&self.default_payment_mode) {
            return Err(ConfigError::Invalid(format!(
                "default_payment_mode {} is not in payment_modes",
                self.default_payment_mode
            )));
        }
        Ok(())
    }

    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            require_phone_item_name: self.require_phone_item_name,
            payment_modes: self.payment_modes.clone(),
        }
    }

    pub fn download_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.download_dir))
    }
}

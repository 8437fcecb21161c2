//! Credential storage for the APIsetu gateway.
//!
//! Two settings are persisted, `apiKey` and `clientId`. The verification
//! client only sees them through the [`CredentialStore`] trait, so callers can
//! swap the TOML-backed [`FileCredentialStore`] for [`MemoryCredentialStore`]
//! or layer environment overrides with [`EnvOverride`].

use crate::error::{ApiSetuError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Production gateway for the Kerala transport department.
pub const DEFAULT_BASE_URL: &str = "https://apisetu.gov.in/transportkl/v3";

/// Total request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Connection timeout
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

pub const CONFIG_DIR_NAME: &str = "apisetu";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const CONFIG_PATH_ENV: &str = "APISETU_CONFIG";
pub const BASE_URL_ENV: &str = "APISETU_BASE_URL";
pub const API_KEY_ENV: &str = "APISETU_API_KEY";
pub const CLIENT_ID_ENV: &str = "APISETU_CLIENT_ID";

pub const SETUP_HINT: &str = "apisetu config set --api-key YOUR_API_KEY --client-id YOUR_CLIENT_ID";
pub const PORTAL_URL: &str = "https://apisetu.gov.in/";

/// A named persisted setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    ApiKey,
    ClientId,
}

impl Setting {
    /// Human-readable name used in status messages.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ApiKey => "API key",
            Self::ClientId => "Client ID",
        }
    }

    #[must_use]
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::ApiKey => API_KEY_ENV,
            Self::ClientId => CLIENT_ID_ENV,
        }
    }
}

/// On-disk shape of the settings file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
}

impl Settings {
    #[must_use]
    pub fn get(&self, setting: Setting) -> Option<&str> {
        match setting {
            Setting::ApiKey => self.api_key.as_deref(),
            Setting::ClientId => self.client_id.as_deref(),
        }
    }

    pub fn set(&mut self, setting: Setting, value: &str) {
        let slot = match setting {
            Setting::ApiKey => &mut self.api_key,
            Setting::ClientId => &mut self.client_id,
        };
        if let Some(old) = slot.as_mut() {
            old.zeroize();
        }
        *slot = Some(value.to_string());
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("client_id", &self.client_id.as_deref().map(mask_secret))
            .finish()
    }
}

/// A complete credential pair, ready to be attached to a request.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    api_key: String,
    client_id: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client_id: client_id.into(),
        }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask_secret(&self.api_key))
            .field("client_id", &mask_secret(&self.client_id))
            .finish()
    }
}

fn not_configured() -> ApiSetuError {
    ApiSetuError::Configuration(format!("API credentials not configured. Run: {SETUP_HINT}"))
}

/// Read/write access to the two credential settings.
///
/// No format validation happens here; bad credentials are only detected when
/// the gateway rejects them.
pub trait CredentialStore {
    /// Returns `None` if the setting was never written.
    fn get(&self, setting: Setting) -> Result<Option<String>>;

    /// Writes or overwrites a setting. Durable once this returns.
    fn set(&self, setting: Setting, value: &str) -> Result<()>;

    /// True iff both settings are present and non-empty.
    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Both settings as a [`Credentials`] pair, or a configuration error.
    fn credentials(&self) -> Result<Credentials> {
        let api_key = self.get(Setting::ApiKey)?.filter(|v| !v.is_empty());
        let client_id = self.get(Setting::ClientId)?.filter(|v| !v.is_empty());
        match (api_key, client_id) {
            (Some(api_key), Some(client_id)) => Ok(Credentials::new(api_key, client_id)),
            _ => Err(not_configured()),
        }
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for &T {
    fn get(&self, setting: Setting) -> Result<Option<String>> {
        (**self).get(setting)
    }

    fn set(&self, setting: Setting, value: &str) -> Result<()> {
        (**self).set(setting, value)
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    fn get(&self, setting: Setting) -> Result<Option<String>> {
        (**self).get(setting)
    }

    fn set(&self, setting: Setting, value: &str) -> Result<()> {
        (**self).set(setting, value)
    }
}

/// Settings persisted as TOML in the user's config directory.
///
/// Every `set` rewrites the whole file. Concurrent writers are not
/// coordinated; the last one wins.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/apisetu/config.toml`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_config_path()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as empty settings.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }

        let content = toml::to_string_pretty(settings)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten files written by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        tracing::debug!(path = %self.path.display(), "settings written");
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, setting: Setting) -> Result<Option<String>> {
        Ok(self.load()?.get(setting).map(str::to_string))
    }

    fn set(&self, setting: Setting, value: &str) -> Result<()> {
        let mut settings = self.load()?;
        settings.set(setting, value);
        self.save(&settings)
    }
}

/// Default settings file location.
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine the user config directory; pass --config",
        )
    })?;
    Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    settings: Mutex<Settings>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(api_key: &str, client_id: &str) -> Self {
        let mut settings = Settings::default();
        settings.set(Setting::ApiKey, api_key);
        settings.set(Setting::ClientId, client_id);
        Self {
            settings: Mutex::new(settings),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Settings> {
        match self.settings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, setting: Setting) -> Result<Option<String>> {
        Ok(self.lock().get(setting).map(str::to_string))
    }

    fn set(&self, setting: Setting, value: &str) -> Result<()> {
        self.lock().set(setting, value);
        Ok(())
    }
}

/// Environment variables take priority over the wrapped store on read.
///
/// `APISETU_API_KEY` / `APISETU_CLIENT_ID` are consulted first; empty values
/// are ignored. Writes always go to the inner store.
pub struct EnvOverride<S> {
    inner: S,
    lookup: fn(&str) -> Option<String>,
}

impl<S: CredentialStore> EnvOverride<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookup: |name| std::env::var(name).ok(),
        }
    }

    /// Replace the environment lookup.
    pub fn with_lookup(inner: S, lookup: fn(&str) -> Option<String>) -> Self {
        Self { inner, lookup }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether `setting` is currently supplied by the environment.
    pub fn is_overridden(&self, setting: Setting) -> bool {
        (self.lookup)(setting.env_var()).is_some_and(|v| !v.is_empty())
    }
}

impl<S: CredentialStore> CredentialStore for EnvOverride<S> {
    fn get(&self, setting: Setting) -> Result<Option<String>> {
        match (self.lookup)(setting.env_var()) {
            Some(value) if !value.is_empty() => Ok(Some(value)),
            _ => self.inner.get(setting),
        }
    }

    fn set(&self, setting: Setting, value: &str) -> Result<()> {
        self.inner.set(setting, value)
    }
}

/// Mask a secret for display: first 6 and last 4 characters survive.
///
/// Values of 10 characters or fewer are fully starred.
#[must_use]
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

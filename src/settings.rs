use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub lookup_enabled: bool,
    pub lookup_endpoint: String,
    pub lookup_api_key_env: String,
    pub lookup_timeout_secs: u64,
    pub work_dir: Option<PathBuf>,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookup_enabled: false,
            lookup_endpoint: "https://api.upcitemdb.com/prod/trial/lookup".to_string(),
            lookup_api_key_env: "UPC_DATABASE_API_KEY".to_string(),
            lookup_timeout_secs: 10,
            work_dir: None,
            server_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    lookup: Option<LookupSettings>,
    scan: Option<ScanSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct LookupSettings {
    enabled: Option<bool>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ScanSettings {
    work_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

/// Embedded defaults, then `./settings.toml`, `./settings.local.toml`,
/// `~/.medscan/settings.toml` and finally `extra_path`. Later files win.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    load_settings_from(&ordered_paths)
}

fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(lookup) = incoming.lookup {
            if let Some(enabled) = lookup.enabled {
                self.lookup_enabled = enabled;
            }
            if let Some(endpoint) = lookup.endpoint {
                if !endpoint.trim().is_empty() {
                    self.lookup_endpoint = endpoint;
                }
            }
            if let Some(env) = lookup.api_key_env {
                if !env.trim().is_empty() {
                    self.lookup_api_key_env = env;
                }
            }
            if let Some(secs) = lookup.timeout_secs {
                if secs > 0 {
                    self.lookup_timeout_secs = secs;
                }
            }
        }
        if let Some(scan) = incoming.scan {
            if let Some(dir) = scan.work_dir {
                if !dir.trim().is_empty() {
                    self.work_dir = Some(PathBuf::from(dir));
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr;
                }
            }
        }
    }

    pub fn resolve_work_dir(&self) -> Result<PathBuf> {
        let dir = self
            .work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("medscan"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create work dir: {}", dir.display()))?;
        Ok(dir)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".medscan"))
        }
    })
}

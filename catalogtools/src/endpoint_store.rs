use std::{
    fs,
    io,
    io::{Error, ErrorKind},
    path::PathBuf,
};

use log::info;
use serde::{Deserialize, Serialize};

/// The persisted client-side state: the sheet endpoint URL and the storefront contact number.
#[derive(Serialize, Deserialize, Default)]
pub struct UserData {
    pub sheet_url: Option<String>,
    pub whatsapp_number: Option<String>,
}

/// Loads, saves, and clears the configuration file at `~/.catalogtools/config.toml`.
///
/// The endpoint URL written here is what flips the application from Unconfigured to Configured
/// at startup; `clear` is the explicit reset back.
pub struct EndpointStore {
    path: PathBuf,
}

impl EndpointStore {
    pub fn open() -> io::Result<Self> {
        Ok(Self { path: get_config_path()? })
    }

    #[cfg(test)]
    fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> io::Result<UserData> {
        let raw = fs::read_to_string(&self.path)?;
        toml::from_str(&raw).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))
    }

    pub fn save(&self, data: &UserData) -> io::Result<()> {
        let raw = toml::to_string(data).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        fs::write(&self.path, raw)?;
        set_permissions(&self.path, 0o600)
    }

    /// Back to the unconfigured state.
    pub fn clear(&self) -> io::Result<()> {
        self.save(&UserData::default())
    }

    pub fn sheet_url(&self) -> Option<String> {
        self.load().ok().and_then(|data| data.sheet_url).filter(|url| !url.trim().is_empty())
    }

    pub fn save_sheet_url(&self, url: &str) -> io::Result<()> {
        let mut data = self.load().unwrap_or_default();
        data.sheet_url = Some(url.trim().to_string());
        self.save(&data)
    }

    pub fn whatsapp_number(&self) -> Option<String> {
        self.load().ok().and_then(|data| data.whatsapp_number).filter(|n| !n.trim().is_empty())
    }
}

fn get_config_path() -> io::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| Error::new(ErrorKind::NotFound, "Home directory not found"))?;
    let config_dir = home.join(".catalogtools");
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        set_permissions(&config_dir, 0o700)?;
    }
    let config_file = config_dir.join("config.toml");
    if !config_file.exists() {
        info!("Creating default config file");
        let default_config = UserData::default();
        let config_str =
            toml::to_string(&default_config).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        fs::write(&config_file, config_str)?;
        set_permissions(&config_file, 0o600)?;
    }
    Ok(config_file)
}

fn set_permissions(path: &PathBuf, perms: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(perms);
        fs::set_permissions(path, permissions)?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, perms);
    }
    Ok(())
}

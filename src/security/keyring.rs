//! Keyring integration for the provider API key
//! Resolution order: `COGNOSYS_API_KEY` env var, OS keyring, then a key file.

use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use std::fs;

const SERVICE_NAME: &str = "cognosys";
const API_KEY_USERNAME: &str = "provider-api-key";
const API_KEY_FILE: &str = "api_key.txt";
pub const API_KEY_ENV: &str = "COGNOSYS_API_KEY";

/// Get the path for the fallback API key file
fn api_key_file_path() -> Result<PathBuf> {
    let dir = crate::config::config_dir()?;
    fs::create_dir_all(&dir).context("Failed to create config directory")?;
    Ok(dir.join(API_KEY_FILE))
}

fn key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Set API key - tries keyring first, falls back to file
pub fn set_api_key(key: &str) -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if entry.set_password(key).is_ok() {
            return Ok(());
        }
    }

    save_to_file(key)?;
    tracing::info!("Keyring unavailable, API key stored in {}", API_KEY_FILE);
    Ok(())
}

fn save_to_file(key: &str) -> Result<()> {
    write_key_file(&api_key_file_path()?, key)
}

fn write_key_file(path: &Path, key: &str) -> Result<()> {
    fs::write(path, key).context("Failed to write API key file")?;

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

/// Get API key from env, keyring or file
pub fn get_api_key() -> Result<String> {
    if let Some(key) = key_from_env() {
        return Ok(key);
    }

    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if let Ok(key) = entry.get_password() {
            return Ok(key);
        }
    }

    read_key_file(&api_key_file_path()?)
}

fn read_key_file(path: &Path) -> Result<String> {
    let key = fs::read_to_string(path)
        .context("No API key configured. Run 'cognosys config --set-api-key YOUR_KEY' or set COGNOSYS_API_KEY.")?;
    let key = key.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("API key file is empty");
    }
    Ok(key)
}

/// Delete API key from both keyring and file
pub fn delete_api_key() -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        let _ = entry.delete_credential();
    }

    remove_key_file(&api_key_file_path()?)?;
    Ok(())
}

/// Returns whether a file was removed
fn remove_key_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).context("Failed to delete API key file")?;
    Ok(true)
}

/// Check if an API key is available from any source
pub fn has_api_key() -> bool {
    get_api_key().is_ok()
}

//! Where the bearer token lives between invocations.

use crate::error::{ClientError, ClientResult};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

const TOKEN_FILE: &str = "token";
const APP_DIR: &str = "sentinel";

#[derive(Debug, Clone)]
pub enum TokenStore {
    Memory(Arc<Mutex<Option<String>>>),
    File(PathBuf),
}

impl TokenStore {
    pub fn memory() -> Self {
        Self::Memory(Arc::new(Mutex::new(None)))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// `<config dir>/sentinel/token`, e.g. `~/.config/sentinel/token` on Linux.
    pub fn default_file() -> ClientResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| ClientError::TokenStore("no config directory on this platform".to_string()))?;
        Ok(Self::File(dir.join(APP_DIR).join(TOKEN_FILE)))
    }

    pub fn load(&self) -> ClientResult<Option<String>> {
        match self {
            Self::Memory(slot) => Ok(slot.lock().unwrap_or_else(PoisonError::into_inner).clone()),
            Self::File(path) => match fs::read_to_string(path) {
                Ok(raw) => Ok(Some(raw.trim().to_string()).filter(|t| !t.is_empty())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ClientError::TokenStore(format!(
                    "read {} failed: {e}",
                    path.display()
                ))),
            },
        }
    }

    pub fn save(&self, token: &str) -> ClientResult<()> {
        match self {
            Self::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
                Ok(())
            }
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        ClientError::TokenStore(format!("create {} failed: {e}", parent.display()))
                    })?;
                }
                fs::write(path, token).map_err(|e| {
                    ClientError::TokenStore(format!("write {} failed: {e}", path.display()))
                })
            }
        }
    }

    pub fn clear(&self) -> ClientResult<()> {
        match self {
            Self::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Ok(())
            }
            Self::File(path) => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ClientError::TokenStore(format!(
                    "remove {} failed: {e}",
                    path.display()
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TokenStore::file(dir.path().join("nested").join("token"));
        assert_eq!(store.load().expect("load"), None);

        store.save("abc.def.ghi").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("abc.def.ghi"));

        store.clear().expect("clear");
        store.clear().expect("clear twice");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn memory_store_is_shared_between_clones() {
        let store = TokenStore::memory();
        let clone = store.clone();
        store.save("t1").expect("save");
        assert_eq!(clone.load().expect("load").as_deref(), Some("t1"));
    }
}

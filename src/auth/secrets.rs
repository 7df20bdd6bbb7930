// Secret store backends.
// Key-value secret maps stored per account: in memory, in a local file, or in the OS keyring.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::cache::store::write_private;
use crate::error::Result;
#[cfg(feature = "keyring")]
use crate::error::GistError;

/// Secrets for one account.
pub type SecretMap = HashMap<String, String>;

/// Secure key-value storage, keyed by account name.
pub trait SecretStore: Send + Sync {
    /// Load the secrets stored for `account`, if any.
    fn load(&self, account: &str) -> Result<Option<SecretMap>>;

    /// Replace the secrets stored for `account`.
    fn update(&self, account: &str, secrets: SecretMap) -> Result<()>;

    /// Remove everything stored for `account`.
    fn delete(&self, account: &str) -> Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    accounts: Mutex<HashMap<String, SecretMap>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn load(&self, account: &str) -> Result<Option<SecretMap>> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.get(account).cloned())
    }

    fn update(&self, account: &str, secrets: SecretMap) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(account.to_string(), secrets);
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts.remove(account);
        Ok(())
    }
}

/// JSON file holding every account's secrets, readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the per-user config directory.
    pub fn open_default() -> Option<Self> {
        crate::cache::paths::secrets_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, SecretMap>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, accounts: &HashMap<String, SecretMap>) -> Result<()> {
        let json = serde_json::to_string(accounts)?;
        write_private(&self.path, json.as_bytes())
    }
}

impl SecretStore for FileSecretStore {
    fn load(&self, account: &str) -> Result<Option<SecretMap>> {
        Ok(self.read_all()?.remove(account))
    }

    fn update(&self, account: &str, secrets: SecretMap) -> Result<()> {
        // A corrupt file is replaced rather than blocking every future write.
        let mut accounts = self.read_all().unwrap_or_default();
        accounts.insert(account.to_string(), secrets);
        self.write_all(&accounts)
    }

    fn delete(&self, account: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut accounts = self.read_all().unwrap_or_default();
        accounts.remove(account);
        self.write_all(&accounts)
    }
}

/// OS keyring store (macOS Keychain, Linux secret-service, Windows Credential
/// Manager). Each account's map is stored JSON-encoded in a single entry.
#[cfg(feature = "keyring")]
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

#[cfg(feature = "keyring")]
impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, account)
            .map_err(|e| GistError::SecretStore(format!("keyring error: {}", e)))
    }
}

#[cfg(feature = "keyring")]
impl SecretStore for KeyringSecretStore {
    fn load(&self, account: &str) -> Result<Option<SecretMap>> {
        match self.entry(account)?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(GistError::SecretStore(format!("failed to read from keyring: {}", e))),
        }
    }

    fn update(&self, account: &str, secrets: SecretMap) -> Result<()> {
        let json = serde_json::to_string(&secrets)?;
        self.entry(account)?
            .set_password(&json)
            .map_err(|e| GistError::SecretStore(format!("failed to store in keyring: {}", e)))
    }

    fn delete(&self, account: &str) -> Result<()> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(GistError::SecretStore(format!("failed to delete from keyring: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn secrets(token: &str) -> SecretMap {
        HashMap::from([("token".to_string(), token.to_string())])
    }

    fn exercise(store: &dyn SecretStore) {
        assert_eq!(store.load("github").unwrap(), None);

        store.update("github", secrets("abc")).unwrap();
        store.update("other", secrets("zzz")).unwrap();
        assert_eq!(store.load("github").unwrap(), Some(secrets("abc")));

        store.update("github", secrets("def")).unwrap();
        assert_eq!(store.load("github").unwrap(), Some(secrets("def")));

        store.delete("github").unwrap();
        assert_eq!(store.load("github").unwrap(), None);
        assert_eq!(store.load("other").unwrap(), Some(secrets("zzz")));

        // Deleting an absent account is not an error
        store.delete("github").unwrap();
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemorySecretStore::new());
    }

    #[test]
    fn test_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(temp_dir.path().join("secrets.json"));
        exercise(&store);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(temp_dir.path().join("secrets.json"));
        store.update("github", secrets("abc")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileSecretStore::new(&path);
        assert!(store.load("github").is_err());

        store.update("github", secrets("abc")).unwrap();
        assert_eq!(store.load("github").unwrap(), Some(secrets("abc")));
    }
}

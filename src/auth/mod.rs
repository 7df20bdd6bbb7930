// Authentication module.
// OAuth login flow, token storage, and the secret stores behind it.

pub mod oauth;
pub mod secrets;
pub mod token;

pub use oauth::{FlowState, LoginHandle, OAuthFlow};
#[cfg(feature = "keyring")]
pub use secrets::KeyringSecretStore;
pub use secrets::{FileSecretStore, MemorySecretStore, SecretMap, SecretStore};
pub use token::TokenStore;

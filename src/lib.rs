// gistkit: a GitHub Gist API client.
// OAuth login, cursor pagination, star management and an offline snapshot cache.

//! Client library for the GitHub Gist API.
//!
//! A [`GistContext`] ties together configuration, an HTTP transport with an
//! ETag response cache, the stored OAuth token and the login flow. From it you
//! get [`GistClient`]s for individual API calls and [`GistFeed`]s that merge
//! pages of a collection and keep a snapshot on disk for offline use.

pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod github;
pub mod state;

pub use auth::{
    FileSecretStore, FlowState, LoginHandle, MemorySecretStore, OAuthFlow, SecretStore, TokenStore,
};
#[cfg(feature = "keyring")]
pub use auth::KeyringSecretStore;
pub use cache::SnapshotCache;
pub use config::GistConfig;
pub use context::GistContext;
pub use error::{GistError, Result};
pub use github::{
    Collection, File, Gist, GistClient, GistPage, NewGist, ReqwestTransport, Transport,
    TransportError,
};
pub use state::{FeedUpdate, GistFeed, LoadingState};

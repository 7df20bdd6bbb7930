// Shared client context.
// Owns the configuration, transport, token store and login flow that every component uses.

use std::sync::Arc;

use crate::auth::{OAuthFlow, SecretStore, TokenStore};
use crate::cache::SnapshotCache;
use crate::config::GistConfig;
use crate::error::Result;
use crate::github::{Collection, GistClient, ReqwestTransport, Transport};
use crate::state::GistFeed;

/// One configured session against the Gist API.
///
/// Clients, feeds and the login flow handed out by a context all see the
/// same token store and response cache.
pub struct GistContext<T = ReqwestTransport> {
    config: Arc<GistConfig>,
    transport: Arc<T>,
    tokens: Arc<TokenStore>,
    oauth: Arc<OAuthFlow<T>>,
}

impl GistContext<ReqwestTransport> {
    /// Build a context over HTTP using the configured user agent.
    pub fn new(config: GistConfig, secrets: impl SecretStore + 'static) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(config, transport, secrets))
    }
}

impl<T: Transport> GistContext<T> {
    pub fn with_transport(
        config: GistConfig,
        transport: T,
        secrets: impl SecretStore + 'static,
    ) -> Self {
        let config = Arc::new(config);
        let transport = Arc::new(transport);
        let tokens = Arc::new(TokenStore::new(secrets));
        let oauth = Arc::new(OAuthFlow::new(
            Arc::clone(&config),
            Arc::clone(&transport),
            Arc::clone(&tokens),
        ));

        Self {
            config,
            transport,
            tokens,
            oauth,
        }
    }

    pub fn config(&self) -> &GistConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn oauth(&self) -> &Arc<OAuthFlow<T>> {
        &self.oauth
    }

    pub fn client(&self) -> GistClient<T> {
        GistClient::new(&self.config, Arc::clone(&self.transport), Arc::clone(&self.tokens))
    }

    pub fn feed(&self, collection: Collection, snapshots: SnapshotCache) -> GistFeed<T> {
        GistFeed::new(self.client(), snapshots, collection)
    }

    pub fn has_token(&self) -> bool {
        self.tokens.has_token()
    }
}

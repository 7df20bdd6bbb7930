// Gist API HTTP client.
// Routes requests, attaches the stored token, and classifies authorization failures.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::GistConfig;
use crate::error::{GistError, Result};

use super::router::{Route, Router};
use super::transport::{HttpResponse, Transport, TransportError};

/// Gist API client sharing a transport and token store with the rest of the context.
pub struct GistClient<T> {
    router: Router,
    transport: Arc<T>,
    tokens: Arc<TokenStore>,
}

impl<T> Clone for GistClient<T> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            transport: Arc::clone(&self.transport),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<T: Transport> GistClient<T> {
    pub fn new(config: &GistConfig, transport: Arc<T>, tokens: Arc<TokenStore>) -> Self {
        Self {
            router: Router::new(config),
            transport,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Whether a non-empty token is stored.
    pub fn has_token(&self) -> bool {
        self.tokens.has_token()
    }

    /// Forget every response cached by the transport.
    pub fn clear_cache(&self) {
        self.transport.clear_cache();
    }

    /// Send a routed request. A 401 clears the stored token and fails with
    /// [`GistError::AuthLost`] before the body is looked at.
    pub(crate) async fn send(&self, route: Route) -> Result<HttpResponse> {
        let token = self.tokens.get();
        let request = self.router.request(route, token.as_deref())?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(request).await?;
        self.check_unauthorized(&response)?;
        Ok(response)
    }

    /// Send a request without the 401 handling, for probes.
    pub(crate) async fn send_unchecked(&self, route: Route) -> Result<HttpResponse> {
        let request = self.router.request(route, None)?;
        Ok(self.transport.execute(request).await?)
    }

    fn check_unauthorized(&self, response: &HttpResponse) -> Result<()> {
        if response.status == StatusCode::UNAUTHORIZED {
            warn!("request rejected with 401; clearing stored token");
            self.tokens.clear();
            return Err(GistError::AuthLost("Not logged in".to_string()));
        }
        Ok(())
    }

    /// Require a 2xx status, preferring the API's own `message` when it gives one.
    pub(crate) fn ensure_success(response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }
        match api_message(&response) {
            Some(message) => Err(GistError::ApiProvided(message)),
            None => Err(TransportError::Status(response.status).into()),
        }
    }
}

/// The `message` field of a JSON object body, if any.
pub(crate) fn api_message(response: &HttpResponse) -> Option<String> {
    response
        .json()?
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

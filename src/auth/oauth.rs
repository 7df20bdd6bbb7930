// OAuth authorization-code login flow.
// Builds the authorize URL, handles the redirect, and swaps the code for a token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::GistConfig;
use crate::error::{GistError, Result};
use crate::github::router::Router;
use crate::github::transport::Transport;

use super::token::TokenStore;

const NO_TOKEN: &str = "Could not obtain an OAuth token";
const SUPERSEDED: &str = "login attempt was superseded";

/// Where the login flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    AwaitingRedirect,
    ExchangingCode,
    Authorized,
    Failed,
}

/// Completion of one login attempt.
///
/// Resolves exactly once. If the attempt is replaced by a later
/// [`OAuthFlow::begin_login`] or cancelled by [`OAuthFlow::logout`] before it
/// finishes, it resolves to [`GistError::AuthCouldNot`] and a token exchange
/// still in flight for it is discarded.
#[derive(Debug)]
pub struct LoginHandle {
    receiver: oneshot::Receiver<Result<()>>,
}

impl LoginHandle {
    /// Wait for the login attempt to finish.
    pub async fn wait(self) -> Result<()> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(GistError::AuthCouldNot(SUPERSEDED.to_string())))
    }
}

struct PendingLogin {
    state_token: String,
    sender: oneshot::Sender<Result<()>>,
}

#[derive(Default)]
struct FlowInner {
    state: FlowState,
    pending: Option<PendingLogin>,
    /// Bumped whenever the current attempt is abandoned.
    attempt: u64,
}

/// Drives the two-step authorization-code exchange.
pub struct OAuthFlow<T> {
    config: Arc<GistConfig>,
    router: Router,
    transport: Arc<T>,
    tokens: Arc<TokenStore>,
    inner: Mutex<FlowInner>,
}

impl<T: Transport> OAuthFlow<T> {
    pub fn new(config: Arc<GistConfig>, transport: Arc<T>, tokens: Arc<TokenStore>) -> Self {
        Self {
            router: Router::new(&config),
            config,
            transport,
            tokens,
            inner: Mutex::new(FlowInner::default()),
        }
    }

    pub fn state(&self) -> FlowState {
        self.inner().state
    }

    /// Start a login attempt.
    ///
    /// Returns the URL to open in a browser and a handle that resolves when
    /// the redirect has been processed. Any attempt still pending is abandoned.
    pub fn begin_login(&self) -> (Url, LoginHandle) {
        let state_token = Uuid::new_v4().to_string();
        let url = self.authorization_url(&state_token);
        let (sender, receiver) = oneshot::channel();

        let mut inner = self.inner();
        if inner.pending.is_some() {
            debug!("replacing pending login attempt");
        }
        inner.attempt = inner.attempt.wrapping_add(1);
        inner.pending = Some(PendingLogin {
            state_token,
            sender,
        });
        inner.state = FlowState::AwaitingRedirect;

        (url, LoginHandle { receiver })
    }

    /// Authorization URL carrying the client id, scope and anti-forgery state.
    pub fn authorization_url(&self, state_token: &str) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state_token);
        url
    }

    /// Process the redirect back from the authorization page.
    ///
    /// The outcome is delivered to the pending [`LoginHandle`] and also returned.
    pub async fn handle_redirect(&self, redirect: &Url) -> Result<()> {
        let Some(code) = query_param(redirect, "code") else {
            warn!("OAuth redirect carried no code");
            return self.finish(Err(GistError::AuthCouldNot(NO_TOKEN.to_string())));
        };

        let attempt = {
            let mut inner = self.inner();
            let expected = inner.pending.as_ref().map(|p| p.state_token.as_str());
            if let (Some(expected), Some(returned)) = (expected, query_param(redirect, "state")) {
                if expected != returned {
                    drop(inner);
                    warn!("OAuth redirect state does not match the pending login");
                    return self.finish(Err(GistError::AuthCouldNot(
                        "OAuth state mismatch".to_string(),
                    )));
                }
            }
            inner.state = FlowState::ExchangingCode;
            inner.attempt
        };

        let outcome = self.request_token(&code).await;
        self.complete(attempt, outcome)
    }

    /// Forget the stored token and abandon any login in progress.
    pub fn logout(&self) {
        let mut inner = self.inner();
        inner.attempt = inner.attempt.wrapping_add(1);
        inner.pending = None;
        inner.state = FlowState::Idle;
        self.tokens.clear();
    }

    async fn request_token(&self, code: &str) -> Result<String> {
        let request =
            self.router
                .token_exchange(&self.config.client_id, &self.config.client_secret, code);

        let response = self.transport.execute(request).await.map_err(|e| {
            warn!(error = %e, "OAuth token exchange failed");
            GistError::AuthCouldNot(e.to_string())
        })?;

        let body = response
            .json()
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .ok_or_else(|| {
                warn!(status = %response.status, "OAuth token response was not a JSON object");
                GistError::AuthCouldNot(NO_TOKEN.to_string())
            })?;

        let Some(token) = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        else {
            let reason = body
                .get("error_description")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or(NO_TOKEN);
            warn!(reason, "OAuth token response had no access_token");
            return Err(GistError::AuthCouldNot(reason.to_string()));
        };

        Ok(token.to_string())
    }

    /// Store the exchanged token, unless the attempt it belongs to was
    /// abandoned while the exchange was in flight.
    fn complete(&self, attempt: u64, outcome: Result<String>) -> Result<()> {
        let mut inner = self.inner();
        if inner.attempt != attempt {
            debug!("discarding token exchange for an abandoned login");
            return Err(GistError::AuthCouldNot(SUPERSEDED.to_string()));
        }

        let outcome = outcome.and_then(|token| {
            self.tokens.set(Some(&token));
            if !self.tokens.has_token() {
                return Err(GistError::AuthCouldNot(
                    "token could not be stored".to_string(),
                ));
            }
            info!("OAuth login complete");
            Ok(())
        });
        Self::settle(&mut inner, outcome)
    }

    fn finish(&self, outcome: Result<()>) -> Result<()> {
        Self::settle(&mut self.inner(), outcome)
    }

    /// Record the outcome and hand it to the pending login, if any.
    fn settle(inner: &mut FlowInner, outcome: Result<()>) -> Result<()> {
        inner.state = if outcome.is_ok() {
            FlowState::Authorized
        } else {
            FlowState::Failed
        };

        match inner.pending.take() {
            Some(pending) => {
                let reported = match &outcome {
                    Ok(()) => Ok(()),
                    Err(e) => Err(GistError::AuthCouldNot(auth_reason(e))),
                };
                // The receiver may have been dropped; nobody is waiting then.
                let _ = pending.sender.send(reported);
            }
            None => debug!("no pending login to notify"),
        }

        outcome
    }

    fn inner(&self) -> MutexGuard<'_, FlowInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn auth_reason(err: &GistError) -> String {
    match err {
        GistError::AuthCouldNot(reason) => reason.clone(),
        other => other.to_string(),
    }
}

/// First query parameter whose name matches `name` case-insensitively.
fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.into_owned())
}

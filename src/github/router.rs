// Request routing for the Gist API.
// Maps each logical operation to a fully-formed HTTP request without performing I/O.

use reqwest::{
    Method,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::config::GistConfig;
use crate::error::{GistError, Result};

use super::transport::{HttpRequest, RequestBody};

/// A logical Gist API operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    ListPublic,
    ListStarred,
    ListMine,
    /// Continue a paginated listing from an absolute cursor URL.
    FollowCursor(String),
    IsStarred(String),
    Star(String),
    Unstar(String),
    Delete(String),
    Create(Value),
    /// The API root, used as a reachability probe.
    Root,
}

impl Route {
    pub fn method(&self) -> Method {
        match self {
            Route::ListPublic
            | Route::ListStarred
            | Route::ListMine
            | Route::FollowCursor(_)
            | Route::IsStarred(_)
            | Route::Root => Method::GET,
            Route::Star(_) => Method::PUT,
            Route::Unstar(_) | Route::Delete(_) => Method::DELETE,
            Route::Create(_) => Method::POST,
        }
    }

    /// Path segments below the API base.
    fn segments(&self) -> Vec<&str> {
        match self {
            // absolute URLs
            Route::FollowCursor(_) | Route::Root => vec![],
            Route::ListPublic => vec!["gists", "public"],
            Route::ListStarred => vec!["gists", "starred"],
            Route::ListMine | Route::Create(_) => vec!["gists"],
            Route::IsStarred(id) | Route::Star(id) | Route::Unstar(id) => {
                vec!["gists", id.as_str(), "star"]
            }
            Route::Delete(id) => vec!["gists", id.as_str()],
        }
    }

    fn is_authenticated(&self) -> bool {
        !matches!(self, Route::Root)
    }
}

/// Builds requests against the configured API base and OAuth endpoints.
#[derive(Debug, Clone)]
pub struct Router {
    api_base: Url,
    token_url: Url,
}

impl Router {
    pub fn new(config: &GistConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            token_url: config.token_url.clone(),
        }
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Build the request for a route, authorizing it with `token` when present.
    pub fn request(&self, route: Route, token: Option<&str>) -> Result<HttpRequest> {
        let url = match &route {
            Route::FollowCursor(cursor) => Url::parse(cursor)?,
            Route::Root => self.api_base.clone(),
            other => self.resolve(&other.segments())?,
        };

        let mut headers = json_headers();
        if route.is_authenticated() {
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                match HeaderValue::from_str(&format!("token {}", token)) {
                    Ok(value) => {
                        headers.insert(AUTHORIZATION, value);
                    }
                    Err(_) => warn!("stored token is not a valid header value; sending unauthenticated"),
                }
            }
        }

        let method = route.method();
        let body = match route {
            Route::Create(params) => RequestBody::Json(params),
            _ => RequestBody::Empty,
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Build the OAuth code-for-token exchange request.
    pub fn token_exchange(&self, client_id: &str, client_secret: &str, code: &str) -> HttpRequest {
        HttpRequest {
            method: Method::POST,
            url: self.token_url.clone(),
            headers: json_headers(),
            body: RequestBody::Form(vec![
                ("client_id".to_string(), client_id.to_string()),
                ("client_secret".to_string(), client_secret.to_string()),
                ("code".to_string(), code.to_string()),
            ]),
        }
    }

    fn resolve(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| GistError::MalformedUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

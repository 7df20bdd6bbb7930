// Gist API endpoint functions.
// Provides typed methods for listing, creating, deleting and starring gists.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{GistError, Result};

use super::client::GistClient;
use super::pagination::next_cursor;
use super::router::Route;
use super::transport::{HttpResponse, Transport, TransportError};
use super::types::{Collection, File, Gist, NewGist, decode_gists};

/// One page of a gist listing.
#[derive(Debug, Clone, PartialEq)]
pub struct GistPage {
    pub gists: Vec<Gist>,
    /// URL of the next page, absent on the last page.
    pub next_cursor: Option<String>,
}

impl<T: Transport> GistClient<T> {
    /// Fetch a page of a collection: the first page when `cursor` is `None`,
    /// otherwise the page the cursor points at.
    pub async fn list(&self, collection: Collection, cursor: Option<&str>) -> Result<GistPage> {
        let route = match (cursor, collection) {
            (Some(cursor), _) => Route::FollowCursor(cursor.to_string()),
            (None, Collection::Public) => Route::ListPublic,
            (None, Collection::Starred) => Route::ListStarred,
            (None, Collection::Mine) => Route::ListMine,
        };

        let response = self.send(route).await?;
        let gists = gists_from_response(&response)?;
        let next_cursor = response.header("link").and_then(next_cursor);
        debug!(count = gists.len(), has_next = next_cursor.is_some(), "fetched gists");

        Ok(GistPage { gists, next_cursor })
    }

    /// Public gists.
    pub async fn list_public(&self, cursor: Option<&str>) -> Result<GistPage> {
        self.list(Collection::Public, cursor).await
    }

    /// Gists the authenticated user starred.
    pub async fn list_starred(&self, cursor: Option<&str>) -> Result<GistPage> {
        self.list(Collection::Starred, cursor).await
    }

    /// Gists owned by the authenticated user.
    pub async fn list_mine(&self, cursor: Option<&str>) -> Result<GistPage> {
        self.list(Collection::Mine, cursor).await
    }

    /// Create a gist from the files that have both a name and content.
    pub async fn create(&self, description: &str, is_public: bool, files: &[File]) -> Result<bool> {
        let payload = serde_json::to_value(NewGist::new(description, is_public, files))?;
        let response = self.send(Route::Create(payload)).await?;
        Self::ensure_success(response)?;

        self.clear_cache();
        Ok(true)
    }

    /// Delete a gist. Clears the transport's response cache on success.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let response = self.send(Route::Delete(id.to_string())).await?;
        Self::ensure_success(response)?;

        self.clear_cache();
        Ok(())
    }

    pub async fn star(&self, id: &str) -> Result<()> {
        let response = self.send(Route::Star(id.to_string())).await?;
        Self::ensure_success(response)?;
        Ok(())
    }

    pub async fn unstar(&self, id: &str) -> Result<()> {
        let response = self.send(Route::Unstar(id.to_string())).await?;
        Self::ensure_success(response)?;
        Ok(())
    }

    /// Whether the authenticated user starred a gist.
    ///
    /// GitHub answers 204 when starred and 404 when not; any other status is
    /// an error.
    pub async fn is_starred(&self, id: &str) -> Result<bool> {
        let response = self.send(Route::IsStarred(id.to_string())).await?;
        match response.status {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(TransportError::Status(status).into()),
        }
    }

    /// Probe the API root. Any failure, including a non-2xx status, means offline.
    pub async fn is_online(&self) -> bool {
        match self.send_unchecked(Route::Root).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!(error = %e, "API is unreachable");
                false
            }
        }
    }
}

/// Decode a list response body.
fn gists_from_response(response: &HttpResponse) -> Result<Vec<Gist>> {
    match response.json() {
        Some(Value::Array(items)) => return Ok(decode_gists(&items)),
        Some(Value::Object(object)) => {
            if let Some(message) = object.get("message").and_then(Value::as_str) {
                return Err(GistError::ApiProvided(message.to_string()));
            }
        }
        _ => {}
    }

    if !response.is_success() {
        return Err(TransportError::Status(response.status).into());
    }
    Err(GistError::ObjectSerialization(
        "Didn't get a JSON array of gists in response".to_string(),
    ))
}

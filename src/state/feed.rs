// Gist feed state management.
// Merges paginated pages into one list, persists snapshots, and falls back to them offline.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::cache::SnapshotCache;
use crate::error::{GistError, Result};
use crate::github::{Collection, Gist, GistClient, Transport};

/// Loading state of a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded)
    }
}

/// What a load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedUpdate {
    /// Gists received from the API.
    pub fetched: usize,
    /// Whether the snapshot was written.
    pub saved: bool,
    /// Whether the items came from the snapshot because the API was unreachable.
    pub offline: bool,
}

/// The in-memory list of one collection, backed by its snapshot.
pub struct GistFeed<T> {
    client: GistClient<T>,
    snapshots: SnapshotCache,
    collection: Collection,
    items: Vec<Gist>,
    next_cursor: Option<String>,
    state: LoadingState,
    offline: bool,
}

impl<T: Transport> GistFeed<T> {
    pub fn new(client: GistClient<T>, snapshots: SnapshotCache, collection: Collection) -> Self {
        Self {
            client,
            snapshots,
            collection,
            items: Vec::new(),
            next_cursor: None,
            state: LoadingState::Idle,
            offline: false,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn items(&self) -> &[Gist] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether another page can be loaded.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn state(&self) -> &LoadingState {
        &self.state
    }

    /// When the collection's snapshot was last written.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.snapshots.saved_at(self.snapshot_name())
    }

    /// Load the first page, replacing the current items.
    ///
    /// If the API cannot be reached the snapshot is shown instead (empty if
    /// there is none) and the feed is marked offline.
    pub async fn load_first(&mut self) -> Result<FeedUpdate> {
        self.state = LoadingState::Loading;

        match self.client.list(self.collection, None).await {
            Ok(page) => {
                let fetched = page.gists.len();
                self.items = page.gists;
                self.offline = false;
                Ok(self.finish_page(fetched, page.next_cursor))
            }
            Err(e) if e.is_offline() => {
                warn!(collection = self.snapshot_name(), error = %e, "API unreachable; showing snapshot");
                self.items = self.snapshots.load(self.snapshot_name()).unwrap_or_default();
                self.next_cursor = None;
                self.offline = true;
                self.state = LoadingState::Loaded;
                Ok(FeedUpdate {
                    fetched: 0,
                    saved: false,
                    offline: true,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Load the page after the last one and append it.
    /// Returns `Ok(None)` when there is no further page.
    pub async fn load_next(&mut self) -> Result<Option<FeedUpdate>> {
        let Some(cursor) = self.next_cursor.clone() else {
            return Ok(None);
        };
        self.state = LoadingState::Loading;

        match self.client.list(self.collection, Some(&cursor)).await {
            Ok(page) => {
                let fetched = page.gists.len();
                self.items.extend(page.gists);
                Ok(Some(self.finish_page(fetched, page.next_cursor)))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Delete the gist at `index` remotely and drop it from the feed.
    /// If the API call fails the gist stays where it was.
    pub async fn delete(&mut self, index: usize) -> Result<Gist> {
        let Some(gist) = self.items.get(index).cloned() else {
            return Err(GistError::OutOfRange {
                index,
                len: self.items.len(),
            });
        };

        self.client.delete(&gist.id).await?;

        self.items.remove(index);
        if !self.snapshots.save(self.snapshot_name(), &self.items) {
            warn!(collection = self.snapshot_name(), "could not update snapshot after delete");
        }
        info!(id = %gist.id, "deleted gist");
        Ok(gist)
    }

    fn finish_page(&mut self, fetched: usize, next_cursor: Option<String>) -> FeedUpdate {
        self.next_cursor = next_cursor;
        self.state = LoadingState::Loaded;
        let saved = self.snapshots.save(self.snapshot_name(), &self.items);

        FeedUpdate {
            fetched,
            saved,
            offline: false,
        }
    }

    fn fail(&mut self, err: GistError) -> GistError {
        self.next_cursor = None;
        self.state = LoadingState::Error(err.to_string());
        err
    }

    fn snapshot_name(&self) -> &'static str {
        self.collection.snapshot_name()
    }
}

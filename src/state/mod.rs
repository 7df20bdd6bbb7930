// Application-side state.
// Gist feeds that merge pages and fall back to snapshots when offline.

pub mod feed;

pub use feed::{FeedUpdate, GistFeed, LoadingState};

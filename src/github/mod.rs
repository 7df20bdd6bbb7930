// GitHub Gist API module.
// Provides the client, request routing, transport, and gist types.

pub mod client;
pub mod endpoints;
pub mod pagination;
pub mod router;
pub mod transport;
pub mod types;

pub use client::GistClient;
pub use endpoints::GistPage;
pub use router::{Route, Router};
pub use transport::{
    HttpRequest, HttpResponse, ReqwestTransport, RequestBody, Transport, TransportError,
};
pub use types::*;

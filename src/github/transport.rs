// HTTP transport for the Gist API.
// Executes routed requests and keeps a conditional-GET response cache that can be cleared.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::{
    Client, Method, StatusCode,
    header::{ETAG, HeaderMap, HeaderValue, IF_NONE_MATCH},
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport-level failure.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No usable response arrived (connection, DNS, TLS, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[source] BoxError),

    /// A response arrived but its status is not acceptable for the operation.
    #[error("unacceptable status: {0}")]
    Status(StatusCode),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(Box::new(err))
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// URL-encoded form fields, in order.
    Form(Vec<(String, String)>),
}

/// A fully-formed request, ready for a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Status, headers and raw body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON, or `None` if it is not JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Executes HTTP requests on behalf of the API client and OAuth flow.
///
/// Every call completes exactly once, with either a response (of any status)
/// or a transport error.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send a request and collect the full response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Forget every cached response.
    fn clear_cache(&self);
}

struct CachedResponse {
    etag: HeaderValue,
    response: HttpResponse,
}

/// Transport backed by `reqwest`, with an ETag response cache for GETs.
pub struct ReqwestTransport {
    client: Client,
    cache: Mutex<HashMap<Url, CachedResponse>>,
}

impl ReqwestTransport {
    /// Create a transport sending the given user agent.
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of responses currently cached.
    pub fn cached_responses(&self) -> usize {
        self.cache().len()
    }

    async fn send(
        &self,
        request: &HttpRequest,
        etag: Option<HeaderValue>,
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(etag) = etag {
            builder = builder.header(IF_NONE_MATCH, etag);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<Url, CachedResponse>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let cacheable = request.method == Method::GET;
        let etag = if cacheable {
            self.cache().get(&request.url).map(|cached| cached.etag.clone())
        } else {
            None
        };
        let revalidating = etag.is_some();

        let mut response = self.send(&request, etag).await?;

        if cacheable && response.status == StatusCode::NOT_MODIFIED {
            if let Some(cached) = self.cache().get(&request.url) {
                debug!(url = %request.url, "serving cached response");
                return Ok(cached.response.clone());
            }
            if revalidating {
                // Cache was cleared while the request was in flight
                debug!(url = %request.url, "cached response gone; fetching again");
                response = self.send(&request, None).await?;
            }
        }

        if cacheable && response.status.is_success() {
            if let Some(etag) = response.headers.get(ETAG) {
                self.cache().insert(
                    request.url,
                    CachedResponse {
                        etag: etag.clone(),
                        response: response.clone(),
                    },
                );
            }
        }

        Ok(response)
    }

    fn clear_cache(&self) {
        let mut cache = self.cache();
        debug!(entries = cache.len(), "clearing response cache");
        cache.clear();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    // Scripted transport for unit tests: records requests, replays canned responses.

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    use super::*;

    pub(crate) struct FakeTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
        pub(crate) cache_clears: AtomicUsize,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                cache_clears: AtomicUsize::new(0),
            }
        }

        pub(crate) fn respond(&self, status: u16, body: &str) -> &Self {
            self.respond_with_headers(status, &[], body)
        }

        pub(crate) fn respond_with_headers(
            &self,
            status: u16,
            headers: &[(&str, &str)],
            body: &str,
        ) -> &Self {
            let mut map = HeaderMap::new();
            for (name, value) in headers {
                map.insert(
                    HeaderName::from_bytes(name.as_bytes()).unwrap(),
                    HeaderValue::from_str(value).unwrap(),
                );
            }
            let response = HttpResponse::new(
                StatusCode::from_u16(status).unwrap(),
                map,
                body.as_bytes().to_vec(),
            );
            self.responses.lock().unwrap().push_back(Ok(response));
            self
        }

        pub(crate) fn fail(&self, message: &str) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(TransportError::Request(message.to_string().into())));
            self
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        pub(crate) fn clears(&self) -> usize {
            self.cache_clears.load(Ordering::SeqCst)
        }
    }

    impl Transport for FakeTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
        }

        fn clear_cache(&self) {
            self.cache_clears.fetch_add(1, Ordering::SeqCst);
        }
    }
}

//! Mock transport for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::fetch::{FetchError, Transport};

#[derive(Debug, Clone)]
enum MockReply {
    Body(Vec<u8>),
    Network(String),
    Status(u16),
}

#[derive(Debug, Clone)]
struct MockRoute {
    reply: MockReply,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, MockRoute>,
    requests: Vec<String>,
}

/// Mock implementation of the Transport trait.
///
/// Provides controllable behavior for testing:
/// - Serve configurable bodies per URL
/// - Simulate network failures and HTTP error statuses
/// - Delay responses to exercise timeouts
/// - Record every request for assertions
///
/// Unknown URLs answer with HTTP 404. Clones share state, so a test can
/// keep one handle and hand another to a [`Fetcher`](crate::fetch::Fetcher).
///
/// # Example
///
/// ```rust,ignore
/// use texvault_core::testing::MockTransport;
///
/// let transport = MockTransport::new();
/// transport.set_response("http://x/a.png", vec![1, 2, 3]);
///
/// let fetcher = Fetcher::new(Arc::new(transport.clone()), &FetchConfig::default())?;
/// fetcher.fetch("http://x/a.png", fetcher.timeout())?;
/// assert_eq!(transport.request_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_reply(&self, url: &str, reply: MockReply) {
        let mut state = self.state();
        let delay = state.routes.get(url).and_then(|r| r.delay);
        state
            .routes
            .insert(url.to_string(), MockRoute { reply, delay });
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Serve `body` at `url`.
    pub fn set_response(&self, url: &str, body: Vec<u8>) {
        self.set_reply(url, MockReply::Body(body));
    }

    /// Serve a JSON document at `url`.
    pub fn set_json(&self, url: &str, value: &Value) {
        self.set_response(url, value.to_string().into_bytes());
    }

    /// Fail requests to `url` with a network error.
    pub fn set_failure(&self, url: &str, reason: &str) {
        self.set_reply(url, MockReply::Network(reason.to_string()));
    }

    /// Answer requests to `url` with an HTTP error status.
    pub fn set_status(&self, url: &str, status: u16) {
        self.set_reply(url, MockReply::Status(status));
    }

    /// Delay the reply for `url`.
    pub fn set_delay(&self, url: &str, delay: Duration) {
        let mut state = self.state();
        let route = state.routes.entry(url.to_string()).or_insert(MockRoute {
            reply: MockReply::Status(404),
            delay: None,
        });
        route.delay = Some(delay);
    }

    /// Remove the delay for `url`.
    pub fn clear_delay(&self, url: &str) {
        if let Some(route) = self.state().routes.get_mut(url) {
            route.delay = None;
        }
    }

    /// Remove the route for `url`, so it answers 404 again.
    pub fn remove(&self, url: &str) {
        self.state().routes.remove(url);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// All requested URLs, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    /// Total number of requests made.
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Number of requests made to `url`.
    pub fn requests_for(&self, url: &str) -> usize {
        self.state().requests.iter().filter(|u| *u == url).count()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let route = {
            let mut state = self.state();
            state.requests.push(url.to_string());
            state.routes.get(url).cloned()
        };

        let Some(route) = route else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        };

        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        match route.reply {
            MockReply::Body(body) => Ok(body),
            MockReply::Network(reason) => Err(FetchError::network(url, reason)),
            MockReply::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}

//! Test utilities for cross-crate integration tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use tokio::runtime::Runtime;
use trustdoc_crypto::KdfParams;
use trustdoc_document::{issue_document, DocumentSource, TransportError, TrustPayload};
use trustdoc_keys::RootKey;

pub const TEST_PASSPHRASE: &str = "integration-passphrase";

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Root key sealed with [`TEST_PASSPHRASE`] and fast KDF parameters.
pub fn test_root_key(name: &str) -> RootKey {
    RootKey::generate(TEST_PASSPHRASE, name, "integration", KdfParams::insecure_fast())
        .expect("Failed to generate root key")
}

/// Armored document listing `urls`, rooted at and signed by `key`.
pub fn issue_for(key: &RootKey, urls: &[&str]) -> String {
    let payload = TrustPayload::new(urls.iter().copied(), key.public_key());
    issue_document(&payload, key, TEST_PASSPHRASE).expect("Failed to issue document")
}

/// In-memory mirror set. Unknown URLs time out.
#[derive(Default)]
pub struct TestMirrors {
    served: HashMap<String, Vec<u8>>,
    contacted: Mutex<Vec<String>>,
}

impl TestMirrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.served.insert(url.to_string(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn contacted(&self) -> Vec<String> {
        self.contacted.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl DocumentSource for TestMirrors {
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if let Ok(mut contacted) = self.contacted.lock() {
            contacted.push(url.to_string());
        }
        self.served
            .get(url)
            .cloned()
            .ok_or(TransportError::Timeout(timeout))
    }
}

/// Canned `(status, body)` per request path.
type Routes = Arc<RwLock<HashMap<String, (StatusCode, String)>>>;

/// Local axum server on an ephemeral port, driven by its own runtime.
///
/// Bind first to learn the URL, then register the canned responses.
/// Unregistered paths answer 404.
pub struct TestHttpServer {
    runtime: Runtime,
    routes: Routes,
    base_url: String,
}

impl TestHttpServer {
    pub fn bind() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("Failed to build test runtime");
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let routes = Routes::default();
        let app = Router::new().fallback(canned).with_state(routes.clone());
        runtime.spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Test server stopped");
            }
        });

        Self {
            runtime,
            routes,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Answer every request for `path` with `status` and `body`.
    pub fn serve_text(&self, path: &str, status: StatusCode, body: impl Into<String>) {
        if let Ok(mut routes) = self.routes.write() {
            routes.insert(path.to_string(), (status, body.into()));
        }
    }

    /// Stop serving; the port is closed once this returns.
    pub fn shutdown(self) {
        self.runtime.shutdown_timeout(Duration::from_secs(1));
    }
}

async fn canned(State(routes): State<Routes>, uri: Uri) -> (StatusCode, String) {
    routes
        .read()
        .ok()
        .and_then(|routes| routes.get(uri.path()).cloned())
        .unwrap_or((StatusCode::NOT_FOUND, String::new()))
}

/// Listener that completes the TCP handshake but never accepts, so requests
/// hang until the client times out. Keep it alive for the duration of the test.
pub fn hung_listener(path: &str) -> (std::net::TcpListener, String) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind hung listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    (listener, format!("http://{}{}", addr, path))
}

/// URL on a local port nobody is listening on.
pub fn closed_url(path: &str) -> String {
    let (listener, url) = hung_listener(path);
    drop(listener);
    url
}

//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use synergia_domain::{DomainServices, Store};
use synergia_server::{AppState, SESSION_HEADER, Server, ServerConfig};
use synergia_session::{CacheConfig, MockProvider, SessionCache, SessionRecord, SessionVerifier};

/// Session id of the default test user.
pub const ALICE_SESSION: &str = "sess_alice";
/// Session id of a second, unrelated user.
pub const BOB_SESSION: &str = "sess_bob";

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Identity provider behind the verifier.
    pub provider: Arc<MockProvider>,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
    /// Temporary directory holding the database.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a new test server with two active users.
    pub async fn start() -> Result<Self> {
        Self::start_with_cache(CacheConfig::default()).await
    }

    /// Start a new test server with a custom verification cache.
    pub async fn start_with_cache(cache: CacheConfig) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let addr = find_available_port().await?;

        let provider = Arc::new(
            MockProvider::new()
                .with_session(SessionRecord::new(ALICE_SESSION, "user_alice", "active"))
                .with_session(SessionRecord::new(BOB_SESSION, "user_bob", "active")),
        );
        let verifier = SessionVerifier::new(SessionCache::new(cache), provider.clone())
            .with_timeout(Duration::from_secs(5));

        let store = Store::open(temp_dir.path().join("synergia.db"))?;
        let services = DomainServices::new(Arc::new(store));

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);
        let server = Server::from_state(AppState::new(config, verifier, services));
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            provider,
            _handle: handle,
            temp_dir,
        })
    }

    /// Get the base URL for the API.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Authenticated GET as `session`.
    pub fn get_as(&self, session: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header(SESSION_HEADER, session)
    }

    /// Authenticated POST as `session`.
    pub fn post_as(&self, session: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header(SESSION_HEADER, session)
    }

    /// Authenticated PUT as `session`.
    pub fn put_as(&self, session: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).header(SESSION_HEADER, session)
    }

    /// Authenticated PATCH as `session`.
    pub fn patch_as(&self, session: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).header(SESSION_HEADER, session)
    }

    /// Authenticated DELETE as `session`.
    pub fn delete_as(&self, session: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).header(SESSION_HEADER, session)
    }

    /// Authenticated GET as the default user.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.get_as(ALICE_SESSION, path)
    }

    /// Authenticated POST as the default user.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.post_as(ALICE_SESSION, path)
    }

    /// Authenticated DELETE as the default user.
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.delete_as(ALICE_SESSION, path)
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self.client.get(self.url("/health")).send().await?;
        Ok(resp.status().is_success())
    }

    /// Create an enabled model and return its id.
    pub async fn create_model(&self, name: &str) -> Result<String> {
        let resp = self
            .post("/models")
            .json(&json!({
                "name": name,
                "provider": "openai",
                "price_per_million_tokens": 2.5
            }))
            .send()
            .await?;
        anyhow::ensure!(resp.status().as_u16() == 201, "model create failed: {}", resp.status());
        id_of(resp.json().await?)
    }

    /// Create a chat for `session` and return its id.
    pub async fn create_chat(&self, session: &str, title: &str) -> Result<String> {
        let resp = self
            .post_as(session, "/chats")
            .json(&json!({ "title": title }))
            .send()
            .await?;
        anyhow::ensure!(resp.status().as_u16() == 201, "chat create failed: {}", resp.status());
        id_of(resp.json().await?)
    }
}

/// Extract the `id` field of a JSON object.
pub fn id_of(value: Value) -> Result<String> {
    value["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("response has no id: {}", value))
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/api/v1/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}

#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

use blog_api_rust::config::{AppConfig, Environment, PasswordConfig};
use blog_api_rust::database::models::User;
use blog_api_rust::database::DatabaseManager;
use blog_api_rust::{AppState, Server};

/// A real server on an ephemeral port, backed by its own in-memory database.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Creates a user straight through the credential store.
    pub async fn create_user(&self, username: &str, name: &str, password: &str) -> Result<User> {
        let user = self
            .state
            .credentials
            .upsert(User::new(username, name), Some(password))
            .await?;
        Ok(user)
    }

    /// POST /api/auth and return the token.
    pub async fn api_token(&self, client: &Client, username: &str, password: &str) -> Result<String> {
        let res = client
            .post(self.url("/api/auth"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body = res.json::<Value>().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("response carries no token")
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    let mut config = AppConfig::for_environment(Environment::Development);
    config.security.password = PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };

    let pool = DatabaseManager::in_memory().await?;
    let state = AppState::new(&config, pool)?;

    let server = Server::bind("127.0.0.1:0", state.clone(), true).await?;
    let base_url = format!("http://{}", server.local_addr()?);
    tokio::spawn(server.run_until(std::future::pending()));

    let server = TestServer { base_url, state };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Browser-like client: keeps cookies, does not follow redirects.
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("reqwest client")
}

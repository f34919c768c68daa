use crate::config::{AppConfig, Environment, PasswordConfig};
use crate::database::models::User;
use crate::database::DatabaseManager;
use crate::state::AppState;

/// Application state over a private in-memory database, with cheap password hashing.
pub struct TestContext {
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Self {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.security.password = PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };

        let pool = DatabaseManager::in_memory()
            .await
            .expect("in-memory database");
        let state = AppState::new(&config, pool).expect("test state");

        Self { state }
    }

    /// Creates a user whose display name is the capitalised username.
    pub async fn register(&self, username: &str, password: &str) -> User {
        let mut name = username.to_string();
        if let Some(first) = name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }

        self.state
            .credentials
            .upsert(User::new(username, name), Some(password))
            .await
            .expect("register test user")
    }
}

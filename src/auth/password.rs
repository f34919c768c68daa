use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::database::manager::StoreError;
use crate::database::models::{User, ValidationError};
use crate::database::Repository;

/// Owns user records and password verification on top of the repository.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn Repository>,
    params: Params,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn Repository>, config: PasswordConfig) -> Result<Self, StoreError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        Ok(Self { repo, params })
    }

    /// Salted Argon2id hash; a fresh salt per call so equal inputs hash differently.
    pub fn hash_password(&self, plaintext: &str) -> Result<String, StoreError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let salt = SaltString::generate(&mut OsRng);

        let hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| StoreError::Hashing(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    /// Constant-time comparison against the stored hash. A corrupt hash never matches.
    pub fn verify_password(&self, user: &User, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(&user.password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(username = %user.username, "Stored password hash unreadable: {}", e);
                return false;
            }
        };

        // Work factors come from the PHC string, not from self.params
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.repo.get_user_by_username(username).await
    }

    /// Writes the user, hashing `new_password` first when given. Without one the stored
    /// hash is kept, so a brand new user must come with a password.
    pub async fn upsert(&self, mut user: User, new_password: Option<&str>) -> Result<User, StoreError> {
        user.validate()?;

        match new_password {
            Some(password) if !password.is_empty() => {
                user.password_hash = self.hash_password(password)?;
            }
            _ => {
                user.password_hash.clear();
                match self.repo.get_user_by_username(&user.username).await {
                    Ok(_) => {}
                    Err(StoreError::NotFound(_)) => {
                        return Err(ValidationError::new("password", "empty").into());
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        self.repo.save_user(user).await
    }

    /// Creates a brand new account. Fails with `AlreadyExists` rather than touching an
    /// existing one, however many registrations race for the name.
    pub async fn register(&self, mut user: User, password: &str) -> Result<User, StoreError> {
        user.validate()?;
        if password.is_empty() {
            return Err(ValidationError::new("password", "empty").into());
        }

        user.password_hash = self.hash_password(password)?;
        self.repo.create_user(user).await
    }

    pub async fn remove(&self, username: &str) -> Result<(), StoreError> {
        self.repo.delete_user(username).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::{DatabaseManager, SqliteRepository};

    /// Cheap work factors so the suite stays fast.
    pub(crate) fn fast_params() -> PasswordConfig {
        PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    pub(crate) async fn store() -> CredentialStore {
        let pool = DatabaseManager::in_memory().await.unwrap();
        CredentialStore::new(Arc::new(SqliteRepository::new(pool)), fast_params()).unwrap()
    }

    fn with_hash(hash: String) -> User {
        let mut user = User::new("alice", "Alice");
        user.password_hash = hash;
        user
    }

    #[tokio::test]
    async fn hash_then_verify_round_trips() {
        let store = store().await;
        for password in ["pw1", "correct horse battery staple", "ünïcødé", ""] {
            let user = with_hash(store.hash_password(password).unwrap());
            assert!(store.verify_password(&user, password), "{password}");
        }
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let store = store().await;
        let a = store.hash_password("pw1").unwrap();
        let b = store.hash_password("pw1").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn single_bit_mutations_fail() {
        let store = store().await;
        let hash = store.hash_password("pw1").unwrap();

        // Flip one bit of the password.
        let mut bytes = b"pw1".to_vec();
        bytes[2] ^= 0x01;
        let mutated = String::from_utf8(bytes).unwrap();
        assert!(!store.verify_password(&with_hash(hash.clone()), &mutated));

        // Flip one bit in the trailing digest of the hash.
        let mut bytes = hash.into_bytes();
        let last = bytes.len() - 2;
        bytes[last] ^= 0x01;
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(!store.verify_password(&with_hash(tampered), "pw1"));
    }

    #[tokio::test]
    async fn garbage_hash_never_matches() {
        let store = store().await;
        assert!(!store.verify_password(&with_hash("not-a-phc-string".into()), "pw1"));
        assert!(!store.verify_password(&with_hash(String::new()), ""));
    }

    #[tokio::test]
    async fn upsert_hashes_and_preserves() {
        let store = store().await;
        let created = store.upsert(User::new("alice", "Alice"), Some("pw1")).await.unwrap();
        assert!(created.id >= 1);
        assert_ne!(created.password_hash, "pw1");

        let renamed = store.upsert(User::new("alice", "Alice B."), None).await.unwrap();
        assert_eq!(renamed.password_hash, created.password_hash);

        let found = store.find_by_username("alice").await.unwrap();
        assert_eq!(found.display_name, "Alice B.");
        assert!(store.verify_password(&found, "pw1"));
    }

    #[tokio::test]
    async fn upsert_rejects_new_user_without_password_and_empty_username() {
        let store = store().await;
        let err = store.upsert(User::new("bob", "Bob"), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.field == "password"));

        let err = store.upsert(User::new("", "Nobody"), Some("pw")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.field == "username"));
    }

    #[tokio::test]
    async fn register_refuses_taken_names_and_empty_passwords() {
        let store = store().await;
        let alice = store.register(User::new("alice", "Alice"), "pw1").await.unwrap();
        assert!(store.verify_password(&alice, "pw1"));

        let err = store.register(User::new("alice", "Mallory"), "evil").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        let stored = store.find_by_username("alice").await.unwrap();
        assert!(store.verify_password(&stored, "pw1"));
        assert!(!store.verify_password(&stored, "evil"));

        let err = store.register(User::new("bob", "Bob"), "").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.field == "password"));
    }
}

//! Identity resolution: passwords, encrypted cookie sessions for the web UI and signed
//! bearer tokens for the API. The session and token halves never depend on each other.

pub mod password;
pub mod session;
pub mod token;

pub use password::CredentialStore;
pub use session::{FormState, Session, SessionError, SessionManager};
pub use token::{active_user, ClaimsData, TokenError, TokenService, ACTIVE_USER_CLAIM};

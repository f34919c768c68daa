// handlers/public/mod.rs - Public handlers (no identity required)
//
// Token acquisition, the read side of the post API, the browsable pages and the
// registration / login forms that establish a session.
pub mod auth;
pub mod health;
pub mod pages;
pub mod posts;

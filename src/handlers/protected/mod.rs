// handlers/protected/mod.rs - Handlers behind a guard
//
// Pages here sit behind the session guard, API routes behind the bearer-token guard.
// Both guards leave the resolved `AuthUser` in the request extensions.
pub mod pages;
pub mod posts;

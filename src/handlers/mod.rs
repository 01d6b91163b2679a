// handlers/mod.rs - HTTP handlers grouped by authentication requirement
//
// public/     - no token required (catalog reads, sign-in flows)
// protected/  - behind jwt_auth_middleware, guarded per route by permission

pub mod protected;
pub mod public;
pub mod utils;

// handlers/protected/mod.rs - Routes behind jwt_auth_middleware
//
// Every handler receives the resolved AuthPrincipal and checks its own
// permission before touching the store.

pub mod admins;
pub mod buildings;
pub mod dashboard;
pub mod notifications;
pub mod paths;
pub mod users;

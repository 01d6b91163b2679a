// handlers/public/mod.rs - Routes reachable without a bearer token

pub mod auth;
pub mod buildings;
pub mod paths;
pub mod system;

pub mod admin;
pub mod geo;
pub mod migrate;
pub mod server;
pub mod user;

#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Accounts, server-side sessions and per-user task lists behind a JSON API."]
#![doc = "The binary (`main.rs`) wires configuration, the store and the HTTP server;"]
#![doc = "everything else lives here so the integration tests can build the same app."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod session;
pub mod store;
pub mod tasks;

pub mod access;
pub mod app;
pub mod auth;
pub mod config;
pub mod configuration;
pub mod crypto;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod types;

#[cfg(test)]
pub mod testing;

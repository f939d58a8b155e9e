pub mod cli;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod server;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;

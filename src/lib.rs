pub mod api;
pub mod app;
pub mod config;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

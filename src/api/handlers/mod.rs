pub mod auth;
pub mod demo;
pub mod health;
pub mod me;
pub mod ping;

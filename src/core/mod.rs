pub mod config;
pub mod generation;
pub mod message;
pub mod models;
pub mod prompt;
pub mod session;

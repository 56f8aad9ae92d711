pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod seed;
pub mod service;
pub mod types;

pub use error::RelayError;

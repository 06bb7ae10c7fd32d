// src/lib.rs

pub mod config;
pub mod error;
pub mod exam;
pub mod handlers;
pub mod import;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

pub use routes::create_router;

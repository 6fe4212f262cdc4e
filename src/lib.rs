pub mod auth;
pub mod cli;
pub mod core;
pub mod error;
pub mod types;
pub mod web;

pub use web::{build_rocket, start_web_server};

pub mod cache;
pub mod config;
pub mod logging;
pub mod repositories;

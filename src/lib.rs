pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod logging;
pub mod types;

// Layered boundaries: ports in app, adapters in infra
pub mod app;
pub mod infra;

pub mod pipeline;

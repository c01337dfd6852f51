/*
[INPUT]:  Public API exports for the openkitx403-cli crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod server;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use server::{build_app, serve, serve_on};

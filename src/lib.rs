// Firestore Probe - connectivity check for Cloud Firestore

pub mod auth;
pub mod config;
pub mod probe;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use probe::{run, run_probe, ProbeDocument, ProbeReport};
pub use types::{ProbeError, ProbeResult, Stage};

//! Wires the core's external collaborators (Mongo source, Postgres
//! target, sled tailer) together and decides, at the top of a run,
//! whether to import and when to tail (C7, §4.7).

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::Config;
pub use error::RuntimeError;
pub use orchestrator::Orchestrator;

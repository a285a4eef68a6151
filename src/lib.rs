//! squid-bytecode library: class-file structural graph and OO design metrics.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;

pub use app::engine::{AnalysisInput, AnalysisReport, SquidEngine};
pub use config::EngineConfig;
pub use domain::provider::AnalysisError;

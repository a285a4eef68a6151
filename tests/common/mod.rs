//! Shared test utilities for integration tests.
//! This module is not compiled as a test binary; it is included by test files.
#![allow(dead_code)]

pub mod class_writer;
pub mod fixtures;
pub mod mock;

use squid_bytecode::app::engine::AnalysisReport;
use squid_bytecode::domain::ports::ClassSource;
use squid_bytecode::{EngineConfig, SquidEngine};

/// Analyze in-memory sources with a synthesized tree.
pub fn analyze(
    classes: &dyn ClassSource,
    libraries: &dyn ClassSource,
    config: EngineConfig,
) -> AnalysisReport {
    SquidEngine::new(config)
        .analyze_sources("tags", classes, libraries, None)
        .expect("analysis succeeds")
}

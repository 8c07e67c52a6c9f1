//! spotalert runner: configuration, channel wiring and the pipeline.
//!
//! This crate builds on `spotalert-core` to provide:
//! - TOML configuration with validation
//! - Environment secrets
//! - Channel construction from config + secrets
//! - The single-run pipeline orchestrator
//! - Tracing setup for the binary

pub mod channels;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod secrets;

pub use channels::build_channels;
pub use config::{ConfigError, GatewaySettings, PipelineConfig, TargetDayPolicy, DEFAULT_CONFIG_PATH};
pub use logging::init_tracing;
pub use pipeline::{
    Clock, FixedClock, Pipeline, PipelineError, PipelineState, RunOutcome, RunReport, SystemClock,
};
pub use secrets::Secrets;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
        assert_send::<Secrets>();
        assert_sync::<Secrets>();
    }

    #[test]
    fn pipeline_is_send_sync() {
        assert_send::<Pipeline>();
        assert_sync::<Pipeline>();
        assert_send::<RunReport>();
    }
}

//! Test harness utilities shared by the behavioural suites.

mod config_loader;
mod harness;
mod reporter;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use harness::{DaemonHarness, HarnessOptions, RawSession, response_value};
pub use reporter::{HealthEvent, RecordingHealthReporter};

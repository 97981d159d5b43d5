pub mod bridge;
pub mod browser;
pub mod compose;
pub mod config;
pub mod error;
pub mod expect;
pub mod interaction;
pub mod runner;
pub mod scenario;
pub mod selectors;

pub use config::RunnerConfig;
pub use error::VerifyError;
pub use runner::{RunReport, ScenarioRunner};
pub use scenario::{Scenario, Step, Target};

//! Mock of the page's remote-call bridge (`google.script.run`).

pub mod envelope;
pub mod mock;

pub use envelope::Envelope;
pub use mock::{expect_called, recorded_calls, BridgeCall, MockBridge, Reply};

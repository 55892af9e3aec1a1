//! Test utilities: scripted transport, fixtures and async helpers

pub mod async_helpers;
pub mod fixtures;
pub mod mock_transport;

pub use async_helpers::*;
pub use fixtures::*;
pub use mock_transport::{CallCounter, MockReply, MockTransport};

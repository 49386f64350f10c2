//! Helpers built on the [`Handle`](crate::Handle) contract: a simulated device
//! for tests and a tracing wrapper.

pub mod fake;
pub mod logger;

pub use fake::FakeDevice;
pub use logger::{LogSink, LoggingHandle, Sink, WriteSink};

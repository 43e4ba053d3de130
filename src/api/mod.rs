//! HTTP clients for the execution feed and the report endpoint.

mod sink_client;
mod source_client;
mod types;

pub use sink_client::ReportSink;
pub use source_client::ExecutionSource;
pub use types::*;

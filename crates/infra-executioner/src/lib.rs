// Tracer OME Infrastructure - Executioner Adapter
// Implements: Executioner (JSON over HTTP, ADR-002)

pub mod http_executioner;
pub mod tls;

pub use http_executioner::{ExecutionerConfig, HttpExecutioner};

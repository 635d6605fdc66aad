// Port Layer - Interfaces for external dependencies

pub mod executioner;
pub mod time_provider;

// Re-exports
pub use executioner::{Executioner, ExecutionerError};
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};

// Forwarder constants (ADR: No magic values)

/// Default capacity of the forward queue (matched pairs)
pub const DEFAULT_FORWARD_QUEUE_CAPACITY: usize = 1024;

/// Default number of settlement attempts per matched pair
pub const DEFAULT_FORWARD_MAX_ATTEMPTS: u32 = 5;

/// Default base delay between settlement attempts (500ms)
pub const DEFAULT_FORWARD_BASE_DELAY_MS: u64 = 500;

/// Exponential backoff factor between attempts
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Upper bound on a single backoff delay (1 minute)
pub const MAX_BACKOFF_DELAY_MS: u64 = 60_000;

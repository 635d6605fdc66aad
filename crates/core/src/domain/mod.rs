// Domain Layer - Order book, orders and matching

pub mod book;
pub mod error;
pub mod external;
pub mod fill;
pub mod order;

// Re-exports
pub use book::{Book, PriceLevels};
pub use error::DomainError;
pub use external::{ExternalBook, ExternalFill, ExternalOrder, ExternalParseError};
pub use fill::{Fill, MatchResult, MatchedPair, OrderStatus};
pub use order::{Order, OrderId, OrderSide};

/// Transaction hash returned by the executioner
pub type TxHash = alloy_primitives::B256;

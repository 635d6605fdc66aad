// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order {0} has expired")]
    Expired(String),

    #[error("Order targets market {order_market}, book is {book_market}")]
    WrongMarket {
        order_market: String,
        book_market: String,
    },

    #[error("Order {0} is already in the book")]
    DuplicateOrder(String),

    #[error("Cannot fill {amount} of order {id}: only {remaining} remaining")]
    Overfill {
        id: String,
        amount: String,
        remaining: String,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

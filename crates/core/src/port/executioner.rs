// Executioner Port
// Abstraction over the service that validates orders and settles matched pairs on chain

use crate::domain::{Order, TxHash};
use async_trait::async_trait;
use thiserror::Error;

/// Executioner errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionerError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Executioner rejected request with status {0}")]
    Rejected(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Executioner trait
///
/// Implementations:
/// - HttpExecutioner: JSON over HTTP(S) (infra-executioner crate)
/// - MockExecutioner: scripted behaviour for tests
#[async_trait]
pub trait Executioner: Send + Sync {
    /// Ask whether the executioner would accept this order
    ///
    /// Used before an order is admitted to a book. Returns `Ok(false)` when the
    /// executioner answered but refused the order.
    async fn check_order_validity(&self, order: &Order) -> Result<bool, ExecutionerError>;

    /// Forward a matched maker/taker pair for settlement
    ///
    /// # Returns
    /// Hash of the settlement transaction
    async fn send_matched_orders(
        &self,
        maker: &Order,
        taker: &Order,
    ) -> Result<TxHash, ExecutionerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::OrderId;
    use alloy_primitives::keccak256;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock executioner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Accept every order and settle every pair
        Accept,
        /// Report every order as invalid (settlement still succeeds)
        RejectOrders,
        /// Fail the first N settlements, then succeed
        FailFirst(usize),
        /// Fail every settlement
        AlwaysFail,
    }

    /// Mock Executioner for testing
    pub struct MockExecutioner {
        behavior: MockBehavior,
        send_attempts: AtomicUsize,
        check_calls: AtomicUsize,
        settled: Mutex<Vec<(OrderId, OrderId)>>,
    }

    impl MockExecutioner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                send_attempts: AtomicUsize::new(0),
                check_calls: AtomicUsize::new(0),
                settled: Mutex::new(Vec::new()),
            }
        }

        pub fn accepting() -> Self {
            Self::new(MockBehavior::Accept)
        }

        /// Number of `send_matched_orders` calls, failed ones included
        pub fn send_attempts(&self) -> usize {
            self.send_attempts.load(Ordering::SeqCst)
        }

        pub fn check_calls(&self) -> usize {
            self.check_calls.load(Ordering::SeqCst)
        }

        /// Successfully settled `(maker, taker)` pairs, in order
        pub fn settled(&self) -> Vec<(OrderId, OrderId)> {
            self.settled
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    #[async_trait]
    impl Executioner for MockExecutioner {
        async fn check_order_validity(&self, _order: &Order) -> Result<bool, ExecutionerError> {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            Ok(!matches!(self.behavior, MockBehavior::RejectOrders))
        }

        async fn send_matched_orders(
            &self,
            maker: &Order,
            taker: &Order,
        ) -> Result<TxHash, ExecutionerError> {
            let attempt = self.send_attempts.fetch_add(1, Ordering::SeqCst);

            let fail = match self.behavior {
                MockBehavior::FailFirst(n) => attempt < n,
                MockBehavior::AlwaysFail => true,
                _ => false,
            };
            if fail {
                return Err(ExecutionerError::Http("connection refused".to_string()));
            }

            self.settled
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((maker.id, taker.id));

            let mut preimage = maker.id.to_vec();
            preimage.extend_from_slice(taker.id.as_slice());
            Ok(keccak256(preimage))
        }
    }
}

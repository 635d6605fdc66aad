// Market Service - books per market, order entry and cancellation

pub mod submit;


pub use submit::SubmitRequest;

use crate::application::forwarder::{ForwardSender, ForwardStatsSnapshot};
use crate::domain::{Book, MatchResult, Order, OrderId};
use crate::error::{AppError, Result};
use crate::port::{Executioner, TimeProvider};
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Behavioural switches for the market service
#[derive(Debug, Clone)]
pub struct MarketSettings {
    /// Ask the executioner to vet every order before it reaches a book
    pub validate_orders: bool,
    /// Create a book on first submit to an unknown market
    pub auto_create: bool,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            validate_orders: false,
            auto_create: true,
        }
    }
}

/// Aggregate counters for `admin.stats`
#[derive(Debug, Clone)]
pub struct MarketStats {
    pub markets: usize,
    pub resting_orders: usize,
    pub forward: ForwardStatsSnapshot,
}

/// Market Service
///
/// Each book sits behind its own mutex, so markets match independently while
/// submissions to one market are serialized.
pub struct MarketService {
    books: RwLock<HashMap<Address, Arc<Mutex<Book>>>>,
    executioner: Arc<dyn Executioner>,
    time_provider: Arc<dyn TimeProvider>,
    forward_queue: ForwardSender,
    settings: MarketSettings,
}

impl MarketService {
    pub fn new(
        executioner: Arc<dyn Executioner>,
        time_provider: Arc<dyn TimeProvider>,
        forward_queue: ForwardSender,
        settings: MarketSettings,
    ) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            executioner,
            time_provider,
            forward_queue,
            settings,
        }
    }

    /// Register a new, empty market
    pub async fn create_market(&self, market: Address) -> Result<()> {
        let mut books = self.books.write().await;
        if books.contains_key(&market) {
            return Err(AppError::Conflict(format!("Market {} already exists", market)));
        }
        books.insert(market, Arc::new(Mutex::new(Book::new(market))));
        info!(market = %market, "Market created");
        Ok(())
    }

    /// All known markets, sorted
    pub async fn markets(&self) -> Vec<Address> {
        let mut markets: Vec<Address> = self.books.read().await.keys().copied().collect();
        markets.sort();
        markets
    }

    /// Snapshot of a market's book
    pub async fn book(&self, market: Address) -> Result<Book> {
        let book = self.existing_book(market).await?;
        let snapshot = book.lock().await.clone();
        Ok(snapshot)
    }

    /// Submit an order
    ///
    /// Matches immediately; resulting pairs are queued for settlement.
    pub async fn submit(&self, req: SubmitRequest) -> Result<MatchResult> {
        let now = self.time_provider.now();
        let order = submit::build_order(&req, now)?;

        if self.settings.validate_orders {
            let valid = self.executioner.check_order_validity(&order).await?;
            if !valid {
                warn!(order_id = %order.id, "Executioner rejected order");
                return Err(AppError::Validation(format!(
                    "Order {} rejected by executioner",
                    order.id
                )));
            }
        }

        let book = if self.settings.auto_create {
            self.book_or_create(order.market).await
        } else {
            self.existing_book(order.market).await?
        };

        // Queue under the book lock so pairs leave in match order
        let mut book = book.lock().await;
        let result = book.submit(order, now)?;
        for pair in &result.matched {
            self.forward_queue.enqueue(pair.clone());
        }

        Ok(result)
    }

    /// Look up a resting order
    pub async fn order(&self, market: Address, id: OrderId) -> Result<Order> {
        let book = self.existing_book(market).await?;
        let book = book.lock().await;
        book.order(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found in {}", id, market)))
    }

    /// Cancel a resting order, returning the cancellation time
    pub async fn cancel(&self, market: Address, id: OrderId) -> Result<DateTime<Utc>> {
        let book = self.existing_book(market).await?;
        let now = self.time_provider.now();
        let cancelled = book.lock().await.cancel(id, now);
        cancelled.ok_or_else(|| AppError::NotFound(format!("Order {} not found in {}", id, market)))
    }

    /// Drop expired orders from every book
    pub async fn prune_expired(&self) -> usize {
        let now = self.time_provider.now();
        let books: Vec<_> = self.books.read().await.values().cloned().collect();

        let mut removed = 0;
        for book in books {
            removed += book.lock().await.prune_expired(now);
        }
        removed
    }

    pub async fn stats(&self) -> MarketStats {
        let books: Vec<_> = self.books.read().await.values().cloned().collect();

        let mut resting_orders = 0;
        for book in &books {
            let (bids, asks) = book.lock().await.depth();
            resting_orders += bids + asks;
        }

        MarketStats {
            markets: books.len(),
            resting_orders,
            forward: self.forward_queue.stats(),
        }
    }

    async fn existing_book(&self, market: Address) -> Result<Arc<Mutex<Book>>> {
        self.books
            .read()
            .await
            .get(&market)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Market {} not found", market)))
    }

    async fn book_or_create(&self, market: Address) -> Arc<Mutex<Book>> {
        if let Some(book) = self.books.read().await.get(&market) {
            return book.clone();
        }

        let mut books = self.books.write().await;
        books
            .entry(market)
            .or_insert_with(|| {
                info!(market = %market, "Market created on first order");
                Arc::new(Mutex::new(Book::new(market)))
            })
            .clone()
    }
}

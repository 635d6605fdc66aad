//! Order book for a single Tracer market, and the matching algorithm over it
//!
//! Each side is a `BTreeMap` of price levels; every level is a FIFO queue, so
//! walking levels best-first and each queue front-to-back gives price-time
//! priority.

use std::collections::{BTreeMap, VecDeque};

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::error::{DomainError, Result};
use super::fill::{MatchResult, MatchedPair, OrderStatus};
use super::order::{Order, OrderId, OrderSide};

pub type PriceLevels = BTreeMap<U256, VecDeque<Order>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    market: Address,
    bids: PriceLevels,
    asks: PriceLevels,
    ltp: U256,
    depth: (usize, usize),
    crossed: bool,
    spread: U256,
}

impl Book {
    /// Create an empty book for `market`
    pub fn new(market: Address) -> Self {
        Self {
            market,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            ltp: U256::ZERO,
            depth: (0, 0),
            crossed: false,
            spread: U256::ZERO,
        }
    }

    pub fn market(&self) -> Address {
        self.market
    }

    pub fn bids(&self) -> &PriceLevels {
        &self.bids
    }

    pub fn asks(&self) -> &PriceLevels {
        &self.asks
    }

    /// Last traded price (zero until the first trade)
    pub fn ltp(&self) -> U256 {
        self.ltp
    }

    /// Live order counts as `(bids, asks)`
    pub fn depth(&self) -> (usize, usize) {
        self.depth
    }

    pub fn crossed(&self) -> bool {
        self.crossed
    }

    pub fn spread(&self) -> U256 {
        self.spread
    }

    /// Best bid and best ask
    pub fn top(&self) -> (Option<U256>, Option<U256>) {
        (
            self.bids.last_key_value().map(|(price, _)| *price),
            self.asks.first_key_value().map(|(price, _)| *price),
        )
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flatten()
            .find(|order| order.id == id)
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.bids
            .values_mut()
            .chain(self.asks.values_mut())
            .flatten()
            .find(|order| order.id == id)
    }

    /// Iterate all resting orders, bids first
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.bids.values().chain(self.asks.values()).flatten()
    }

    /// Submit an order to the matching engine
    ///
    /// Whatever cannot be matched immediately rests in the book.
    pub fn submit(&mut self, mut order: Order, now: DateTime<Utc>) -> Result<MatchResult> {
        self.validate(&order, now)?;
        info!(order = %order, "Submitting order");

        let opposing_top = match order.side {
            OrderSide::Bid => self.top().1,
            OrderSide::Ask => self.top().0,
        };
        let crosses = opposing_top
            .map(|top| price_viable(top, order.price, order.side))
            .unwrap_or(false);

        let matched = if crosses {
            self.match_against(&mut order, now)?
        } else {
            debug!(order_id = %order.id, "Order does not cross the spread");
            Vec::new()
        };

        let order_id = order.id;
        let status = if order.is_filled() {
            OrderStatus::FullMatch
        } else {
            let status = if matched.is_empty() {
                OrderStatus::Placed
            } else {
                OrderStatus::PartialMatch
            };
            self.add_order(order);
            status
        };

        self.update(now);

        info!(
            order_id = %order_id,
            status = %status,
            fills = matched.len(),
            "Order processed"
        );

        Ok(MatchResult {
            order_id,
            status,
            matched,
        })
    }

    /// Cancel a resting order
    ///
    /// Returns the cancellation time, or `None` if no such order rests here.
    pub fn cancel(&mut self, id: OrderId, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let removed = remove_from(&mut self.bids, id).or_else(|| remove_from(&mut self.asks, id));
        let order = removed?;
        info!(order = %order, "Cancelled order");
        self.update(now);
        Some(now)
    }

    /// Drop resting orders that expired at or before `now`
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.live_count();
        self.update(now);
        let removed = before - self.live_count();
        if removed > 0 {
            info!(market = %self.market, removed, "Pruned expired orders");
        }
        removed
    }

    fn validate(&self, order: &Order, now: DateTime<Utc>) -> Result<()> {
        if order.market != self.market {
            return Err(DomainError::WrongMarket {
                order_market: order.market.to_string(),
                book_market: self.market.to_string(),
            });
        }
        if order.price.is_zero() {
            return Err(DomainError::InvalidOrder("price must be positive".to_string()));
        }
        if order.remaining.is_zero() {
            return Err(DomainError::InvalidOrder(
                "quantity must be positive".to_string(),
            ));
        }
        if order.is_expired(now) {
            return Err(DomainError::Expired(order.id.to_string()));
        }
        if self.order(order.id).is_some() {
            return Err(DomainError::DuplicateOrder(order.id.to_string()));
        }
        Ok(())
    }

    /// Walk the opposing side best-first, filling `taker` as far as prices allow
    fn match_against(
        &mut self,
        taker: &mut Order,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchedPair>> {
        let side = taker.side;
        let opposing = match side {
            OrderSide::Bid => &mut self.asks,
            OrderSide::Ask => &mut self.bids,
        };
        let levels: Box<dyn Iterator<Item = (&U256, &mut VecDeque<Order>)> + '_> = match side {
            OrderSide::Bid => Box::new(opposing.iter_mut()),
            OrderSide::Ask => Box::new(opposing.iter_mut().rev()),
        };

        let mut matched = Vec::new();
        let mut last_price = None;

        'levels: for (price, level) in levels {
            if !price_viable(*price, taker.price, side) {
                break;
            }

            for maker in level.iter_mut() {
                if taker.is_filled() {
                    break 'levels;
                }
                if maker.trader == taker.trader {
                    debug!(maker = %maker.id, taker = %taker.id, "Self-trade, skipping");
                    continue;
                }
                if maker.is_filled() || maker.is_expired(now) {
                    continue;
                }

                let amount = maker.remaining.min(taker.remaining);
                maker.fill(amount)?;
                taker.fill(amount)?;
                debug!(maker = %maker.id, taker = %taker.id, %amount, %price, "Filled");

                matched.push(MatchedPair {
                    maker: maker.clone(),
                    taker: taker.clone(),
                    quantity: amount,
                    price: *price,
                });
                last_price = Some(*price);
            }

            if taker.is_filled() {
                break;
            }
        }

        if let Some(price) = last_price {
            self.ltp = price;
            debug!(ltp = %price, "LTP updated");
        }

        Ok(matched)
    }

    fn add_order(&mut self, order: Order) {
        debug!(order = %order, "Resting order");
        let levels = match order.side {
            OrderSide::Bid => &mut self.bids,
            OrderSide::Ask => &mut self.asks,
        };
        levels.entry(order.price).or_default().push_back(order);
    }

    /// Re-establish book invariants after a mutation
    fn update(&mut self, now: DateTime<Utc>) {
        prune(&mut self.bids, now);
        prune(&mut self.asks, now);

        self.depth = (
            self.bids.values().map(VecDeque::len).sum(),
            self.asks.values().map(VecDeque::len).sum(),
        );

        let (bid, ask) = self.top();
        self.crossed = matches!((bid, ask), (Some(bid), Some(ask)) if bid >= ask);
        self.spread = match (bid, ask) {
            (Some(bid), Some(ask)) if ask > bid => ask - bid,
            _ => U256::ZERO,
        };
    }

    fn live_count(&self) -> usize {
        self.orders().count()
    }
}

/// Would a resting `opposite` price trade against an incoming order?
fn price_viable(opposite: U256, incoming: U256, incoming_side: OrderSide) -> bool {
    match incoming_side {
        OrderSide::Bid => opposite <= incoming,
        OrderSide::Ask => opposite >= incoming,
    }
}

fn prune(levels: &mut PriceLevels, now: DateTime<Utc>) {
    for orders in levels.values_mut() {
        orders.retain(|order| !order.is_filled() && !order.is_expired(now));
    }
    levels.retain(|_, orders| !orders.is_empty());
}

fn remove_from(levels: &mut PriceLevels, id: OrderId) -> Option<Order> {
    levels.values_mut().find_map(|orders| {
        let index = orders.iter().position(|order| order.id == id)?;
        orders.remove(index)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn market() -> Address {
        Address::with_last_byte(0xee)
    }

    fn order(trader: u8, side: OrderSide, price: u64, quantity: u64) -> Order {
        Order::new(
            Address::with_last_byte(trader),
            market(),
            side,
            U256::from(price),
            U256::from(quantity),
            now() + Duration::hours(1),
            now(),
            Bytes::new(),
        )
    }

    #[test]
    fn test_non_crossing_order_is_placed() {
        let mut book = Book::new(market());
        let result = book.submit(order(1, OrderSide::Bid, 100, 5), now()).unwrap();

        assert_eq!(result.status, OrderStatus::Placed);
        assert!(result.matched.is_empty());
        assert_eq!(book.depth(), (1, 0));
        assert_eq!(book.top(), (Some(U256::from(100u64)), None));
        assert_eq!(book.spread(), U256::ZERO);
    }

    #[test]
    fn test_full_match_at_maker_price() {
        let mut book = Book::new(market());
        let ask = order(1, OrderSide::Ask, 100, 5);
        let ask_id = ask.id;
        book.submit(ask, now()).unwrap();

        let bid = order(2, OrderSide::Bid, 105, 5);
        let result = book.submit(bid, now()).unwrap();

        assert_eq!(result.status, OrderStatus::FullMatch);
        let fills = result.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].maker, ask_id);
        assert_eq!(fills[0].price, U256::from(100u64));
        assert_eq!(fills[0].quantity, U256::from(5u64));
        assert_eq!(book.ltp(), U256::from(100u64));
        assert_eq!(book.depth(), (0, 0));
        assert!(book.order(ask_id).is_none());
    }

    #[test]
    fn test_partial_match_rests_remainder() {
        let mut book = Book::new(market());
        book.submit(order(1, OrderSide::Bid, 100, 3), now()).unwrap();

        let ask = order(2, OrderSide::Ask, 90, 10);
        let ask_id = ask.id;
        let result = book.submit(ask, now()).unwrap();

        assert_eq!(result.status, OrderStatus::PartialMatch);
        assert_eq!(result.traded(), U256::from(3u64));
        let resting = book.order(ask_id).unwrap();
        assert_eq!(resting.remaining, U256::from(7u64));
        assert_eq!(book.depth(), (0, 1));
        assert_eq!(book.top(), (None, Some(U256::from(90u64))));
    }

    #[test]
    fn test_price_priority_then_time_priority() {
        let mut book = Book::new(market());
        let first_at_101 = order(1, OrderSide::Ask, 101, 2);
        let second_at_101 = order(2, OrderSide::Ask, 101, 2);
        let at_100 = order(3, OrderSide::Ask, 100, 2);
        let (a, b, c) = (first_at_101.id, second_at_101.id, at_100.id);
        book.submit(first_at_101, now()).unwrap();
        book.submit(second_at_101, now()).unwrap();
        book.submit(at_100, now()).unwrap();

        let result = book.submit(order(4, OrderSide::Bid, 101, 5), now()).unwrap();
        let makers: Vec<_> = result.fills().iter().map(|f| f.maker).collect();

        assert_eq!(makers, vec![c, a, b]);
        assert_eq!(result.status, OrderStatus::FullMatch);
        assert_eq!(book.order(b).unwrap().remaining, U256::from(1u64));
        assert_eq!(book.ltp(), U256::from(101u64));
    }

    #[test]
    fn test_ask_walks_bids_descending_and_stops_at_limit() {
        let mut book = Book::new(market());
        book.submit(order(1, OrderSide::Bid, 98, 1), now()).unwrap();
        book.submit(order(2, OrderSide::Bid, 100, 1), now()).unwrap();
        book.submit(order(3, OrderSide::Bid, 99, 1), now()).unwrap();

        let result = book.submit(order(4, OrderSide::Ask, 99, 5), now()).unwrap();
        let prices: Vec<_> = result.fills().iter().map(|f| f.price).collect();

        assert_eq!(prices, vec![U256::from(100u64), U256::from(99u64)]);
        assert_eq!(result.status, OrderStatus::PartialMatch);
        assert_eq!(book.top(), (Some(U256::from(98u64)), Some(U256::from(99u64))));
        assert_eq!(book.spread(), U256::from(1u64));
        assert!(!book.crossed());
    }

    #[test]
    fn test_self_trade_is_skipped() {
        let mut book = Book::new(market());
        book.submit(order(1, OrderSide::Ask, 100, 5), now()).unwrap();
        let other = order(2, OrderSide::Ask, 100, 5);
        let other_id = other.id;
        book.submit(other, now()).unwrap();

        let result = book.submit(order(1, OrderSide::Bid, 100, 5), now()).unwrap();

        assert_eq!(result.status, OrderStatus::FullMatch);
        assert_eq!(result.fills()[0].maker, other_id);
        assert_eq!(book.depth(), (0, 1));
    }

    #[test]
    fn test_only_self_trades_leaves_book_crossed() {
        let mut book = Book::new(market());
        book.submit(order(1, OrderSide::Ask, 100, 5), now()).unwrap();

        let result = book.submit(order(1, OrderSide::Bid, 100, 5), now()).unwrap();

        assert_eq!(result.status, OrderStatus::Placed);
        assert!(book.crossed());
        assert_eq!(book.spread(), U256::ZERO);
        assert_eq!(book.depth(), (1, 1));
    }

    #[test]
    fn test_rejects_invalid_orders() {
        let mut book = Book::new(market());

        let zero_price = order(1, OrderSide::Bid, 0, 1);
        assert!(matches!(
            book.submit(zero_price, now()),
            Err(DomainError::InvalidOrder(_))
        ));

        let zero_quantity = order(1, OrderSide::Bid, 1, 0);
        assert!(matches!(
            book.submit(zero_quantity, now()),
            Err(DomainError::InvalidOrder(_))
        ));

        let mut foreign = order(1, OrderSide::Bid, 1, 1);
        foreign.market = Address::with_last_byte(0x01);
        assert!(matches!(
            book.submit(foreign, now()),
            Err(DomainError::WrongMarket { .. })
        ));

        let expired = order(1, OrderSide::Bid, 1, 1);
        assert!(matches!(
            book.submit(expired, now() + Duration::hours(2)),
            Err(DomainError::Expired(_))
        ));
    }

    #[test]
    fn test_duplicate_order_rejected() {
        let mut book = Book::new(market());
        book.submit(order(1, OrderSide::Bid, 100, 1), now()).unwrap();
        let err = book
            .submit(order(1, OrderSide::Bid, 100, 1), now())
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateOrder(_)));
        assert_eq!(book.depth(), (1, 0));
    }

    #[test]
    fn test_cancel() {
        let mut book = Book::new(market());
        let bid = order(1, OrderSide::Bid, 100, 1);
        let id = bid.id;
        book.submit(bid, now()).unwrap();

        assert_eq!(book.cancel(id, now()), Some(now()));
        assert_eq!(book.depth(), (0, 0));
        assert!(book.bids().is_empty());
        assert_eq!(book.cancel(id, now()), None);
    }

    #[test]
    fn test_expired_makers_are_not_matched_and_get_pruned() {
        let mut book = Book::new(market());
        let mut short_lived = order(1, OrderSide::Ask, 100, 5);
        short_lived.expiration = now() + Duration::seconds(10);
        book.submit(short_lived, now()).unwrap();

        let later = now() + Duration::seconds(20);
        let mut bid = order(2, OrderSide::Bid, 100, 5);
        bid.created = later;
        let result = book.submit(bid, later).unwrap();

        assert_eq!(result.status, OrderStatus::Placed);
        assert_eq!(book.depth(), (1, 0));
        assert!(book.asks().is_empty());
    }

    #[test]
    fn test_prune_expired_counts_removed() {
        let mut book = Book::new(market());
        let mut short_lived = order(1, OrderSide::Bid, 100, 5);
        short_lived.expiration = now() + Duration::seconds(10);
        book.submit(short_lived, now()).unwrap();
        book.submit(order(2, OrderSide::Bid, 99, 5), now()).unwrap();

        assert_eq!(book.prune_expired(now()), 0);
        assert_eq!(book.prune_expired(now() + Duration::seconds(10)), 1);
        assert_eq!(book.depth(), (1, 0));
    }
}

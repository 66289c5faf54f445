//! Auction overlap: the crossed region of a book as a cumulative curve.
//!
//! Starting from the best bid and best ask, the walk ascends through the
//! crossed prices, folding in whichever side's next level is cheaper and
//! recording both running totals at every distinct price. Picking a single
//! clearing price from the curve is up to the caller.

use std::cmp::Ordering;

use log::debug;

use crate::index::PriceIndex;
use crate::{OrderBook, OrderFragment, Price, PriceComparator, PriceLevel, Quantity, Side};

/// One checkpoint of the auction curve.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlappedLevel {
    pub price: Price,
    /// Buy fragments folded in so far, best level first, FIFO within a level
    pub buy_orders: Vec<OrderFragment>,
    /// Sell fragments folded in so far
    pub sell_orders: Vec<OrderFragment>,
    pub buy_total: Quantity,
    pub sell_total: Quantity,
    /// `min(buy_total, sell_total)`
    pub executions: Quantity,
    /// `|buy_total - sell_total|`
    pub surplus: Quantity,
}

impl<I: PriceIndex> OrderBook<I> {
    /// Resolve the crossed region into ascending, distinct price checkpoints.
    ///
    /// Empty when either side is empty or the best bid is below the best ask.
    pub fn overlapped_range(&self) -> Vec<OverlappedLevel> {
        let range = resolve(
            self.index(Side::Buy),
            self.index(Side::Sell),
            self.comparator(),
        );
        debug!("overlap resolved into {} checkpoints", range.len());
        range
    }
}

#[derive(Default)]
struct Curve {
    buy_orders: Vec<OrderFragment>,
    sell_orders: Vec<OrderFragment>,
    buy_total: Quantity,
    sell_total: Quantity,
}

impl Curve {
    fn absorb(&mut self, side: Side, level: &PriceLevel) {
        let (orders, total) = match side {
            Side::Buy => (&mut self.buy_orders, &mut self.buy_total),
            Side::Sell => (&mut self.sell_orders, &mut self.sell_total),
        };
        orders.extend(level.iter().cloned());
        *total += level.total_quantity();
    }

    fn checkpoint(&self, price: Price) -> OverlappedLevel {
        OverlappedLevel {
            price,
            buy_orders: self.buy_orders.clone(),
            sell_orders: self.sell_orders.clone(),
            buy_total: self.buy_total,
            sell_total: self.sell_total,
            executions: self.buy_total.min(self.sell_total),
            surplus: (self.buy_total - self.sell_total).abs(),
        }
    }
}

fn resolve<I: PriceIndex + ?Sized>(
    buys: &I,
    sells: &I,
    cmp: PriceComparator,
) -> Vec<OverlappedLevel> {
    let mut buy_levels = buys.iter_best_first().peekable();
    let mut sell_levels = sells.iter_best_first().peekable();

    let (Some(best_buy), Some(best_sell)) = (buy_levels.next(), sell_levels.next()) else {
        return Vec::new();
    };
    let best_bid = best_buy.price();
    if !cmp.crosses(best_bid, best_sell.price()) {
        return Vec::new();
    }

    let mut curve = Curve::default();
    curve.absorb(Side::Buy, best_buy);
    curve.absorb(Side::Sell, best_sell);
    let mut last_price = best_sell.price();
    let mut checkpoints = vec![curve.checkpoint(last_price)];

    loop {
        // Buys may not pull the curve back below where it already is; sells
        // stop once they price above the best bid.
        let buy = buy_levels
            .peek()
            .copied()
            .filter(|level| cmp.crosses(level.price(), last_price));
        let sell = sell_levels
            .peek()
            .copied()
            .filter(|level| cmp.crosses(best_bid, level.price()));

        let price = match (buy, sell) {
            (None, None) => break,
            (Some(b), None) => {
                buy_levels.next();
                curve.absorb(Side::Buy, b);
                b.price()
            }
            (None, Some(s)) => {
                sell_levels.next();
                curve.absorb(Side::Sell, s);
                s.price()
            }
            (Some(b), Some(s)) => match cmp.compare(Side::Sell, b.price(), s.price()) {
                Ordering::Less => {
                    buy_levels.next();
                    curve.absorb(Side::Buy, b);
                    b.price()
                }
                Ordering::Greater => {
                    sell_levels.next();
                    curve.absorb(Side::Sell, s);
                    s.price()
                }
                Ordering::Equal => {
                    buy_levels.next();
                    sell_levels.next();
                    curve.absorb(Side::Buy, b);
                    curve.absorb(Side::Sell, s);
                    s.price()
                }
            },
        };

        if cmp.same_price(price, last_price) {
            if let Some(last) = checkpoints.last_mut() {
                *last = curve.checkpoint(last_price);
            }
        } else {
            last_price = price;
            checkpoints.push(curve.checkpoint(price));
        }
    }

    checkpoints
}

//! Pairs open orders with the opposite-side orders that flatten them.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{ClosedTrade, Direction, Order, OrderBook};

use super::profit::{round_cents, ProfitCalculator};

/// Closer-selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingMethod {
    /// First eligible closer in book order, no backtracking
    FirstFit,
    /// Eligible closer with the earliest timestamp
    EarliestClose,
}

impl MatchingMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "first_fit" | "firstfit" | "first" => Some(Self::FirstFit),
            "earliest_close" | "earliest" | "fifo" => Some(Self::EarliestClose),
            _ => None,
        }
    }

    pub fn policy(&self) -> Box<dyn MatchingPolicy> {
        match self {
            Self::FirstFit => Box::new(FirstFit),
            Self::EarliestClose => Box::new(EarliestClose),
        }
    }
}

/// Chooses which eligible closer an opener is paired with.
///
/// The matcher hands a policy one direction at a time. By default the
/// policy walks that direction's openers in book order and `select_closer`
/// picks among the closers still free. A policy that has to see the whole
/// side at once, such as an optimal assignment, overrides `assign` instead.
pub trait MatchingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `eligible` holds, in book order, every free closer that passes
    /// [`is_eligible`] for `opener`. An index outside `eligible` means no match.
    fn select_closer(&self, opener: &Order, eligible: &[&Order]) -> Option<usize>;

    /// Pair openers with closers for one direction.
    ///
    /// `openers` and `closers` index into `orders`; `consumed` marks orders
    /// already used by an earlier direction. Returns `(opener, closer)` index
    /// pairs in output order. The matcher drops any pair that reuses an
    /// order or is not eligible.
    fn assign(
        &self,
        orders: &[Order],
        openers: &[usize],
        closers: &[usize],
        consumed: &[bool],
    ) -> Vec<(usize, usize)> {
        let mut taken = consumed.to_vec();
        let mut pairs = Vec::new();

        for &i in openers {
            let opener = &orders[i];
            if taken[i] || !opener.is_open() {
                continue;
            }

            let eligible: Vec<usize> = closers
                .iter()
                .copied()
                .filter(|&j| j != i && !taken[j] && is_eligible(opener, &orders[j]))
                .collect();
            let candidates: Vec<&Order> = eligible.iter().map(|&j| &orders[j]).collect();

            match self
                .select_closer(opener, &candidates)
                .and_then(|pick| eligible.get(pick).copied())
            {
                Some(j) => {
                    taken[i] = true;
                    taken[j] = true;
                    pairs.push((i, j));
                }
                None => {
                    debug!(order = %opener.order_number, quantity = %opener.open_quantity(), "No closer found");
                }
            }
        }
        pairs
    }
}

/// Whether `closer` can flatten `opener`: opposite side, a different
/// order, flat itself, and executed exactly the opener's open quantity.
pub fn is_eligible(opener: &Order, closer: &Order) -> bool {
    opener.is_open()
        && closer.side == opener.side.opposite()
        && closer.order_number != opener.order_number
        && !closer.is_open()
        && closer.total_quantity == opener.open_quantity()
}

/// Takes the first eligible closer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl MatchingPolicy for FirstFit {
    fn name(&self) -> &'static str {
        "first_fit"
    }

    fn select_closer(&self, _opener: &Order, eligible: &[&Order]) -> Option<usize> {
        if eligible.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Takes the eligible closer that finished earliest; ties go to book order.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarliestClose;

impl MatchingPolicy for EarliestClose {
    fn name(&self) -> &'static str {
        "earliest_close"
    }

    fn select_closer(&self, _opener: &Order, eligible: &[&Order]) -> Option<usize> {
        eligible
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| compare_timestamps(&a.timestamp, &b.timestamp))
            .map(|(i, _)| i)
    }
}

/// Parse the timestamp layouts the execution feed is known to use.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    const LAYOUTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M:%S%.f",
    ];
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
}

/// Total order on feed timestamps: parsed ones chronologically, then the
/// unparsable ones lexically after all of them.
fn compare_timestamps(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Greedy single-pass matcher.
///
/// Buy-side openers are matched first against sell-side closers, then
/// sell-side openers against the buy-side orders left over. Every order
/// ends up in at most one closed trade; orders without a partner are
/// left out of the result.
pub struct TradeMatcher {
    policy: Box<dyn MatchingPolicy>,
}

impl TradeMatcher {
    pub fn new(method: MatchingMethod) -> Self {
        Self::with_policy(method.policy())
    }

    pub fn with_policy(policy: Box<dyn MatchingPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Match the book into closed trades: long openers first, then short openers.
    ///
    /// Fails only when a trade's profit leaves the `Decimal` range.
    pub fn match_orders(&self, book: &OrderBook) -> Result<Vec<ClosedTrade>> {
        let orders = book.as_slice();
        let mut consumed = vec![false; orders.len()];
        let mut trades = Vec::new();

        for direction in [Direction::Long, Direction::Short] {
            let opening_side = direction.opening_side();
            let (openers, closers): (Vec<usize>, Vec<usize>) =
                (0..orders.len()).partition(|&i| orders[i].side == opening_side);

            for (i, j) in self.policy.assign(orders, &openers, &closers, &consumed) {
                let valid = openers.contains(&i)
                    && closers.contains(&j)
                    && !consumed[i]
                    && !consumed[j]
                    && is_eligible(&orders[i], &orders[j]);
                if !valid {
                    warn!(policy = self.policy.name(), opener = i, closer = j, "Dropping ineligible pair");
                    continue;
                }

                consumed[i] = true;
                consumed[j] = true;

                let trade = settle(trades.len() as u32 + 1, &orders[i], &orders[j], direction)?;
                debug!(
                    id = trade.sequence_id,
                    open = %trade.open_order,
                    close = %trade.close_order,
                    direction = direction.as_str(),
                    profit = %trade.profit,
                    "Closed trade"
                );
                trades.push(trade);
            }
        }

        debug!(
            policy = self.policy.name(),
            orders = orders.len(),
            closed = trades.len(),
            unmatched = consumed.iter().filter(|c| !**c).count(),
            "Matched orders into closed trades"
        );
        Ok(trades)
    }
}

impl Default for TradeMatcher {
    fn default() -> Self {
        Self::new(MatchingMethod::FirstFit)
    }
}

fn settle(sequence_id: u32, opener: &Order, closer: &Order, direction: Direction) -> Result<ClosedTrade> {
    let profit = ProfitCalculator::compute(
        opener.total_value,
        closer.total_value,
        opener.total_commission,
        closer.total_commission,
        direction,
    )?;

    Ok(ClosedTrade {
        sequence_id,
        direction,
        open_order: opener.order_number.clone(),
        close_order: closer.order_number.clone(),
        open_timestamp: opener.timestamp.clone(),
        close_timestamp: closer.timestamp.clone(),
        open_value: opener.total_value,
        close_value: closer.total_value,
        profit: round_cents(profit),
    })
}

use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::store::Value;

pub(crate) const STATUS_SUCCESS: &str = "success";
pub(crate) const STATUS_FAILED: &str = "failed";

/// Platform take: 0.5% of successfully settled value.
pub(crate) fn fee_rate() -> Decimal {
    Decimal::new(5, 3)
}

/// Half-away-from-zero to two decimal places, the rounding every reported
/// percentage and monetary figure uses.
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// `100 * part / whole`, rounded. Zero denominators yield zero rather than
/// a division error; grouped callers never hit that case since groups come
/// from existing rows.
pub(crate) fn percent(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }

    round2(Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
}

/// Running aggregates for one group of transactions.
///
/// Amount-based figures ignore rows with a missing amount; counts do not.
#[derive(Debug, Default, Clone)]
pub(crate) struct GroupStats {
    pub count: u64,
    pub successful: u64,
    pub failed: u64,
    amount_count: u64,
    amount_sum: Decimal,
    success_amount_sum: Decimal,
    min_amount: Option<Decimal>,
    users: HashSet<String>,
}

impl GroupStats {
    pub fn record(&mut self, status: Option<&str>, amount: Option<Decimal>, user: Option<String>) {
        self.count += 1;

        match status {
            Some(STATUS_SUCCESS) => {
                self.successful += 1;

                if let Some(amount) = amount {
                    self.success_amount_sum += amount;
                }
            }
            Some(STATUS_FAILED) => self.failed += 1,
            _ => {}
        }

        if let Some(amount) = amount {
            self.amount_count += 1;
            self.amount_sum += amount;
            self.min_amount = Some(self.min_amount.map_or(amount, |current| current.min(amount)));
        }

        if let Some(user) = user {
            self.users.insert(user);
        }
    }

    pub fn unique_users(&self) -> u64 {
        self.users.len() as u64
    }

    pub fn failure_rate(&self) -> Decimal {
        percent(self.failed, self.count)
    }

    pub fn success_rate(&self) -> Decimal {
        percent(self.successful, self.count)
    }

    pub fn avg_amount(&self) -> Value {
        if self.amount_count == 0 {
            return Value::Null;
        }

        Value::Number(round2(self.amount_sum / Decimal::from(self.amount_count)))
    }

    pub fn total_value(&self) -> Decimal {
        round2(self.amount_sum)
    }

    pub fn revenue(&self) -> Decimal {
        round2(self.success_amount_sum * fee_rate())
    }

    pub fn min_amount(&self) -> Value {
        match self.min_amount {
            Some(amount) => Value::Number(round2(amount)),
            None => Value::Null,
        }
    }

    pub fn avg_txns_per_user(&self) -> Value {
        if self.users.is_empty() {
            return Value::Null;
        }

        Value::Number(round2(Decimal::from(self.count) / Decimal::from(self.users.len() as u64)))
    }
}

/// Fixed amount brackets, ordered by lower bound. The lower bound of each
/// bracket is inclusive: an amount equal to a boundary lands in the upper
/// bracket (exactly 1000 is `$1k-$5k`, not `<$1k`).
pub(crate) struct BracketScheme {
    upper_bounds: Vec<(Decimal, &'static str)>,
    top_label: &'static str,
}

impl BracketScheme {
    /// The full-dataset distribution: <$1k, $1k-$5k, $5k-$10k, $10k-$20k, >$20k.
    pub fn standard() -> Self {
        Self {
            upper_bounds: vec![
                (Decimal::from(1_000), "<$1k"),
                (Decimal::from(5_000), "$1k-$5k"),
                (Decimal::from(10_000), "$5k-$10k"),
                (Decimal::from(20_000), "$10k-$20k"),
            ],
            top_label: ">$20k",
        }
    }

    /// The coarser split used for single-corridor root-cause work:
    /// <$5k, $5k-$10k, >$10k.
    pub fn corridor_focus() -> Self {
        Self {
            upper_bounds: vec![(Decimal::from(5_000), "<$5k"), (Decimal::from(10_000), "$5k-$10k")],
            top_label: ">$10k",
        }
    }

    /// Maps an amount to its bracket ordinal. Exhaustive: every amount lands
    /// in exactly one bracket.
    pub fn classify(&self, amount: Decimal) -> usize {
        self.upper_bounds
            .iter()
            .position(|(bound, _)| amount < *bound)
            .unwrap_or(self.upper_bounds.len())
    }

    pub fn label(&self, ordinal: usize) -> &'static str {
        self.upper_bounds
            .get(ordinal)
            .map(|(_, label)| *label)
            .unwrap_or(self.top_label)
    }
}

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SwapPeriod {
    Day,
    Week,
    Month,
}

impl SwapPeriod {
    pub fn duration(&self) -> Duration {
        match self {
            SwapPeriod::Day => Duration::days(1),
            SwapPeriod::Week => Duration::days(7),
            SwapPeriod::Month => Duration::days(30),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SwapperType {
    Pair,
    User,
}

/// Rolling swap volume of one user or pair.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Swapper {
    pub id: String,
    pub swapper_type: SwapperType,
    pub day_amount_usd: BigDecimal,
    pub week_amount_usd: BigDecimal,
    pub month_amount_usd: BigDecimal,
}

impl Swapper {
    pub fn new(id: impl Into<String>, swapper_type: SwapperType) -> Self {
        Self {
            id: id.into(),
            swapper_type,
            day_amount_usd: BigDecimal::zero(),
            week_amount_usd: BigDecimal::zero(),
            month_amount_usd: BigDecimal::zero(),
        }
    }

    pub fn amount_usd(&self, period: SwapPeriod) -> &BigDecimal {
        match period {
            SwapPeriod::Day => &self.day_amount_usd,
            SwapPeriod::Week => &self.week_amount_usd,
            SwapPeriod::Month => &self.month_amount_usd,
        }
    }

    pub fn amount_usd_mut(&mut self, period: SwapPeriod) -> &mut BigDecimal {
        match period {
            SwapPeriod::Day => &mut self.day_amount_usd,
            SwapPeriod::Week => &mut self.week_amount_usd,
            SwapPeriod::Month => &mut self.month_amount_usd,
        }
    }
}

/// Summary of one rollup window, keyed by the period tag.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SwapStatPeriod {
    pub id: String,
    pub period: SwapPeriod,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub swaps_count: i64,
    pub pairs_count: i64,
    pub users_count: i64,
    pub total_amount_usd: BigDecimal,
}

impl SwapStatPeriod {
    pub fn new(period: SwapPeriod, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            id: period.to_string(),
            period,
            from,
            to,
            swaps_count: 0,
            pairs_count: 0,
            users_count: 0,
            total_amount_usd: BigDecimal::zero(),
        }
    }
}

//! Monthly price history
//!
//! Prices are stored in integer minor units (cents) and keyed by
//! `(year, month, type)`. A price list never holds two records for the same key.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Whether a price has been agreed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStatus {
    #[default]
    Confirmed,
    Provisional,
}

/// One price for one month and one price type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(deserialize_with = "whole_number")]
    pub year: i32,
    /// 1-12
    #[serde(deserialize_with = "whole_number")]
    pub month: u32,
    #[serde(rename = "type")]
    pub price_type: String,
    /// Minor units; stored floats are rounded
    #[serde(deserialize_with = "whole_number")]
    pub price: i64,
    #[serde(default)]
    pub status: PriceStatus,
}

impl PriceRecord {
    /// Create a confirmed record from a minor-unit price
    pub fn confirmed<S: Into<String>>(year: i32, month: u32, price_type: S, price: i64) -> Self {
        Self {
            year,
            month,
            price_type: price_type.into(),
            price,
            status: PriceStatus::Confirmed,
        }
    }

    /// Create a confirmed record from a major-unit amount, rounding to the nearest minor unit
    pub fn from_major<S: Into<String>>(period: PricePeriod, price_type: S, amount: f64) -> Self {
        Self::confirmed(
            period.year(),
            period.month(),
            price_type,
            (amount * 100.0).round() as i64,
        )
    }

    /// Price in major units
    pub fn major_units(&self) -> f64 {
        self.price as f64 / 100.0
    }

    /// True when both records occupy the same (year, month, type) slot
    pub fn same_slot(&self, other: &PriceRecord) -> bool {
        self.year == other.year && self.month == other.month && self.price_type == other.price_type
    }
}

/// Accept integers and floats, rounding the latter
fn whole_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    use serde::de::Error as _;

    let n = f64::deserialize(deserializer)?;
    if !n.is_finite() || n.abs() >= 9.0e15 {
        return Err(D::Error::custom(format!("{} is not a usable whole number", n)));
    }
    T::try_from(n.round() as i64).map_err(|_| D::Error::custom(format!("{} is out of range", n)))
}

/// Merge incoming price records into an existing history.
///
/// A record sharing `(year, month, type)` with an existing one replaces it in
/// place; any other record is appended. Untouched records keep their order.
pub fn merge_prices(existing: &[PriceRecord], incoming: &[PriceRecord]) -> Vec<PriceRecord> {
    let mut merged = existing.to_vec();
    for record in incoming {
        match merged.iter_mut().find(|slot| slot.same_slot(record)) {
            Some(slot) => *slot = record.clone(),
            None => merged.push(record.clone()),
        }
    }
    merged
}

/// The month an import's price columns are booked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PricePeriod {
    year: i32,
    month: u32,
}

impl PricePeriod {
    /// Create a period, rejecting months outside 1-12
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

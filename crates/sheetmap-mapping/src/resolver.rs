//! Variable lookup against the documents of one row

use sheetmap_core::Document;
use sheetmap_expr::Variables;

/// Variables under this prefix read a price of the row's primary document
pub const PRICE_PREFIX: &str = "prices.";
/// Variables under this prefix read the row's secondary document
pub const METRICS_PREFIX: &str = "metrics.";

/// Resolve one variable path to a number.
///
/// - `prices.<type>`: the first price record of that type, in major units
/// - `metrics.<path>`: dotted lookup in the secondary document
/// - anything else: dotted lookup in the primary document
///
/// Absent, non-numeric and non-finite values resolve to `None`.
pub fn resolve(primary: &Document, secondary: &Document, path: &str) -> Option<f64> {
    let value = if let Some(price_type) = path.strip_prefix(PRICE_PREFIX) {
        primary.find_price(price_type).map(|record| record.major_units())
    } else if path.starts_with(METRICS_PREFIX) {
        secondary.get_number(path)
    } else {
        primary.get_number(path)
    };
    value.filter(|n| n.is_finite())
}

/// Resolve every name into an evaluator variable map
pub fn resolve_all<'a, I>(primary: &Document, secondary: &Document, names: I) -> Variables
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|name| (name.clone(), resolve(primary, secondary, name)))
        .collect()
}

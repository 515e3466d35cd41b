use crate::error::AnalyticsError;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

pub(crate) const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Extreme inputs can push intermediate values past `Decimal::MAX`; those surface as a
/// `Data` error instead of a panic.
fn out_of_range(what: &str) -> AnalyticsError {
    AnalyticsError::Data(format!("{what} is too large to compute"))
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, AnalyticsError> {
    a.checked_mul(b).ok_or_else(|| out_of_range(what))
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, AnalyticsError> {
    a.checked_sub(b).ok_or_else(|| out_of_range(what))
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>, what: &str) -> Result<Decimal, AnalyticsError> {
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or_else(|| out_of_range(what))
    })
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub(crate) fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Result<Decimal, AnalyticsError> {
    if denominator.is_zero() {
        Ok(Decimal::ZERO)
    } else {
        numerator
            .checked_div(denominator)
            .ok_or_else(|| out_of_range("ratio"))
    }
}

/// Percentage change from `first` to `last`; zero when `first` is zero.
pub(crate) fn pct_change(first: Decimal, last: Decimal) -> Result<Decimal, AnalyticsError> {
    let delta = checked_sub(last, first, "price change")?;
    checked_mul(ratio_or_zero(delta, first)?, HUNDRED, "percentage change")
}

pub(crate) fn mean(values: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    if values.is_empty() {
        return Ok(Decimal::ZERO);
    }
    ratio_or_zero(checked_sum(values.iter().copied(), "sum")?, Decimal::from(values.len()))
}

/// Population standard deviation (divides by N). Zero for an empty series.
pub(crate) fn population_stdev(values: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    if values.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let mean = mean(values)?;
    let squared = values
        .iter()
        .map(|v| {
            let deviation = checked_sub(*v, mean, "deviation")?;
            checked_mul(deviation, deviation, "variance")
        })
        .collect::<Result<Vec<_>, _>>()?;
    let variance = ratio_or_zero(checked_sum(squared, "variance")?, Decimal::from(values.len()))?;

    variance
        .sqrt()
        .ok_or_else(|| AnalyticsError::Internal("Failed to calculate square root for variance".to_string()))
}

/// Coefficient of variation: stdev over mean, zero when the mean is zero.
pub(crate) fn coefficient_of_variation(values: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    ratio_or_zero(population_stdev(values)?, mean(values)?)
}

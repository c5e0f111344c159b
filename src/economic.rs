//! Money range policy
//!
//! Every sum of money values is range-checked after each addition, so an
//! overflow (or a negative value sneaking in) is detected deterministically
//! at the first offending step.

use crate::constants::*;
use crate::error::RejectReason;
use crate::types::*;

/// MoneyRange: ℤ → {true, false}
///
/// 0 ≤ value ≤ MAX_MONEY
pub fn money_range(value: Amount) -> bool {
    (0..=MAX_MONEY).contains(&value)
}

/// Add `value` to a running total, returning `None` if the result leaves the money range.
pub fn add_money(total: Amount, value: Amount) -> Option<Amount> {
    total.checked_add(value).filter(|sum| money_range(*sum))
}

/// Σ values with a range check after every addition
pub fn sum_money<I>(values: I) -> Option<Amount>
where
    I: IntoIterator<Item = Amount>,
{
    values
        .into_iter()
        .try_fold(0, |total: Amount, value| add_money(total, value))
}

/// Fee: valueIn − valueOut
///
/// 1. If valueIn < valueOut: bad-txns-in-belowout
/// 2. If the fee is outside the money range: bad-txns-fee-outofrange
pub fn calculate_fee(value_in: Amount, value_out: Amount) -> std::result::Result<Amount, RejectReason> {
    if value_in < value_out {
        return Err(RejectReason::InBelowOut);
    }

    let fee = value_in
        .checked_sub(value_out)
        .ok_or(RejectReason::FeeOutOfRange)?;
    if !money_range(fee) {
        return Err(RejectReason::FeeOutOfRange);
    }

    Ok(fee)
}

//! Order number formatting
//!
//! `CP` + YY + MM + DD + sequence. The sequence is zero-padded to three
//! digits and simply grows wider past 999 so numbers stay unique.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::utils::time::business_date;

pub const ORDER_NUMBER_PREFIX: &str = "CP";

/// YYMMDD of `now` in the business timezone
pub fn day_key(now: DateTime<Utc>, tz: Tz) -> String {
    business_date(now, tz).format("%y%m%d").to_string()
}

pub fn format_order_number(day_key: &str, sequence: u64) -> String {
    format!("{}{}{:03}", ORDER_NUMBER_PREFIX, day_key, sequence)
}

/// Shape check used before hitting the store on public lookups
pub fn is_valid_order_number(number: &str) -> bool {
    let Some(rest) = number.strip_prefix(ORDER_NUMBER_PREFIX) else {
        return false;
    };
    rest.len() >= 9 && rest.bytes().all(|b| b.is_ascii_digit())
}

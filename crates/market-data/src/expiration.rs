//! Monthly expiration classification.
//!
//! Standard monthly equity options expire on the third Friday of the month,
//! i.e. a Friday whose day-of-month falls in `15..=21`. One vendor reports
//! those expirations a day early (on the Thursday); the
//! `vendor_glitch_correction` flag shifts such Thursdays forward before
//! testing.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::errors::MarketDataError;

/// Date format used for expirations on every vendor API.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%d";

/// Returns whether `date` is a monthly expiration, plus the (possibly
/// corrected) date.
///
/// With `vendor_glitch_correction`, a Thursday is advanced by one day before
/// the test. When the date does not match, the original date is returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use optionwatch_market_data::expiration::is_monthly_expiration;
///
/// let thursday = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
/// let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
///
/// assert_eq!(is_monthly_expiration(thursday, false), (false, thursday));
/// assert_eq!(is_monthly_expiration(thursday, true), (true, friday));
/// ```
pub fn is_monthly_expiration(date: NaiveDate, vendor_glitch_correction: bool) -> (bool, NaiveDate) {
    let candidate = if vendor_glitch_correction && date.weekday() == Weekday::Thu {
        match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => return (false, date),
        }
    } else {
        date
    };

    if is_third_friday(candidate) {
        (true, candidate)
    } else {
        (false, date)
    }
}

fn is_third_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && (15..=21).contains(&date.day())
}

/// Walks forward day by day from `start` (inclusive) and returns the next
/// `n` monthly expirations in ascending order.
///
/// No vendor correction is applied: these are the dates we *ask* for.
pub fn enumerate_next_n_monthly_expirations(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut found = Vec::with_capacity(n);
    let mut day = start;

    while found.len() < n {
        if is_third_friday(day) {
            found.push(day);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    found
}

/// Parse a vendor expiration string (`YYYY-MM-DD`).
pub fn parse_expiration(value: &str) -> Result<NaiveDate, MarketDataError> {
    NaiveDate::parse_from_str(value.trim(), EXPIRATION_FORMAT)
        .map_err(|_| MarketDataError::InvalidExpiration(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_third_friday_detected() {
        assert_eq!(is_monthly_expiration(date(2024, 3, 15), false), (true, date(2024, 3, 15)));
        assert_eq!(is_monthly_expiration(date(2024, 6, 21), false), (true, date(2024, 6, 21)));
    }

    #[test]
    fn test_other_fridays_rejected() {
        // first, second and fourth Fridays of March 2024
        for d in [1, 8, 22, 29] {
            assert_eq!(is_monthly_expiration(date(2024, 3, d), false), (false, date(2024, 3, d)));
        }
    }

    #[test]
    fn test_glitch_correction_shifts_thursday() {
        // Thursday the 14th becomes Friday the 15th
        assert_eq!(is_monthly_expiration(date(2024, 3, 14), true), (true, date(2024, 3, 15)));
        // without correction the Thursday is not an expiration
        assert_eq!(is_monthly_expiration(date(2024, 3, 14), false), (false, date(2024, 3, 14)));
    }

    #[test]
    fn test_glitch_correction_keeps_original_on_miss() {
        // Thursday the 7th -> Friday the 8th, not a third Friday
        assert_eq!(is_monthly_expiration(date(2024, 3, 7), true), (false, date(2024, 3, 7)));
        // a real third Friday is left untouched
        assert_eq!(is_monthly_expiration(date(2024, 3, 15), true), (true, date(2024, 3, 15)));
    }

    #[test]
    fn test_enumerate_next_expirations() {
        let found = enumerate_next_n_monthly_expirations(date(2024, 1, 1), 3);
        assert_eq!(found, vec![date(2024, 1, 19), date(2024, 2, 16), date(2024, 3, 15)]);
    }

    #[test]
    fn test_enumerate_includes_start_date() {
        let found = enumerate_next_n_monthly_expirations(date(2024, 3, 15), 2);
        assert_eq!(found, vec![date(2024, 3, 15), date(2024, 4, 19)]);
    }

    #[test]
    fn test_enumerate_zero() {
        assert!(enumerate_next_n_monthly_expirations(date(2024, 3, 15), 0).is_empty());
    }

    #[test]
    fn test_parse_expiration() {
        assert_eq!(parse_expiration("2024-03-15").unwrap(), date(2024, 3, 15));
        assert_eq!(parse_expiration(" 2024-03-15 ").unwrap(), date(2024, 3, 15));
        assert!(matches!(
            parse_expiration("03/15/2024"),
            Err(MarketDataError::InvalidExpiration(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_classifier_matches_third_friday_rule(offset in 0u64..20_000) {
            let d = date(2000, 1, 1) + Days::new(offset);
            let expected = d.weekday() == Weekday::Fri && (15..=21).contains(&d.day());
            prop_assert_eq!(is_monthly_expiration(d, false), (expected, d));
        }

        #[test]
        fn prop_glitch_only_moves_thursdays(offset in 0u64..20_000) {
            let d = date(2000, 1, 1) + Days::new(offset);
            let (matched, corrected) = is_monthly_expiration(d, true);
            if matched && d.weekday() == Weekday::Thu {
                prop_assert_eq!(corrected, d + Days::new(1));
            } else {
                prop_assert_eq!(corrected, d);
            }
        }

        #[test]
        fn prop_enumeration_is_sorted_and_monthly(offset in 0u64..20_000, n in 0usize..24) {
            let start = date(2000, 1, 1) + Days::new(offset);
            let found = enumerate_next_n_monthly_expirations(start, n);
            prop_assert_eq!(found.len(), n);
            prop_assert!(found.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(found.iter().all(|d| *d >= start && is_monthly_expiration(*d, false).0));
        }
    }
}

//! Report calculations shared by the PDF and summary endpoints.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Convert an inclusive `[from, to]` date range to timestamp bounds.
///
/// Both ends are inclusive: `from` starts at midnight, `to` runs to the last
/// representable instant of that day.
pub fn inclusive_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&from.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = Utc.from_utc_datetime(
        &to.and_hms_micro_opt(23, 59, 59, 999_999).unwrap_or_default(),
    );
    (start, end)
}

/// Amount due for a set of dispensed lines: sum of price times quantity.
pub fn calculate_amount_due(lines: &[(Decimal, i32)]) -> Decimal {
    lines
        .iter()
        .map(|(price, quantity)| price * Decimal::from(*quantity))
        .sum()
}

/// Top dispensed medications by total quantity, descending, limited to `top_n`.
/// Ties break alphabetically so the ordering is stable.
pub fn top_dispensed(lines: &[(String, i32)], top_n: usize) -> Vec<(String, i64)> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for (name, quantity) in lines {
        *totals.entry(name.as_str()).or_default() += i64::from(*quantity);
    }

    let mut ranked: Vec<(String, i64)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_string(), total))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bounds_are_inclusive_on_both_ends() {
        let (start, end) = inclusive_bounds(date(2025, 3, 1), date(2025, 3, 31));

        assert_eq!(start.date_naive(), date(2025, 3, 1));
        assert_eq!(end.date_naive(), date(2025, 3, 31));

        // A dispense at any time on the boundary days falls inside the range
        let first_morning = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 1).unwrap();
        let last_evening = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap();
        assert!(first_morning >= start && first_morning <= end);
        assert!(last_evening >= start && last_evening <= end);
    }

    #[test]
    fn single_day_range_covers_whole_day() {
        let (start, end) = inclusive_bounds(date(2025, 6, 15), date(2025, 6, 15));
        assert_eq!(start.day(), 15);
        assert!(end > start);
        assert_eq!(end.date_naive(), date(2025, 6, 15));
    }

    #[test]
    fn amount_due_is_price_times_quantity() {
        let lines = vec![
            (Decimal::new(1999, 2), 2), // 19.99 x 2
            (Decimal::new(500, 2), 3),  // 5.00 x 3
        ];
        assert_eq!(calculate_amount_due(&lines), Decimal::new(5498, 2));
    }

    #[test]
    fn amount_due_of_no_lines_is_zero() {
        assert_eq!(calculate_amount_due(&[]), Decimal::ZERO);
    }

    #[test]
    fn top_dispensed_aggregates_and_ranks() {
        let lines = vec![
            ("Panado".to_string(), 10),
            ("Allergex".to_string(), 5),
            ("Panado".to_string(), 7),
            ("Betapyn".to_string(), 17),
        ];

        let ranked = top_dispensed(&lines, 2);
        assert_eq!(
            ranked,
            vec![("Betapyn".to_string(), 17), ("Panado".to_string(), 17)]
        );
    }

    #[test]
    fn top_dispensed_ties_break_alphabetically() {
        let lines = vec![("Zopax".to_string(), 4), ("Allergex".to_string(), 4)];
        let ranked = top_dispensed(&lines, 5);
        assert_eq!(ranked[0].0, "Allergex");
        assert_eq!(ranked[1].0, "Zopax");
    }
}

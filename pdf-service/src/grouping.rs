//! Grouping keys for the stock-take report.
//!
//! The `group_by` query parameter is an enumerated key, and grouping genuinely
//! buckets the rows: rows are sorted by the key and rendered under one heading
//! per distinct value.

use crate::reports::StockTakeRow;
use serde::Deserialize;
use std::str::FromStr;

/// Grouping key for the stock-take report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockGroupBy {
    #[default]
    DosageForm,
    Schedule,
    Supplier,
}

impl StockGroupBy {
    /// The label shown for a row's bucket under this key.
    pub fn label(&self, row: &StockTakeRow) -> String {
        match self {
            StockGroupBy::DosageForm => row.dosage_form.clone(),
            StockGroupBy::Schedule => format!("Schedule {}", row.schedule),
            StockGroupBy::Supplier => row.supplier.clone(),
        }
    }
}

impl FromStr for StockGroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dosage_form" | "dosage" => Ok(StockGroupBy::DosageForm),
            "schedule" => Ok(StockGroupBy::Schedule),
            "supplier" => Ok(StockGroupBy::Supplier),
            other => Err(format!("unknown group_by key: {}", other)),
        }
    }
}

/// Sort rows by the grouping key and bucket them under their label.
///
/// Buckets come back in ascending label order, rows within a bucket in
/// medication-name order.
pub fn bucket_rows(
    mut rows: Vec<StockTakeRow>,
    group_by: StockGroupBy,
) -> Vec<(String, Vec<StockTakeRow>)> {
    rows.sort_by(|a, b| {
        group_by
            .label(a)
            .cmp(&group_by.label(b))
            .then_with(|| a.medication_name.cmp(&b.medication_name))
    });

    let mut buckets: Vec<(String, Vec<StockTakeRow>)> = Vec::new();
    for row in rows {
        let label = group_by.label(&row);
        match buckets.last_mut() {
            Some((last_label, bucket)) if *last_label == label => bucket.push(row),
            _ => buckets.push((label, vec![row])),
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, form: &str, schedule: i32, supplier: &str) -> StockTakeRow {
        StockTakeRow {
            medication_name: name.into(),
            dosage_form: form.into(),
            quantity_on_hand: 10,
            schedule,
            supplier: supplier.into(),
        }
    }

    #[test]
    fn parses_group_by_keys() {
        assert_eq!("dosage".parse::<StockGroupBy>(), Ok(StockGroupBy::DosageForm));
        assert_eq!(
            "dosage_form".parse::<StockGroupBy>(),
            Ok(StockGroupBy::DosageForm)
        );
        assert_eq!("schedule".parse::<StockGroupBy>(), Ok(StockGroupBy::Schedule));
        assert_eq!("supplier".parse::<StockGroupBy>(), Ok(StockGroupBy::Supplier));
        assert!("price".parse::<StockGroupBy>().is_err());
    }

    #[test]
    fn buckets_by_dosage_form() {
        let rows = vec![
            row("Panado", "Tablet", 2, "MediSupply"),
            row("Allergex", "Syrup", 1, "MediSupply"),
            row("Disprin", "Tablet", 1, "PharmaDirect"),
        ];

        let buckets = bucket_rows(rows, StockGroupBy::DosageForm);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].0, "Syrup");
        assert_eq!(buckets[1].0, "Tablet");
        assert_eq!(buckets[1].1.len(), 2);
        // rows within a bucket sorted by medication name
        assert_eq!(buckets[1].1[0].medication_name, "Disprin");
    }

    #[test]
    fn buckets_by_schedule_are_labelled() {
        let rows = vec![
            row("B", "Tablet", 4, "X"),
            row("A", "Tablet", 0, "X"),
        ];

        let buckets = bucket_rows(rows, StockGroupBy::Schedule);
        assert_eq!(buckets[0].0, "Schedule 0");
        assert_eq!(buckets[1].0, "Schedule 4");
    }
}

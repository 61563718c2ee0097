//! Dispense business rules.
//!
//! Dispensing is a two-pass operation: [`check_dispense`] validates every
//! prescription item up front and rejects the whole dispense if any item
//! fails, so no partial dispense is ever written. Only then does the handler
//! run the mutation pass inside a transaction, where stock decrements and
//! repeat increments are conditional UPDATEs.

use crate::models::PrescriptionItemDetail;

/// One line of the mutation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispensePlanLine {
    pub item_id: uuid::Uuid,
    pub medication_id: uuid::Uuid,
    pub quantity: i32,
}

/// Validate every item of a prescription before any mutation.
///
/// Returns the rejection message for the first failing item. An item fails
/// when it has no repeats remaining or the pharmacy holds insufficient stock.
pub fn check_dispense(items: &[PrescriptionItemDetail]) -> Result<(), String> {
    if items.is_empty() {
        return Err("Prescription has no items to dispense".to_string());
    }

    for item in items {
        if item.repeats_used >= item.number_of_repeats {
            return Err(format!(
                "No repeats remaining for {}",
                item.medication_name
            ));
        }
        if item.quantity_on_hand < item.quantity {
            return Err(format!(
                "Insufficient stock for {}: need {}, have {}",
                item.medication_name, item.quantity, item.quantity_on_hand
            ));
        }
    }

    Ok(())
}

/// Build the mutation plan: one line per item, decrementing stock by exactly
/// the prescribed quantity.
pub fn plan_dispense(items: &[PrescriptionItemDetail]) -> Vec<DispensePlanLine> {
    items
        .iter()
        .map(|item| DispensePlanLine {
            item_id: item.id,
            medication_id: item.medication_id,
            quantity: item.quantity,
        })
        .collect()
}

/// Whether a repeat may be requested on a single item.
pub fn can_request_repeat(repeats_used: i32, number_of_repeats: i32) -> bool {
    repeats_used < number_of_repeats
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn item(
        name: &str,
        quantity: i32,
        on_hand: i32,
        repeats: i32,
        used: i32,
    ) -> PrescriptionItemDetail {
        PrescriptionItemDetail {
            id: Uuid::new_v4(),
            prescription_id: Uuid::new_v4(),
            medication_id: Uuid::new_v4(),
            medication_name: name.to_string(),
            schedule: 2,
            sale_price: Decimal::new(1999, 2),
            quantity_on_hand: on_hand,
            quantity,
            instructions: "Take as directed".to_string(),
            number_of_repeats: repeats,
            repeats_used: used,
        }
    }

    #[test]
    fn all_items_valid_passes() {
        let items = vec![item("Panado", 2, 100, 3, 0), item("Allergex", 1, 5, 2, 1)];
        assert!(check_dispense(&items).is_ok());
    }

    #[test]
    fn exhausted_repeats_rejects_whole_dispense() {
        let items = vec![item("Panado", 2, 100, 3, 0), item("Allergex", 1, 5, 2, 2)];
        let err = check_dispense(&items).unwrap_err();
        assert_eq!(err, "No repeats remaining for Allergex");
    }

    #[test]
    fn insufficient_stock_rejects_whole_dispense() {
        let items = vec![item("Panado", 20, 10, 3, 0)];
        let err = check_dispense(&items).unwrap_err();
        assert!(err.contains("Insufficient stock for Panado"));
        assert!(err.contains("need 20, have 10"));
    }

    #[test]
    fn stock_exactly_equal_to_quantity_passes() {
        let items = vec![item("Panado", 10, 10, 1, 0)];
        assert!(check_dispense(&items).is_ok());
    }

    #[test]
    fn empty_prescription_rejected() {
        assert!(check_dispense(&[]).is_err());
    }

    #[test]
    fn plan_has_one_line_per_item_with_exact_quantities() {
        let items = vec![item("Panado", 2, 100, 3, 0), item("Allergex", 5, 50, 2, 0)];
        let plan = plan_dispense(&items);

        assert_eq!(plan.len(), items.len());
        for (line, item) in plan.iter().zip(items.iter()) {
            assert_eq!(line.item_id, item.id);
            assert_eq!(line.medication_id, item.medication_id);
            assert_eq!(line.quantity, item.quantity);
        }
    }

    #[test]
    fn repeat_request_fails_only_when_exhausted() {
        assert!(can_request_repeat(0, 3));
        assert!(can_request_repeat(2, 3));
        assert!(!can_request_repeat(3, 3));
        assert!(!can_request_repeat(0, 0));
    }

    #[test]
    fn repeat_request_is_gated_per_item() {
        // A sibling item with exhausted repeats must not block a repeat on an
        // item that still has repeats left.
        let fresh = item("Panado", 2, 100, 3, 0);
        let exhausted = item("Allergex", 1, 5, 2, 2);

        assert!(can_request_repeat(
            fresh.repeats_used,
            fresh.number_of_repeats
        ));
        assert!(!can_request_repeat(
            exhausted.repeats_used,
            exhausted.number_of_repeats
        ));
    }
}

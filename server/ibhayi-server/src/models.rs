//! Database row types and status vocabularies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Prescription lifecycle states.
pub mod prescription_status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const DISPENSED: &str = "dispensed";
    pub const CANCELLED: &str = "cancelled";
}

/// Customer order lifecycle states.
pub mod order_status {
    pub const PENDING: &str = "pending";
    pub const READY: &str = "ready";
    pub const COLLECTED: &str = "collected";
}

/// Stock order lifecycle states.
pub mod stock_order_status {
    pub const PENDING: &str = "pending";
    pub const RECEIVED: &str = "received";
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
    pub cellphone: Option<String>,
    pub is_active: bool,
    pub password_reset_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Pharmacy {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub license_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Pharmacist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pharmacy_id: Uuid,
    pub health_council_number: String,
    pub created_at: DateTime<Utc>,
}

/// Pharmacist joined with their account details, as listed to managers.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PharmacistSummary {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub health_council_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub allergies: String,
    pub created_at: DateTime<Utc>,
}

/// Customer joined with their account details.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub id_number: Option<String>,
    pub cellphone: Option<String>,
    pub allergies: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Doctor {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub practice_number: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Supplier {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ActiveIngredient {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct DosageForm {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Medication {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub name: String,
    pub dosage_form_id: Uuid,
    pub supplier_id: Uuid,
    pub schedule: i32,
    pub sale_price: Decimal,
    pub reorder_level: i32,
    pub quantity_on_hand: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Medication joined with its dosage form and supplier names.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MedicationSummary {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub name: String,
    pub dosage_form: String,
    pub supplier: String,
    pub schedule: i32,
    pub sale_price: Decimal,
    pub reorder_level: i32,
    pub quantity_on_hand: i32,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MedicationIngredient {
    pub medication_id: Uuid,
    pub active_ingredient_id: Uuid,
    pub strength: String,
}

/// Ingredient line shown on medication / prescription detail.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct IngredientLine {
    pub medication_id: Uuid,
    pub name: String,
    pub strength: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Prescription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub doctor_id: Uuid,
    pub pharmacist_id: Uuid,
    pub pharmacy_id: Uuid,
    pub status: String,
    pub prescribed_date: DateTime<Utc>,
    pub dispensed_date: Option<DateTime<Utc>>,
    pub pdf_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Prescription joined with customer and doctor names, as listed to pharmacists.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PrescriptionSummary {
    pub id: Uuid,
    pub status: String,
    pub prescribed_date: DateTime<Utc>,
    pub dispensed_date: Option<DateTime<Utc>>,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub doctor_first_name: String,
    pub doctor_last_name: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PrescriptionItem {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub medication_id: Uuid,
    pub quantity: i32,
    pub instructions: String,
    pub number_of_repeats: i32,
    pub repeats_used: i32,
}

/// Prescription item joined with medication details for detail views and
/// dispensing.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PrescriptionItemDetail {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub medication_id: Uuid,
    pub medication_name: String,
    pub schedule: i32,
    pub sale_price: Decimal,
    pub quantity_on_hand: i32,
    pub quantity: i32,
    pub instructions: String,
    pub number_of_repeats: i32,
    pub repeats_used: i32,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PrescriptionOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub prescription_id: Option<Uuid>,
    pub status: String,
    pub pdf_path: Option<String>,
    pub amount_due: Option<Decimal>,
    pub ordered_at: DateTime<Utc>,
    pub ready_at: Option<DateTime<Utc>>,
    pub collected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PrescriptionDispense {
    pub id: Uuid,
    pub prescription_item_id: Uuid,
    pub pharmacist_id: Uuid,
    pub quantity: i32,
    pub dispensed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct StockOrder {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub supplier_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct StockOrderItem {
    pub id: Uuid,
    pub stock_order_id: Uuid,
    pub medication_id: Uuid,
    pub quantity_ordered: i32,
}

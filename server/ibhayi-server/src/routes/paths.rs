//! Centralized API route path constants
//!
//! Route paths live here so the route table reads as a single catalogue and
//! handlers never hard-code paths.

/// API base path
pub const API_V1: &str = "/api/v1";

/// Health check endpoints
pub mod health {
    pub const HEALTH: &str = "/health";
    pub const VERSION: &str = "/version";
}

/// Authentication endpoints
pub mod auth {
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const PASSWORD_RESET_REQUEST: &str = "/password-reset/request";
    pub const PASSWORD_RESET_CONFIRM: &str = "/password-reset/confirm";
    pub const ME: &str = "/me";
}

/// Manager endpoints
pub mod manager {
    pub const PHARMACIES: &str = "/pharmacies";
    pub const PHARMACY_BY_ID: &str = "/pharmacies/:id";
    pub const MEDICATIONS: &str = "/medications";
    pub const MEDICATION_STOCK: &str = "/medications/:id/stock";
    pub const LOW_STOCK: &str = "/medications/low-stock";
    pub const ACTIVE_INGREDIENTS: &str = "/active-ingredients";
    pub const DOSAGE_FORMS: &str = "/dosage-forms";
    pub const SUPPLIERS: &str = "/suppliers";
    pub const DOCTORS: &str = "/doctors";
    pub const PHARMACISTS: &str = "/pharmacists";
    pub const STOCK_ORDERS: &str = "/stock-orders";
    pub const STOCK_ORDER_RECEIVE: &str = "/stock-orders/:id/receive";
    pub const STOCK_TAKE_REPORT: &str = "/reports/stock-take";
    pub const SUMMARY_REPORT: &str = "/reports/summary";
}

/// Pharmacist endpoints
pub mod pharmacist {
    pub const PRESCRIPTIONS: &str = "/prescriptions";
    pub const PRESCRIPTION_BY_ID: &str = "/prescriptions/:id";
    pub const PRESCRIPTION_DISPENSE: &str = "/prescriptions/:id/dispense";
    pub const PRESCRIPTION_PDF: &str = "/prescriptions/:id/pdf";
    pub const ORDER_COLLECT: &str = "/orders/:id/collect";
    pub const DISPENSE_REPORT: &str = "/reports/dispensed";
}

/// Customer endpoints
pub mod customer {
    pub const PRESCRIPTIONS: &str = "/prescriptions";
    pub const ORDERS: &str = "/orders";
    pub const ORDER_BY_ID: &str = "/orders/:id";
    pub const REPEATS: &str = "/repeats";
    pub const COLLECTION_REPORT: &str = "/reports/collections";
    pub const PROFILE: &str = "/profile";
}

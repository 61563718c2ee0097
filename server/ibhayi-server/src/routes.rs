pub mod paths;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{
    handlers::{auth, customer, health, manager, pharmacist},
    server::IbhayiServer,
};

/// Create health check routes
pub fn health_routes() -> Router<IbhayiServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
}

/// Create authentication routes
pub fn auth_routes() -> Router<IbhayiServer> {
    Router::new()
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::REGISTER, post(auth::register))
        .route(
            paths::auth::PASSWORD_RESET_REQUEST,
            post(auth::password_reset_request),
        )
        .route(
            paths::auth::PASSWORD_RESET_CONFIRM,
            post(auth::password_reset_confirm),
        )
}

/// Create manager routes
pub fn manager_routes() -> Router<IbhayiServer> {
    Router::new()
        // Pharmacies
        .route(paths::manager::PHARMACIES, get(manager::list_pharmacies))
        .route(paths::manager::PHARMACY_BY_ID, get(manager::get_pharmacy))
        .route(paths::manager::PHARMACY_BY_ID, put(manager::update_pharmacy))
        // Medications and stock
        .route(paths::manager::MEDICATIONS, get(manager::list_medications))
        .route(paths::manager::MEDICATIONS, post(manager::create_medication))
        .route(paths::manager::MEDICATION_STOCK, post(manager::adjust_stock))
        .route(paths::manager::LOW_STOCK, get(manager::low_stock))
        // Reference data
        .route(
            paths::manager::ACTIVE_INGREDIENTS,
            get(manager::list_active_ingredients),
        )
        .route(
            paths::manager::ACTIVE_INGREDIENTS,
            post(manager::create_active_ingredient),
        )
        .route(paths::manager::DOSAGE_FORMS, get(manager::list_dosage_forms))
        .route(paths::manager::DOSAGE_FORMS, post(manager::create_dosage_form))
        .route(paths::manager::SUPPLIERS, get(manager::list_suppliers))
        .route(paths::manager::SUPPLIERS, post(manager::create_supplier))
        .route(paths::manager::DOCTORS, get(manager::list_doctors))
        .route(paths::manager::DOCTORS, post(manager::create_doctor))
        .route(paths::manager::PHARMACISTS, get(manager::list_pharmacists))
        // Stock orders
        .route(paths::manager::STOCK_ORDERS, get(manager::list_stock_orders))
        .route(paths::manager::STOCK_ORDERS, post(manager::create_stock_order))
        .route(
            paths::manager::STOCK_ORDER_RECEIVE,
            post(manager::receive_stock_order),
        )
        // Reports
        .route(
            paths::manager::STOCK_TAKE_REPORT,
            get(manager::stock_take_report),
        )
        .route(paths::manager::SUMMARY_REPORT, get(manager::summary_report))
}

/// Create pharmacist routes
pub fn pharmacist_routes() -> Router<IbhayiServer> {
    Router::new()
        .route(
            paths::pharmacist::PRESCRIPTIONS,
            get(pharmacist::list_prescriptions),
        )
        .route(
            paths::pharmacist::PRESCRIPTIONS,
            post(pharmacist::load_prescription),
        )
        .route(
            paths::pharmacist::PRESCRIPTION_BY_ID,
            get(pharmacist::prescription_detail),
        )
        .route(
            paths::pharmacist::PRESCRIPTION_DISPENSE,
            post(pharmacist::dispense_prescription),
        )
        .route(
            paths::pharmacist::PRESCRIPTION_PDF,
            post(pharmacist::upload_prescription_pdf),
        )
        .route(
            paths::pharmacist::ORDER_COLLECT,
            post(pharmacist::collect_order),
        )
        .route(
            paths::pharmacist::DISPENSE_REPORT,
            get(pharmacist::dispense_report),
        )
}

/// Create customer routes
pub fn customer_routes() -> Router<IbhayiServer> {
    Router::new()
        .route(
            paths::customer::PRESCRIPTIONS,
            get(customer::list_prescriptions),
        )
        .route(paths::customer::ORDERS, get(customer::list_orders))
        .route(paths::customer::ORDERS, post(customer::upload_order))
        .route(paths::customer::ORDER_BY_ID, get(customer::get_order))
        .route(paths::customer::REPEATS, get(customer::repeats_overview))
        .route(paths::customer::REPEATS, post(customer::request_repeat))
        .route(
            paths::customer::COLLECTION_REPORT,
            get(customer::collection_report),
        )
        .route(paths::customer::PROFILE, get(customer::get_profile))
        .route(paths::customer::PROFILE, put(customer::update_profile))
}

/// Create API v1 routes
pub fn api_v1_routes() -> Router<IbhayiServer> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/manager", manager_routes())
        .nest("/pharmacist", pharmacist_routes())
        .nest("/customer", customer_routes())
        .route(paths::auth::ME, get(auth::me))
}

/// Create all application routes
pub fn create_routes() -> Router<IbhayiServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        // API v1 routes
        .nest(paths::API_V1, api_v1_routes())
}

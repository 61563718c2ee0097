//! Customer endpoints: own prescriptions, orders, repeat requests, the
//! collections report, and profile management.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::{NaiveDate, Utc};
use pdf_service::{CollectionReportRow, PdfService};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{api_success, api_success_with_meta, ActionResult, ApiError, ApiResponse};
use crate::handlers::manager::pdf_download;
use crate::handlers::pharmacist::read_pdf_upload;
use crate::middleware::AuthContext;
use crate::models::{order_status, CustomerProfile, PrescriptionOrder};
use crate::server::IbhayiServer;
use crate::services::{dispense, report_service};
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_required};

// ============================================================================
// PRESCRIPTIONS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// One of the customer's prescriptions with prescriber details.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CustomerPrescription {
    pub id: Uuid,
    pub status: String,
    pub prescribed_date: chrono::DateTime<Utc>,
    pub dispensed_date: Option<chrono::DateTime<Utc>>,
    pub doctor_first_name: String,
    pub doctor_last_name: String,
    pub item_count: i64,
}

/// List the customer's own prescriptions
pub async fn list_prescriptions(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<CustomerPrescription>>>, ApiError> {
    let customer_id = auth.require_customer()?;

    let mut query = PaginatedQuery::new(
        r#"
        SELECT p.id, p.status, p.prescribed_date, p.dispensed_date,
               d.first_name AS doctor_first_name, d.last_name AS doctor_last_name,
               (SELECT COUNT(*) FROM prescription_items pi WHERE pi.prescription_id = p.id)
                   AS item_count
        FROM prescriptions p
        JOIN doctors d ON p.doctor_id = d.id
        WHERE 1=1"#,
    );
    query
        .add_base_filter("p.customer_id", customer_id)
        .order_by("p.prescribed_date", "DESC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let prescriptions: Vec<CustomerPrescription> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prescriptions WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&server.db_pool)
            .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(prescriptions, metadata)))
}

// ============================================================================
// ORDERS
// ============================================================================

/// Upload a script PDF to open a new pending order
pub async fn upload_order(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PrescriptionOrder>>), ApiError> {
    let customer_id = auth.require_customer()?;

    let filename = read_pdf_upload(&server, &mut multipart).await?;

    let order = sqlx::query_as::<_, PrescriptionOrder>(
        r#"
        INSERT INTO prescription_orders (customer_id, status, pdf_path)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(customer_id)
    .bind(order_status::PENDING)
    .bind(&filename)
    .fetch_one(&server.db_pool)
    .await?;

    tracing::info!(order_id = %order.id, "Prescription order uploaded");

    Ok((StatusCode::CREATED, Json(api_success(order))))
}

/// List the customer's own orders
pub async fn list_orders(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PrescriptionOrder>>>, ApiError> {
    let customer_id = auth.require_customer()?;

    let mut query = PaginatedQuery::new("SELECT * FROM prescription_orders WHERE 1=1");
    query
        .add_base_filter("customer_id", customer_id)
        .order_by("ordered_at", "DESC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let orders: Vec<PrescriptionOrder> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM prescription_orders WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(orders, metadata)))
}

/// Fetch one of the customer's orders. Another customer's order is
/// indistinguishable from a missing one.
pub async fn get_order(
    State(server): State<IbhayiServer>,
    Path(order_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<PrescriptionOrder>>, ApiError> {
    let customer_id = auth.require_customer()?;

    let order = sqlx::query_as::<_, PrescriptionOrder>(
        "SELECT * FROM prescription_orders WHERE id = $1 AND customer_id = $2",
    )
    .bind(order_id)
    .bind(customer_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("order"))?;

    Ok(Json(api_success(order)))
}

// ============================================================================
// REPEATS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RepeatRequest {
    pub prescription_item_id: Uuid,
}

impl RequestValidation for RepeatRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.prescription_item_id,
            !self.prescription_item_id.is_nil(),
            "Prescription item ID is required"
        );
        Ok(())
    }
}

/// Request a repeat on a single prescription item.
///
/// The gate is per item: only the named item's repeat count matters, and a
/// sibling item with exhausted repeats does not block the request. Succeeding
/// opens exactly one new pending order linked to the item's prescription;
/// exhausted repeats come back as `success = false` rather than an error
/// status.
pub async fn request_repeat(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<RepeatRequest>,
) -> Result<Json<ActionResult>, ApiError> {
    let customer_id = auth.require_customer()?;
    req.validate()?;

    // Ownership gate: someone else's item reads as not found
    let item = sqlx::query_as::<_, (Uuid, i32, i32)>(
        r#"
        SELECT pi.prescription_id, pi.repeats_used, pi.number_of_repeats
        FROM prescription_items pi
        JOIN prescriptions p ON pi.prescription_id = p.id
        WHERE pi.id = $1 AND p.customer_id = $2
        "#,
    )
    .bind(req.prescription_item_id)
    .bind(customer_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("prescription item"))?;

    let (prescription_id, repeats_used, number_of_repeats) = item;

    if !dispense::can_request_repeat(repeats_used, number_of_repeats) {
        return Ok(Json(ActionResult::failed(
            "No repeats left for this medication",
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO prescription_orders (customer_id, prescription_id, status)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(customer_id)
    .bind(prescription_id)
    .bind(order_status::PENDING)
    .execute(&server.db_pool)
    .await?;

    tracing::info!(
        prescription_item_id = %req.prescription_item_id,
        "Repeat order requested"
    );

    Ok(Json(ActionResult::ok("Repeat requested successfully")))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RepeatOverviewLine {
    pub prescription_id: Uuid,
    pub medication_name: String,
    pub number_of_repeats: i32,
    pub repeats_used: i32,
    pub repeats_left: i32,
}

/// Repeats remaining per item across the customer's prescriptions
pub async fn repeats_overview(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<RepeatOverviewLine>>>, ApiError> {
    let customer_id = auth.require_customer()?;

    let lines = sqlx::query_as::<_, RepeatOverviewLine>(
        r#"
        SELECT p.id AS prescription_id, m.name AS medication_name,
               pi.number_of_repeats, pi.repeats_used,
               pi.number_of_repeats - pi.repeats_used AS repeats_left
        FROM prescriptions p
        JOIN prescription_items pi ON pi.prescription_id = p.id
        JOIN medications m ON pi.medication_id = m.id
        WHERE p.customer_id = $1
        ORDER BY p.prescribed_date DESC, m.name
        "#,
    )
    .bind(customer_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(lines)))
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CollectionReportParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// PDF of the customer's collected medication over an inclusive date range,
/// with the total amount spent
pub async fn collection_report(
    State(server): State<IbhayiServer>,
    Query(params): Query<CollectionReportParams>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    let customer_id = auth.require_customer()?;

    let customer_name = sqlx::query_scalar::<_, String>(
        r#"
        SELECT u.first_name || ' ' || u.last_name
        FROM customers c
        JOIN user_accounts u ON c.user_id = u.id
        WHERE c.id = $1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("customer"))?;

    let (start, end) = report_service::inclusive_bounds(params.from, params.to);

    let rows = sqlx::query_as::<_, (chrono::DateTime<Utc>, String, i32, Decimal)>(
        r#"
        SELECT pd.dispensed_at, m.name, pd.quantity, m.sale_price
        FROM prescription_dispenses pd
        JOIN prescription_items pi ON pd.prescription_item_id = pi.id
        JOIN prescriptions p ON pi.prescription_id = p.id
        JOIN medications m ON pi.medication_id = m.id
        WHERE p.customer_id = $1 AND pd.dispensed_at BETWEEN $2 AND $3
        ORDER BY pd.dispensed_at
        "#,
    )
    .bind(customer_id)
    .bind(start)
    .bind(end)
    .fetch_all(&server.db_pool)
    .await?;

    let total_amount = report_service::calculate_amount_due(
        &rows
            .iter()
            .map(|(_, _, quantity, price)| (*price, *quantity))
            .collect::<Vec<_>>(),
    );

    let items = rows
        .into_iter()
        .map(|(date, medication_name, quantity, price)| CollectionReportRow {
            date,
            medication_name,
            quantity,
            price,
        })
        .collect::<Vec<_>>();

    let bytes =
        PdfService::generate_customer_report_pdf(&customer_name, start, end, items, total_amount)?;

    Ok(pdf_download(
        bytes,
        &format!(
            "collection_report_{}.pdf",
            Utc::now().format("%Y%m%d_%H%M%S")
        ),
    ))
}

// ============================================================================
// PROFILE
// ============================================================================

/// The customer's own profile
pub async fn get_profile(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<CustomerProfile>>, ApiError> {
    let customer_id = auth.require_customer()?;

    let profile = fetch_profile(&server, customer_id).await?;
    Ok(Json(api_success(profile)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cellphone: Option<String>,
    pub allergies: Option<String>,
}

impl RequestValidation for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref first_name) = self.first_name {
            validate_required!(first_name, "First name cannot be empty");
        }
        if let Some(ref last_name) = self.last_name {
            validate_required!(last_name, "Last name cannot be empty");
        }
        Ok(())
    }
}

/// Update the customer's name, cellphone, or allergy record
pub async fn update_profile(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<CustomerProfile>>, ApiError> {
    let customer_id = auth.require_customer()?;
    req.validate()?;

    let mut tx = server.db_pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE user_accounts u
        SET first_name = COALESCE($1, u.first_name),
            last_name = COALESCE($2, u.last_name),
            cellphone = COALESCE($3, u.cellphone),
            updated_at = NOW()
        FROM customers c
        WHERE c.user_id = u.id AND c.id = $4
        "#,
    )
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.cellphone)
    .bind(customer_id)
    .execute(&mut *tx)
    .await?;

    if let Some(ref allergies) = req.allergies {
        sqlx::query("UPDATE customers SET allergies = $1 WHERE id = $2")
            .bind(allergies.trim())
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    let profile = fetch_profile(&server, customer_id).await?;
    Ok(Json(api_success(profile)))
}

async fn fetch_profile(
    server: &IbhayiServer,
    customer_id: Uuid,
) -> Result<CustomerProfile, ApiError> {
    sqlx::query_as::<_, CustomerProfile>(
        r#"
        SELECT c.id, u.email, u.first_name, u.last_name,
               u.id_number, u.cellphone, c.allergies
        FROM customers c
        JOIN user_accounts u ON c.user_id = u.id
        WHERE c.id = $1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("customer"))
}

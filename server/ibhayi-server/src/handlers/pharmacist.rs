//! Pharmacist endpoints: loading and dispensing prescriptions, script PDF
//! uploads, and dispensing reports.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::{NaiveDate, Utc};
use pdf_service::{DispenseReportRow, PdfService};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{api_success, api_success_with_meta, ActionResult, ApiError, ApiResponse};
use crate::handlers::manager::pdf_download;
use crate::middleware::AuthContext;
use crate::models::{
    order_status, prescription_status, IngredientLine, Prescription, PrescriptionItemDetail,
    PrescriptionOrder, PrescriptionSummary,
};
use crate::server::IbhayiServer;
use crate::services::{dispense, report_service};
use crate::storage;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_required};

// ============================================================================
// PRESCRIPTION LISTING AND DETAIL
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListPrescriptionsParams {
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

const PRESCRIPTION_SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.status, p.prescribed_date, p.dispensed_date,
           cu.first_name AS customer_first_name, cu.last_name AS customer_last_name,
           d.first_name AS doctor_first_name, d.last_name AS doctor_last_name
    FROM prescriptions p
    JOIN customers c ON p.customer_id = c.id
    JOIN user_accounts cu ON c.user_id = cu.id
    JOIN doctors d ON p.doctor_id = d.id
    WHERE 1=1"#;

/// List prescriptions at the pharmacist's pharmacy
pub async fn list_prescriptions(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListPrescriptionsParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PrescriptionSummary>>>, ApiError> {
    auth.require_pharmacist()?;
    let pharmacy_id = auth
        .pharmacy_id
        .ok_or_else(|| ApiError::authorization("No pharmacy associated with this account"))?;

    let mut query = PaginatedQuery::new(PRESCRIPTION_SUMMARY_SELECT);
    query
        .add_base_filter("p.pharmacy_id", pharmacy_id)
        .filter_eq("p.status", params.status.clone())
        .order_by("p.prescribed_date", "DESC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let prescriptions: Vec<PrescriptionSummary> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM prescriptions
        WHERE pharmacy_id = $1 AND ($2::text IS NULL OR status = $2)
        "#,
    )
    .bind(pharmacy_id)
    .bind(params.status.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(prescriptions, metadata)))
}

#[derive(Debug, Serialize)]
pub struct PrescriptionDetail {
    pub prescription: Prescription,
    pub items: Vec<PrescriptionItemDetail>,
    pub ingredients: Vec<IngredientLine>,
}

const ITEM_DETAIL_SELECT: &str = r#"
    SELECT pi.id, pi.prescription_id, pi.medication_id, m.name AS medication_name,
           m.schedule, m.sale_price, m.quantity_on_hand,
           pi.quantity, pi.instructions, pi.number_of_repeats, pi.repeats_used
    FROM prescription_items pi
    JOIN medications m ON pi.medication_id = m.id
    WHERE pi.prescription_id = $1
    ORDER BY m.name"#;

/// Full detail for a prescription: header, items, and active ingredients
pub async fn prescription_detail(
    State(server): State<IbhayiServer>,
    Path(prescription_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<PrescriptionDetail>>, ApiError> {
    auth.require_pharmacist()?;

    let prescription =
        sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = $1")
            .bind(prescription_id)
            .fetch_optional(&server.db_pool)
            .await?
            .ok_or_else(|| ApiError::not_found("prescription"))?;

    let items = sqlx::query_as::<_, PrescriptionItemDetail>(ITEM_DETAIL_SELECT)
        .bind(prescription_id)
        .fetch_all(&server.db_pool)
        .await?;

    let ingredients = sqlx::query_as::<_, IngredientLine>(
        r#"
        SELECT mi.medication_id, ai.name, mi.strength
        FROM prescription_items pi
        JOIN medication_ingredients mi ON pi.medication_id = mi.medication_id
        JOIN active_ingredients ai ON mi.active_ingredient_id = ai.id
        WHERE pi.prescription_id = $1
        ORDER BY ai.name
        "#,
    )
    .bind(prescription_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(PrescriptionDetail {
        prescription,
        items,
        ingredients,
    })))
}

// ============================================================================
// LOADING PRESCRIPTIONS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoadItemRequest {
    pub medication_id: Uuid,
    pub quantity: i32,
    pub instructions: String,
    pub number_of_repeats: i32,
}

#[derive(Debug, Deserialize)]
pub struct LoadPrescriptionRequest {
    pub customer_id_number: String,
    pub doctor_id: Uuid,
    /// Stored filename of a previously uploaded script PDF, if any.
    pub pdf_path: Option<String>,
    pub items: Vec<LoadItemRequest>,
}

impl RequestValidation for LoadPrescriptionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.customer_id_number, "Customer ID number is required");
        validate_field!(
            self.items,
            !self.items.is_empty(),
            "A prescription needs at least one item"
        );
        for item in &self.items {
            validate_field!(
                item.quantity,
                item.quantity > 0,
                "Item quantities must be positive"
            );
            validate_field!(
                item.number_of_repeats,
                item.number_of_repeats > 0,
                "Number of repeats must be at least 1"
            );
            validate_required!(item.instructions, "Item instructions are required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoadPrescriptionResponse {
    pub prescription_id: Uuid,
    #[serde(flatten)]
    pub result: ActionResult,
}

/// Capture a paper prescription against a customer's record.
///
/// The customer is resolved by national ID number. When the customer has
/// recorded allergies the response carries them back as a warning so the
/// pharmacist can check the script against them.
pub async fn load_prescription(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<LoadPrescriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoadPrescriptionResponse>>), ApiError> {
    let pharmacist_id = auth.require_pharmacist()?;
    let pharmacy_id = auth
        .pharmacy_id
        .ok_or_else(|| ApiError::authorization("No pharmacy associated with this account"))?;
    req.validate()?;

    let customer = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT c.id, c.allergies
        FROM customers c
        JOIN user_accounts u ON c.user_id = u.id
        WHERE u.id_number = $1
        "#,
    )
    .bind(req.customer_id_number.trim())
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("customer"))?;

    let doctor_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM doctors WHERE id = $1 AND pharmacy_id = $2)",
    )
    .bind(req.doctor_id)
    .bind(pharmacy_id)
    .fetch_one(&server.db_pool)
    .await?;
    if !doctor_exists {
        return Err(ApiError::not_found("doctor"));
    }

    let mut tx = server.db_pool.begin().await?;

    let prescription_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO prescriptions
            (customer_id, doctor_id, pharmacist_id, pharmacy_id, status, prescribed_date, pdf_path)
        VALUES ($1, $2, $3, $4, $5, NOW(), $6)
        RETURNING id
        "#,
    )
    .bind(customer.0)
    .bind(req.doctor_id)
    .bind(pharmacist_id)
    .bind(pharmacy_id)
    .bind(prescription_status::PENDING)
    .bind(req.pdf_path.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            r#"
            INSERT INTO prescription_items
                (prescription_id, medication_id, quantity, instructions, number_of_repeats)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(prescription_id)
        .bind(item.medication_id)
        .bind(item.quantity)
        .bind(item.instructions.trim())
        .bind(item.number_of_repeats)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(prescription_id = %prescription_id, "Prescription loaded");

    let allergies = customer.1.trim();
    let warning = if allergies.is_empty() {
        None
    } else {
        Some(format!("Customer has recorded allergies: {}", allergies))
    };

    Ok((
        StatusCode::CREATED,
        Json(api_success(LoadPrescriptionResponse {
            prescription_id,
            result: ActionResult::ok_with_warning("Prescription loaded", warning),
        })),
    ))
}

// ============================================================================
// DISPENSING
// ============================================================================

/// Dispense every item on a prescription.
///
/// Pass one validates all items; any failure rejects the whole dispense with
/// a 200 and `success = false`, leaving nothing written. Pass two runs the
/// stock decrements and repeat increments as conditional updates inside one
/// transaction, so a concurrent dispense that consumed the stock first makes
/// this one roll back instead of driving the quantity negative.
pub async fn dispense_prescription(
    State(server): State<IbhayiServer>,
    Path(prescription_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ActionResult>, ApiError> {
    let pharmacist_id = auth.require_pharmacist()?;

    let prescription =
        sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = $1")
            .bind(prescription_id)
            .fetch_optional(&server.db_pool)
            .await?
            .ok_or_else(|| ApiError::not_found("prescription"))?;

    if prescription.status == prescription_status::DISPENSED {
        return Ok(Json(ActionResult::failed(
            "Prescription has already been dispensed",
        )));
    }
    if prescription.status == prescription_status::CANCELLED {
        return Ok(Json(ActionResult::failed("Prescription is cancelled")));
    }

    let items = sqlx::query_as::<_, PrescriptionItemDetail>(ITEM_DETAIL_SELECT)
        .bind(prescription_id)
        .fetch_all(&server.db_pool)
        .await?;

    if let Err(message) = dispense::check_dispense(&items) {
        return Ok(Json(ActionResult::failed(message)));
    }

    let plan = dispense::plan_dispense(&items);

    let mut tx = server.db_pool.begin().await?;

    for line in &plan {
        let stock_updated = sqlx::query(
            r#"
            UPDATE medications
            SET quantity_on_hand = quantity_on_hand - $1, updated_at = NOW()
            WHERE id = $2 AND quantity_on_hand >= $1
            "#,
        )
        .bind(line.quantity)
        .bind(line.medication_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if stock_updated == 0 {
            tx.rollback().await?;
            return Ok(Json(ActionResult::failed(
                "Stock level changed during dispensing; please retry",
            )));
        }

        let repeat_updated = sqlx::query(
            r#"
            UPDATE prescription_items
            SET repeats_used = repeats_used + 1
            WHERE id = $1 AND repeats_used < number_of_repeats
            "#,
        )
        .bind(line.item_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if repeat_updated == 0 {
            tx.rollback().await?;
            return Ok(Json(ActionResult::failed(
                "Repeats were exhausted during dispensing; please retry",
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO prescription_dispenses (prescription_item_id, pharmacist_id, quantity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(line.item_id)
        .bind(pharmacist_id)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        UPDATE prescriptions
        SET status = $1, dispensed_date = NOW()
        WHERE id = $2
        "#,
    )
    .bind(prescription_status::DISPENSED)
    .bind(prescription_id)
    .execute(&mut *tx)
    .await?;

    // Any order placed against this prescription is now ready for collection,
    // priced at the dispensed line total
    let amount_due = report_service::calculate_amount_due(
        &items
            .iter()
            .map(|item| (item.sale_price, item.quantity))
            .collect::<Vec<_>>(),
    );
    sqlx::query(
        r#"
        UPDATE prescription_orders
        SET status = $1, ready_at = NOW(), amount_due = $2
        WHERE prescription_id = $3 AND status = $4
        "#,
    )
    .bind(order_status::READY)
    .bind(amount_due)
    .bind(prescription_id)
    .bind(order_status::PENDING)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(prescription_id = %prescription_id, "Prescription dispensed");

    // Collection notification is best-effort
    let customer = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT u.email, u.first_name, c.allergies
        FROM customers c
        JOIN user_accounts u ON c.user_id = u.id
        WHERE c.id = $1
        "#,
    )
    .bind(prescription.customer_id)
    .fetch_optional(&server.db_pool)
    .await?;

    let mut warning = None;
    if let Some((email, first_name, allergies)) = customer {
        if !allergies.trim().is_empty() {
            warning = Some(format!("Customer has recorded allergies: {}", allergies.trim()));
        }
        if let Err(e) = server
            .email
            .send_prescription_ready_notification(
                &email,
                &first_name,
                &prescription_id.to_string(),
            )
            .await
        {
            tracing::warn!(
                prescription_id = %prescription_id,
                error = %e,
                "Failed to send prescription ready notification"
            );
        }
    }

    Ok(Json(ActionResult::ok_with_warning(
        "Prescription dispensed",
        warning,
    )))
}

// ============================================================================
// ORDER HANDOVER
// ============================================================================

/// Mark a ready order as collected at handover
pub async fn collect_order(
    State(server): State<IbhayiServer>,
    Path(order_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<PrescriptionOrder>>, ApiError> {
    auth.require_pharmacist()?;

    let order = sqlx::query_as::<_, PrescriptionOrder>(
        r#"
        UPDATE prescription_orders
        SET status = $1, collected_at = NOW()
        WHERE id = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(order_status::COLLECTED)
    .bind(order_id)
    .bind(order_status::READY)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("ready order"))?;

    tracing::info!(order_id = %order.id, "Order collected");

    Ok(Json(api_success(order)))
}

// ============================================================================
// SCRIPT UPLOADS
// ============================================================================

/// Attach a scanned script PDF to a prescription
pub async fn upload_prescription_pdf(
    State(server): State<IbhayiServer>,
    Path(prescription_id): Path<Uuid>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require_pharmacist()?;

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM prescriptions WHERE id = $1)")
            .bind(prescription_id)
            .fetch_one(&server.db_pool)
            .await?;
    if !exists {
        return Err(ApiError::not_found("prescription"));
    }

    let filename = read_pdf_upload(&server, &mut multipart).await?;

    sqlx::query("UPDATE prescriptions SET pdf_path = $1 WHERE id = $2")
        .bind(&filename)
        .bind(prescription_id)
        .execute(&server.db_pool)
        .await?;

    Ok(Json(api_success(filename)))
}

/// Pull the first `file` field out of a multipart upload and persist it.
pub(crate) async fn read_pdf_upload(
    server: &IbhayiServer,
    multipart: &mut Multipart,
) -> Result<String, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("prescription.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::validation("Uploaded file is empty"));
        }

        let filename =
            storage::save_prescription_pdf(&server.config.upload_dir, &original_name, &data)
                .await
                .map_err(|e| {
                    ApiError::internal(format!("Failed to store uploaded file: {}", e))
                })?;

        return Ok(filename);
    }

    Err(ApiError::validation("No file field in upload"))
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DispenseReportParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// PDF of everything this pharmacist dispensed over an inclusive date range
pub async fn dispense_report(
    State(server): State<IbhayiServer>,
    Query(params): Query<DispenseReportParams>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    let pharmacist_id = auth.require_pharmacist()?;

    let pharmacist_name = sqlx::query_scalar::<_, String>(
        r#"
        SELECT u.first_name || ' ' || u.last_name
        FROM pharmacists p
        JOIN user_accounts u ON p.user_id = u.id
        WHERE p.id = $1
        "#,
    )
    .bind(pharmacist_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("pharmacist"))?;

    let (start, end) = report_service::inclusive_bounds(params.from, params.to);

    let rows = sqlx::query_as::<_, (chrono::DateTime<Utc>, String, i32, i32)>(
        r#"
        SELECT pd.dispensed_at, m.name, pd.quantity, m.schedule
        FROM prescription_dispenses pd
        JOIN prescription_items pi ON pd.prescription_item_id = pi.id
        JOIN medications m ON pi.medication_id = m.id
        WHERE pd.pharmacist_id = $1 AND pd.dispensed_at BETWEEN $2 AND $3
        ORDER BY pd.dispensed_at
        "#,
    )
    .bind(pharmacist_id)
    .bind(start)
    .bind(end)
    .fetch_all(&server.db_pool)
    .await?
    .into_iter()
    .map(|(date, medication_name, quantity, schedule)| DispenseReportRow {
        date,
        medication_name,
        quantity,
        schedule,
    })
    .collect::<Vec<_>>();

    let bytes = PdfService::generate_pharmacist_report_pdf(&pharmacist_name, start, end, rows)?;

    Ok(pdf_download(
        bytes,
        &format!("dispense_report_{}.pdf", Utc::now().format("%Y%m%d_%H%M%S")),
    ))
}

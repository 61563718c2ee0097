//! Manager endpoints: pharmacy administration, medication stock, reference
//! data, stock orders, and reports.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use email_service::StockOrderLine;
use pdf_service::{PdfService, StockGroupBy, StockTakeRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::models::{
    stock_order_status, ActiveIngredient, Doctor, DosageForm, MedicationSummary, Pharmacy,
    PharmacistSummary, StockOrder, StockOrderItem, Supplier,
};
use crate::server::IbhayiServer;
use crate::services::report_service;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_field, validate_range, validate_required};

// ============================================================================
// PHARMACIES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListPharmaciesParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List all pharmacies
pub async fn list_pharmacies(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListPharmaciesParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Pharmacy>>>, ApiError> {
    auth.require_manager()?;

    let mut query = PaginatedQuery::new("SELECT * FROM pharmacies WHERE 1=1");
    query
        .order_by("name", "ASC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let pharmacies: Vec<Pharmacy> = query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pharmacies")
        .fetch_one(&server.db_pool)
        .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(pharmacies, metadata)))
}

/// Get a specific pharmacy by ID
pub async fn get_pharmacy(
    State(server): State<IbhayiServer>,
    Path(pharmacy_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Pharmacy>>, ApiError> {
    auth.require_manager()?;

    let pharmacy = sqlx::query_as::<_, Pharmacy>("SELECT * FROM pharmacies WHERE id = $1")
        .bind(pharmacy_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("pharmacy"))?;

    Ok(Json(api_success(pharmacy)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePharmacyRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub license_number: Option<String>,
}

impl RequestValidation for UpdatePharmacyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref name) = self.name {
            validate_required!(name, "Pharmacy name cannot be empty");
        }
        if let Some(ref email) = self.email {
            validate_email!(email, "Invalid email format");
        }
        Ok(())
    }
}

/// Update a pharmacy's details
pub async fn update_pharmacy(
    State(server): State<IbhayiServer>,
    Path(pharmacy_id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<UpdatePharmacyRequest>,
) -> Result<Json<ApiResponse<Pharmacy>>, ApiError> {
    auth.require_manager()?;
    req.validate()?;

    // Existence re-check turns concurrent-delete conflicts into a 404
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM pharmacies WHERE id = $1)",
    )
    .bind(pharmacy_id)
    .fetch_one(&server.db_pool)
    .await?;

    if !exists {
        return Err(ApiError::not_found("pharmacy"));
    }

    let pharmacy = sqlx::query_as::<_, Pharmacy>(
        r#"
        UPDATE pharmacies
        SET
            name = COALESCE($1, name),
            address = COALESCE($2, address),
            contact_number = COALESCE($3, contact_number),
            email = COALESCE($4, email),
            license_number = COALESCE($5, license_number),
            updated_at = NOW()
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.address)
    .bind(&req.contact_number)
    .bind(&req.email)
    .bind(&req.license_number)
    .bind(pharmacy_id)
    .fetch_optional(&server.db_pool)
    .await?;

    match pharmacy {
        Some(pharmacy) => Ok(Json(api_success(pharmacy))),
        None => Err(ApiError::not_found("pharmacy")),
    }
}

// ============================================================================
// MEDICATIONS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListMedicationsParams {
    pub pharmacy_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

const MEDICATION_SUMMARY_SELECT: &str = r#"
    SELECT m.id, m.pharmacy_id, m.name, df.name AS dosage_form, s.name AS supplier,
           m.schedule, m.sale_price, m.reorder_level, m.quantity_on_hand
    FROM medications m
    JOIN dosage_forms df ON m.dosage_form_id = df.id
    JOIN suppliers s ON m.supplier_id = s.id
    WHERE 1=1"#;

/// List medications, optionally scoped to one pharmacy
pub async fn list_medications(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListMedicationsParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<MedicationSummary>>>, ApiError> {
    auth.require_manager()?;

    let mut query = PaginatedQuery::new(MEDICATION_SUMMARY_SELECT);
    query
        .filter_eq("m.pharmacy_id", params.pharmacy_id)
        .order_by("m.name", "ASC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let medications: Vec<MedicationSummary> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM medications WHERE ($1::uuid IS NULL OR pharmacy_id = $1)",
    )
    .bind(params.pharmacy_id)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(medications, metadata)))
}

#[derive(Debug, Deserialize)]
pub struct IngredientLineRequest {
    pub active_ingredient_id: Uuid,
    pub strength: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMedicationRequest {
    pub pharmacy_id: Uuid,
    pub name: String,
    pub dosage_form_id: Uuid,
    pub supplier_id: Uuid,
    pub schedule: i32,
    pub sale_price: Decimal,
    pub reorder_level: i32,
    pub quantity_on_hand: i32,
    #[serde(default)]
    pub ingredients: Vec<IngredientLineRequest>,
}

impl RequestValidation for CreateMedicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Medication name is required");
        validate_range!(self.schedule, 0, 6, "Schedule must be between 0 and 6");
        validate_field!(
            self.sale_price,
            self.sale_price >= Decimal::ZERO,
            "Sale price cannot be negative"
        );
        validate_field!(
            self.reorder_level,
            self.reorder_level >= 0,
            "Reorder level cannot be negative"
        );
        validate_field!(
            self.quantity_on_hand,
            self.quantity_on_hand >= 0,
            "Quantity on hand cannot be negative"
        );
        for ingredient in &self.ingredients {
            validate_required!(ingredient.strength, "Ingredient strength is required");
        }
        Ok(())
    }
}

/// Create a medication with its active-ingredient lines
pub async fn create_medication(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Uuid>>), ApiError> {
    auth.require_manager()?;
    req.validate()?;

    let mut tx = server.db_pool.begin().await?;

    let medication_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO medications
            (pharmacy_id, name, dosage_form_id, supplier_id, schedule,
             sale_price, reorder_level, quantity_on_hand)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(req.pharmacy_id)
    .bind(req.name.trim())
    .bind(req.dosage_form_id)
    .bind(req.supplier_id)
    .bind(req.schedule)
    .bind(req.sale_price)
    .bind(req.reorder_level)
    .bind(req.quantity_on_hand)
    .fetch_one(&mut *tx)
    .await?;

    for ingredient in &req.ingredients {
        sqlx::query(
            r#"
            INSERT INTO medication_ingredients (medication_id, active_ingredient_id, strength)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(medication_id)
        .bind(ingredient.active_ingredient_id)
        .bind(ingredient.strength.trim())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(medication_id = %medication_id, "Medication created");

    Ok((StatusCode::CREATED, Json(api_success(medication_id))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAdjustmentMode {
    Set,
    Increment,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub mode: StockAdjustmentMode,
    pub quantity: i32,
}

/// Adjust a medication's stock level, either setting it or adding to it
pub async fn adjust_stock(
    State(server): State<IbhayiServer>,
    Path(medication_id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<MedicationSummary>>, ApiError> {
    auth.require_manager()?;

    if req.quantity < 0 {
        return Err(ApiError::validation("Quantity cannot be negative"));
    }

    let rows_affected = match req.mode {
        StockAdjustmentMode::Set => {
            sqlx::query(
                "UPDATE medications SET quantity_on_hand = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(req.quantity)
            .bind(medication_id)
            .execute(&server.db_pool)
            .await?
            .rows_affected()
        }
        StockAdjustmentMode::Increment => {
            sqlx::query(
                r#"
                UPDATE medications
                SET quantity_on_hand = quantity_on_hand + $1, updated_at = NOW()
                WHERE id = $2
                "#,
            )
            .bind(req.quantity)
            .bind(medication_id)
            .execute(&server.db_pool)
            .await?
            .rows_affected()
        }
    };

    if rows_affected == 0 {
        return Err(ApiError::not_found("medication"));
    }

    let medication = fetch_medication_summary(&server, medication_id).await?;
    Ok(Json(api_success(medication)))
}

/// Medications at or below their reorder threshold.
///
/// The threshold carries a 10-unit buffer above the configured reorder level
/// so orders can be placed before stock actually runs out.
pub async fn low_stock(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListMedicationsParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<MedicationSummary>>>, ApiError> {
    auth.require_manager()?;

    let mut query = PaginatedQuery::new(MEDICATION_SUMMARY_SELECT);
    query
        .query_builder()
        .push(" AND m.quantity_on_hand <= m.reorder_level + 10");
    query
        .filter_eq("m.pharmacy_id", params.pharmacy_id)
        .order_by("m.quantity_on_hand", "ASC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let medications: Vec<MedicationSummary> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM medications
        WHERE quantity_on_hand <= reorder_level + 10
          AND ($1::uuid IS NULL OR pharmacy_id = $1)
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(medications, metadata)))
}

async fn fetch_medication_summary(
    server: &IbhayiServer,
    medication_id: Uuid,
) -> Result<MedicationSummary, ApiError> {
    sqlx::query_as::<_, MedicationSummary>(
        r#"
        SELECT m.id, m.pharmacy_id, m.name, df.name AS dosage_form, s.name AS supplier,
               m.schedule, m.sale_price, m.reorder_level, m.quantity_on_hand
        FROM medications m
        JOIN dosage_forms df ON m.dosage_form_id = df.id
        JOIN suppliers s ON m.supplier_id = s.id
        WHERE m.id = $1
        "#,
    )
    .bind(medication_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("medication"))
}

// ============================================================================
// REFERENCE DATA
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReferenceListParams {
    pub pharmacy_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNamedRequest {
    pub pharmacy_id: Uuid,
    pub name: String,
}

impl RequestValidation for CreateNamedRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Name is required");
        Ok(())
    }
}

/// List a pharmacy's active ingredients
pub async fn list_active_ingredients(
    State(server): State<IbhayiServer>,
    Query(params): Query<ReferenceListParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<ActiveIngredient>>>, ApiError> {
    auth.require_manager()?;

    let ingredients = sqlx::query_as::<_, ActiveIngredient>(
        r#"
        SELECT * FROM active_ingredients
        WHERE ($1::uuid IS NULL OR pharmacy_id = $1)
        ORDER BY name
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(ingredients)))
}

/// Create an active ingredient
pub async fn create_active_ingredient(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ActiveIngredient>>), ApiError> {
    auth.require_manager()?;
    req.validate()?;

    let ingredient = sqlx::query_as::<_, ActiveIngredient>(
        "INSERT INTO active_ingredients (pharmacy_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(req.pharmacy_id)
    .bind(req.name.trim())
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(ingredient))))
}

/// List a pharmacy's dosage forms
pub async fn list_dosage_forms(
    State(server): State<IbhayiServer>,
    Query(params): Query<ReferenceListParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<DosageForm>>>, ApiError> {
    auth.require_manager()?;

    let forms = sqlx::query_as::<_, DosageForm>(
        r#"
        SELECT * FROM dosage_forms
        WHERE ($1::uuid IS NULL OR pharmacy_id = $1)
        ORDER BY name
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(forms)))
}

/// Create a dosage form
pub async fn create_dosage_form(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DosageForm>>), ApiError> {
    auth.require_manager()?;
    req.validate()?;

    let form = sqlx::query_as::<_, DosageForm>(
        "INSERT INTO dosage_forms (pharmacy_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(req.pharmacy_id)
    .bind(req.name.trim())
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(form))))
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    pub pharmacy_id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

impl RequestValidation for CreateSupplierRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Supplier name is required");
        validate_required!(self.email, "Supplier email is required");
        validate_email!(self.email, "Invalid email format");
        Ok(())
    }
}

/// List a pharmacy's suppliers
pub async fn list_suppliers(
    State(server): State<IbhayiServer>,
    Query(params): Query<ReferenceListParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Supplier>>>, ApiError> {
    auth.require_manager()?;

    let suppliers = sqlx::query_as::<_, Supplier>(
        r#"
        SELECT * FROM suppliers
        WHERE ($1::uuid IS NULL OR pharmacy_id = $1)
        ORDER BY name
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(suppliers)))
}

/// Create a supplier
pub async fn create_supplier(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Supplier>>), ApiError> {
    auth.require_manager()?;
    req.validate()?;

    let supplier = sqlx::query_as::<_, Supplier>(
        r#"
        INSERT INTO suppliers (pharmacy_id, name, contact_person, email, phone)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(req.pharmacy_id)
    .bind(req.name.trim())
    .bind(req.contact_person.as_deref())
    .bind(req.email.trim())
    .bind(req.phone.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(supplier))))
}

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub pharmacy_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub practice_number: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

impl RequestValidation for CreateDoctorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.first_name, "First name is required");
        validate_required!(self.last_name, "Last name is required");
        validate_required!(self.practice_number, "Practice number is required");
        if let Some(ref email) = self.email {
            validate_email!(email, "Invalid email format");
        }
        Ok(())
    }
}

/// List a pharmacy's doctors
pub async fn list_doctors(
    State(server): State<IbhayiServer>,
    Query(params): Query<ReferenceListParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Doctor>>>, ApiError> {
    auth.require_manager()?;

    let doctors = sqlx::query_as::<_, Doctor>(
        r#"
        SELECT * FROM doctors
        WHERE ($1::uuid IS NULL OR pharmacy_id = $1)
        ORDER BY last_name, first_name
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(doctors)))
}

/// Create a doctor
pub async fn create_doctor(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Doctor>>), ApiError> {
    auth.require_manager()?;
    req.validate()?;

    let doctor = sqlx::query_as::<_, Doctor>(
        r#"
        INSERT INTO doctors
            (pharmacy_id, first_name, last_name, practice_number, contact_number, email)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(req.pharmacy_id)
    .bind(req.first_name.trim())
    .bind(req.last_name.trim())
    .bind(req.practice_number.trim())
    .bind(req.contact_number.as_deref())
    .bind(req.email.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(doctor))))
}

#[derive(Debug, Deserialize)]
pub struct ListPharmacistsParams {
    pub pharmacy_id: Option<Uuid>,
}

/// List pharmacists with their account details
pub async fn list_pharmacists(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListPharmacistsParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PharmacistSummary>>>, ApiError> {
    auth.require_manager()?;

    let pharmacists = sqlx::query_as::<_, PharmacistSummary>(
        r#"
        SELECT p.id, p.pharmacy_id, p.health_council_number,
               u.first_name, u.last_name, u.email
        FROM pharmacists p
        JOIN user_accounts u ON p.user_id = u.id
        WHERE ($1::uuid IS NULL OR p.pharmacy_id = $1)
        ORDER BY u.last_name, u.first_name
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(pharmacists)))
}

// ============================================================================
// STOCK ORDERS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListStockOrdersParams {
    pub pharmacy_id: Option<Uuid>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List stock orders
pub async fn list_stock_orders(
    State(server): State<IbhayiServer>,
    Query(params): Query<ListStockOrdersParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<StockOrder>>>, ApiError> {
    auth.require_manager()?;

    let mut query = PaginatedQuery::new("SELECT * FROM stock_orders WHERE 1=1");
    query
        .filter_pharmacy(params.pharmacy_id)
        .filter_eq("status", params.status.clone())
        .order_by("placed_at", "DESC")
        .paginate(params.pagination.page, params.pagination.page_size);

    let orders: Vec<StockOrder> = query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM stock_orders
        WHERE ($1::uuid IS NULL OR pharmacy_id = $1)
          AND ($2::text IS NULL OR status = $2)
        "#,
    )
    .bind(params.pharmacy_id)
    .bind(params.status.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(orders, metadata)))
}

#[derive(Debug, Deserialize)]
pub struct StockOrderLineRequest {
    pub medication_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateStockOrderRequest {
    pub pharmacy_id: Uuid,
    pub supplier_id: Uuid,
    pub lines: Vec<StockOrderLineRequest>,
}

impl RequestValidation for CreateStockOrderRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.lines,
            !self.lines.is_empty(),
            "A stock order needs at least one line"
        );
        for line in &self.lines {
            validate_field!(
                line.quantity,
                line.quantity > 0,
                "Line quantities must be positive"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct StockOrderResponse {
    pub order: StockOrder,
    pub items: Vec<StockOrderItem>,
}

/// Place a stock order with a supplier and email them the order summary.
///
/// The email is best-effort: delivery failure is logged and the order stands.
pub async fn create_stock_order(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
    Json(req): Json<CreateStockOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StockOrderResponse>>), ApiError> {
    auth.require_manager()?;
    req.validate()?;

    let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
        .bind(req.supplier_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("supplier"))?;

    let order_number = format!("SO-{}", Utc::now().timestamp());

    let mut tx = server.db_pool.begin().await?;

    let order = sqlx::query_as::<_, StockOrder>(
        r#"
        INSERT INTO stock_orders (pharmacy_id, supplier_id, order_number, status)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(req.pharmacy_id)
    .bind(req.supplier_id)
    .bind(&order_number)
    .bind(stock_order_status::PENDING)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(req.lines.len());
    for line in &req.lines {
        let item = sqlx::query_as::<_, StockOrderItem>(
            r#"
            INSERT INTO stock_order_items (stock_order_id, medication_id, quantity_ordered)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(line.medication_id)
        .bind(line.quantity)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }

    tx.commit().await?;

    // Gather medication names for the supplier email
    let email_lines = sqlx::query_as::<_, (String, i32)>(
        r#"
        SELECT m.name, soi.quantity_ordered
        FROM stock_order_items soi
        JOIN medications m ON soi.medication_id = m.id
        WHERE soi.stock_order_id = $1
        "#,
    )
    .bind(order.id)
    .fetch_all(&server.db_pool)
    .await?
    .into_iter()
    .map(|(medication_name, quantity_ordered)| StockOrderLine {
        medication_name,
        quantity_ordered,
    })
    .collect::<Vec<_>>();

    if let Err(e) = server
        .email
        .send_stock_order_email(&supplier.email, &supplier.name, &order_number, &email_lines)
        .await
    {
        tracing::warn!(
            order_number = %order_number,
            error = %e,
            "Failed to send stock order email to supplier"
        );
    }

    tracing::info!(order_number = %order_number, "Stock order placed");

    Ok((
        StatusCode::CREATED,
        Json(api_success(StockOrderResponse { order, items })),
    ))
}

/// Mark a pending stock order received.
///
/// Inventory is untouched here; quantities enter stock through the explicit
/// stock adjustment endpoint once the delivery is checked in.
pub async fn receive_stock_order(
    State(server): State<IbhayiServer>,
    Path(order_id): Path<Uuid>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<StockOrder>>, ApiError> {
    auth.require_manager()?;

    let order = sqlx::query_as::<_, StockOrder>(
        r#"
        UPDATE stock_orders
        SET status = $1, received_at = NOW()
        WHERE id = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(stock_order_status::RECEIVED)
    .bind(order_id)
    .bind(stock_order_status::PENDING)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("pending stock order"))?;

    tracing::info!(order_number = %order.order_number, "Stock order received");

    Ok(Json(api_success(order)))
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StockTakeParams {
    pub pharmacy_id: Uuid,
    pub group_by: Option<StockGroupBy>,
}

/// Stock-take PDF download, grouped by the selected key
pub async fn stock_take_report(
    State(server): State<IbhayiServer>,
    Query(params): Query<StockTakeParams>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    auth.require_manager()?;

    let pharmacy = sqlx::query_as::<_, Pharmacy>("SELECT * FROM pharmacies WHERE id = $1")
        .bind(params.pharmacy_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("pharmacy"))?;

    let rows = sqlx::query_as::<_, (String, String, i32, i32, String)>(
        r#"
        SELECT m.name, df.name, m.quantity_on_hand, m.schedule, s.name
        FROM medications m
        JOIN dosage_forms df ON m.dosage_form_id = df.id
        JOIN suppliers s ON m.supplier_id = s.id
        WHERE m.pharmacy_id = $1
        ORDER BY m.name
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?
    .into_iter()
    .map(
        |(medication_name, dosage_form, quantity_on_hand, schedule, supplier)| StockTakeRow {
            medication_name,
            dosage_form,
            quantity_on_hand,
            schedule,
            supplier,
        },
    )
    .collect::<Vec<_>>();

    let group_by = params.group_by.unwrap_or_default();
    let bytes = PdfService::generate_stock_take_pdf(&pharmacy.name, rows, group_by)?;

    Ok(pdf_download(
        bytes,
        &format!("stock_take_{}.pdf", Utc::now().format("%Y%m%d_%H%M%S")),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub pharmacy_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub prescription_count: i64,
    pub pending_count: i64,
    pub total_sales: Decimal,
    pub top_medications: Vec<TopMedication>,
}

#[derive(Debug, Serialize)]
pub struct TopMedication {
    pub name: String,
    pub total_quantity: i64,
}

/// Summary figures over an inclusive date range
pub async fn summary_report(
    State(server): State<IbhayiServer>,
    Query(params): Query<SummaryParams>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<SummaryReport>>, ApiError> {
    auth.require_manager()?;

    let (start, end) = report_service::inclusive_bounds(params.from, params.to);

    let prescription_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM prescriptions
        WHERE prescribed_date BETWEEN $1 AND $2
          AND ($3::uuid IS NULL OR pharmacy_id = $3)
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(params.pharmacy_id)
    .fetch_one(&server.db_pool)
    .await?;

    let pending_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM prescriptions
        WHERE status = 'pending'
          AND ($1::uuid IS NULL OR pharmacy_id = $1)
        "#,
    )
    .bind(params.pharmacy_id)
    .fetch_one(&server.db_pool)
    .await?;

    let dispensed_lines = sqlx::query_as::<_, (String, Decimal, i32)>(
        r#"
        SELECT m.name, m.sale_price, pd.quantity
        FROM prescription_dispenses pd
        JOIN prescription_items pi ON pd.prescription_item_id = pi.id
        JOIN medications m ON pi.medication_id = m.id
        WHERE pd.dispensed_at BETWEEN $1 AND $2
          AND ($3::uuid IS NULL OR m.pharmacy_id = $3)
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(params.pharmacy_id)
    .fetch_all(&server.db_pool)
    .await?;

    let total_sales = report_service::calculate_amount_due(
        &dispensed_lines
            .iter()
            .map(|(_, price, quantity)| (*price, *quantity))
            .collect::<Vec<_>>(),
    );

    let top_medications = report_service::top_dispensed(
        &dispensed_lines
            .iter()
            .map(|(name, _, quantity)| (name.clone(), *quantity))
            .collect::<Vec<_>>(),
        5,
    )
    .into_iter()
    .map(|(name, total_quantity)| TopMedication {
        name,
        total_quantity,
    })
    .collect();

    Ok(Json(api_success(SummaryReport {
        prescription_count,
        pending_count,
        total_sales,
        top_medications,
    })))
}

/// Build an `application/pdf` attachment response.
pub(crate) fn pdf_download(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

//! Database seeding for first-run setup.
//!
//! Creates the admin manager account plus enough reference data to exercise
//! the system: one pharmacy, common dosage forms and active ingredients, a
//! supplier, and a doctor. Every insert is idempotent so re-running the
//! seeder against an initialized database is harmless.

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::hash_password;

const DEFAULT_DOSAGE_FORMS: &[&str] = &["Tablet", "Capsule", "Syrup", "Cream", "Injection"];

const DEFAULT_ACTIVE_INGREDIENTS: &[&str] = &[
    "Paracetamol",
    "Ibuprofen",
    "Amoxicillin",
    "Cetirizine",
    "Loratadine",
];

/// Seed the admin account and baseline reference data.
///
/// The admin credentials come from `ADMIN_EMAIL` and `ADMIN_PASSWORD`.
pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    let admin_email = std::env::var("ADMIN_EMAIL")
        .context("ADMIN_EMAIL environment variable is required for seeding")?;
    let admin_password = std::env::var("ADMIN_PASSWORD")
        .context("ADMIN_PASSWORD environment variable is required for seeding")?;

    seed_admin(pool, &admin_email, &admin_password).await?;
    let pharmacy_id = seed_pharmacy(pool).await?;
    seed_reference_data(pool, pharmacy_id).await?;

    tracing::info!(pharmacy_id = %pharmacy_id, "Database seeding complete");
    Ok(())
}

async fn seed_admin(pool: &PgPool, email: &str, password: &str) -> anyhow::Result<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM user_accounts WHERE email = $1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    if exists {
        tracing::info!("Admin account already present, skipping");
        return Ok(());
    }

    let password_hash = hash_password(password).await?;

    sqlx::query(
        r#"
        INSERT INTO user_accounts (email, password_hash, role, first_name, last_name)
        VALUES ($1, $2, 'manager', 'System', 'Administrator')
        "#,
    )
    .bind(email)
    .bind(&password_hash)
    .execute(pool)
    .await?;

    tracing::info!(email = %email, "Admin manager account created");
    Ok(())
}

async fn seed_pharmacy(pool: &PgPool) -> anyhow::Result<Uuid> {
    if let Some(id) =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM pharmacies ORDER BY created_at LIMIT 1")
            .fetch_optional(pool)
            .await?
    {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO pharmacies (name, address, contact_number, email, license_number)
        VALUES ('Ibhayi Pharmacy', '12 Govan Mbeki Avenue, Gqeberha',
                '041 555 0100', 'info@ibhayipharmacy.co.za', 'PHARM-0001')
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await?;

    tracing::info!("Default pharmacy created");
    Ok(id)
}

async fn seed_reference_data(pool: &PgPool, pharmacy_id: Uuid) -> anyhow::Result<()> {
    for name in DEFAULT_DOSAGE_FORMS {
        sqlx::query(
            r#"
            INSERT INTO dosage_forms (pharmacy_id, name) VALUES ($1, $2)
            ON CONFLICT (pharmacy_id, name) DO NOTHING
            "#,
        )
        .bind(pharmacy_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    for name in DEFAULT_ACTIVE_INGREDIENTS {
        sqlx::query(
            r#"
            INSERT INTO active_ingredients (pharmacy_id, name) VALUES ($1, $2)
            ON CONFLICT (pharmacy_id, name) DO NOTHING
            "#,
        )
        .bind(pharmacy_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let has_supplier = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM suppliers WHERE pharmacy_id = $1)",
    )
    .bind(pharmacy_id)
    .fetch_one(pool)
    .await?;
    if !has_supplier {
        sqlx::query(
            r#"
            INSERT INTO suppliers (pharmacy_id, name, contact_person, email, phone)
            VALUES ($1, 'Eastern Cape Pharmaceutical Wholesalers', 'T. Jacobs',
                    'orders@ecpw.co.za', '041 555 0200')
            "#,
        )
        .bind(pharmacy_id)
        .execute(pool)
        .await?;
    }

    let has_doctor = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM doctors WHERE pharmacy_id = $1)",
    )
    .bind(pharmacy_id)
    .fetch_one(pool)
    .await?;
    if !has_doctor {
        sqlx::query(
            r#"
            INSERT INTO doctors (pharmacy_id, first_name, last_name, practice_number, contact_number)
            VALUES ($1, 'Nomsa', 'Dlamini', 'MP-447281', '041 555 0300')
            "#,
        )
        .bind(pharmacy_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

//! Query builder utilities for consistent SQL query construction
//!
//! This module provides utilities to eliminate duplication in SQL query building
//! across handlers, particularly for filtering, ordering, and pagination.

use sqlx::query::QueryAs;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Paginated query builder for consistent query construction
///
/// Example usage:
/// ```ignore
/// let mut query = PaginatedQuery::new("SELECT * FROM prescriptions WHERE 1=1");
/// query
///     .filter_pharmacy(Some(pharmacy_id))
///     .filter_eq("status", params.status.clone())
///     .order_by("prescribed_date", "DESC")
///     .paginate(params.page, params.page_size);
///
/// let rows: Vec<Prescription> = query.build_query_as().fetch_all(&pool).await?;
/// ```
pub struct PaginatedQuery<'a> {
    query: QueryBuilder<'a, Postgres>,
    page: u32,
    page_size: u32,
}

impl<'a> PaginatedQuery<'a> {
    /// Create a new paginated query builder
    pub fn new(base_query: &'static str) -> Self {
        Self {
            query: QueryBuilder::new(base_query),
            page: 1,
            page_size: 20,
        }
    }

    /// Add a required base filter (appends to existing WHERE clause)
    pub fn add_base_filter<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        self.query.push(format!(" AND {} = ", column));
        self.query.push_bind(value);
        self
    }

    /// Add an equality filter (only if value is Some)
    pub fn filter_eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        if let Some(val) = value {
            self.query.push(format!(" AND {} = ", column));
            self.query.push_bind(val);
        }
        self
    }

    /// Add a not-equal filter (only if value is Some)
    pub fn filter_ne<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        if let Some(val) = value {
            self.query.push(format!(" AND {} != ", column));
            self.query.push_bind(val);
        }
        self
    }

    /// Filter by pharmacy_id (common pattern)
    pub fn filter_pharmacy(&mut self, pharmacy_id: Option<Uuid>) -> &mut Self {
        self.filter_eq("pharmacy_id", pharmacy_id)
    }

    /// Add ORDER BY clause
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        self.query.push(format!(" ORDER BY {} {}", column, direction));
        self
    }

    /// Add ORDER BY created_at DESC (common pattern)
    pub fn order_by_created_desc(&mut self) -> &mut Self {
        self.order_by("created_at", "DESC")
    }

    /// Apply pagination
    pub fn paginate(&mut self, page: Option<u32>, page_size: Option<u32>) -> &mut Self {
        self.page = page.unwrap_or(1).max(1);
        self.page_size = page_size.unwrap_or(20).clamp(1, 100);
        let offset = (self.page - 1) * self.page_size;
        self.query.push(" LIMIT ");
        self.query.push_bind(self.page_size as i64);
        self.query.push(" OFFSET ");
        self.query.push_bind(offset as i64);
        self
    }

    /// Build the final query as a typed query for fetching specific types
    pub fn build_query_as<T>(&mut self) -> QueryAs<'_, Postgres, T, sqlx::postgres::PgArguments>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        self.query.build_query_as()
    }

    /// Get the underlying query builder for advanced use cases
    pub fn query_builder(&mut self) -> &mut QueryBuilder<'a, Postgres> {
        &mut self.query
    }

    /// Get current page
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Get current page size
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_query_builder() {
        let mut query = PaginatedQuery::new("SELECT * FROM medications WHERE 1=1");
        query
            .filter_eq("status", Some("pending"))
            .order_by("created_at", "DESC")
            .paginate(Some(2), Some(10));

        assert_eq!(query.page(), 2);
        assert_eq!(query.page_size(), 10);
    }

    #[test]
    fn test_filter_eq_with_none() {
        let mut query = PaginatedQuery::new("SELECT * FROM medications WHERE 1=1");
        query.filter_eq("status", None::<String>);
        // Should not add filter when value is None
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 20);
    }

    #[test]
    fn test_filter_pharmacy() {
        let pharmacy_id = Uuid::new_v4();
        let mut query = PaginatedQuery::new("SELECT * FROM medications WHERE 1=1");
        query.filter_pharmacy(Some(pharmacy_id));
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_filter_ne() {
        let mut query = PaginatedQuery::new("SELECT * FROM stock_orders WHERE 1=1");
        query.filter_ne("status", Some("received"));
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_paginate_defaults() {
        let mut query = PaginatedQuery::new("SELECT * FROM medications WHERE 1=1");
        query.paginate(None, None);
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 20);
    }

    #[test]
    fn test_paginate_clamps() {
        let mut query = PaginatedQuery::new("SELECT * FROM medications WHERE 1=1");
        query.paginate(Some(0), Some(200));
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 100);
    }

    #[test]
    fn test_chaining_filters() {
        let pharmacy_id = Uuid::new_v4();
        let mut query = PaginatedQuery::new("SELECT * FROM prescriptions WHERE 1=1");
        query
            .filter_pharmacy(Some(pharmacy_id))
            .filter_eq("status", Some("pending"))
            .order_by_created_desc()
            .paginate(Some(2), Some(25));

        assert_eq!(query.page(), 2);
        assert_eq!(query.page_size(), 25);
    }
}

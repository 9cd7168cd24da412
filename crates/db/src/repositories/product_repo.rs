//! Repository for the `products` table.
//!
//! The import pipeline and the HTTP API both end up here: the pipeline via
//! [`ProductRepo::bulk_upsert`], the API via the CRUD methods. Identity is
//! always `sku_lower`; the repository derives it on every write path so a
//! product can never be stored with a key that disagrees with its SKU.

use sqlx::PgPool;
use stockroom_core::importer::{sku_key, ProductRow};
use stockroom_core::types::DbId;

use crate::models::product::{CreateProduct, Product, ProductListQuery, UpdateProduct};

/// Column list for `products` queries.
const COLUMNS: &str = "\
    id, sku, sku_lower, name, description, price, active, \
    created_at, updated_at";

/// Number of bind parameters per row in a bulk upsert.
const UPSERT_BINDS_PER_ROW: u32 = 6;

/// Provides CRUD and bulk-upsert operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Create a single product. Fails with a unique violation if the
    /// derived `sku_lower` already exists.
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (sku, sku_lower, name, description, price, active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.sku)
            .bind(sku_key(&input.sku))
            .bind(&input.name)
            .bind(input.description.as_deref())
            .bind(input.price)
            .bind(input.active.unwrap_or(true))
            .fetch_one(pool)
            .await
    }

    /// Find a product by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List products with optional filters, most recently updated first.
    pub async fn list(
        pool: &PgPool,
        params: &ProductListQuery,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let limit = stockroom_core::pagination::clamp_limit(params.limit);
        let offset = stockroom_core::pagination::clamp_offset(params.offset);

        // Build dynamic WHERE clauses.
        let mut conditions = Vec::new();
        let mut bind_idx = 1u32;

        if params.q.is_some() {
            conditions.push(format!(
                "(sku ILIKE ${bind_idx} OR name ILIKE ${bind_idx} OR description ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if params.sku.is_some() {
            conditions.push(format!("sku ILIKE ${bind_idx}"));
            bind_idx += 1;
        }
        if params.name.is_some() {
            conditions.push(format!("name ILIKE ${bind_idx}"));
            bind_idx += 1;
        }
        if params.active.is_some() {
            conditions.push(format!("active = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM products \
             {where_clause} \
             ORDER BY updated_at DESC \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Product>(&query);

        // Bind dynamic parameters in order.
        if let Some(ref term) = params.q {
            q = q.bind(format!("%{term}%"));
        }
        if let Some(ref sku) = params.sku {
            q = q.bind(format!("%{sku}%"));
        }
        if let Some(ref name) = params.name {
            q = q.bind(format!("%{name}%"));
        }
        if let Some(active) = params.active {
            q = q.bind(active);
        }

        q = q.bind(limit).bind(offset);
        q.fetch_all(pool).await
    }

    /// Update an existing product. Omitted fields keep their current value;
    /// a changed `sku` re-derives `sku_lower`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET \
                sku = COALESCE($2, sku), \
                sku_lower = COALESCE($3, sku_lower), \
                name = COALESCE($4, name), \
                description = COALESCE($5, description), \
                price = COALESCE($6, price), \
                active = COALESCE($7, active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(input.sku.as_deref())
            .bind(input.sku.as_deref().map(sku_key))
            .bind(input.name.as_deref())
            .bind(input.description.as_deref())
            .bind(input.price)
            .bind(input.active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a product by ID. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every product. Returns the number of rows removed.
    pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products").execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Upsert a batch of parsed rows in one atomic statement.
    ///
    /// Inserted rows get `created_at = updated_at = NOW()`; conflicting rows
    /// (same `sku_lower`) have every mutable field overwritten and only
    /// `updated_at` refreshed. Either the whole batch commits or none of it
    /// does.
    ///
    /// Callers must not pass two rows with the same `sku_lower`: Postgres
    /// rejects an `ON CONFLICT DO UPDATE` that touches one row twice. The
    /// batch must also stay under the 65535 bind-parameter statement cap
    /// (six binds per row); `UpsertBatcher` clamps its capacity accordingly.
    pub async fn bulk_upsert(pool: &PgPool, rows: &[ProductRow]) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        // Build a multi-row INSERT statement.
        let mut query = String::from(
            "INSERT INTO products \
             (sku, sku_lower, name, description, price, active, created_at, updated_at) \
             VALUES ",
        );
        let mut param_idx = 1u32;
        let mut first = true;

        for _ in rows {
            if !first {
                query.push_str(", ");
            }
            first = false;
            query.push('(');
            for i in 0..UPSERT_BINDS_PER_ROW {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push_str(", NOW(), NOW())");
        }

        query.push_str(
            " ON CONFLICT (sku_lower) DO UPDATE SET \
               sku = EXCLUDED.sku, \
               name = EXCLUDED.name, \
               description = EXCLUDED.description, \
               price = EXCLUDED.price, \
               active = EXCLUDED.active, \
               updated_at = NOW()",
        );

        let mut q = sqlx::query(&query);
        for row in rows {
            q = q
                .bind(&row.sku)
                .bind(&row.sku_lower)
                .bind(&row.name)
                .bind(&row.description)
                .bind(row.price)
                .bind(row.active);
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }
}

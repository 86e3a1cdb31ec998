//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError |
//! |-----------------------|------------|
//! | `23505` (unique violation) | `UniqueViolation` |
//! | `23503` (foreign key violation) | `MissingReference` |
//! | anything else, pool/network failures | `Backend` |

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;

use bazaar_auth::{NewUser, Role, User};
use bazaar_core::{ProductId, SaleId, UserId};
use bazaar_products::{NewProduct, Product};
use bazaar_sales::{NewSale, Sale, SaleDetails, SaleFilter, SaleLineItem, SaleStatus};

use super::traits::{ProductStore, SaleStore, StoreError, StoreResult, UserStore};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_digest TEXT NOT NULL,
        role TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price NUMERIC(9, 2) NOT NULL,
        url_image TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        seller_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        total_price NUMERIC(9, 2) NOT NULL,
        delivery_address TEXT NOT NULL,
        delivery_number TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Pendente',
        sale_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales_products (
        sale_id BIGINT NOT NULL REFERENCES sales (id) ON DELETE CASCADE,
        product_id BIGINT NOT NULL REFERENCES products (id),
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        PRIMARY KEY (sale_id, product_id)
    )
    "#,
];

const SALE_COLUMNS: &str = "id, user_id, seller_id, total_price, delivery_address, delivery_number, status, sale_date";

/// PostgreSQL implementation of every store trait.
///
/// `PgPool` is internally reference counted, so cloning the store shares the
/// same pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(email = %user.email, role = %user.role), err)]
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_digest, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_digest)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(user.into_user(UserId::new(id)))
    }

    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_digest, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_digest, role FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password_digest, role
            FROM users
            WHERE ($1::text IS NULL OR role = $1)
            ORDER BY id ASC
            "#,
        )
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(name = %product.name), err)]
    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        let row = sqlx::query(
            "INSERT INTO products (name, price, url_image) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&product.name)
        .bind(product.price.round_dp(2))
        .bind(&product.url_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(product.into_product(ProductId::new(id)))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT id, name, price, url_image FROM products WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price, url_image FROM products ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait]
impl SaleStore for PostgresStore {
    /// Inserts the sale row and every line item in one transaction; any
    /// failing item rolls the whole sale back.
    #[instrument(
        skip(self, sale),
        fields(buyer_id = %sale.user_id, seller_id = %sale.seller_id, items = sale.items.len()),
        err
    )]
    async fn insert(&self, sale: NewSale) -> StoreResult<SaleDetails> {
        let created_at = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO sales (
                user_id,
                seller_id,
                total_price,
                delivery_address,
                delivery_number,
                status,
                sale_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(sale.user_id.get())
        .bind(sale.seller_id.get())
        .bind(sale.total_price.round_dp(2))
        .bind(&sale.delivery_address)
        .bind(&sale.delivery_number)
        .bind(SaleStatus::INITIAL.as_str())
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_sale", e))?;

        let id = SaleId::new(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("insert_sale", e))?,
        );

        for item in &sale.items {
            sqlx::query(
                "INSERT INTO sales_products (sale_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(id.get())
            .bind(item.product_id.get())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sale_product", e))?;
        }

        // Dropping `tx` on any early return above rolls the sale back.
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let (sale, products) = sale.into_rows(id, created_at);
        Ok(SaleDetails { sale, products })
    }

    #[instrument(skip(self), fields(sale_id = %id), err)]
    async fn find_by_id(&self, id: SaleId) -> StoreResult<Option<Sale>> {
        let row = sqlx::query(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_sale", e))?;

        row.as_ref().map(sale_from_row).transpose()
    }

    #[instrument(skip(self), fields(sale_id = %id), err)]
    async fn line_items(&self, id: SaleId) -> StoreResult<Vec<SaleLineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT sale_id, product_id, quantity
            FROM sales_products
            WHERE sale_id = $1
            ORDER BY product_id ASC
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_sale_products", e))?;

        rows.iter()
            .map(|row| {
                Ok(SaleLineItem {
                    sale_id: SaleId::new(get(row, "sale_id")?),
                    product_id: ProductId::new(get(row, "product_id")?),
                    quantity: get(row, "quantity")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: SaleFilter) -> StoreResult<Vec<Sale>> {
        let (buyer, seller) = match filter {
            SaleFilter::All => (None, None),
            SaleFilter::Buyer(id) => (Some(id.get()), None),
            SaleFilter::Seller(id) => (None, Some(id.get())),
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE ($1::bigint IS NULL OR user_id = $1)
                AND ($2::bigint IS NULL OR seller_id = $2)
            ORDER BY id ASC
            "#
        ))
        .bind(buyer)
        .bind(seller)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_sales", e))?;

        rows.iter().map(sale_from_row).collect()
    }

    #[instrument(skip(self), fields(sale_id = %id, from = %expected, to = %next), err)]
    async fn update_status(
        &self,
        id: SaleId,
        expected: SaleStatus,
        next: SaleStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE sales SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(id.get())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_sale_status", e))?;
        Ok(result.rows_affected() == 1)
    }
}

// Row decoding

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| map_sqlx_error("decode_row", e))
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = get(row, "role")?;
    Ok(User {
        id: UserId::new(get(row, "id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        password_digest: get(row, "password_digest")?,
        role: role
            .parse()
            .map_err(|_| StoreError::Backend(format!("unknown role '{role}' in users row")))?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::new(get(row, "id")?),
        name: get(row, "name")?,
        price: get(row, "price")?,
        url_image: get(row, "url_image")?,
    })
}

fn sale_from_row(row: &PgRow) -> StoreResult<Sale> {
    let status: String = get(row, "status")?;
    Ok(Sale {
        id: SaleId::new(get(row, "id")?),
        user_id: UserId::new(get(row, "user_id")?),
        seller_id: UserId::new(get(row, "seller_id")?),
        total_price: get(row, "total_price")?,
        delivery_address: get(row, "delivery_address")?,
        delivery_number: get(row, "delivery_number")?,
        status: status
            .parse()
            .map_err(|_| StoreError::Backend(format!("unknown status '{status}' in sales row")))?,
        created_at: get(row, "sale_date")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

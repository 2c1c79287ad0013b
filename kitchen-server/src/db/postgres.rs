//! PostgreSQL store

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    CartItem, CartItemCreate, CategoryStats, MenuItem, MenuItemInput, Payment, PaymentDraft,
    Review, ReviewCreate, SettlementIssue, User, UserCreate,
};
use shared::util::{new_id, now_millis};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{
    CartStore, MenuStore, ReportStore, ReviewStore, SettlementRecord, SettlementStore, StoreError,
    StoreResult, UserStore,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_PAYMENT_STATUS: &str = "pending";

/// Rows are locked in id order so settlements over overlapping carts
/// queue behind each other instead of deadlocking.
const LOCK_CART_ROWS: &str =
    "SELECT id FROM carts WHERE id = ANY($1) AND email = $2 ORDER BY id FOR UPDATE";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::new(pool))
    }

    async fn estimated_count(&self, table: &str) -> StoreResult<i64> {
        let estimate: Option<f32> =
            sqlx::query_scalar("SELECT reltuples FROM pg_class WHERE relname = $1")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;

        // reltuples is -1 until the table has been analyzed
        match estimate {
            Some(n) if n >= 0.0 => Ok(n as i64),
            _ => {
                let exact: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                    .fetch_one(&self.pool)
                    .await?;
                Ok(exact)
            }
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn insert_user_if_absent(&self, user: UserCreate) -> StoreResult<Option<String>> {
        let id: Option<String> = sqlx::query_scalar(
            "INSERT INTO users (id, email, name, photo_url, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO NOTHING
             RETURNING id",
        )
        .bind(new_id())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.photo_url)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn promote_to_admin(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }

    async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}

#[async_trait]
impl MenuStore for PgStore {
    async fn list_menu(&self) -> StoreResult<Vec<MenuItem>> {
        let items = sqlx::query_as("SELECT * FROM menu ORDER BY category, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn find_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        let item = sqlx::query_as("SELECT * FROM menu WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn insert_menu_item(&self, input: MenuItemInput) -> StoreResult<MenuItem> {
        let item = sqlx::query_as(
            "INSERT INTO menu (id, name, recipe, image, category, price, quantity)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(new_id())
        .bind(&input.name)
        .bind(&input.recipe)
        .bind(&input.image)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        id: &str,
        input: MenuItemInput,
    ) -> StoreResult<Option<MenuItem>> {
        let item = sqlx::query_as(
            "UPDATE menu
             SET name = $2, recipe = $3, image = $4, category = $5, price = $6, quantity = $7
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.recipe)
        .bind(&input.image)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.quantity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn delete_menu_item(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM menu WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        let reviews = sqlx::query_as("SELECT * FROM reviews")
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn insert_review(&self, review: ReviewCreate) -> StoreResult<Review> {
        let review = sqlx::query_as(
            "INSERT INTO reviews (id, name, details, rating)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(new_id())
        .bind(&review.name)
        .bind(&review.details)
        .bind(review.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn list_cart(&self, email: &str) -> StoreResult<Vec<CartItem>> {
        let items = sqlx::query_as("SELECT * FROM carts WHERE email = $1")
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn insert_cart_item(&self, item: CartItemCreate) -> StoreResult<CartItem> {
        let item = sqlx::query_as(
            "INSERT INTO carts (id, email, menu_item_id, name, image, price)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(new_id())
        .bind(&item.email)
        .bind(&item.menu_item_id)
        .bind(&item.name)
        .bind(&item.image)
        .bind(item.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn find_cart_item(&self, id: &str) -> StoreResult<Option<CartItem>> {
        let item = sqlx::query_as("SELECT * FROM carts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn delete_cart_item(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}

#[async_trait]
impl SettlementStore for PgStore {
    async fn settle(&self, draft: &PaymentDraft) -> StoreResult<SettlementRecord> {
        let mut tx = self.pool.begin().await?;

        // Lock the caller's cart rows so overlapping settlements serialize
        let locked: Vec<String> = sqlx::query_scalar(LOCK_CART_ROWS)
            .bind(draft.cart_ids.as_slice())
            .bind(&draft.email)
            .fetch_all(&mut *tx)
            .await?;

        let payment_id: Option<String> = sqlx::query_scalar(
            "INSERT INTO payments (id, email, price, transaction_id, date, cart_ids, menu_item_ids, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (transaction_id) DO NOTHING
             RETURNING id",
        )
        .bind(new_id())
        .bind(&draft.email)
        .bind(draft.price)
        .bind(&draft.transaction_id)
        .bind(draft.date.unwrap_or_else(chrono::Utc::now))
        .bind(draft.cart_ids.as_slice())
        .bind(draft.menu_item_ids.as_slice())
        .bind(draft.status.as_deref().unwrap_or(DEFAULT_PAYMENT_STATUS))
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping tx rolls back
        let Some(payment_id) = payment_id else {
            return Err(StoreError::Duplicate(format!(
                "transaction {} already recorded",
                draft.transaction_id
            )));
        };

        let deleted_count = sqlx::query("DELETE FROM carts WHERE id = ANY($1) AND email = $2")
            .bind(locked.as_slice())
            .bind(&draft.email)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let missing_cart_ids: Vec<String> = draft
            .cart_ids
            .iter()
            .filter(|id| !locked.contains(id))
            .cloned()
            .collect();

        if !missing_cart_ids.is_empty() {
            sqlx::query(
                "INSERT INTO settlement_issues (id, payment_id, email, missing_cart_ids, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(new_id())
            .bind(&payment_id)
            .bind(&draft.email)
            .bind(missing_cart_ids.as_slice())
            .bind(now_millis())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SettlementRecord {
            payment_id,
            deleted_count,
            missing_cart_ids,
        })
    }

    async fn list_payments(&self, email: &str) -> StoreResult<Vec<Payment>> {
        let payments = sqlx::query_as("SELECT * FROM payments WHERE email = $1 ORDER BY date DESC")
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    async fn list_settlement_issues(&self) -> StoreResult<Vec<SettlementIssue>> {
        let issues = sqlx::query_as("SELECT * FROM settlement_issues ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(issues)
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn estimated_counts(&self) -> StoreResult<(i64, i64, i64)> {
        let (users, menu_items, payments) = tokio::try_join!(
            self.estimated_count("users"),
            self.estimated_count("menu"),
            self.estimated_count("payments"),
        )?;
        Ok((users, menu_items, payments))
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        let revenue: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(price), 0) FROM payments")
            .fetch_one(&self.pool)
            .await?;
        Ok(revenue)
    }

    async fn order_stats_by_category(&self) -> StoreResult<Vec<CategoryStats>> {
        let stats = sqlx::query_as(
            "SELECT m.category AS category,
                    COUNT(*)::BIGINT AS quantity,
                    COALESCE(SUM(m.price), 0) AS revenue
             FROM payments p
             CROSS JOIN LATERAL UNNEST(p.menu_item_ids) AS item(menu_item_id)
             JOIN menu m ON m.id = item.menu_item_id
             GROUP BY m.category
             ORDER BY m.category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}

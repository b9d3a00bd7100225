use super::{ensure_owned, OwnedResource, Repository};
use crate::database::{
    CreateExpenseRequest, CreateShoppingItemRequest, Expense, ItemType, ShoppingItem,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

const DEFAULT_CURRENCY: &str = "USD";

impl OwnedResource for ShoppingItem {
    const TABLE: &'static str = "shopping_items";
    const ENTITY: &'static str = "Shopping item";
}

impl OwnedResource for Expense {
    const TABLE: &'static str = "expenses";
    const ENTITY: &'static str = "Expense";
    const ORDER_BY: &'static str = "spent_at DESC";
}

impl Repository {
    pub async fn create_shopping_item(
        &self,
        user_id: &str,
        req: CreateShoppingItemRequest,
        now: DateTime<Utc>,
    ) -> Result<ShoppingItem> {
        let mut conn = self.pool.acquire().await?;
        if let Some(category_id) = &req.category_id {
            super::tasks::ensure_category_visible(&mut conn, user_id, category_id).await?;
        }

        let id = Uuid::new_v4().to_string();

        let item = sqlx::query_as::<_, ShoppingItem>(
            r#"
            INSERT INTO shopping_items (
                id, user_id, name, note, expiry_date, quantity, unit,
                estimated_cost_cents, purchased, item_type, priority, category_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.note)
        .bind(req.expiry_date)
        .bind(req.quantity)
        .bind(&req.unit)
        .bind(req.estimated_cost_cents)
        .bind(req.item_type)
        .bind(req.priority)
        .bind(&req.category_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created shopping item: {} ({:?})", id, req.item_type);
        Ok(item)
    }

    pub async fn set_item_purchased(
        &self,
        user_id: &str,
        id: &str,
        purchased: bool,
    ) -> Result<ShoppingItem> {
        let rows = sqlx::query(
            "UPDATE shopping_items SET purchased = ? WHERE id = ? AND user_id = ?",
        )
        .bind(purchased)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(ShoppingItem::ENTITY, id));
        }

        self.get_owned(user_id, id).await
    }

    /// Unpurchased items expiring on or before `until`, or whose note says
    /// they are almost over
    pub async fn expiring_items(&self, user_id: &str, until: NaiveDate) -> Result<Vec<ShoppingItem>> {
        let items = sqlx::query_as::<_, ShoppingItem>(
            r#"
            SELECT * FROM shopping_items
            WHERE user_id = ? AND purchased = 0
              AND (
                (expiry_date IS NOT NULL AND expiry_date <= ?)
                OR LOWER(note) LIKE '%almost over%'
              )
            ORDER BY expiry_date IS NULL, expiry_date ASC
            "#,
        )
        .bind(user_id)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Unpurchased impulsive items, highest priority first
    pub async fn list_impulsive_items(&self, user_id: &str) -> Result<Vec<ShoppingItem>> {
        let items = sqlx::query_as::<_, ShoppingItem>(
            r#"
            SELECT * FROM shopping_items
            WHERE user_id = ? AND purchased = 0 AND item_type = ?
            ORDER BY CASE priority
                WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3
            END, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(ItemType::Impulsive)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn create_expense(
        &self,
        user_id: &str,
        req: CreateExpenseRequest,
        now: DateTime<Utc>,
    ) -> Result<Expense> {
        let mut conn = self.pool.acquire().await?;
        if let Some(item_id) = &req.shopping_item_id {
            ensure_owned::<ShoppingItem>(&mut conn, user_id, item_id).await?;
        }

        let id = Uuid::new_v4().to_string();
        // Defaults
        let currency = req.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, user_id, shopping_item_id, amount_cents, currency, category, note, spent_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.shopping_item_id)
        .bind(req.amount_cents)
        .bind(currency)
        .bind(&req.category)
        .bind(&req.note)
        .bind(req.spent_at.unwrap_or(now))
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Recorded expense: {} ({} cents)", id, req.amount_cents);
        Ok(expense)
    }

    /// Sum of every expense the user has recorded
    pub async fn total_spent_cents(&self, user_id: &str) -> Result<i64> {
        let total = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Whether any expense since `since` paid for an impulsive item
pub(crate) async fn impulsive_expense_since(
    conn: &mut SqliteConnection,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM expenses e
        JOIN shopping_items s ON s.id = e.shopping_item_id
        WHERE e.user_id = ? AND e.spent_at >= ? AND s.item_type = ?
        "#,
    )
    .bind(user_id)
    .bind(since)
    .bind(ItemType::Impulsive)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count > 0)
}

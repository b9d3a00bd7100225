//! Shopping service
//!
//! Shopping list, expenses, and the budget check for impulsive items.

use crate::clock::Clock;
use crate::database::{
    CreateExpenseRequest, CreateShoppingItemRequest, Expense, ItemType, Repository, ShoppingItem,
};
use crate::error::{AppError, Result};
use chrono::Duration;
use std::sync::Arc;

#[derive(Clone)]
pub struct ShoppingService {
    repo: Repository,
    clock: Arc<dyn Clock>,
    expiry_warning_days: i64,
}

impl ShoppingService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>, expiry_warning_days: i64) -> Self {
        Self {
            repo,
            clock,
            expiry_warning_days,
        }
    }

    pub async fn create_item(
        &self,
        user_id: &str,
        req: CreateShoppingItemRequest,
    ) -> Result<ShoppingItem> {
        validate_item(&req)?;
        self.repo.create_shopping_item(user_id, req, self.clock.now()).await
    }

    pub async fn get_item(&self, user_id: &str, id: &str) -> Result<ShoppingItem> {
        self.repo.get_owned(user_id, id).await
    }

    pub async fn list_items(&self, user_id: &str) -> Result<Vec<ShoppingItem>> {
        self.repo.list_owned(user_id).await
    }

    pub async fn delete_item(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_owned::<ShoppingItem>(user_id, id).await
    }

    pub async fn mark_purchased(&self, user_id: &str, id: &str) -> Result<ShoppingItem> {
        self.repo.set_item_purchased(user_id, id, true).await
    }

    /// Unpurchased items expiring soon or noted as almost over
    pub async fn expiring_items(&self, user_id: &str) -> Result<Vec<ShoppingItem>> {
        let until = self.clock.today() + Duration::days(self.expiry_warning_days);
        self.repo.expiring_items(user_id, until).await
    }

    /// Add an impulsive item unless it would take spending past the user's salary
    pub async fn add_impulsive_item(
        &self,
        user_id: &str,
        mut req: CreateShoppingItemRequest,
    ) -> Result<ShoppingItem> {
        req.item_type = ItemType::Impulsive;
        validate_item(&req)?;

        // Check against the salary budget
        let user = self.repo.get_user(user_id).await?;
        let spent = self.repo.total_spent_cents(user_id).await?;
        let projected = spent + req.estimated_cost_cents.unwrap_or(0);

        if projected > user.salary_cents {
            tracing::warn!(
                "Impulsive item '{}' rejected for {}: {} > {}",
                req.name,
                user_id,
                projected,
                user.salary_cents
            );
            return Err(AppError::BudgetExceeded {
                budget_cents: user.salary_cents,
                projected_cents: projected,
            });
        }

        self.repo.create_shopping_item(user_id, req, self.clock.now()).await
    }

    /// Unpurchased impulsive items, most urgent first
    pub async fn list_impulsive_items(&self, user_id: &str) -> Result<Vec<ShoppingItem>> {
        self.repo.list_impulsive_items(user_id).await
    }

    pub async fn create_expense(&self, user_id: &str, req: CreateExpenseRequest) -> Result<Expense> {
        if req.amount_cents < 0 {
            return Err(AppError::Validation("amount cannot be negative".to_string()));
        }

        let expense = self.repo.create_expense(user_id, req, self.clock.now()).await?;
        tracing::debug!("Expense recorded: {}", expense.id);
        Ok(expense)
    }

    /// Expenses, most recent first
    pub async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        self.repo.list_owned(user_id).await
    }
}

fn validate_item(req: &CreateShoppingItemRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("item name is required".to_string()));
    }
    if req.quantity <= 0.0 {
        return Err(AppError::Validation("quantity must be positive".to_string()));
    }
    if matches!(req.estimated_cost_cents, Some(cost) if cost < 0) {
        return Err(AppError::Validation("estimated cost cannot be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::repository::test_support::*;

    async fn create_test_service() -> (ShoppingService, Repository) {
        let repo = create_test_repo().await;
        let service = ShoppingService::new(repo.clone(), Arc::new(FixedClock::new(t0())), 3);
        (service, repo)
    }

    fn item(name: &str, cost: i64) -> CreateShoppingItemRequest {
        CreateShoppingItemRequest {
            name: name.to_string(),
            estimated_cost_cents: Some(cost),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_impulsive_item_over_budget() {
        let (service, repo) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        service
            .create_expense(
                &user.id,
                CreateExpenseRequest {
                    amount_cents: 100_000,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = service
            .add_impulsive_item(&user.id, item("Gaming chair", 25_000))
            .await
            .unwrap_err();
        match err {
            AppError::BudgetExceeded {
                budget_cents,
                projected_cents,
            } => {
                assert_eq!(budget_cents, 120_000);
                assert_eq!(projected_cents, 125_000);
            }
            other => panic!("expected BudgetExceeded, got {:?}", other),
        }
        assert!(service.list_impulsive_items(&user.id).await.unwrap().is_empty());

        let fits = service
            .add_impulsive_item(&user.id, item("Sticker pack", 20_000))
            .await
            .unwrap();
        assert_eq!(fits.item_type, ItemType::Impulsive);
        assert_eq!(service.list_impulsive_items(&user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expiring_items_use_warning_window() {
        let (service, repo) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let today = t0().date_naive();

        service
            .create_item(
                &user.id,
                CreateShoppingItemRequest {
                    expiry_date: Some(today + Duration::days(3)),
                    ..item("Yogurt", 250)
                },
            )
            .await
            .unwrap();
        service
            .create_item(
                &user.id,
                CreateShoppingItemRequest {
                    expiry_date: Some(today + Duration::days(4)),
                    ..item("Cheese", 600)
                },
            )
            .await
            .unwrap();

        let expiring = service.expiring_items(&user.id).await.unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].name, "Yogurt");
    }

    #[tokio::test]
    async fn test_item_validation() {
        let (service, repo) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        let zero_quantity = CreateShoppingItemRequest {
            quantity: 0.0,
            ..item("Eggs", 300)
        };
        assert!(matches!(
            service.create_item(&user.id, zero_quantity).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service
                .create_expense(
                    &user.id,
                    CreateExpenseRequest {
                        amount_cents: -5,
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::Validation(_))
        ));
    }
}

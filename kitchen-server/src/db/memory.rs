//! In-memory store
//!
//! Backs the router in tests and local runs without PostgreSQL. All tables
//! sit behind one lock, so a settlement is as atomic here as it is inside a
//! database transaction.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    CartItem, CartItemCreate, CategoryStats, MenuItem, MenuItemInput, Payment, PaymentDraft,
    Review, ReviewCreate, SettlementIssue, User, UserCreate,
};
use shared::util::{new_id, now_millis};
use tokio::sync::RwLock;

use super::{
    CartStore, MenuStore, ReportStore, ReviewStore, SettlementRecord, SettlementStore, StoreError,
    StoreResult, UserStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    menu: Vec<MenuItem>,
    reviews: Vec<Review>,
    carts: Vec<CartItem>,
    payments: Vec<Payment>,
    settlement_issues: Vec<SettlementIssue>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    operations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    /// Seed a user with an explicit role
    pub async fn seed_user(&self, email: &str, role: Option<&str>) -> String {
        let id = new_id();
        self.tables.write().await.users.push(User {
            id: id.clone(),
            email: email.to_string(),
            name: None,
            photo_url: None,
            role: role.map(String::from),
            created_at: now_millis(),
        });
        id
    }

    /// Seed a menu item with a fixed id
    pub async fn seed_menu_item(&self, id: &str, category: &str, price: Decimal) {
        self.tables.write().await.menu.push(MenuItem {
            id: id.to_string(),
            name: format!("{category} {id}"),
            recipe: String::new(),
            image: String::new(),
            category: category.to_string(),
            price,
            quantity: None,
        });
    }

    /// Seed a cart item with a fixed id
    pub async fn seed_cart_item(&self, id: &str, email: &str, menu_item_id: &str, price: Decimal) {
        self.tables.write().await.carts.push(CartItem {
            id: id.to_string(),
            email: email.to_string(),
            menu_item_id: menu_item_id.to_string(),
            name: None,
            image: None,
            price,
        });
    }

    /// Snapshot of every cart item, regardless of owner
    pub async fn all_cart_items(&self) -> Vec<CartItem> {
        self.tables.read().await.carts.clone()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.touch();
        Ok(self.tables.read().await.users.clone())
    }

    async fn insert_user_if_absent(&self, user: UserCreate) -> StoreResult<Option<String>> {
        self.touch();
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let id = new_id();
        tables.users.push(User {
            id: id.clone(),
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            role: None,
            created_at: now_millis(),
        });
        Ok(Some(id))
    }

    async fn promote_to_admin(&self, id: &str) -> StoreResult<bool> {
        self.touch();
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.role = Some("admin".to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        self.touch();
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() < before)
    }
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn list_menu(&self) -> StoreResult<Vec<MenuItem>> {
        self.touch();
        Ok(self.tables.read().await.menu.clone())
    }

    async fn find_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables.menu.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_menu_item(&self, input: MenuItemInput) -> StoreResult<MenuItem> {
        self.touch();
        let item = MenuItem {
            id: new_id(),
            name: input.name,
            recipe: input.recipe,
            image: input.image,
            category: input.category,
            price: input.price,
            quantity: input.quantity,
        };
        self.tables.write().await.menu.push(item.clone());
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        id: &str,
        input: MenuItemInput,
    ) -> StoreResult<Option<MenuItem>> {
        self.touch();
        let mut tables = self.tables.write().await;
        let Some(item) = tables.menu.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        item.name = input.name;
        item.recipe = input.recipe;
        item.image = input.image;
        item.category = input.category;
        item.price = input.price;
        item.quantity = input.quantity;
        Ok(Some(item.clone()))
    }

    async fn delete_menu_item(&self, id: &str) -> StoreResult<bool> {
        self.touch();
        let mut tables = self.tables.write().await;
        let before = tables.menu.len();
        tables.menu.retain(|m| m.id != id);
        Ok(tables.menu.len() < before)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        self.touch();
        Ok(self.tables.read().await.reviews.clone())
    }

    async fn insert_review(&self, review: ReviewCreate) -> StoreResult<Review> {
        self.touch();
        let review = Review {
            id: new_id(),
            name: review.name,
            details: review.details,
            rating: review.rating,
        };
        self.tables.write().await.reviews.push(review.clone());
        Ok(review)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_cart(&self, email: &str) -> StoreResult<Vec<CartItem>> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables
            .carts
            .iter()
            .filter(|c| c.email == email)
            .cloned()
            .collect())
    }

    async fn insert_cart_item(&self, item: CartItemCreate) -> StoreResult<CartItem> {
        self.touch();
        let item = CartItem {
            id: new_id(),
            email: item.email,
            menu_item_id: item.menu_item_id,
            name: item.name,
            image: item.image,
            price: item.price,
        };
        self.tables.write().await.carts.push(item.clone());
        Ok(item)
    }

    async fn find_cart_item(&self, id: &str) -> StoreResult<Option<CartItem>> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables.carts.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_cart_item(&self, id: &str) -> StoreResult<bool> {
        self.touch();
        let mut tables = self.tables.write().await;
        let before = tables.carts.len();
        tables.carts.retain(|c| c.id != id);
        Ok(tables.carts.len() < before)
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn settle(&self, draft: &PaymentDraft) -> StoreResult<SettlementRecord> {
        self.touch();
        let mut tables = self.tables.write().await;

        if tables
            .payments
            .iter()
            .any(|p| p.transaction_id == draft.transaction_id)
        {
            return Err(StoreError::Duplicate(format!(
                "transaction {} already recorded",
                draft.transaction_id
            )));
        }

        let payment_id = new_id();
        tables.payments.push(Payment {
            id: payment_id.clone(),
            email: draft.email.clone(),
            price: draft.price,
            transaction_id: draft.transaction_id.clone(),
            date: draft.date.unwrap_or_else(chrono::Utc::now),
            cart_ids: draft.cart_ids.clone(),
            menu_item_ids: draft.menu_item_ids.clone(),
            status: draft.status.clone().unwrap_or_else(|| "pending".to_string()),
        });

        let before = tables.carts.len();
        let (removed, kept): (Vec<CartItem>, Vec<CartItem>) =
            std::mem::take(&mut tables.carts).into_iter().partition(|c| {
                c.email == draft.email && draft.cart_ids.contains(&c.id)
            });
        tables.carts = kept;
        let deleted_count = (before - tables.carts.len()) as u64;

        let missing_cart_ids: Vec<String> = draft
            .cart_ids
            .iter()
            .filter(|id| !removed.iter().any(|c| &c.id == *id))
            .cloned()
            .collect();

        if !missing_cart_ids.is_empty() {
            tables.settlement_issues.push(SettlementIssue {
                id: new_id(),
                payment_id: payment_id.clone(),
                email: draft.email.clone(),
                missing_cart_ids: missing_cart_ids.clone(),
                created_at: now_millis(),
            });
        }

        Ok(SettlementRecord {
            payment_id,
            deleted_count,
            missing_cart_ids,
        })
    }

    async fn list_payments(&self, email: &str) -> StoreResult<Vec<Payment>> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .filter(|p| p.email == email)
            .cloned()
            .collect())
    }

    async fn list_settlement_issues(&self) -> StoreResult<Vec<SettlementIssue>> {
        self.touch();
        Ok(self.tables.read().await.settlement_issues.clone())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn estimated_counts(&self) -> StoreResult<(i64, i64, i64)> {
        self.touch();
        let tables = self.tables.read().await;
        Ok((
            tables.users.len() as i64,
            tables.menu.len() as i64,
            tables.payments.len() as i64,
        ))
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables.payments.iter().map(|p| p.price).sum())
    }

    async fn order_stats_by_category(&self) -> StoreResult<Vec<CategoryStats>> {
        self.touch();
        let tables = self.tables.read().await;

        let mut by_category: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
        for menu_item_id in tables.payments.iter().flat_map(|p| &p.menu_item_ids) {
            let Some(item) = tables.menu.iter().find(|m| &m.id == menu_item_id) else {
                continue;
            };
            let entry = by_category
                .entry(item.category.clone())
                .or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += item.price;
        }

        Ok(by_category
            .into_iter()
            .map(|(category, (quantity, revenue))| CategoryStats {
                category,
                quantity,
                revenue,
            })
            .collect())
    }
}

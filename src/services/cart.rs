use crate::{
    db::DbPool,
    entities::{cart_item, inventory, product::ProductCategory, CartItem, Inventory, Product},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Cart line joined with its product, priced at the product's current
/// effective price. Cart prices are live; only order placement snapshots
/// them.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: Uuid,
    pub product_name: String,
    pub slug: String,
    pub category: ProductCategory,
    pub image_url: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub stock_available: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: i32,
    pub total: Decimal,
}

#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
}

impl CartService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Adds a product to the cart, merging into an existing line for the
    /// same product. The combined quantity must fit the current stock.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        if !product.is_active {
            return Err(ServiceError::Validation(format!(
                "'{}' is not available",
                product.name
            )));
        }

        let stock = self.stock_for(product_id).await?;
        let existing = CartItem::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        let requested = existing.as_ref().map(|l| l.quantity).unwrap_or(0) + quantity;
        if requested > stock {
            return Err(ServiceError::InsufficientStock(format!(
                "only {} of '{}' available, {} requested",
                stock, product.name, requested
            )));
        }

        let now = Utc::now();
        match existing {
            Some(line) => {
                let mut active: cart_item::ActiveModel = line.into();
                active.quantity = Set(requested);
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
            None => {
                let line = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                line.insert(&*self.db).await?;
            }
        }

        info!(%customer_id, %product_id, quantity, "cart item added");
        self.view_cart(customer_id).await
    }

    /// Sets the quantity of an existing line. Zero removes the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::Validation(
                "quantity cannot be negative".to_string(),
            ));
        }

        let line = CartItem::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;

        if quantity == 0 {
            line.delete(&*self.db).await?;
            return self.view_cart(customer_id).await;
        }

        let stock = self.stock_for(product_id).await?;
        if quantity > stock {
            return Err(ServiceError::InsufficientStock(format!(
                "only {} available, {} requested",
                stock, quantity
            )));
        }

        let mut active: cart_item::ActiveModel = line.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        self.view_cart(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let line = CartItem::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;
        line.delete(&*self.db).await?;
        self.view_cart(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        CartItem::delete_many()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// The cart as shown at checkout: lines joined with products, priced
    /// at today's effective prices, totalled.
    #[instrument(skip(self))]
    pub async fn view_cart(&self, customer_id: Uuid) -> Result<CartView, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;
        let mut item_count = 0;
        for (line, maybe_product) in lines {
            let product = maybe_product.ok_or_else(|| {
                ServiceError::Internal(format!(
                    "cart line {} references missing product {}",
                    line.id, line.product_id
                ))
            })?;
            let unit_price = product.effective_price();
            let subtotal = unit_price * Decimal::from(line.quantity);
            total += subtotal;
            item_count += line.quantity;
            items.push(CartLineView {
                product_id: product.id,
                product_name: product.name.clone(),
                slug: product.slug.clone(),
                category: product.category,
                image_url: product.image_or_default().to_string(),
                unit_price,
                quantity: line.quantity,
                subtotal,
                stock_available: self.stock_for(product.id).await.unwrap_or(0),
            });
        }

        Ok(CartView {
            items,
            item_count,
            total,
        })
    }

    async fn stock_for(&self, product_id: Uuid) -> Result<i32, ServiceError> {
        let stock = Inventory::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .map(|row| row.stock_available)
            .unwrap_or(0);
        Ok(stock)
    }
}

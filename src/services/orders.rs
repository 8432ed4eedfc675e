use crate::{
    db::DbPool,
    entities::{
        cart_item, customer, inventory,
        order::{self, OrderStatus},
        order_item, CartItem, Customer, Inventory, Order, OrderItem, Product,
    },
    errors::ServiceError,
    notifications::{self, EmailLineItem, Mailer, ShippingSnapshot},
    services::customers::hash_password,
    validation::{card_not_expired, mask_card_last4, PHONE_RE, POSTAL_RE},
};
use chrono::Utc;
use rand::RngCore;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order placement and lifecycle. Placement turns a list of requested
/// lines into an order inside a single transaction: stock is re-checked
/// under row locks, prices are snapshotted, inventory is decremented and
/// the customer's cart is cleared, all atomically.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    mailer: Arc<dyn Mailer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingInput {
    pub name: String,
    /// Required for guest checkout; optional when a customer id is given.
    #[serde(default)]
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardInput {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    /// Omitted for guest checkout; the shipping contact set identifies or
    /// creates the customer instead.
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub shipping: ShippingInput,
    /// None means cash on delivery
    #[serde(default)]
    pub card: Option<CardInput>,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub payment: Option<String>,
    pub order_date: chrono::DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// What checkout returns. The shipping block is an echo of the request,
/// never stored; it exists for the confirmation page and email.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPlacementResult {
    #[serde(flatten)]
    pub order: OrderView,
    pub shipping: ShippingSnapshot,
}

struct PricedLine {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
}

enum ResolvedCustomer {
    /// Known account; `new_email` set when shipping carries a different,
    /// available address to move the account to.
    Existing {
        model: customer::Model,
        new_email: Option<String>,
    },
    /// Guest checkout with an unseen email; an account gets created.
    New { email: String },
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    /// Places an order for an explicit list of lines.
    ///
    /// Validation happens before the transaction so obviously bad input
    /// never opens one. Inside the transaction the customer record is
    /// created or refreshed from the shipping contact, each inventory row
    /// is locked and re-checked, prices are snapshotted and the cart is
    /// cleared. A single shortfall rolls the whole order back. On commit
    /// the confirmation email goes out best-effort.
    #[instrument(skip(self, input))]
    pub async fn place_order(
        &self,
        input: PlaceOrderInput,
    ) -> Result<OrderPlacementResult, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::Validation(
                "order contains no items".to_string(),
            ));
        }
        let lines = self.price_lines(&input.items).await?;
        let resolved = self.resolve_customer(input.customer_id, &input.shipping).await?;
        let shipping = validate_shipping(&input.shipping)?;
        let payment = match input.card {
            Some(card) => Some(validate_card(card)?),
            None => None,
        };

        let txn = self.db.begin().await?;

        let now = Utc::now();
        let customer = match resolved {
            ResolvedCustomer::Existing { model, new_email } => {
                let mut active: customer::ActiveModel = model.into();
                active.name = Set(shipping.name.clone());
                active.phone = Set(shipping.phone.clone());
                if let Some(email) = new_email {
                    active.email = Set(email);
                }
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            ResolvedCustomer::New { email } => {
                // Guests get an account with an unguessable password; they
                // claim it through the password reset flow.
                let model = customer::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(shipping.name.clone()),
                    email: Set(email),
                    phone: Set(shipping.phone.clone()),
                    password_hash: Set(hash_password(&random_secret())?),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&txn).await?
            }
        };
        let customer_id = customer.id;

        // Stock was checked while pricing the lines, but it may have moved
        // since. Lock each row and decide on what is true now.
        for line in &lines {
            let stock_row = Inventory::find()
                .filter(inventory::Column::ProductId.eq(line.product_id))
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Inventory for product {} not found",
                        line.product_id
                    ))
                })?;
            if stock_row.stock_available < line.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "only {} of '{}' available, {} requested",
                    stock_row.stock_available, line.product_name, line.quantity
                )));
            }
            let remaining = stock_row.stock_available - line.quantity;
            let mut active: inventory::ActiveModel = stock_row.into();
            active.stock_available = Set(remaining);
            active.update(&txn).await?;
        }

        let total: Decimal = lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();

        let order_id = Uuid::new_v4();
        let order_date = Utc::now();
        let order_model = order::ActiveModel {
            id: Set(order_id),
            customer_id: Set(customer_id),
            status: Set(OrderStatus::Pending),
            total_amount: Set(total),
            payment: Set(payment.clone()),
            order_date: Set(order_date),
        };
        order_model.insert(&txn).await?;

        let mut item_views = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price: Set(line.unit_price),
            };
            item.insert(&txn).await?;
            item_views.push(OrderItemView {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                price: line.unit_price,
                subtotal: line.unit_price * Decimal::from(line.quantity),
            });
        }

        CartItem::delete_many()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(%order_id, %total, "order placed");

        let email_items: Vec<EmailLineItem> = item_views
            .iter()
            .map(|i| EmailLineItem {
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                price: i.price,
            })
            .collect();
        notifications::send_best_effort(
            self.mailer.as_ref(),
            notifications::render_order_confirmation(
                &customer.email,
                &customer.name,
                order_id,
                order_date,
                total,
                payment.as_deref(),
                &email_items,
                &shipping,
            ),
        )
        .await;

        Ok(OrderPlacementResult {
            order: OrderView {
                id: order_id,
                status: OrderStatus::Pending,
                total_amount: total,
                payment,
                order_date,
                items: item_views,
            },
            shipping,
        })
    }

    /// Fetches one order with its lines. Customers can only see their own
    /// orders.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderView, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        if order.customer_id != customer_id {
            return Err(ServiceError::Unauthorized(
                "order belongs to another customer".to_string(),
            ));
        }
        self.view_of(order).await
    }

    /// Customer's order history, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        customer_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderView>, u64), ServiceError> {
        let paginator = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::OrderDate)
            .paginate(&*self.db, per_page.clamp(1, 100));
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.view_of(order).await?);
        }
        Ok((views, total))
    }

    /// Advances an order's status. Shipped and delivered transitions
    /// notify the customer; terminal states cannot move again.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<OrderView, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if matches!(order.status, OrderStatus::Delivered | OrderStatus::Cancelled) {
            return Err(ServiceError::Validation(format!(
                "order is already {} and cannot change status",
                order.status
            )));
        }

        let customer = Customer::find_by_id(order.customer_id).one(&*self.db).await?;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        let updated = active.update(&*self.db).await?;

        if let Some(customer) = customer {
            match new_status {
                OrderStatus::Shipped => {
                    notifications::send_best_effort(
                        self.mailer.as_ref(),
                        notifications::render_order_shipped(
                            &customer.email,
                            &customer.name,
                            order_id,
                            tracking_number.as_deref(),
                        ),
                    )
                    .await;
                }
                OrderStatus::Delivered => {
                    notifications::send_best_effort(
                        self.mailer.as_ref(),
                        notifications::render_order_delivered(
                            &customer.email,
                            &customer.name,
                            order_id,
                        ),
                    )
                    .await;
                }
                _ => {}
            }
        }

        info!(%order_id, status = %new_status, "order status updated");
        self.view_of(updated).await
    }

    async fn view_of(&self, order: order::Model) -> Result<OrderView, ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .find_also_related(Product)
            .all(&*self.db)
            .await?;
        let items = items
            .into_iter()
            .map(|(item, product)| OrderItemView {
                product_id: item.product_id,
                product_name: product.map(|p| p.name).unwrap_or_default(),
                quantity: item.quantity,
                subtotal: item.subtotal(),
                price: item.price,
            })
            .collect();
        Ok(OrderView {
            id: order.id,
            status: order.status,
            total_amount: order.total_amount,
            payment: order.payment,
            order_date: order.order_date,
            items,
        })
    }

    /// Requested lines joined with products and priced at today's
    /// effective prices. These prices become the order's permanent
    /// snapshot. Fail-fast: the first bad line aborts the whole order.
    async fn price_lines(&self, items: &[OrderLineInput]) -> Result<Vec<PricedLine>, ServiceError> {
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = Product::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
            let stock = Inventory::find()
                .filter(inventory::Column::ProductId.eq(product.id))
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("No inventory for '{}'", product.name))
                })?;
            if item.quantity > stock.stock_available {
                return Err(ServiceError::InsufficientStock(format!(
                    "only {} of '{}' available, {} requested",
                    stock.stock_available, product.name, item.quantity
                )));
            }
            if item.quantity < 1 {
                return Err(ServiceError::Validation(format!(
                    "invalid quantity for '{}'",
                    product.name
                )));
            }
            lines.push(PricedLine {
                product_id: product.id,
                unit_price: product.effective_price(),
                product_name: product.name,
                quantity: item.quantity,
            });
        }
        Ok(lines)
    }

    /// Finds who the order belongs to. An explicit customer id wins;
    /// otherwise the shipping contact set must be complete enough to match
    /// or create an account.
    async fn resolve_customer(
        &self,
        customer_id: Option<Uuid>,
        shipping: &ShippingInput,
    ) -> Result<ResolvedCustomer, ServiceError> {
        let email = shipping.email.trim().to_lowercase();

        if let Some(id) = customer_id {
            let model = Customer::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;
            let new_email = if email.is_empty() || email == model.email {
                None
            } else {
                if !validator::validate_email(&email) {
                    return Err(ServiceError::Validation(
                        "shipping email is not valid".to_string(),
                    ));
                }
                let taken = Customer::find()
                    .filter(customer::Column::Email.eq(email.as_str()))
                    .one(&*self.db)
                    .await?;
                if taken.is_some() {
                    return Err(ServiceError::DuplicateEmail(email));
                }
                Some(email)
            };
            self.ensure_phone_free(shipping.phone.trim(), Some(model.id))
                .await?;
            return Ok(ResolvedCustomer::Existing { model, new_email });
        }

        if shipping.name.trim().is_empty() || email.is_empty() || shipping.phone.trim().is_empty() {
            return Err(ServiceError::Validation(
                "checkout needs a customer id or a full name, email and phone".to_string(),
            ));
        }
        if !validator::validate_email(&email) {
            return Err(ServiceError::Validation(
                "shipping email is not valid".to_string(),
            ));
        }
        match Customer::find()
            .filter(customer::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?
        {
            Some(model) => {
                self.ensure_phone_free(shipping.phone.trim(), Some(model.id))
                    .await?;
                Ok(ResolvedCustomer::Existing {
                    model,
                    new_email: None,
                })
            }
            None => {
                self.ensure_phone_free(shipping.phone.trim(), None).await?;
                Ok(ResolvedCustomer::New { email })
            }
        }
    }

    /// The phone column is unique; a contact refresh must not take a
    /// number already on another account.
    async fn ensure_phone_free(
        &self,
        phone: &str,
        owner: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Customer::find().filter(customer::Column::Phone.eq(phone));
        if let Some(id) = owner {
            query = query.filter(customer::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::DuplicatePhone(phone.to_string()));
        }
        Ok(())
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn validate_shipping(input: &ShippingInput) -> Result<ShippingSnapshot, ServiceError> {
    let name = input.name.trim();
    let address = input.address.trim();
    let city = input.city.trim();
    let postal_code = input.postal_code.trim();
    let phone = input.phone.trim();

    if name.is_empty() || address.is_empty() || city.is_empty() {
        return Err(ServiceError::Validation(
            "shipping name, address and city are required".to_string(),
        ));
    }
    if !POSTAL_RE.is_match(postal_code) {
        return Err(ServiceError::Validation(
            "shipping postal code is not valid".to_string(),
        ));
    }
    if !PHONE_RE.is_match(phone) {
        return Err(ServiceError::Validation(
            "shipping phone number is not valid".to_string(),
        ));
    }

    Ok(ShippingSnapshot {
        name: name.to_string(),
        address: address.to_string(),
        city: city.to_string(),
        postal_code: postal_code.to_string(),
        phone: phone.to_string(),
    })
}

fn validate_card(card: CardInput) -> Result<String, ServiceError> {
    if !card_not_expired(card.exp_month, card.exp_year) {
        return Err(ServiceError::Validation("card has expired".to_string()));
    }
    mask_card_last4(&card.number)
        .ok_or_else(|| ServiceError::Validation("card number is not valid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingInput {
        ShippingInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            address: "12 Garden Row".into(),
            city: "Leiden".into(),
            postal_code: "2311 GJ".into(),
            phone: "+31 6 1234 5678".into(),
        }
    }

    #[test]
    fn shipping_validation_trims_and_accepts() {
        let snap = validate_shipping(&shipping()).unwrap();
        assert_eq!(snap.city, "Leiden");
    }

    #[test]
    fn shipping_validation_rejects_blank_city() {
        let mut input = shipping();
        input.city = "  ".into();
        assert!(matches!(
            validate_shipping(&input),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn card_validation_masks_number() {
        let descriptor = validate_card(CardInput {
            number: "4242 4242 4242 4242".into(),
            exp_month: 12,
            exp_year: 2100,
        })
        .unwrap();
        assert_eq!(descriptor, "Card ending in 4242");
    }

    #[test]
    fn expired_card_is_rejected() {
        let err = validate_card(CardInput {
            number: "4242 4242 4242 4242".into(),
            exp_month: 1,
            exp_year: 2001,
        });
        assert!(matches!(err, Err(ServiceError::Validation(_))));
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A rendered transactional email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// Delivery transport. Store flows never depend on delivery succeeding;
/// callers go through [`send_best_effort`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), NotificationError>;
}

/// Default transport: writes the email to the log instead of a wire. Used
/// in development and tests.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    #[instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send(&self, email: OutboundEmail) -> Result<(), NotificationError> {
        info!(body_len = email.body.len(), "outbound email");
        Ok(())
    }
}

/// Sends an email without letting a transport failure escape. Order
/// placement and registration commit first and mail after; a down mail
/// server must never roll back or fail those flows.
pub async fn send_best_effort(mailer: &dyn Mailer, email: OutboundEmail) {
    let to = email.to.clone();
    let subject = email.subject.clone();
    if let Err(err) = mailer.send(email).await {
        warn!(%to, %subject, error = %err, "email delivery failed, continuing");
    }
}

/// Line item data needed to render an order confirmation.
#[derive(Debug, Clone)]
pub struct EmailLineItem {
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl EmailLineItem {
    fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Shipping details captured at checkout. Not persisted anywhere; exists
/// only to render the confirmation email and the placement response.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ShippingSnapshot {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

pub fn render_welcome(customer_name: &str, to: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Welcome to Farmstand!".to_string(),
        body: format!(
            "Hi {customer_name},\n\n\
             Welcome to Farmstand! Your account is ready.\n\
             Browse the catalog for fresh, seasonal produce delivered to your door.\n\n\
             Thank you for joining us.\n"
        ),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn render_order_confirmation(
    to: &str,
    customer_name: &str,
    order_id: Uuid,
    order_date: DateTime<Utc>,
    total_amount: Decimal,
    payment: Option<&str>,
    items: &[EmailLineItem],
    shipping: &ShippingSnapshot,
) -> OutboundEmail {
    let mut body = format!(
        "Hi {customer_name},\n\n\
         Thank you for your order!\n\n\
         Order #{order_id}\n\
         Placed on {}\n\n\
         Items:\n",
        order_date.format("%B %d, %Y at %H:%M")
    );
    for item in items {
        body.push_str(&format!(
            "  {} x{} @ {} = {}\n",
            item.product_name,
            item.quantity,
            item.price,
            item.subtotal()
        ));
    }
    body.push_str(&format!(
        "\nTotal: {total_amount}\nPayment: {}\n\n\
         Delivery to:\n  {}\n  {}\n  {} {}\n  {}\n\n\
         We will email you again when your order ships.\n",
        payment.unwrap_or("Cash on Delivery"),
        shipping.name,
        shipping.address,
        shipping.city,
        shipping.postal_code,
        shipping.phone,
    ));
    OutboundEmail {
        to: to.to_string(),
        subject: format!("Order Confirmation #{order_id} - Farmstand"),
        body,
    }
}

pub fn render_password_reset(to: &str, customer_name: &str, reset_link: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Password Reset Request - Farmstand".to_string(),
        body: format!(
            "Hi {customer_name},\n\n\
             We received a request to reset your password. Use the link below\n\
             within the next hour:\n\n\
             {reset_link}\n\n\
             If you did not request this, you can ignore this email.\n"
        ),
    }
}

pub fn render_order_shipped(
    to: &str,
    customer_name: &str,
    order_id: Uuid,
    tracking_number: Option<&str>,
) -> OutboundEmail {
    let mut body = format!(
        "Hi {customer_name},\n\n\
         Good news! Your order #{order_id} has shipped and is on its way.\n"
    );
    if let Some(tracking) = tracking_number {
        body.push_str(&format!("Tracking number: {tracking}\n"));
    }
    body.push_str(
        "You should receive your fresh produce within 24-48 hours.\n\n\
         Thank you for choosing Farmstand!\n",
    );
    OutboundEmail {
        to: to.to_string(),
        subject: format!("Your Order #{order_id} Has Been Shipped!"),
        body,
    }
}

pub fn render_order_delivered(to: &str, customer_name: &str, order_id: Uuid) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: format!("Your Order #{order_id} Has Been Delivered!"),
        body: format!(
            "Hi {customer_name},\n\n\
             Your order #{order_id} has been delivered.\n\
             We hope you enjoy your fresh produce. We'd love to hear your\n\
             feedback, so please consider leaving a review.\n\n\
             Thank you for choosing Farmstand!\n"
        ),
    }
}

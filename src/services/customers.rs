use crate::{
    db::DbPool,
    entities::{
        address, cart_item, customer, order, order_item, password_reset_token, Address, CartItem,
        Customer, Order, OrderItem, PasswordResetToken,
    },
    errors::ServiceError,
    notifications::{self, Mailer},
    validation::PHONE_RE,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Reset tokens stop working one hour after issuance.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Account registration, authentication and credential recovery.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
    mailer: Arc<dyn Mailer>,
    public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 30))]
    pub phone: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 6, max = 30))]
    pub phone: Option<String>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>, public_base_url: String) -> Self {
        Self {
            db,
            mailer,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Registers a new account. Email is normalized to lowercase before
    /// the uniqueness check, so BOB@x.com and bob@x.com are the same
    /// account. A welcome email goes out after the row is committed.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();
        let phone = input.phone.trim().to_string();
        if !PHONE_RE.is_match(&phone) {
            return Err(ServiceError::Validation(
                "phone number is not valid".to_string(),
            ));
        }

        let email_taken = Customer::find()
            .filter(customer::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;
        if email_taken.is_some() {
            return Err(ServiceError::DuplicateEmail(email));
        }

        let phone_taken = Customer::find()
            .filter(customer::Column::Phone.eq(phone.as_str()))
            .one(&*self.db)
            .await?;
        if phone_taken.is_some() {
            return Err(ServiceError::DuplicatePhone(phone));
        }

        let now = Utc::now();
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(email),
            phone: Set(phone),
            password_hash: Set(hash_password(&input.password)?),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&*self.db).await?;

        info!(customer_id = %saved.id, "customer registered");
        notifications::send_best_effort(
            self.mailer.as_ref(),
            notifications::render_welcome(&saved.name, &saved.email),
        )
        .await;

        Ok(saved)
    }

    /// Verifies credentials. An unknown email is NotFound; a known email
    /// with the wrong password is InvalidCredentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<customer::Model, ServiceError> {
        let email = email.trim().to_lowercase();
        let found = Customer::find()
            .filter(customer::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;
        let Some(found) = found else {
            return Err(ServiceError::NotFound(
                "No account found with this email".to_string(),
            ));
        };
        if !verify_password(password, &found.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }
        Ok(found)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        customer_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        if let Some(phone) = input.phone.as_deref() {
            let phone = phone.trim();
            if !PHONE_RE.is_match(phone) {
                return Err(ServiceError::Validation(
                    "phone number is not valid".to_string(),
                ));
            }
            let taken = Customer::find()
                .filter(customer::Column::Phone.eq(phone))
                .filter(customer::Column::Id.ne(customer_id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::DuplicatePhone(phone.to_string()));
            }
        }

        let current = self.get_customer(customer_id).await?;
        let mut active: customer::ActiveModel = current.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone.trim().to_string());
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Issues a reset token and emails the link. An unknown email returns
    /// NotFound rather than a generic success.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let email = email.trim().to_lowercase();
        let found = Customer::find()
            .filter(customer::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("No account found with this email".to_string())
            })?;

        let token = generate_reset_token();
        let model = password_reset_token::ActiveModel {
            token: Set(token.clone()),
            customer_id: Set(found.id),
            created_at: Set(Utc::now()),
            is_used: Set(false),
        };
        model.insert(&*self.db).await?;

        let reset_link = format!("{}/reset-password/{}", self.public_base_url, token);
        notifications::send_best_effort(
            self.mailer.as_ref(),
            notifications::render_password_reset(&found.email, &found.name, &reset_link),
        )
        .await;

        info!(customer_id = %found.id, "password reset token issued");
        Ok(())
    }

    /// Consumes a reset token and replaces the password. The token must be
    /// unused and younger than an hour; consumption and the credential
    /// update commit together.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if new_password.len() < 8 {
            return Err(ServiceError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let row = PasswordResetToken::find_by_id(token.to_string())
            .one(&txn)
            .await?
            .ok_or(ServiceError::InvalidOrExpiredToken)?;
        if row.is_used {
            return Err(ServiceError::InvalidOrExpiredToken);
        }
        let age = Utc::now() - row.created_at;
        if age > Duration::minutes(RESET_TOKEN_TTL_MINUTES) {
            return Err(ServiceError::InvalidOrExpiredToken);
        }

        let customer = Customer::find_by_id(row.customer_id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::InvalidOrExpiredToken)?;

        let mut customer_active: customer::ActiveModel = customer.into();
        customer_active.password_hash = Set(hash_password(new_password)?);
        customer_active.updated_at = Set(Utc::now());
        customer_active.update(&txn).await?;

        let mut token_active: password_reset_token::ActiveModel = row.into();
        token_active.is_used = Set(true);
        token_active.update(&txn).await?;

        txn.commit().await?;
        info!("password reset completed");
        Ok(())
    }

    /// Removes an account and everything hanging off it in one
    /// transaction: tokens, cart, addresses, order lines, orders, then
    /// the customer row.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let customer = Customer::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;
        CartItem::delete_many()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;
        Address::delete_many()
            .filter(address::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;

        let order_ids: Vec<Uuid> = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .select_only()
            .column(order::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        if !order_ids.is_empty() {
            OrderItem::delete_many()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .exec(&txn)
                .await?;
        }
        Order::delete_many()
            .filter(order::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;

        customer.delete(&txn).await?;
        txn.commit().await?;

        warn!(%customer_id, "customer account deleted");
        Ok(())
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Hash(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| ServiceError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// 32 random bytes, hex encoded. Opaque and unguessable; the token itself
/// is the primary key.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

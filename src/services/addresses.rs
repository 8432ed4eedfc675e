use crate::{
    db::DbPool,
    entities::{
        address::{self, AddressLabel},
        Address,
    },
    errors::ServiceError,
    validation::{PHONE_RE, POSTAL_RE},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Saved address book. Every write path re-establishes the invariant that
/// a customer has at most one default address.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DbPool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub label: AddressLabel,
    pub line: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    fn check(&self) -> Result<(), ServiceError> {
        if self.line.trim().is_empty() || self.city.trim().is_empty() {
            return Err(ServiceError::Validation(
                "address line and city are required".to_string(),
            ));
        }
        if !POSTAL_RE.is_match(self.postal_code.trim()) {
            return Err(ServiceError::Validation(
                "postal code is not valid".to_string(),
            ));
        }
        if !PHONE_RE.is_match(self.phone.trim()) {
            return Err(ServiceError::Validation(
                "phone number is not valid".to_string(),
            ));
        }
        Ok(())
    }
}

impl AddressService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Addresses for a customer, default first.
    #[instrument(skip(self))]
    pub async fn list_addresses(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<address::Model>, ServiceError> {
        let addresses = Address::find()
            .filter(address::Column::CustomerId.eq(customer_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(addresses)
    }

    /// Creates an address. The customer's first address becomes the
    /// default regardless of the flag; an explicit default demotes any
    /// existing one inside the same transaction.
    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn create_address(
        &self,
        customer_id: Uuid,
        input: AddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.check()?;

        let txn = self.db.begin().await?;

        let existing = Address::find()
            .filter(address::Column::CustomerId.eq(customer_id))
            .count(&txn)
            .await?;
        let make_default = input.is_default || existing == 0;

        if make_default {
            Self::clear_default(&txn, customer_id).await?;
        }

        let now = Utc::now();
        let model = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            label: Set(input.label),
            line: Set(input.line.trim().to_string()),
            city: Set(input.city.trim().to_string()),
            postal_code: Set(input.postal_code.trim().to_string()),
            phone: Set(input.phone.trim().to_string()),
            is_default: Set(make_default),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&txn).await?;
        txn.commit().await?;

        info!(address_id = %saved.id, is_default = saved.is_default, "address created");
        Ok(saved)
    }

    /// Replaces an address's fields. Promoting to default demotes the
    /// current default in the same transaction; the flag cannot be turned
    /// off here, only moved to another address.
    #[instrument(skip(self, input), fields(customer_id = %customer_id, address_id = %address_id))]
    pub async fn update_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
        input: AddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.check()?;

        let txn = self.db.begin().await?;
        let current = Self::owned_address(&txn, customer_id, address_id).await?;

        let becomes_default = current.is_default || input.is_default;
        if input.is_default && !current.is_default {
            Self::clear_default(&txn, customer_id).await?;
        }

        let mut active: address::ActiveModel = current.into();
        active.label = Set(input.label);
        active.line = Set(input.line.trim().to_string());
        active.city = Set(input.city.trim().to_string());
        active.postal_code = Set(input.postal_code.trim().to_string());
        active.phone = Set(input.phone.trim().to_string());
        active.is_default = Set(becomes_default);
        active.updated_at = Set(Utc::now());
        let saved = active.update(&txn).await?;
        txn.commit().await?;

        Ok(saved)
    }

    /// Moves the default flag to the given address.
    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let current = Self::owned_address(&txn, customer_id, address_id).await?;

        if current.is_default {
            txn.commit().await?;
            return Ok(current);
        }

        Self::clear_default(&txn, customer_id).await?;
        let mut active: address::ActiveModel = current.into();
        active.is_default = Set(true);
        active.updated_at = Set(Utc::now());
        let saved = active.update(&txn).await?;
        txn.commit().await?;

        Ok(saved)
    }

    /// Deletes an address. When the default is removed and others remain,
    /// the most recently created survivor is promoted so the customer
    /// never lacks a default while owning addresses.
    #[instrument(skip(self))]
    pub async fn delete_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let current = Self::owned_address(&txn, customer_id, address_id).await?;
        let was_default = current.is_default;
        current.delete(&txn).await?;

        if was_default {
            let survivor = Address::find()
                .filter(address::Column::CustomerId.eq(customer_id))
                .order_by_desc(address::Column::CreatedAt)
                .one(&txn)
                .await?;
            if let Some(next) = survivor {
                let mut active: address::ActiveModel = next.into();
                active.is_default = Set(true);
                active.updated_at = Set(Utc::now());
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        info!(%address_id, was_default, "address deleted");
        Ok(())
    }

    async fn owned_address<C: sea_orm::ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        let found = Address::find_by_id(address_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;
        if found.customer_id != customer_id {
            return Err(ServiceError::Unauthorized(
                "address belongs to another customer".to_string(),
            ));
        }
        Ok(found)
    }

    async fn clear_default<C: sea_orm::ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<(), ServiceError> {
        Address::update_many()
            .col_expr(
                address::Column::IsDefault,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(address::Column::CustomerId.eq(customer_id))
            .filter(address::Column::IsDefault.eq(true))
            .exec(conn)
            .await?;
        Ok(())
    }
}

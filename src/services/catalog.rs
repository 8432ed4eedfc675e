use crate::{
    db::DbPool,
    entities::{
        inventory,
        product::{self, ProductCategory, Season},
        Inventory, Product,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Catalog read and admin write operations. Stock lives in the inventory
/// table; everything returned to clients is the joined view.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

/// Product as presented to storefront clients: discount already applied,
/// stock folded in, image fallback resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub local_name: Option<String>,
    pub slug: String,
    pub category: ProductCategory,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub effective_price: Decimal,
    pub season: Season,
    pub stock_available: i32,
    pub in_stock: bool,
    pub image_url: String,
}

impl ProductView {
    fn from_parts(product: product::Model, stock: Option<inventory::Model>) -> Self {
        let stock_available = stock.map(|s| s.stock_available).unwrap_or(0);
        Self {
            effective_price: product.effective_price(),
            image_url: product.image_or_default().to_string(),
            in_stock: stock_available > 0,
            id: product.id,
            name: product.name,
            local_name: product.local_name,
            slug: product.slug,
            category: product.category,
            price: product.price,
            discount_percent: product.discount_percent,
            season: product.season,
            stock_available,
        }
    }
}

/// Catalog query filters. All optional; an empty filter lists the whole
/// active catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub season: Option<Season>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
}

/// Sort vocabulary for listings. The default groups by category, then
/// name, matching the storefront grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    CategoryThenName,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    Newest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 120))]
    pub local_name: Option<String>,
    pub category: ProductCategory,
    #[validate(range(min = 0.01))]
    pub price: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percent: Option<f64>,
    pub season: Season,
    pub image_url: Option<String>,
    #[validate(range(min = 0))]
    pub initial_stock: Option<i32>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists active products matching the filter. Returns one page plus
    /// the total match count.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        sort: ProductSort,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductView>, u64), ServiceError> {
        let mut condition = Condition::all().add(product::Column::IsActive.eq(true));

        if let Some(category) = filter.category {
            condition = condition.add(product::Column::Category.eq(category));
        }
        if let Some(season) = filter.season {
            condition = condition.add(product::Column::Season.eq(season));
        }
        if let Some(q) = filter.search.as_deref().filter(|q| !q.trim().is_empty()) {
            // LIKE is case-sensitive on Postgres; lowercase both sides.
            let pattern = format!("%{}%", q.trim().to_lowercase());
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::LocalName)))
                            .like(pattern),
                    ),
            );
        }
        if let Some(min) = filter.min_price {
            condition = condition.add(product::Column::Price.gte(min));
        }
        if let Some(max) = filter.max_price {
            condition = condition.add(product::Column::Price.lte(max));
        }

        if filter.in_stock_only {
            // Subquery instead of a join: the listing already left-joins
            // inventory to hydrate stock counts.
            condition = condition.add(
                product::Column::Id.in_subquery(
                    sea_orm::sea_query::Query::select()
                        .column(inventory::Column::ProductId)
                        .from(inventory::Entity)
                        .and_where(inventory::Column::StockAvailable.gt(0))
                        .to_owned(),
                ),
            );
        }

        let mut query = Product::find().filter(condition);

        query = match sort {
            ProductSort::CategoryThenName => query
                .order_by_asc(product::Column::Category)
                .order_by_asc(product::Column::Name),
            ProductSort::NameAsc => query.order_by_asc(product::Column::Name),
            ProductSort::NameDesc => query.order_by_desc(product::Column::Name),
            ProductSort::PriceAsc => query.order_by_asc(product::Column::Price),
            ProductSort::PriceDesc => query.order_by_desc(product::Column::Price),
            ProductSort::Newest => query.order_by_desc(product::Column::CreatedAt),
        };

        let paginator = query
            .find_also_related(Inventory)
            .paginate(&*self.db, per_page.clamp(1, 100));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((
            rows.into_iter()
                .map(|(p, inv)| ProductView::from_parts(p, inv))
                .collect(),
            total,
        ))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductView, ServiceError> {
        let (product, stock) = Product::find_by_id(product_id)
            .find_also_related(Inventory)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(ProductView::from_parts(product, stock))
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductView, ServiceError> {
        let (product, stock) = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .find_also_related(Inventory)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))?;
        Ok(ProductView::from_parts(product, stock))
    }

    /// Creates a product with its inventory row. The slug is derived from
    /// the name.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;

        let price = Decimal::try_from(input.price)
            .map_err(|_| ServiceError::Validation("price is not a valid amount".into()))?
            .round_dp(2);
        let discount = input
            .discount_percent
            .map(Decimal::try_from)
            .transpose()
            .map_err(|_| ServiceError::Validation("discount is not a valid percentage".into()))?
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);

        let slug = product::derive_slug(&input.name);
        if slug.is_empty() {
            return Err(ServiceError::Validation(
                "product name must contain at least one alphanumeric character".into(),
            ));
        }
        let existing = Product::find()
            .filter(product::Column::Slug.eq(slug.as_str()))
            .count(&*self.db)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Validation(format!(
                "a product with slug '{}' already exists",
                slug
            )));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            local_name: Set(input.local_name),
            slug: Set(slug),
            category: Set(input.category),
            price: Set(price),
            discount_percent: Set(discount),
            season: Set(input.season),
            is_active: Set(true),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&*self.db).await?;

        let stock = inventory::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(saved.id),
            stock_available: Set(input.initial_stock.unwrap_or(0).max(0)),
        };
        let stock = stock.insert(&*self.db).await?;

        info!(product_id = %saved.id, "product created");
        Ok(ProductView::from_parts(saved, Some(stock)))
    }

    /// Sets absolute stock for a product. Restocks and manual corrections
    /// both land here.
    #[instrument(skip(self))]
    pub async fn set_stock(
        &self,
        product_id: Uuid,
        stock_available: i32,
    ) -> Result<(), ServiceError> {
        if stock_available < 0 {
            return Err(ServiceError::Validation(
                "stock cannot be negative".to_string(),
            ));
        }
        let row = Inventory::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory for product {} not found", product_id))
            })?;
        let mut active: inventory::ActiveModel = row.into();
        active.stock_available = Set(stock_available);
        active.update(&*self.db).await?;
        info!(%product_id, stock_available, "stock updated");
        Ok(())
    }

    /// Deactivates a product so it no longer appears in listings. Existing
    /// orders keep their snapshotted lines.
    #[instrument(skip(self))]
    pub async fn deactivate_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let row = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        let mut active: product::ActiveModel = row.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fallback asset served when a product carries no image of its own.
const DEFAULT_PRODUCT_IMAGE: &str = "/static/img/products/placeholder.png";

/// Catalog product. Inventory lives in its own 1:1 row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Vernacular name shown alongside the English one
    #[sea_orm(nullable)]
    pub local_name: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub category: ProductCategory,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub discount_percent: Decimal,
    pub season: Season,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Price after the product's own discount is applied.
    pub fn effective_price(&self) -> Decimal {
        let hundred = Decimal::from(100);
        (self.price * (hundred - self.discount_percent) / hundred).round_dp(2)
    }

    /// Image URL with the single place the placeholder fallback lives.
    pub fn image_or_default(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_PRODUCT_IMAGE)
    }
}

/// Derives a URL slug from a product name: lowercase, alphanumeric runs
/// joined by single hyphens.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    #[sea_orm(string_value = "vegetables")]
    Vegetables,
    #[sea_orm(string_value = "fruits")]
    Fruits,
    #[sea_orm(string_value = "herbs")]
    Herbs,
}

impl std::str::FromStr for ProductCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vegetables" => Ok(Self::Vegetables),
            "fruits" => Ok(Self::Fruits),
            "herbs" => Ok(Self::Herbs),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[sea_orm(string_value = "summer")]
    Summer,
    #[sea_orm(string_value = "winter")]
    Winter,
    #[sea_orm(string_value = "all_year")]
    AllYear,
}

impl std::str::FromStr for Season {
    type Err = ();

    /// Accepts the external lowercase vocabulary ("summer", "winter",
    /// "all-year"/"all_year"/"allyear").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summer" => Ok(Self::Summer),
            "winter" => Ok(Self::Winter),
            "all-year" | "all_year" | "allyear" | "all year" => Ok(Self::AllYear),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product(price: Decimal, discount: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Cherry Tomatoes".to_string(),
            local_name: None,
            slug: derive_slug("Cherry Tomatoes"),
            category: ProductCategory::Vegetables,
            price,
            discount_percent: discount,
            season: Season::Summer,
            is_active: true,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn slug_derivation() {
        assert_eq!(derive_slug("Cherry Tomatoes"), "cherry-tomatoes");
        assert_eq!(derive_slug("  Basil (Fresh)  "), "basil-fresh");
        assert_eq!(derive_slug("Okra"), "okra");
    }

    #[test]
    fn effective_price_applies_discount() {
        let p = sample_product(dec!(10.00), dec!(25));
        assert_eq!(p.effective_price(), dec!(7.50));

        let p = sample_product(dec!(3.99), Decimal::ZERO);
        assert_eq!(p.effective_price(), dec!(3.99));
    }

    #[test]
    fn image_fallback_is_single_sourced() {
        let mut p = sample_product(dec!(1.00), Decimal::ZERO);
        assert_eq!(p.image_or_default(), DEFAULT_PRODUCT_IMAGE);
        p.image_url = Some("/static/img/products/okra.png".into());
        assert_eq!(p.image_or_default(), "/static/img/products/okra.png");
    }

    #[test]
    fn season_normalization_accepts_external_vocabulary() {
        assert_eq!("summer".parse::<Season>(), Ok(Season::Summer));
        assert_eq!("all-year".parse::<Season>(), Ok(Season::AllYear));
        assert_eq!("All Year".parse::<Season>(), Ok(Season::AllYear));
        assert!("monsoon".parse::<Season>().is_err());
    }
}

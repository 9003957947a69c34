//! Catalog entities

use serde::{Deserialize, Serialize};
use spec_repository::{Entity, FilterValue, Record};

/// Manufacturer a product is sold under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ProductBrand {
    pub id: i32,
    pub name: String,
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ProductType {
    pub id: i32,
    pub name: String,
}

/// Catalog product
///
/// `product_type` and `product_brand` stay `None` unless the specification used
/// to load the product includes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Price in the smallest currency unit
    pub price_cents: i64,
    pub picture_url: String,
    pub product_type_id: i32,
    pub product_brand_id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "database", sqlx(skip))]
    pub product_type: Option<ProductType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "database", sqlx(skip))]
    pub product_brand: Option<ProductBrand>,
}

impl Product {
    /// Include path loading [`Product::product_type`]
    pub const TYPE_RELATION: &'static str = "product_type";

    /// Include path loading [`Product::product_brand`]
    pub const BRAND_RELATION: &'static str = "product_brand";
}

impl Entity for ProductBrand {
    type Id = i32;
    const ENTITY_TYPE: &'static str = "ProductBrand";

    fn id(&self) -> &i32 {
        &self.id
    }
}

impl Entity for ProductType {
    type Id = i32;
    const ENTITY_TYPE: &'static str = "ProductType";

    fn id(&self) -> &i32 {
        &self.id
    }
}

impl Entity for Product {
    type Id = i32;
    const ENTITY_TYPE: &'static str = "Product";

    fn id(&self) -> &i32 {
        &self.id
    }
}

impl Record for ProductBrand {
    fn field(&self, name: &str) -> Option<FilterValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl Record for ProductType {
    fn field(&self, name: &str) -> Option<FilterValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl Record for Product {
    fn field(&self, name: &str) -> Option<FilterValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "description" => Some(self.description.as_str().into()),
            "price_cents" => Some(self.price_cents.into()),
            "picture_url" => Some(self.picture_url.as_str().into()),
            "product_type_id" => Some(self.product_type_id.into()),
            "product_brand_id" => Some(self.product_brand_id.into()),
            _ => None,
        }
    }
}

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

/// One attribute/property pick, e.g. (size, XL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct VariantChoice {
    pub attribute_item: Uuid,
    pub property_item: Uuid,
}

/// A set of choices identifying a product variant.
///
/// Always kept sorted and deduplicated so two selectors naming the same
/// choices in a different order compare (and serialize) equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "Vec<VariantChoice>", into = "Vec<VariantChoice>")]
pub struct VariantSelector(Vec<VariantChoice>);

impl VariantSelector {
    pub fn new(mut choices: Vec<VariantChoice>) -> Self {
        choices.sort();
        choices.dedup();
        Self(choices)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn choices(&self) -> &[VariantChoice] {
        &self.0
    }

    /// Serialized form stored alongside cart and order lines.
    pub fn canonical(&self) -> Result<String, DomainError> {
        serde_json::to_string(&self.0).map_err(|e| DomainError::Internal(e.to_string()))
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str::<Vec<VariantChoice>>(raw)
            .map(Self::new)
            .map_err(|e| DomainError::InvalidInput(format!("malformed variant selector: {e}")))
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, DomainError> {
        serde_json::from_value::<Vec<VariantChoice>>(value.clone())
            .map(Self::new)
            .map_err(|e| DomainError::InvalidInput(format!("malformed variant selector: {e}")))
    }
}

impl From<Vec<VariantChoice>> for VariantSelector {
    fn from(choices: Vec<VariantChoice>) -> Self {
        Self::new(choices)
    }
}

impl From<VariantSelector> for Vec<VariantChoice> {
    fn from(selector: VariantSelector) -> Self {
        selector.0
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub variant_id: Option<Uuid>,
    pub variant: VariantSelector,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    #[schema(value_type = String)]
    pub line_total: BigDecimal,
    pub available: i32,
}

pub fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::InvalidQuantity);
    }
    Ok(())
}

/// Quantity of a line after adding `added` more units to it.
pub fn merged_quantity(existing: Option<i32>, added: i32) -> Result<i32, DomainError> {
    validate_quantity(added)?;
    existing
        .unwrap_or(0)
        .checked_add(added)
        .ok_or(DomainError::InvalidQuantity)
}

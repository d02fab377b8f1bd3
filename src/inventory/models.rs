//! Material models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inventory line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub name: String,
    /// May go negative; nothing enforces a floor
    pub quantity: i64,
    pub unit: String,
    pub category: String,
    /// Stored threshold, no behaviour attached
    pub reorder_point: i64,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Material {
    /// Build a record from caller-supplied data plus store-assigned fields
    pub fn from_form(id: String, data: MaterialFormData, last_updated: DateTime<Utc>) -> Self {
        Self {
            id,
            name: data.name,
            quantity: data.quantity,
            unit: data.unit,
            category: data.category,
            reorder_point: data.reorder_point,
            last_updated,
            image_url: data.image_url,
        }
    }

    /// The editable part of this record, e.g. to prefill an edit form
    pub fn form_data(&self) -> MaterialFormData {
        MaterialFormData {
            name: self.name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
            category: self.category.clone(),
            reorder_point: self.reorder_point,
            image_url: self.image_url.clone(),
        }
    }
}

/// Material minus `id` and `last_updated`, which the store always assigns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialFormData {
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    pub category: String,
    pub reorder_point: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Request body for a quantity-only update
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdjustQuantityRequest {
    pub quantity: i64,
}

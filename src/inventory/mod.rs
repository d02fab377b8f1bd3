//! In-memory inventory store.
//!
//! Holds the ordered collection of materials for the lifetime of the process.
//! Every mutation takes the single write lock, so at most one mutation is in
//! flight at a time and readers never see a half-applied write.

mod models;

pub use models::*;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by store mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("material not found: {0}")]
    NotFound(String),
}

/// Ordered collection of materials
#[derive(Debug, Default)]
pub struct InventoryStore {
    materials: RwLock<Vec<Material>>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the two demo materials
    pub fn seeded() -> Self {
        let now = Utc::now();
        let materials = vec![
            Material {
                id: "1".to_string(),
                name: "Steel Plates".to_string(),
                quantity: 500,
                unit: "pieces".to_string(),
                category: "Metal".to_string(),
                reorder_point: 100,
                last_updated: now,
                image_url: Some(
                    "https://images.pexels.com/photos/2381463/pexels-photo-2381463.jpeg"
                        .to_string(),
                ),
            },
            Material {
                id: "2".to_string(),
                name: "Lumber 2x4".to_string(),
                quantity: 1000,
                unit: "feet".to_string(),
                category: "Wood".to_string(),
                reorder_point: 200,
                last_updated: now,
                image_url: Some(
                    "https://images.pexels.com/photos/129733/pexels-photo-129733.jpeg"
                        .to_string(),
                ),
            },
        ];

        info!(count = materials.len(), "Seeded inventory with demo materials");
        Self {
            materials: RwLock::new(materials),
        }
    }

    /// All materials in insertion order
    pub fn list(&self) -> Vec<Material> {
        self.materials.read().clone()
    }

    /// Look up a single material by id
    pub fn get(&self, id: &str) -> Option<Material> {
        self.materials.read().iter().find(|m| m.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.materials.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.read().is_empty()
    }

    /// Append a new material with a fresh id and timestamp
    pub fn insert(&self, data: MaterialFormData) -> Material {
        let mut materials = self.materials.write();

        let mut id = uuid::Uuid::new_v4().to_string();
        while materials.iter().any(|m| m.id == id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        let material = Material::from_form(id, data, Utc::now());
        materials.push(material.clone());

        info!(id = %material.id, name = %material.name, "Material added");
        material
    }

    /// Replace every editable field of an existing material, keeping its id
    /// and position.
    pub fn replace(&self, id: &str, data: MaterialFormData) -> Result<Material, InventoryError> {
        let mut materials = self.materials.write();

        let slot = materials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        *slot = Material::from_form(id.to_string(), data, Utc::now());

        info!(id = %id, name = %slot.name, "Material updated");
        Ok(slot.clone())
    }

    /// Set the quantity of an existing material; every other field is kept.
    pub fn adjust_quantity(&self, id: &str, quantity: i64) -> Result<Material, InventoryError> {
        let mut materials = self.materials.write();

        let slot = materials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let previous = slot.quantity;
        slot.quantity = quantity;
        slot.last_updated = Utc::now();

        info!(id = %id, from = previous, to = quantity, "Material quantity adjusted");
        Ok(slot.clone())
    }

    /// Drop the material with this id. Returns whether anything was removed;
    /// removing an unknown id is not an error.
    pub fn remove(&self, id: &str) -> bool {
        let mut materials = self.materials.write();
        let before = materials.len();
        materials.retain(|m| m.id != id);
        let removed = materials.len() != before;

        if removed {
            info!(id = %id, "Material removed");
        } else {
            debug!(id = %id, "Remove skipped, no such material");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn bolts() -> MaterialFormData {
        MaterialFormData {
            name: "Bolts".to_string(),
            quantity: 50,
            unit: "box".to_string(),
            category: "Metal".to_string(),
            reorder_point: 10,
            image_url: None,
        }
    }

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let store = InventoryStore::new();
        let mut seen = HashSet::new();

        for i in 0..50 {
            let mut data = bolts();
            data.quantity = i;
            let material = store.insert(data);
            assert!(seen.insert(material.id), "duplicate id generated");
        }

        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_insert_then_list_contains_record() {
        let store = InventoryStore::new();
        let before = Utc::now();

        let created = store.insert(bolts());
        let listed = store.list();

        let matches: Vec<_> = listed.iter().filter(|m| m.id == created.id).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].form_data(), bolts());
        assert!(matches[0].last_updated >= before);
        assert!(!created.id.is_empty());
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let store = InventoryStore::seeded();
        let created = store.insert(bolts());

        let names: Vec<_> = store.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Steel Plates", "Lumber 2x4", "Bolts"]);
        assert_eq!(store.list()[2].id, created.id);
    }

    #[test]
    fn test_replace_keeps_id_and_position() {
        let store = InventoryStore::seeded();
        let original = store.get("1").unwrap();

        let mut data = original.form_data();
        data.name = "Steel Sheets".to_string();
        data.image_url = None;

        let updated = store.replace("1", data).unwrap();
        assert_eq!(updated.id, "1");
        assert_eq!(updated.name, "Steel Sheets");
        assert_eq!(updated.image_url, None);
        assert!(updated.last_updated >= original.last_updated);
        assert_eq!(store.list()[0], updated);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_replace_missing_is_not_found() {
        let store = InventoryStore::seeded();
        let before = store.list();

        let err = store.replace("missing", bolts()).unwrap_err();
        assert_eq!(err, InventoryError::NotFound("missing".to_string()));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn test_adjust_quantity_only_touches_quantity_and_timestamp() {
        let store = InventoryStore::seeded();
        let original = store.get("2").unwrap();

        let adjusted = store.adjust_quantity("2", -25).unwrap();

        assert_eq!(adjusted.quantity, -25);
        assert!(adjusted.last_updated >= original.last_updated);
        assert_eq!(adjusted.id, original.id);
        assert_eq!(adjusted.name, original.name);
        assert_eq!(adjusted.unit, original.unit);
        assert_eq!(adjusted.category, original.category);
        assert_eq!(adjusted.reorder_point, original.reorder_point);
        assert_eq!(adjusted.image_url, original.image_url);
        assert_eq!(store.get("2").unwrap(), adjusted);
    }

    #[test]
    fn test_adjust_quantity_missing_is_not_found() {
        let store = InventoryStore::new();
        let err = store.adjust_quantity("nope", 3).unwrap_err();
        assert_eq!(err, InventoryError::NotFound("nope".to_string()));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = InventoryStore::seeded();

        assert!(store.remove("1"));
        assert!(store.list().iter().all(|m| m.id != "1"));
        assert!(!store.remove("1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_seeded_insert_then_remove_scenario() {
        let store = InventoryStore::seeded();
        let original = store.list();
        assert_eq!(original.len(), 2);
        assert_eq!(original[0].name, "Steel Plates");
        assert_eq!(original[0].quantity, 500);
        assert_eq!(original[1].name, "Lumber 2x4");
        assert_eq!(original[1].quantity, 1000);

        let started = Utc::now();
        let bolts = store.insert(bolts());
        assert_eq!(store.len(), 3);
        assert!(original.iter().all(|m| m.id != bolts.id));
        assert!(bolts.last_updated >= started);

        store.remove(&bolts.id);
        assert_eq!(store.list(), original);
    }
}

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    config::Config,
    models::property::{Property, PropertyBasics, PropertyCharacteristics, PropertyImages},
};

/// Loads the three listing collections from disk and keeps the merged
/// result in memory until [`PropertyStore::clear_cache`] is called.
pub struct PropertyStore {
    basics_path: PathBuf,
    characteristics_path: PathBuf,
    images_path: PathBuf,
    cache: RwLock<Option<Arc<Vec<Property>>>>,
}

impl PropertyStore {
    pub fn new(config: &Config) -> Self {
        PropertyStore {
            basics_path: config.data_path(&config.basics_file),
            characteristics_path: config.data_path(&config.characteristics_file),
            images_path: config.data_path(&config.images_file),
            cache: RwLock::new(None),
        }
    }

    pub async fn all(&self) -> Arc<Vec<Property>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return cached.clone();
        }

        let mut cache = self.cache.write().await;
        // Another request may have filled the cache while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            return cached.clone();
        }

        let merged = Arc::new(self.load().await);
        info!("Loaded {} properties into cache", merged.len());
        *cache = Some(merged.clone());
        merged
    }

    /// Reads and merges the source files without touching the cache.
    pub async fn load(&self) -> Vec<Property> {
        let basics: Vec<PropertyBasics> = load_collection(&self.basics_path).await;
        let characteristics: Vec<PropertyCharacteristics> =
            load_collection(&self.characteristics_path).await;
        let images: Vec<PropertyImages> = load_collection(&self.images_path).await;

        merge_property_data(basics, characteristics, images)
    }

    pub async fn get_by_id(&self, property_id: i64) -> Option<Property> {
        self.all()
            .await
            .iter()
            .find(|p| p.id == property_id)
            .cloned()
    }

    /// Properties whose id is in `property_ids`, in store order. Unknown ids are skipped.
    pub async fn get_by_ids(&self, property_ids: &[i64]) -> Vec<Property> {
        self.all()
            .await
            .iter()
            .filter(|p| property_ids.contains(&p.id))
            .cloned()
            .collect()
    }

    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
    }
}

/// Reads a JSON array of rows. Rows that do not decode are skipped so one bad
/// listing cannot take the rest of the collection down with it.
async fn load_collection<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let rows: Vec<Value> = match serde_json::from_str(&contents) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("JSON decode error in {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping row {} of {}: {}", index, path.display(), e);
                None
            }
        })
        .collect()
}

/// Joins the collections on `id`. A property exists iff it has a basics row;
/// characteristics and images are optional.
pub fn merge_property_data(
    basics: Vec<PropertyBasics>,
    characteristics: Vec<PropertyCharacteristics>,
    images: Vec<PropertyImages>,
) -> Vec<Property> {
    let characteristics_by_id: HashMap<i64, PropertyCharacteristics> = characteristics
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let images_by_id: HashMap<i64, Vec<String>> =
        images.into_iter().map(|i| (i.id, i.images)).collect();

    basics
        .into_iter()
        .map(|basic| {
            let characteristics = characteristics_by_id.get(&basic.id);
            Property {
                id: basic.id,
                title: basic.title,
                price: basic.price,
                location: basic.location,
                bedrooms: characteristics.and_then(|c| c.bedrooms),
                bathrooms: characteristics.and_then(|c| c.bathrooms),
                size: characteristics.and_then(|c| c.size),
                amenities: characteristics.and_then(|c| c.amenities.clone()),
                images: images_by_id.get(&basic.id).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

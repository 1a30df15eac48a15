#![allow(dead_code)]

use std::{path::Path, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use homefinder::{
    config::{self, Config},
    llm_client::LanguageModel,
    models::{chat::Preferences, property::Property},
};
use serde_json::json;
use tempfile::TempDir;

/// Four listings: three complete ones and a studio with no characteristics or images.
pub fn write_fixtures(dir: &Path) {
    let basics = json!([
        {"id": 1, "title": "Modern Family Home", "price": 450000, "location": "Austin, TX"},
        {"id": 2, "title": "Cozy Downtown Condo", "price": "350000", "location": "San Francisco, CA"},
        {"id": 3, "title": "Luxury Penthouse", "price": 600000.0, "location": "San Francisco, CA"},
        {"id": 4, "title": "Starter Studio", "price": 200000, "location": "Denver, CO"}
    ]);
    let characteristics = json!([
        {"id": 1, "bedrooms": 3, "bathrooms": 2, "size": 2000, "amenities": ["pool", "garage"]},
        {"id": 2, "bedrooms": 2, "bathrooms": 1, "size": 900, "amenities": ["gym"]},
        {"id": 3, "bedrooms": 3, "bathrooms": 3, "size": 2500, "amenities": ["Pool", "gym", "doorman"]}
    ]);
    let images = json!([
        {"id": 1, "images": ["home-front.jpg", "home-back.jpg"]},
        {"id": 2, "images": ["condo.jpg"]},
        {"id": 3, "images": []}
    ]);

    std::fs::write(dir.join("property_basics.json"), basics.to_string()).unwrap();
    std::fs::write(
        dir.join("property_characteristics.json"),
        characteristics.to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("property_images.json"), images.to_string()).unwrap();
}

/// Config pointing at a fresh fixture directory. Keep the `TempDir` alive for the test.
pub fn fixture_config() -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let config = Config {
        data_dir: dir.path().to_string_lossy().to_string(),
        llm_timeout_seconds: 1,
        ..config::create_test_config()
    };
    (dir, config)
}

pub fn property(id: i64, price: f64, location: &str) -> Property {
    Property {
        id,
        title: format!("Listing {id}"),
        price,
        location: location.to_string(),
        bedrooms: Some(2),
        bathrooms: Some(1),
        size: Some(1000),
        amenities: Some(vec![]),
        images: vec![],
    }
}

/// Language model double with canned answers.
#[derive(Default)]
pub struct ScriptedModel {
    pub preferences: Preferences,
    pub property_name: Option<String>,
    pub reply: Option<String>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl ScriptedModel {
    async fn behave(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(anyhow!("scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn extract_preferences(&self, _message: &str) -> Result<Preferences> {
        self.behave().await?;
        Ok(self.preferences.clone())
    }

    async fn extract_property_name(&self, _message: &str) -> Result<Option<String>> {
        self.behave().await?;
        Ok(self.property_name.clone())
    }

    async fn generate_response(
        &self,
        _message: &str,
        properties: &[Property],
        _preferences: &Preferences,
    ) -> Result<String> {
        self.behave().await?;
        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| format!("Here are {} homes.", properties.len())))
    }
}

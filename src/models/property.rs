use serde::{Deserialize, Serialize};
use serde_this_or_that::as_f64;

use super::prediction::Prediction;

/// Row of the basics collection. Every merged property starts from one of these.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyBasics {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    // Hand-maintained files write prices both as numbers and numeric strings,
    // and an unpriced listing reads as 0
    #[serde(default, deserialize_with = "as_f64")]
    pub price: f64,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyCharacteristics {
    pub id: i64,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub size: Option<u32>,
    pub amenities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyImages {
    pub id: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A property assembled from the three source collections.
///
/// Characteristic attributes stay optional so that filters can tell a
/// property without a characteristics row apart from one with zero rooms.
/// [`PropertyResponse`] is the defaulted view handed out over the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub location: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub size: Option<u32>,
    pub amenities: Option<Vec<String>>,
    pub images: Vec<String>,
}

impl Property {
    pub fn amenity_list(&self) -> &[String] {
        self.amenities.as_deref().unwrap_or(&[])
    }

    /// Exact, case-sensitive tag lookup.
    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenity_list().iter().any(|a| a == amenity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyResponse {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub size: u32,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    #[serde(default)]
    pub prediction: Option<Prediction>,
}

impl From<&Property> for PropertyResponse {
    fn from(property: &Property) -> Self {
        PropertyResponse {
            id: property.id,
            title: property.title.clone(),
            price: property.price,
            location: property.location.clone(),
            bedrooms: property.bedrooms.unwrap_or_default(),
            bathrooms: property.bathrooms.unwrap_or_default(),
            size: property.size.unwrap_or_default(),
            amenities: property.amenity_list().to_vec(),
            images: property.images.clone(),
            prediction: None,
        }
    }
}

impl PropertyResponse {
    pub fn with_prediction(mut self, prediction: Prediction) -> Self {
        self.prediction = Some(prediction);
        self
    }
}

/// Optional search constraints. Absent fields place no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub min_size: Option<u32>,
    pub amenities: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PropertiesResponse {
    pub properties: Vec<PropertyResponse>,
    pub count: usize,
}

impl PropertiesResponse {
    pub fn new(properties: Vec<PropertyResponse>) -> Self {
        let count = properties.len();
        PropertiesResponse { properties, count }
    }
}

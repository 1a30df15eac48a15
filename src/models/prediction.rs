use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "SFH")]
    SingleFamily,
    Condo,
}

/// Full feature set accepted by `POST /api/predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub property_type: PropertyType,
    pub lot_area: Option<u32>,
    pub building_area: Option<u32>,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub year_built: i32,
    #[serde(default)]
    pub has_pool: bool,
    #[serde(default)]
    pub has_garage: bool,
    pub school_rating: i32,
}

/// The feature vector handed to a price model, echoed back in predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    pub property_type: PropertyType,
    pub lot_area: u32,
    pub building_area: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub year_built: i32,
    pub has_pool: bool,
    pub has_garage: bool,
    pub school_rating: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub property_id: Option<i64>,
    pub listed_price: Option<f64>,
    pub predicted_price: f64,
    pub model_input: Option<ModelInput>,
}

impl Prediction {
    /// Placeholder used when a prediction inside a batch fails.
    pub fn zero(property_id: i64, listed_price: f64) -> Self {
        Prediction {
            property_id: Some(property_id),
            listed_price: Some(listed_price),
            predicted_price: 0.0,
            model_input: None,
        }
    }
}

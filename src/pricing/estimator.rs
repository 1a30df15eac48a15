use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::{
    config::Config,
    error::ServiceError,
    models::{
        prediction::{ModelInput, Prediction, PredictionRequest, PropertyType},
        property::Property,
    },
};

const BASE_PRICE: f64 = 200_000.0;
const DEFAULT_LOT_AREA: u32 = 5000;
const DEFAULT_BUILDING_AREA: u32 = 1000;
const DEFAULT_YEAR_BUILT: i32 = 2015;
const DEFAULT_SCHOOL_RATING: i32 = 7;

/// A price model takes the feature vector as a JSON object, the same shape an
/// external prediction service would receive. `None` means the model could
/// not produce a price for this input.
pub trait PriceModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, features: &Value) -> Option<f64>;
}

/// The fixed pricing formula, exposed as a model.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicModel;

impl PriceModel for HeuristicModel {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn predict(&self, features: &Value) -> Option<f64> {
        let input: ModelInput = serde_json::from_value(features.clone()).ok()?;
        Some(heuristic_price(&input))
    }
}

pub fn heuristic_price(input: &ModelInput) -> f64 {
    let mut price = BASE_PRICE;

    match input.property_type {
        PropertyType::SingleFamily => {
            price += 100_000.0;
            price += (f64::from(input.lot_area) / 1000.0) * 5000.0;
        }
        PropertyType::Condo => {
            price += 50_000.0;
            price += (f64::from(input.building_area) / 100.0) * 300.0;
        }
    }

    price += f64::from(input.bedrooms) * 50_000.0;
    price += f64::from(input.bathrooms) * 30_000.0;
    price += year_bonus(input.year_built);

    if input.has_pool {
        price += 50_000.0;
    }
    if input.has_garage {
        price += 30_000.0;
    }

    price += f64::from(input.school_rating - 5) * 20_000.0;

    price.max(0.0)
}

fn year_bonus(year_built: i32) -> f64 {
    match year_built {
        y if y >= 2020 => 50_000.0,
        y if y >= 2010 => 30_000.0,
        y if y >= 2000 => 10_000.0,
        _ => 0.0,
    }
}

impl PredictionRequest {
    /// Only the area matching the property type is kept; a missing or zero
    /// area falls back to the type's default.
    pub fn to_model_input(&self) -> ModelInput {
        let (lot_area, building_area) = match self.property_type {
            PropertyType::SingleFamily => (or_default_area(self.lot_area, DEFAULT_LOT_AREA), 0),
            PropertyType::Condo => (0, or_default_area(self.building_area, DEFAULT_BUILDING_AREA)),
        };

        ModelInput {
            property_type: self.property_type,
            lot_area,
            building_area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            year_built: self.year_built,
            has_pool: self.has_pool,
            has_garage: self.has_garage,
            school_rating: self.school_rating,
        }
    }
}

fn or_default_area(area: Option<u32>, default: u32) -> u32 {
    area.filter(|a| *a > 0).unwrap_or(default)
}

/// Builds a feature set from a stored listing.
///
/// Listings carry no type, build year or school data: a "garage" amenity
/// marks a single-family home, everything else is a condo, and the build
/// year and school rating are fixed defaults.
pub fn infer_prediction_request(property: &Property) -> PredictionRequest {
    let has_garage = property.has_amenity("garage");
    let property_type = if has_garage {
        PropertyType::SingleFamily
    } else {
        PropertyType::Condo
    };

    PredictionRequest {
        property_type,
        lot_area: match property_type {
            PropertyType::SingleFamily => Some(property.size.unwrap_or(DEFAULT_LOT_AREA)),
            PropertyType::Condo => None,
        },
        building_area: match property_type {
            PropertyType::SingleFamily => None,
            PropertyType::Condo => Some(property.size.unwrap_or(DEFAULT_BUILDING_AREA)),
        },
        bedrooms: property.bedrooms.unwrap_or(2),
        bathrooms: property.bathrooms.unwrap_or(1),
        year_built: DEFAULT_YEAR_BUILT,
        has_pool: property.has_amenity("pool"),
        has_garage,
        school_rating: DEFAULT_SCHOOL_RATING,
    }
}

pub struct PricingEstimator {
    model: Option<Arc<dyn PriceModel>>,
}

impl PricingEstimator {
    pub fn new(model: Option<Arc<dyn PriceModel>>) -> Self {
        PricingEstimator { model }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.pricing_enabled {
            let model = HeuristicModel;
            info!("Price model '{}' loaded", model.name());
            PricingEstimator::new(Some(Arc::new(model)))
        } else {
            warn!("Pricing disabled, prediction endpoints will report the model as unavailable");
            PricingEstimator::new(None)
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction, ServiceError> {
        let model = self.model.as_ref().ok_or(ServiceError::ModelNotLoaded)?;
        let input = request.to_model_input();
        let predicted_price = run_model(model.as_ref(), &input);

        Ok(Prediction {
            property_id: None,
            listed_price: None,
            predicted_price,
            model_input: Some(input),
        })
    }

    pub fn predict_for_property(&self, property: &Property) -> Result<Prediction, ServiceError> {
        let request = infer_prediction_request(property);
        let prediction = self.predict(&request)?;

        Ok(Prediction {
            property_id: Some(property.id),
            listed_price: Some(property.price),
            ..prediction
        })
    }
}

/// Any model miss falls back to the formula, so a loaded estimator always prices.
fn run_model(model: &dyn PriceModel, input: &ModelInput) -> f64 {
    let prediction = serde_json::to_value(input)
        .ok()
        .and_then(|features| model.predict(&features))
        .filter(|price| price.is_finite());

    match prediction {
        Some(price) => price,
        None => {
            warn!(
                "Model '{}' returned no prediction, using fallback formula",
                model.name()
            );
            heuristic_price(input)
        }
    }
}

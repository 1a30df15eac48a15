mod common;

#[cfg(test)]
mod pricing {
    use std::sync::Arc;

    use homefinder::{
        config,
        error::ServiceError,
        models::prediction::{ModelInput, PredictionRequest, PropertyType},
        pricing::estimator::{
            heuristic_price, infer_prediction_request, HeuristicModel, PriceModel,
            PricingEstimator,
        },
    };
    use serde_json::{json, Value};

    use crate::common::property;

    fn family_home() -> PredictionRequest {
        serde_json::from_value(json!({
            "property_type": "SFH",
            "lot_area": 6000,
            "bedrooms": 3,
            "bathrooms": 2,
            "year_built": 2021,
            "has_pool": true,
            "has_garage": true,
            "school_rating": 8
        }))
        .unwrap()
    }

    fn estimator() -> PricingEstimator {
        PricingEstimator::from_config(&config::create_test_config())
    }

    #[test]
    fn test_single_family_home_price() {
        let prediction = estimator().predict(&family_home()).unwrap();
        assert_eq!(prediction.predicted_price, 730000.0);

        let input = prediction.model_input.unwrap();
        assert_eq!(input.lot_area, 6000);
        assert_eq!(input.building_area, 0);
    }

    #[test]
    fn test_condo_price_uses_building_area() {
        let request: PredictionRequest = serde_json::from_value(json!({
            "property_type": "Condo",
            "lot_area": 99999,
            "building_area": 1500,
            "bedrooms": 2,
            "bathrooms": 1,
            "year_built": 2005,
            "school_rating": 5
        }))
        .unwrap();

        let prediction = estimator().predict(&request).unwrap();
        // 200000 + 50000 + 4500 + 100000 + 30000 + 10000
        assert_eq!(prediction.predicted_price, 394500.0);
        assert_eq!(prediction.model_input.unwrap().lot_area, 0);
    }

    #[test]
    fn test_missing_area_uses_default() {
        let mut request = family_home();
        request.lot_area = None;

        let input = request.to_model_input();
        assert_eq!(input.lot_area, 5000);
        assert_eq!(estimator().predict(&request).unwrap().predicted_price, 725000.0);
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let first = estimator().predict(&family_home()).unwrap();
        let second = estimator().predict(&family_home()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_price_never_negative() {
        let input = ModelInput {
            property_type: PropertyType::Condo,
            lot_area: 0,
            building_area: 0,
            bedrooms: 0,
            bathrooms: 0,
            year_built: 1900,
            has_pool: false,
            has_garage: false,
            school_rating: -100,
        };
        assert_eq!(heuristic_price(&input), 0.0);
    }

    #[test]
    fn test_heuristic_model_rejects_malformed_features() {
        let model = HeuristicModel;
        assert_eq!(model.predict(&json!("not an object")), None);
        assert_eq!(model.predict(&json!({"property_type": "SFH"})), None);
    }

    #[test]
    fn test_disabled_pricing_reports_model_not_loaded() {
        let estimator = PricingEstimator::new(None);
        assert!(!estimator.is_available());

        let result = estimator.predict(&family_home());
        assert!(matches!(result, Err(ServiceError::ModelNotLoaded)));
    }

    struct SilentModel;

    impl PriceModel for SilentModel {
        fn name(&self) -> &str {
            "silent"
        }

        fn predict(&self, _features: &Value) -> Option<f64> {
            None
        }
    }

    struct FlatModel;

    impl PriceModel for FlatModel {
        fn name(&self) -> &str {
            "flat"
        }

        fn predict(&self, _features: &Value) -> Option<f64> {
            Some(123456.0)
        }
    }

    #[test]
    fn test_model_miss_falls_back_to_formula() {
        let estimator = PricingEstimator::new(Some(Arc::new(SilentModel)));
        let prediction = estimator.predict(&family_home()).unwrap();
        assert_eq!(prediction.predicted_price, 730000.0);
    }

    #[test]
    fn test_model_answer_is_used() {
        let estimator = PricingEstimator::new(Some(Arc::new(FlatModel)));
        let prediction = estimator.predict(&family_home()).unwrap();
        assert_eq!(prediction.predicted_price, 123456.0);
    }

    #[test]
    fn test_garage_marks_single_family_home() {
        let mut home = property(7, 500000.0, "Austin");
        home.size = Some(8000);
        home.amenities = Some(vec!["garage".to_string(), "pool".to_string()]);

        let request = infer_prediction_request(&home);
        assert_eq!(request.property_type, PropertyType::SingleFamily);
        assert_eq!(request.lot_area, Some(8000));
        assert_eq!(request.building_area, None);
        assert!(request.has_pool);
        assert!(request.has_garage);
        assert_eq!(request.year_built, 2015);
        assert_eq!(request.school_rating, 7);
    }

    #[test]
    fn test_listing_without_garage_is_condo() {
        let mut flat = property(8, 300000.0, "Denver");
        flat.size = None;
        flat.bedrooms = None;
        flat.bathrooms = None;

        let request = infer_prediction_request(&flat);
        assert_eq!(request.property_type, PropertyType::Condo);
        assert_eq!(request.building_area, Some(1000));
        assert_eq!(request.bedrooms, 2);
        assert_eq!(request.bathrooms, 1);
    }

    #[test]
    fn test_prediction_for_property_carries_listing() {
        let listing = property(9, 410000.0, "Austin");
        let prediction = estimator().predict_for_property(&listing).unwrap();

        assert_eq!(prediction.property_id, Some(9));
        assert_eq!(prediction.listed_price, Some(410000.0));
        // Condo, 1000 sqft, 2 bed, 1 bath, 2015, school rating 7
        assert_eq!(prediction.predicted_price, 453000.0);
    }
}

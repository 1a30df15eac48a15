mod common;

#[cfg(test)]
mod http_api {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use homefinder::{
        db::DocumentStore,
        llm_client::LanguageModel,
        web::{router, AppState},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::common::{fixture_config, ScriptedModel};

    fn app() -> (TempDir, Router) {
        app_with(|_| {})
    }

    fn app_with(configure: impl FnOnce(&mut homefinder::config::Config)) -> (TempDir, Router) {
        let (dir, mut config) = fixture_config();
        configure(&mut config);

        let llm: Arc<dyn LanguageModel> = Arc::new(ScriptedModel {
            fail: true,
            ..ScriptedModel::default()
        });
        let state = AppState::new(config, Some(llm), DocumentStore::disabled());
        (dir, router(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_liveness() {
        let (_dir, app) = app();
        let (status, body) = send(&app, Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_list_all_properties_with_defaults() {
        let (_dir, app) = app();
        let (status, body) = send(&app, Method::GET, "/api/properties", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 4);
        let studio = &body["properties"][3];
        assert_eq!(studio["id"], 4);
        assert_eq!(studio["bedrooms"], 0);
        assert_eq!(studio["amenities"], json!([]));
        assert_eq!(studio["images"], json!([]));
    }

    #[tokio::test]
    async fn test_search_with_filter() {
        let (_dir, app) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties/search",
            Some(json!({"min_price": 400000, "max_price": 500000})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["properties"][0]["title"], "Modern Family Home");
    }

    #[tokio::test]
    async fn test_save_list_and_remove() {
        let (_dir, app) = app();

        let request = json!({"property_id": 2, "user_id": "alice"});
        send(&app, Method::POST, "/api/properties/save", Some(request.clone())).await;
        let (status, body) =
            send(&app, Method::POST, "/api/properties/save", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved_properties"], json!([2]));
        assert_eq!(body["storage"], "memory");

        let (_, saved) = send(&app, Method::GET, "/api/properties/saved/alice", None).await;
        assert_eq!(saved["count"], 1);
        assert_eq!(saved["properties"][0]["id"], 2);

        let (_, removed) =
            send(&app, Method::DELETE, "/api/properties/saved/alice/2", None).await;
        assert_eq!(removed["success"], true);

        let (_, saved) = send(&app, Method::GET, "/api/properties/saved/alice", None).await;
        assert_eq!(saved["count"], 0);
    }

    #[tokio::test]
    async fn test_save_rejects_non_positive_id() {
        let (_dir, app) = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/properties/save",
            Some(json!({"property_id": 0})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_two_properties() {
        let (_dir, app) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties/compare",
            Some(json!({"property_ids": [1, 2]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["property1"]["id"], 1);
        assert_eq!(body["property2"]["id"], 2);
        assert_eq!(body["property1"]["prediction"]["property_id"], 1);
        assert!(body["property2"]["prediction"]["predicted_price"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_compare_validation() {
        let (_dir, app) = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties/compare",
            Some(json!({"property_ids": [1]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Please provide exactly 2 property IDs");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties/compare",
            Some(json!({"property_ids": [1, 99]})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "One or more properties not found");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties/compare",
            Some(json!({"property_ids": [98, 99]})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "One or more properties not found");
    }

    #[tokio::test]
    async fn test_compare_without_model_uses_zero_prediction() {
        let (_dir, app) = app_with(|config| config.pricing_enabled = false);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties/compare",
            Some(json!({"property_ids": [2, 3]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["property1"]["prediction"]["predicted_price"], 0.0);
        assert_eq!(body["property1"]["prediction"]["listed_price"], 350000.0);
    }

    #[tokio::test]
    async fn test_predict_from_features() {
        let (_dir, app) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/predict",
            Some(json!({
                "property_type": "SFH",
                "lot_area": 6000,
                "bedrooms": 3,
                "bathrooms": 2,
                "year_built": 2021,
                "has_pool": true,
                "has_garage": true,
                "school_rating": 8
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["predicted_price"], 730000.0);
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range_rating() {
        let (_dir, app) = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/predict",
            Some(json!({
                "property_type": "Condo",
                "bedrooms": 1,
                "bathrooms": 1,
                "year_built": 2000,
                "school_rating": 11
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_without_model() {
        let (_dir, app) = app_with(|config| config.pricing_enabled = false);
        let (status, body) = send(&app, Method::POST, "/api/properties/1/predict", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Model not loaded");
    }

    #[tokio::test]
    async fn test_predict_for_stored_property() {
        let (_dir, app) = app();

        let (status, body) = send(&app, Method::POST, "/api/properties/1/predict", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["property_id"], 1);
        assert_eq!(body["listed_price"], 450000.0);
        assert_eq!(body["model_input"]["property_type"], "SFH");

        let (status, body) = send(&app, Method::POST, "/api/properties/42/predict", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Property not found");
    }

    #[tokio::test]
    async fn test_chat_history_round_trip() {
        let (_dir, app) = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(json!({"message": "hello", "user_id": "alice", "preferences": {"x": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["properties"], json!([]));
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 4);

        let (_, history) = send(&app, Method::GET, "/api/chat/history/alice", None).await;
        assert_eq!(history["count"], 2);
        assert_eq!(history["messages"][0]["type"], "user");
        assert_eq!(history["messages"][1]["type"], "bot");

        let (_, cleared) = send(&app, Method::DELETE, "/api/chat/history/alice", None).await;
        assert_eq!(cleared["success"], true);

        let (_, history) = send(&app, Method::GET, "/api/chat/history/alice", None).await;
        assert_eq!(history["count"], 0);
        assert_eq!(history["messages"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_defaults_user_id() {
        let (_dir, app) = app();
        send(&app, Method::POST, "/api/chat", Some(json!({"message": "hey"}))).await;

        let (_, history) = send(&app, Method::GET, "/api/chat/history/default", None).await;
        assert_eq!(history["count"], 2);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (_dir, app) = app();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}

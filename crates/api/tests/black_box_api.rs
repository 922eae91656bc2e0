use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use cropcast_api::app::router_with;
use cropcast_api::app::services::AppServices;
use cropcast_infra::{InMemoryModelStore, ModelStore, OpenWeatherClient, ServiceSettings, WeatherConfig, YieldService};
use cropcast_model::{ForestParams, TrainingConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(service: YieldService) -> Self {
        // Same router as prod over injected services, on an ephemeral port.
        let app = router_with(Arc::new(AppServices::new(service)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn settings(auto_train: bool) -> ServiceSettings {
    ServiceSettings {
        auto_train,
        training_samples: 200,
        training: TrainingConfig::default().with_forest(ForestParams::default().with_trees(10)),
        ..ServiceSettings::default()
    }
}

fn service(auto_train: bool) -> YieldService {
    let store: Arc<dyn ModelStore> = Arc::new(InMemoryModelStore::new());
    YieldService::new(store, settings(auto_train))
}

fn full_features() -> Value {
    json!({
        "ph": 6.6,
        "organic_matter": 3.4,
        "nitrogen": 38.0,
        "phosphorus": 27.0,
        "potassium": 165.0,
        "temperature": 19.5,
        "rainfall": 650.0,
        "humidity": 62.0
    })
}

fn soil_only() -> Value {
    json!({
        "ph": 6.6,
        "organic_matter": 3.4,
        "nitrogen": 38.0,
        "phosphorus": 27.0,
        "potassium": 165.0
    })
}

/// Minimal OpenWeatherMap stand-in: `Furnace` is hot, `Nowhere` is unknown.
async fn spawn_weather_mock() -> String {
    async fn current(Query(params): Query<HashMap<String, String>>) -> Response {
        let q = params.get("q").cloned().unwrap_or_default();
        if q == "Nowhere" {
            return axum::http::StatusCode::NOT_FOUND.into_response();
        }
        let temp = if q == "Furnace" { 38.5 } else { 24.0 };
        axum::Json(json!({
            "name": q,
            "coord": {"lat": 31.5, "lon": 74.3},
            "sys": {"country": "PK"},
            "main": {"temp": temp, "feels_like": temp, "humidity": 55, "pressure": 1010},
            "weather": [{"description": "scattered clouds"}],
            "wind": {"speed": 2.5, "deg": 90},
            "visibility": 10000
        }))
        .into_response()
    }

    async fn forecast() -> Response {
        let list: Vec<_> = (0..40)
            .map(|i| {
                json!({
                    "dt": 1_700_000_000 + i * 10_800,
                    "main": {"temp": 22.0, "humidity": 60},
                    "weather": [{"description": "few clouds"}],
                    "wind": {"speed": 1.5}
                })
            })
            .collect();
        axum::Json(json!({"list": list, "city": {"name": "Lahore"}})).into_response()
    }

    let app = axum::Router::new()
        .route("/weather", get(current))
        .route("/forecast", get(forecast));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn service_with_weather() -> YieldService {
    let base_url = spawn_weather_mock().await;
    let client = OpenWeatherClient::new(&WeatherConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    service(true).with_weather(Arc::new(client))
}

#[tokio::test]
async fn health_and_crop_listing() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = client.get(server.url("/crops")).send().await.unwrap().json().await.unwrap();
    let slugs: Vec<&str> = body["crops"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["wheat", "corn", "rice", "soybean"]);
    assert_eq!(body["cached_models"], json!([]));
    assert_eq!(body["weather_enabled"], json!(false));
}

#[tokio::test]
async fn predict_trains_on_demand_then_reuses_the_model() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();
    let request = json!({"crop": "wheat", "features": full_features(), "farm_area": 4.0});

    let res = client.post(server.url("/predict")).json(&request).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await.unwrap();
    let estimate = &first["estimate"];
    let per_ha = estimate["yield_per_ha"].as_f64().unwrap();
    assert!(per_ha >= 0.0);
    assert!((estimate["total_yield"].as_f64().unwrap() - per_ha * 4.0).abs() < 1e-6);
    assert!(first.get("degraded").is_none());

    let second: Value = client
        .post(server.url("/predict"))
        .json(&request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["estimate"]["model_id"], estimate["model_id"]);

    let crops: Value = client.get(server.url("/crops")).send().await.unwrap().json().await.unwrap();
    assert_eq!(crops["cached_models"], json!(["wheat"]));
}

#[tokio::test]
async fn predict_rejects_bad_input() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/predict"))
        .json(&json!({"crop": "barley", "features": full_features()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_crop");

    let mut out_of_range = full_features();
    out_of_range["ph"] = json!(15.0);
    let res = client
        .post(server.url("/predict"))
        .json(&json!({"crop": "corn", "features": out_of_range}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // Missing weather features and no location to fill them from.
    let res = client
        .post(server.url("/predict"))
        .json(&json!({"crop": "corn", "features": soil_only()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Rejected input never triggers training.
    let crops: Value = client.get(server.url("/crops")).send().await.unwrap().json().await.unwrap();
    assert_eq!(crops["cached_models"], json!([]));
}

#[tokio::test]
async fn predict_without_a_model_is_not_found_when_auto_train_is_off() {
    let server = TestServer::spawn(service(false)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/predict"))
        .json(&json!({"crop": "rice", "features": full_features()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "model_not_found");

    let res = client.get(server.url("/models/rice")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explicit_training_publishes_a_model() {
    let server = TestServer::spawn(service(false)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/models/soybean/train"))
        .json(&json!({"samples": 150, "seed": 7}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let summary: Value = res.json().await.unwrap();
    assert_eq!(summary["crop"], "soybean");
    assert_eq!(
        summary["train_samples"].as_u64().unwrap() + summary["test_samples"].as_u64().unwrap(),
        150
    );

    let fetched: Value = client
        .get(server.url("/models/soybean"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"], summary["id"]);

    let res = client
        .post(server.url("/predict"))
        .json(&json!({"crop": "soybean", "features": full_features()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["estimate"]["model_id"], summary["id"]);
}

#[tokio::test]
async fn training_on_too_few_samples_is_unprocessable() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/models/corn/train"))
        .json(&json!({"samples": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_data");
}

fn observations(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let mut features = full_features();
            features["ph"] = json!(5.5 + 2.0 * t);
            features["nitrogen"] = json!(20.0 + 40.0 * ((i * 7) % n) as f64 / n as f64);
            features["rainfall"] = json!(400.0 + 500.0 * ((i * 3) % n) as f64 / n as f64);
            json!({"features": features, "yield_t_ha": 2.0 + 3.0 * t})
        })
        .collect()
}

#[tokio::test]
async fn training_on_supplied_observations() {
    let server = TestServer::spawn(service(false)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/models/rice/train"))
        .json(&json!({"data": observations(40)}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let summary: Value = res.json().await.unwrap();
    assert_eq!(summary["crop"], "rice");
    assert_eq!(
        summary["train_samples"].as_u64().unwrap() + summary["test_samples"].as_u64().unwrap(),
        40
    );
    let fetched: Value = client
        .get(server.url("/models/rice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"], summary["id"]);

    // One bad row rejects the whole batch and leaves the model in place.
    let mut data = observations(40);
    data[3]["yield_t_ha"] = json!(-1.0);
    let res = client
        .post(server.url("/models/rice/train"))
        .json(&json!({"data": data}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().starts_with("data[3]"));

    let mut data = observations(40);
    data[0]["features"]["humidity"] = Value::Null;
    let res = client
        .post(server.url("/models/rice/train"))
        .json(&json!({"data": data}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let fetched: Value = client
        .get(server.url("/models/rice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"], summary["id"]);

    let res = client
        .post(server.url("/models/rice/train"))
        .json(&json!({"data": observations(8)}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn training_without_a_body_uses_synthetic_data() {
    let server = TestServer::spawn(service(false)).await;
    let client = reqwest::Client::new();

    let res = client.post(server.url("/models/wheat/train")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let summary: Value = res.json().await.unwrap();
    assert_eq!(
        summary["train_samples"].as_u64().unwrap() + summary["test_samples"].as_u64().unwrap(),
        200
    );
}

#[tokio::test]
async fn malformed_bodies_are_json_validation_errors() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let cases = [
        ("/predict", json!({"crop": "corn", "features": {"ph": "abc"}})),
        ("/predict", json!({"features": full_features()})),
        ("/soil-health", json!({"features": {"nitrogen": [1, 2]}})),
        ("/models/corn/train", json!({"samples": "many"})),
    ];
    for (path, payload) in cases {
        let res = client.post(server.url(path)).json(&payload).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "validation_error", "{path}");
        assert!(body["message"].is_string(), "{path}");
    }

    let res = client
        .post(server.url("/predict"))
        .header("content-type", "application/json")
        .body("{\"crop\": \"corn\",")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client.get(server.url("/plan/wheat/flowering?month=may")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // Nothing malformed reached the trainer.
    let crops: Value = client.get(server.url("/crops")).send().await.unwrap().json().await.unwrap();
    assert_eq!(crops["cached_models"], json!([]));
}

#[tokio::test]
async fn advisory_endpoints() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let rec: Value = client
        .post(server.url("/recommend"))
        .json(&json!({"crop": "rice", "features": full_features()}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rec["crop"], "rice");
    assert_eq!(rec["stages"].as_array().unwrap().len(), 4);
    for section in ["pest_management", "soil_amendments", "weather_notes"] {
        assert!(!rec[section].as_array().unwrap().is_empty(), "{section} is empty");
    }

    let res = client
        .post(server.url("/suitability"))
        .json(&json!({"crop": "wheat", "features": full_features()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();
    assert!(report["overall"].as_u64().unwrap() <= 100);

    let res = client
        .post(server.url("/soil-health"))
        .json(&json!({"features": full_features()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/fertilizer-plan"))
        .json(&json!({"crop": "corn", "features": full_features(), "target_yield": 9.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/suitability"))
        .json(&json!({"crop": "wheat", "features": soil_only()}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Advice is rule-based; no model is needed.
    let crops: Value = client.get(server.url("/crops")).send().await.unwrap().json().await.unwrap();
    assert_eq!(crops["cached_models"], json!([]));
}

#[tokio::test]
async fn field_plan_and_weekly_schedule() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/plan/wheat/flowering?month=5")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let plan: Value = res.json().await.unwrap();
    assert_eq!(plan["month"], 5);
    assert_eq!(plan["stage"], "flowering");

    let res = client.get(server.url("/plan/wheat/flowering")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/plan/wheat/flowering?month=13")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/plan/wheat/dormant")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_stage");

    let schedule: Value = client
        .get(server.url("/schedule/rice/vegetative"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(schedule["days"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn weather_routes_need_a_configured_provider() {
    let server = TestServer::spawn(service(true)).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/weather/Lahore")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "weather_unavailable");
}

#[tokio::test]
async fn weather_routes_with_a_provider() {
    let server = TestServer::spawn(service_with_weather().await).await;
    let client = reqwest::Client::new();

    let current: Value = client
        .get(server.url("/weather/Lahore"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["location"], "Lahore");

    let forecast: Value = client
        .get(server.url("/weather/Lahore/forecast?days=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(forecast["entries"].as_array().unwrap().len(), 16);

    let res = client.get(server.url("/weather/Lahore/forecast?days=0")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let alerts: Value = client
        .get(server.url("/weather/Furnace/alerts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alerts["alerts"][0]["kind"], "Heat Warning");

    let impact: Value = client
        .get(server.url("/weather/Lahore/impact"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(impact["crops"].as_array().unwrap().len(), 4);

    let res = client.get(server.url("/weather/Nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn predict_fills_weather_features_from_location() {
    let server = TestServer::spawn(service_with_weather().await).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/predict"))
        .json(&json!({"crop": "corn", "features": soil_only(), "location": "Lahore"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["weather"]["location"], "Lahore");
    assert!(body.get("degraded").is_none());

    // Provider failure leaves humidity unfilled; the 400 says why.
    let res = client
        .post(server.url("/predict"))
        .json(&json!({
            "crop": "corn",
            "features": {"ph": 6.6, "organic_matter": 3.4, "nitrogen": 38.0, "phosphorus": 27.0,
                         "potassium": 165.0, "temperature": 24.0, "rainfall": 800.0},
            "location": "Nowhere"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("live weather unavailable"));
}

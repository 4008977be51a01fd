// ============================================================
// Layer 1 — HTTP Presentation Layer
// ============================================================
// The serving surface, built from warp filters:
//
//   POST /predict      {"features": [..]} → {"prediction": n}
//   GET  /health       → {"status": "ok"}
//   GET|POST /test     → "test route working"
//
// Status policy for /predict:
//   200 — prediction produced
//   400 — body is not JSON, has no "features" key, features are
//         not numbers, wrong width, or the model refused the row
//   500 — no model was loaded at startup
//
// Every error body is {"error": "<message>"}. Handlers never
// fail the connection; each request is independent.

pub mod service;

use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc};
use thiserror::Error;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::domain::prediction::Prediction;
pub use service::ModelService;

pub const TEST_ROUTE_MESSAGE: &str = "test route working";

// ─── Request / Response types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Ways a /predict body can be unusable before the model runs.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing \"features\" key in input")]
    MissingFeatures,

    #[error("\"features\" must be an array of numbers: {0}")]
    InvalidFeatures(String),
}

/// Pull the single-row feature vector out of a request body.
pub fn parse_features(body: &[u8]) -> Result<Vec<f64>, RequestError> {
    let payload: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| RequestError::InvalidJson(e.to_string()))?;

    let object   = payload.as_object().ok_or(RequestError::NotAnObject)?;
    let features = object.get("features").ok_or(RequestError::MissingFeatures)?;

    serde_json::from_value::<Vec<f64>>(features.clone())
        .map_err(|e| RequestError::InvalidFeatures(e.to_string()))
}

// =============================================================================
// Routes
// =============================================================================

/// Build the complete route tree around one model service.
pub fn routes(
    service: Arc<ModelService>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let predict = warp::path("predict")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_service(service))
        .and_then(handle_predict);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&HealthResponse { status: "ok".to_string() })
        });

    let test = warp::path("test")
        .and(warp::path::end())
        .and(warp::get().or(warp::post()).unify())
        .map(|| warp::reply::json(&TEST_ROUTE_MESSAGE));

    predict
        .or(health)
        .or(test)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_service(
    service: Arc<ModelService>,
) -> impl Filter<Extract = (Arc<ModelService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_predict(
    body:    Bytes,
    service: Arc<ModelService>,
) -> Result<warp::reply::Response, Infallible> {
    let Some(model) = service.model() else {
        tracing::error!(
            "Prediction requested but model '{}' is not loaded",
            service.model_name()
        );
        return Ok(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Model not loaded; service not ready",
        ));
    };

    let features = match parse_features(&body) {
        Ok(features) => features,
        Err(e) => {
            tracing::warn!("Rejected prediction request: {e}");
            return Ok(error_response(StatusCode::BAD_REQUEST, &e.to_string()));
        }
    };
    tracing::info!("Received prediction request: {:?}", features);

    match model.predict(&features) {
        Ok(prediction) => {
            tracing::debug!("Prediction: {prediction}");
            Ok(warp::reply::json(&PredictResponse { prediction }).into_response())
        }
        Err(e) => {
            tracing::error!("Prediction error: {e}");
            Ok(error_response(StatusCode::BAD_REQUEST, &e.to_string()))
        }
    }
}

/// Turn warp's own rejections (unknown path, wrong method) into
/// the same JSON error shape the handlers use.
async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Route not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        (StatusCode::BAD_REQUEST, format!("Bad request: {err:?}"))
    };
    Ok(error_response(status, &message))
}

fn error_response(status: StatusCode, message: &str) -> warp::reply::Response {
    let body = ApiError { error: message.to_string() };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{validate_row, PredictError, Predictor};

    /// Sums its three inputs; stands in for a fitted model.
    struct SumModel;

    impl Predictor for SumModel {
        fn n_features(&self) -> usize { 3 }

        fn predict(&self, features: &[f64]) -> Result<Prediction, PredictError> {
            validate_row(features, 3)?;
            Ok(Prediction::Value(features.iter().sum()))
        }
    }

    /// Always answers class 2.
    struct ConstantClassifier;

    impl Predictor for ConstantClassifier {
        fn n_features(&self) -> usize { 4 }

        fn predict(&self, features: &[f64]) -> Result<Prediction, PredictError> {
            validate_row(features, 4)?;
            Ok(Prediction::Class(2))
        }
    }

    fn ready_service() -> Arc<ModelService> {
        Arc::new(ModelService::ready("sum.bin", Arc::new(SumModel)))
    }

    fn empty_service() -> Arc<ModelService> {
        Arc::new(ModelService::not_ready("missing.bin"))
    }

    async fn post_predict(service: Arc<ModelService>, body: &str) -> warp::http::Response<Bytes> {
        warp::test::request()
            .method("POST")
            .path("/predict")
            .header("content-type", "application/json")
            .body(body.to_string())
            .reply(&routes(service))
            .await
    }

    fn error_of(resp: &warp::http::Response<Bytes>) -> String {
        serde_json::from_slice::<ApiError>(resp.body()).unwrap().error
    }

    #[tokio::test]
    async fn test_predict_success() {
        let resp = post_predict(ready_service(), r#"{"features": [1.0, 2.0, 3.5]}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "prediction": 6.5 }));
    }

    #[tokio::test]
    async fn test_predict_class_is_integer() {
        let service = Arc::new(ModelService::ready("c.bin", Arc::new(ConstantClassifier)));
        let resp = post_predict(service, r#"{"features": [5.1, 3.5, 1.4, 0.2]}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), br#"{"prediction":2}"#);
    }

    #[tokio::test]
    async fn test_predict_ignores_content_type() {
        let resp = warp::test::request()
            .method("POST")
            .path("/predict")
            .body(r#"{"features": [1, 1, 1]}"#)
            .reply(&routes(ready_service()))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_features_key_is_400() {
        for body in [r#"{}"#, r#"{"feature": [1, 2, 3]}"#, r#"{"values": null}"#] {
            let resp = post_predict(ready_service(), body).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(error_of(&resp), "Missing \"features\" key in input");
        }
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_400() {
        for body in ["", "not json", "[1, 2, 3]", r#"{"features": "1,2,3"}"#, r#"{"features": [1, "x", 3]}"#] {
            let resp = post_predict(ready_service(), body).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(!error_of(&resp).is_empty());
        }
    }

    #[tokio::test]
    async fn test_wrong_width_is_400_with_precise_message() {
        let resp = post_predict(ready_service(), r#"{"features": [1.0, 2.0]}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&resp), "expected 3 features, got 2");
    }

    #[tokio::test]
    async fn test_predict_without_model_is_500() {
        let resp = post_predict(empty_service(), r#"{"features": [1.0, 2.0, 3.0]}"#).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // Even a malformed body never gets a 200 when no model is loaded.
        let resp = post_predict(empty_service(), r#"{}"#).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_is_ok_with_or_without_model() {
        for service in [ready_service(), empty_service()] {
            let resp = warp::test::request()
                .method("GET")
                .path("/health")
                .reply(&routes(service))
                .await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: HealthResponse = serde_json::from_slice(resp.body()).unwrap();
            assert_eq!(body.status, "ok");
        }
    }

    #[tokio::test]
    async fn test_test_route_get_and_post() {
        for method in ["GET", "POST"] {
            let resp = warp::test::request()
                .method(method)
                .path("/test")
                .reply(&routes(empty_service()))
                .await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: String = serde_json::from_slice(resp.body()).unwrap();
            assert_eq!(body, TEST_ROUTE_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_json() {
        let resp = warp::test::request()
            .method("GET")
            .path("/nope")
            .reply(&routes(ready_service()))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_of(&resp), "Route not found");
    }

    #[tokio::test]
    async fn test_get_predict_is_405() {
        let resp = warp::test::request()
            .method("GET")
            .path("/predict")
            .reply(&routes(ready_service()))
            .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_parse_features_errors() {
        assert_eq!(parse_features(b"{}"), Err(RequestError::MissingFeatures));
        assert_eq!(parse_features(b"[]"), Err(RequestError::NotAnObject));
        assert_eq!(parse_features(br#"{"features": [1, 2.5]}"#), Ok(vec![1.0, 2.5]));
    }
}

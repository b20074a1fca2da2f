use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::AppError;
use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/predict-rf", post(handlers::predict::predict_rf))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

/// Turns a handler panic into the generic 500 body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    error!("Handler panicked: {}", details);
    AppError::internal(details).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use awair_core::{FeatureVector, FEATURE_COUNT};
    use awair_dataset::Dataset;
    use awair_model::{Classifier, LabelDecoder, ModelError, Predictor};
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    const CSV: &str = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude,health_general_population,health_advice,City\n\
        50,0.5,0.02,0.03,20,15,0.01,-6.2,106.8,Sensitive groups should reduce exertion,Stay indoors,Jakarta\n\
        80,0.7,0.04,0.05,40,30,0.02,-7.25,112.75,Limit prolonged outdoor activity,Wear a mask,Surabaya\n";

    const JAKARTA: &str = r#"{"input": [50, 0.5, 0.02, 0.03, 20, 15, 0.01, -6.2, 106.8]}"#;

    enum Mode {
        Class(usize),
        Fail,
        Panic,
    }

    struct FakeClassifier {
        mode: Mode,
        calls: AtomicUsize,
    }

    impl Classifier for FakeClassifier {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }

        fn n_classes(&self) -> usize {
            2
        }

        fn predict(&self, _features: &FeatureVector) -> Result<usize, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Class(class) => Ok(class),
                Mode::Fail => Err(ModelError::UnknownClass(42)),
                Mode::Panic => panic!("forest corrupted"),
            }
        }
    }

    fn app_with(mode: Mode) -> (Router, Arc<FakeClassifier>) {
        let classifier = Arc::new(FakeClassifier { mode, calls: AtomicUsize::new(0) });
        let decoder = LabelDecoder::new(vec!["no2".into(), "pm25".into()]).unwrap();
        let predictor = Predictor::new(classifier.clone(), decoder).unwrap();
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let state = Arc::new(AppState::new(predictor, dataset));
        (router(state), classifier)
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/predict-rf")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_exact_match_scenario() {
        let (app, _) = app_with(Mode::Class(1));
        let (status, body) = post_json(app, JAKARTA).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "prediction": {
                    "Dom. Pollutant": "pm25: 15.00",
                    "Health Advices": "Sensitive groups should reduce exertion",
                    "City": "Jakarta"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_response_has_exactly_three_keys() {
        let (app, _) = app_with(Mode::Class(0));
        let (status, body) = post_json(app, r#"{"input": [80, 0.7, 0.04, 0.05, 40, 30, 0.02, -7.25, 112.75]}"#).await;
        assert_eq!(status, StatusCode::OK);
        let prediction = body["prediction"].as_object().unwrap();
        assert_eq!(prediction.len(), 3);
        assert_eq!(prediction["Dom. Pollutant"], "no2: 0.04");
        assert_eq!(prediction["City"], "Surabaya");
    }

    #[tokio::test]
    async fn test_no_match_uses_fallbacks() {
        let (app, _) = app_with(Mode::Class(1));
        let (status, body) = post_json(app, r#"{"input": [1, 2, 3, 4, 5, 6, 7, 8, 9]}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "prediction": {
                    "Dom. Pollutant": "pm25: Unknown concentration",
                    "Health Advices": "Unknown (no match found in dataset)",
                    "City": "Unknown city"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_idempotent() {
        let (app, _) = app_with(Mode::Class(1));
        let first = post_json(app.clone(), JAKARTA).await;
        let second = post_json(app, JAKARTA).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_length_mismatch_skips_classifier() {
        let (app, classifier) = app_with(Mode::Class(1));
        let (status, body) = post_json(app, r#"{"input": [1, 2, 3, 4, 5]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Input length must be 9 values" }));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_input_field() {
        let (app, classifier) = app_with(Mode::Class(1));
        let (status, body) = post_json(app, "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid input format, missing \"input\" field" }));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let (app, _) = app_with(Mode::Class(1));
        let (status, body) = post_json(app, "input=1,2,3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input format, missing \"input\" field");
    }

    #[tokio::test]
    async fn test_non_numeric_value() {
        let (app, classifier) = app_with(Mode::Class(1));
        let (status, body) =
            post_json(app, r#"{"input": [50, 0.5, 0.02, 0.03, 20, "high", 0.01, -6.2, 106.8]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "input[5] is not a number: \"high\"" }));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_500() {
        let (app, _) = app_with(Mode::Fail);
        let (status, body) = post_json(app, JAKARTA).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An error occurred during prediction");
        assert_eq!(body["details"], "Encoded class 42 is outside the label vocabulary");
    }

    #[tokio::test]
    async fn test_panic_is_500() {
        let (app, _) = app_with(Mode::Panic);
        let (status, body) = post_json(app, JAKARTA).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An error occurred during prediction");
        assert_eq!(body["details"], "forest corrupted");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app_with(Mode::Class(0));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}

use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};
use uuid::Uuid;

use super::types::{HealthResponse, PredictRequest};
use super::AppState;
use crate::error::PredictError;
use crate::model::decision::DecisionResult;

pub async fn predict(
    State(state): State<AppState>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<DecisionResult>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();

    let result = state
        .pipeline
        .predict(&payload.text)
        .await
        .map_err(|err| http_error(request_id, err))?;

    info!(
        %request_id,
        intent = %result.intent,
        confidence = result.clf_confidence,
        distance = result.retrieval_distance,
        fallback = result.fallback_used,
        "prediction served"
    );

    Ok(Json(result))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        message: "intent-gate API",
    })
}

fn http_error(request_id: Uuid, err: PredictError) -> (StatusCode, String) {
    error!(%request_id, "prediction failed: {err}");
    match err {
        PredictError::Load(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("model_load_failed: {err}"),
        ),
        PredictError::Embedding(err) => (
            StatusCode::BAD_GATEWAY,
            format!("embedding_provider_error: {err}"),
        ),
        PredictError::Fallback(err) => (
            StatusCode::BAD_GATEWAY,
            format!("fallback_model_error: {err}"),
        ),
        PredictError::Codec(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("label_codec_error: {err}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use ndarray::{Array1, Array2};
    use tower::util::ServiceExt;

    use crate::api;
    use crate::classifier::knn::FlatIndex;
    use crate::classifier::labels::LabelCodec;
    use crate::classifier::linear::LinearClassifier;
    use crate::config::{ArtifactPaths, EscalationPolicy};
    use crate::error::{EmbeddingError, FallbackError};
    use crate::manager::{ModelManager, ModelSet};
    use crate::pipeline::{Embedder, FallbackModel, IntentPipeline};

    struct ZeroEmbedder;

    #[async_trait]
    impl Embedder for ZeroEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.0; 3])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
        }
    }

    struct StaticOracle;

    #[async_trait]
    impl FallbackModel for StaticOracle {
        async fn llm_fallback(&self, _text: &str) -> Result<String, FallbackError> {
            Ok("general_question".into())
        }
    }

    fn confident_set() -> ModelSet {
        // logit(0.9) intercept rows; zero query embeds at distance 0.
        let logit = |p: f32| (p / (1.0 - p)).ln();
        ModelSet {
            classifier: LinearClassifier::new(
                Array2::zeros((2, 3)),
                Array1::from(vec![logit(0.9), logit(0.1)]),
                vec![0, 1],
                "corpus-test",
            ),
            labels: LabelCodec::fit(["login_problems", "payment_issues"]),
            index: FlatIndex::new(Array2::zeros((1, 3)), "corpus-test"),
        }
    }

    fn app(manager: ModelManager) -> axum::Router {
        let pipeline = Arc::new(IntentPipeline::new(
            manager,
            Arc::new(ZeroEmbedder),
            Arc::new(StaticOracle),
            EscalationPolicy::default(),
        ));
        api::router().with_state(api::AppState { pipeline })
    }

    async fn body_string(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_the_decision() {
        let app = app(ModelManager::preloaded(confident_set()));
        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text": "Ich kann mich nicht einloggen"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response.into_body()).await).unwrap();
        assert_eq!(body["intent"], "login_problems");
        assert_eq!(body["fallback_used"], false);
        assert_eq!(body["text"], "Ich kann mich nicht einloggen");
    }

    #[tokio::test]
    async fn empty_text_is_served_not_rejected() {
        let app = app(ModelManager::preloaded(confident_set()));
        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_text_field_is_rejected_by_the_extractor() {
        let app = app(ModelManager::preloaded(confident_set()));
        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"invalid": "field"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn load_failure_surfaces_as_server_error() {
        let manager = ModelManager::new(ArtifactPaths {
            classifier: "/nonexistent/classifier.bin".into(),
            labels: "/nonexistent/labels.bin".into(),
            index: "/nonexistent/index.bin".into(),
        });
        let app = app(manager);
        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text": "hallo"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response.into_body()).await;
        assert!(body.starts_with("model_load_failed"), "body was: {body}");
    }

    #[tokio::test]
    async fn health_reports_running() {
        let app = app(ModelManager::preloaded(confident_set()));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response.into_body()).await).unwrap();
        assert_eq!(body["status"], "running");
    }
}

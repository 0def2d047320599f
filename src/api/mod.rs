use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::IntentPipeline;

pub mod handlers;
pub mod types;

use handlers::{health, predict};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntentPipeline>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/", get(health))
}

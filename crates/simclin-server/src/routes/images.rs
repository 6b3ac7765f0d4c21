use axum::extract::{Path, Query};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::state::AppState;
use crate::svg;

#[derive(Deserialize)]
struct ImageQuery {
    #[serde(default)]
    id: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/examen/{tipo}", get(exam_image))
}

/// Procedurally drawn exam image, deterministic per `(tipo, id)`.
async fn exam_image(Path(tipo): Path<String>, Query(query): Query<ImageQuery>) -> impl IntoResponse {
    let body = svg::render(&tipo.to_lowercase(), &query.id);
    ([(header::CONTENT_TYPE, "image/svg+xml")], body)
}

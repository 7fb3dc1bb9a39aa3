//! Service route handlers.
//!
//! Analysis endpoints return JSON. State is shared via `Arc<ServiceState>`.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::extractor::OddsExtractor;
use crate::ocr::{ImageFetcher, OcrProvider, TesseractOcr};
use crate::report;
use crate::storage::{AnalysisStore, SqliteStore};
use crate::types::{AnalysisResult, HistoryEntry, Locale};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServiceState {
    pub extractor: OddsExtractor,
    pub store: Option<Arc<dyn AnalysisStore>>,
    pub ocr: Option<Arc<dyn OcrProvider>>,
    pub fetcher: ImageFetcher,
    pub history_limit: u32,
}

impl ServiceState {
    /// Analyzer-only state: no store, no OCR.
    pub fn new(locale: Locale, history_limit: u32) -> Result<Self> {
        Ok(Self {
            extractor: OddsExtractor::new(locale),
            store: None,
            ocr: None,
            fetcher: ImageFetcher::new()?,
            history_limit,
        })
    }

    pub fn with_store(mut self, store: Arc<dyn AnalysisStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrProvider>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Wire up the adapters enabled in `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let mut state = Self::new(config.analysis.locale, config.storage.history_limit)?;

        if config.storage.enabled {
            let store = SqliteStore::from_config(&config.storage).await?;
            state = state.with_store(Arc::new(store));
        } else {
            warn!("Storage disabled, analyses will not be persisted");
        }

        if config.ocr.enabled {
            state = state.with_ocr(Arc::new(TesseractOcr::from_config(&config.ocr)));
        } else {
            warn!("OCR disabled, image endpoints will return 503");
        }

        Ok(state)
    }

    pub fn locale(&self) -> Locale {
        self.extractor.locale()
    }
}

pub type AppState = Arc<ServiceState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeUrlRequest {
    pub url: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: AnalysisResult,
    pub report: String,
    /// Id of the stored record; null when not persisted.
    pub record_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: i64,
    pub entries: Vec<HistoryEntry>,
    pub report: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    NoOdds(Locale),
    OcrFailed(Locale),
    OcrDisabled,
    StorageDisabled,
    EmptyBody,
    Download(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NoOdds(locale) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_odds",
                report::no_odds_message(locale).to_string(),
            ),
            ApiError::OcrFailed(locale) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ocr_failed",
                report::ocr_failed_message(locale).to_string(),
            ),
            ApiError::OcrDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ocr_disabled",
                "OCR is not enabled on this server".to_string(),
            ),
            ApiError::StorageDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "storage_disabled",
                "Storage is not enabled on this server".to_string(),
            ),
            ApiError::EmptyBody => (
                StatusCode::BAD_REQUEST,
                "empty_body",
                "Request body must contain an image".to_string(),
            ),
            ApiError::Download(message) => (StatusCode::BAD_GATEWAY, "download_failed", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
        };

        let body = ErrorBody {
            error: error.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared pipeline
// ---------------------------------------------------------------------------

/// Analyze lower-cased text, persist when a user is known, render the report.
#[tracing::instrument(
    name = "analysis",
    skip(state, text),
    fields(request_id = %Uuid::new_v4(), chars = text.chars().count())
)]
async fn run_analysis(
    state: &ServiceState,
    text: &str,
    user_id: Option<i64>,
    source: &'static str,
) -> Result<AnalyzeResponse, ApiError> {
    let locale = state.locale();
    let analysis = state.extractor.analyze(text).map_err(|e| {
        info!(error = %e, "No odds in input");
        ApiError::NoOdds(locale)
    })?;

    let record_id = match (user_id, &state.store) {
        (Some(user_id), Some(store)) => match store
            .save_analysis(
                user_id,
                &analysis.participants,
                analysis.coefficients,
                analysis.probabilities,
            )
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                error!(error = %e, user_id, "Failed to save analysis");
                None
            }
        },
        _ => None,
    };

    info!(
        participants = %analysis.participants,
        margin = analysis.margin,
        bookmaker = %analysis.bookmaker,
        record_id = ?record_id,
        "Analysis complete"
    );

    Ok(AnalyzeResponse {
        report: report::render(&analysis, locale),
        analysis,
        record_id,
    })
}

/// OCR an image and hand the text to the analyzer.
async fn analyze_image_bytes(
    state: &ServiceState,
    ocr: &dyn OcrProvider,
    image: &[u8],
    user_id: Option<i64>,
    source: &'static str,
) -> Result<AnalyzeResponse, ApiError> {
    let text = ocr
        .recognize(image)
        .await
        .ok_or(ApiError::OcrFailed(state.locale()))?;
    info!(engine = ocr.name(), chars = text.chars().count(), "Text recognized");
    run_analysis(state, &text, user_id, source).await
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/analyze
pub async fn analyze_text(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let text = req.text.to_lowercase();
    run_analysis(&state, &text, req.user_id, "text").await.map(Json)
}

/// POST /api/analyze/image
pub async fn analyze_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let ocr = state.ocr.clone().ok_or(ApiError::OcrDisabled)?;
    if body.is_empty() {
        return Err(ApiError::EmptyBody);
    }
    analyze_image_bytes(&state, ocr.as_ref(), &body, query.user_id, "image")
        .await
        .map(Json)
}

/// POST /api/analyze/url
pub async fn analyze_url(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeUrlRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let ocr = state.ocr.clone().ok_or(ApiError::OcrDisabled)?;
    let image = state.fetcher.fetch(&req.url).await.map_err(|e| {
        warn!(error = %e, url = %req.url, "Image download failed");
        ApiError::Download(format!("{e:#}"))
    })?;
    analyze_image_bytes(&state, ocr.as_ref(), &image, req.user_id, "url")
        .await
        .map(Json)
}

/// GET /api/history/:user_id
pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let store = state.store.as_ref().ok_or(ApiError::StorageDisabled)?;
    let entries = store
        .user_history(user_id, state.history_limit)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to load history");
            ApiError::Internal("Failed to load history".to_string())
        })?;

    Ok(Json(HistoryResponse {
        user_id,
        report: report::render_history(&entries, state.locale()),
        entries,
    }))
}

/// GET /
pub async fn welcome(State(state): State<AppState>) -> &'static str {
    report::welcome_message(state.locale())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::MockOcrProvider;
    use crate::storage::MockAnalysisStore;

    fn base_state() -> ServiceState {
        ServiceState::new(Locale::Ru, 10).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_text_without_user_is_not_saved() {
        let mut store = MockAnalysisStore::new();
        store.expect_save_analysis().never();
        let state = Arc::new(base_state().with_store(Arc::new(store)));

        let req = AnalyzeTextRequest {
            text: "СПАРТАК vs ЗЕНИТ 1.85 4.20".into(),
            user_id: None,
        };
        let Json(resp) = analyze_text(State(state), Json(req)).await.unwrap();
        assert_eq!(resp.analysis.participants.first, "спартак");
        assert_eq!(resp.analysis.probabilities, [54.05, 23.81]);
        assert!(resp.record_id.is_none());
        assert!(resp.report.contains("спартак vs зенит"));
    }

    #[tokio::test]
    async fn test_analyze_text_saves_with_user() {
        let mut store = MockAnalysisStore::new();
        store
            .expect_save_analysis()
            .withf(|user_id, pair, coefficients, _| {
                *user_id == 77 && pair.second == "зенит" && *coefficients == [1.85, 4.2]
            })
            .times(1)
            .returning(|_, _, _, _| Ok(12));
        let state = Arc::new(base_state().with_store(Arc::new(store)));

        let req = AnalyzeTextRequest {
            text: "спартак vs зенит 1.85 4.20".into(),
            user_id: Some(77),
        };
        let Json(resp) = analyze_text(State(state), Json(req)).await.unwrap();
        assert_eq!(resp.record_id, Some(12));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_analysis() {
        let mut store = MockAnalysisStore::new();
        store
            .expect_save_analysis()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("disk full")));
        let state = Arc::new(base_state().with_store(Arc::new(store)));

        let req = AnalyzeTextRequest {
            text: "2.10 1.75".into(),
            user_id: Some(1),
        };
        let Json(resp) = analyze_text(State(state), Json(req)).await.unwrap();
        assert!(resp.record_id.is_none());
        assert_eq!(resp.analysis.coefficients, [2.1, 1.75]);
    }

    #[tokio::test]
    async fn test_analyze_text_without_odds() {
        let state = Arc::new(base_state());
        let req = AnalyzeTextRequest {
            text: "просто текст".into(),
            user_id: None,
        };
        let err = analyze_text(State(state), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::NoOdds(Locale::Ru)));
    }

    #[tokio::test]
    async fn test_image_without_ocr_is_unavailable() {
        let state = Arc::new(base_state());
        let err = analyze_image(State(state), Query(ImageQuery::default()), Bytes::from_static(b"png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OcrDisabled));
    }

    #[tokio::test]
    async fn test_image_ocr_failure() {
        let mut ocr = MockOcrProvider::new();
        ocr.expect_recognize().returning(|_| None);
        let state = Arc::new(base_state().with_ocr(Arc::new(ocr)));

        let err = analyze_image(State(state), Query(ImageQuery::default()), Bytes::from_static(b"png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OcrFailed(_)));
    }

    #[tokio::test]
    async fn test_history_without_store() {
        let state = Arc::new(base_state());
        let err = get_history(State(state), Path(5)).await.unwrap_err();
        assert!(matches!(err, ApiError::StorageDisabled));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NoOdds(Locale::En).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::OcrDisabled.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Download("boom".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::EmptyBody.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_text_request_user_id_optional() {
        let req: AnalyzeTextRequest = serde_json::from_str(r#"{"text":"1.5 2.5"}"#).unwrap();
        assert!(req.user_id.is_none());
    }
}

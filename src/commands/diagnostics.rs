use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::binaries::{self, BinaryDiagnostic};

use super::AppState;

/// Résumé du dernier artefact retenu.
#[derive(serde::Serialize)]
pub struct LatestArtifact {
    pub request_id: String,
    pub duration_secs: f64,
    pub segment_count: usize,
}

/// Rapport de santé: état global et diagnostic des binaires externes.
#[derive(serde::Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub binaries: Vec<BinaryDiagnostic>,
    pub latest_artifact: Option<LatestArtifact>,
}

impl HealthReport {
    /// `healthy` uniquement si tous les binaires sont résolus.
    pub fn from_diagnostics(binaries: Vec<BinaryDiagnostic>) -> Self {
        let status = if binaries.iter().all(BinaryDiagnostic::is_resolved) {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status,
            binaries,
            latest_artifact: None,
        }
    }
}

/// Diagnostic de résolution de ffmpeg et yt-dlp (chemin configuré, emplacements connus, PATH).
pub fn diagnose_media_binaries(state: &AppState) -> Vec<BinaryDiagnostic> {
    vec![
        binaries::diagnose_binary("ffmpeg", state.ffmpeg_override.as_deref()),
        binaries::diagnose_binary("yt-dlp", state.yt_dlp_override.as_deref()),
    ]
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let latest_artifact = state.store.latest().map(|artifact| LatestArtifact {
        request_id: artifact.request_id,
        duration_secs: artifact.duration.as_secs_f64(),
        segment_count: artifact.segment_count,
    });

    let mut report = tokio::task::spawn_blocking(move || {
        HealthReport::from_diagnostics(diagnose_media_binaries(&state))
    })
    .await
    .unwrap_or_else(|e| {
        log::error!("Binary diagnostics task failed: {}", e);
        HealthReport::from_diagnostics(Vec::new())
    });
    report.latest_artifact = latest_artifact;

    let status = if report.status == "healthy" && !report.binaries.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

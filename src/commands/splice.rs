use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;

use crate::error::ApiError;
use crate::splicer::{self, types::CombinedAudioArtifact, ArtifactStore};

use super::{delivery, AppState};

/// `POST /splice-videos`: valide, assemble les segments puis renvoie l'audio combiné.
pub async fn splice_videos(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body_missing = || ApiError::BadRequest("Request body not included.".to_string());
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(body_missing());
    }
    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::BadRequest(format!("Failed to decode JSON object: {e}"))
    })?;
    if payload.is_null() {
        return Err(body_missing());
    }

    let request = splicer::validate_request(&payload, state.limits)?;
    let ctx = state.store.new_context();
    log::info!(
        "[{}] Splicing {} segment(s) with {}s offset",
        ctx.request_id,
        request.segments().len(),
        request.splice_offset()
    );

    // Le pipeline bloque (process externes, fichiers): une requête occupe un thread bloquant.
    let splicer = state.splicer.clone();
    let artifact = tokio::task::spawn_blocking(move || splicer.splice(&ctx, &request))
        .await
        .map_err(|e| {
            log::error!("Splice task aborted: {}", e);
            ApiError::Internal("Error occurred while splicing audio.".to_string())
        })?
        .map_err(|e| {
            log::error!("Splice failed: {}", e);
            ApiError::from(e)
        })?;

    deliver_and_retain(&state.store, artifact).await
}

/// Livre l'artefact puis le retient comme dernier résultat; en cas d'échec, il est supprimé.
async fn deliver_and_retain(
    store: &ArtifactStore,
    artifact: CombinedAudioArtifact,
) -> Result<Response, ApiError> {
    match delivery::deliver(&artifact, store.artifact_file_name()).await {
        Ok(response) => {
            store.publish(artifact);
            Ok(response)
        }
        Err(e) => {
            store.discard(&artifact.path);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    fn store_in(root: &std::path::Path) -> ArtifactStore {
        ArtifactStore::new(root.join("temp"), root.join("output"), "combined_audio.m4a")
    }

    fn artifact_at(ctx_path: std::path::PathBuf, request_id: String) -> CombinedAudioArtifact {
        CombinedAudioArtifact {
            request_id,
            path: ctx_path,
            duration: Duration::from_secs(1),
            segment_count: 1,
        }
    }

    #[tokio::test]
    async fn failed_delivery_discards_request_output() {
        let root = tempfile::tempdir().unwrap();
        let store = store_in(root.path());
        let ctx = store.new_context();
        let request_dir = ctx.artifact_path.parent().unwrap().to_path_buf();
        fs::create_dir_all(&request_dir).unwrap();

        // Répertoire de requête présent, fichier absent au moment de l'envoi.
        let err = deliver_and_retain(&store, artifact_at(ctx.artifact_path, ctx.request_id))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        assert!(!request_dir.exists());
        assert!(store.latest().is_none());
    }

    #[tokio::test]
    async fn successful_delivery_retains_artifact() {
        let root = tempfile::tempdir().unwrap();
        let store = store_in(root.path());
        let ctx = store.new_context();
        fs::create_dir_all(ctx.artifact_path.parent().unwrap()).unwrap();
        fs::write(&ctx.artifact_path, b"m4a").unwrap();

        let response =
            deliver_and_retain(&store, artifact_at(ctx.artifact_path.clone(), ctx.request_id.clone()))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(ctx.artifact_path.exists());
        assert_eq!(store.latest().map(|a| a.request_id), Some(ctx.request_id));
    }
}

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::splicer::types::CombinedAudioArtifact;
use crate::utils::path::secure_filename;

/// Type MIME du conteneur de sortie (`.m4a`).
pub const ARTIFACT_CONTENT_TYPE: &str = "audio/mp4";

/// Ouvre l'artefact et le renvoie en pièce jointe, en streaming.
pub async fn deliver(
    artifact: &CombinedAudioArtifact,
    download_name: &str,
) -> Result<Response, ApiError> {
    let file_name = secure_filename(download_name);

    let file = match File::open(&artifact.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::error!(
                "[{}] Artifact missing at send time: {}",
                artifact.request_id,
                artifact.path.display()
            );
            return Err(ApiError::NotFound(format!("File '{file_name}' not found.")));
        }
        Err(e) => return Err(send_error(artifact, e)),
    };
    let length = file
        .metadata()
        .await
        .map_err(|e| send_error(artifact, e))?
        .len();

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| ApiError::Internal(format!("Error occurred while sending audio file: {e}")))?;

    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, length)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Error occurred while sending audio file: {e}")))
}

fn send_error(artifact: &CombinedAudioArtifact, e: std::io::Error) -> ApiError {
    log::error!(
        "[{}] Unable to read artifact {}: {}",
        artifact.request_id,
        artifact.path.display(),
        e
    );
    ApiError::Internal(format!("Error occurred while sending audio file: {e}"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    fn artifact(path: PathBuf) -> CombinedAudioArtifact {
        CombinedAudioArtifact {
            request_id: "req".into(),
            path,
            duration: Duration::from_secs(1),
            segment_count: 1,
        }
    }

    #[tokio::test]
    async fn streams_file_as_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined_audio.m4a");
        std::fs::write(&path, b"fake-m4a-bytes").unwrap();

        let response = deliver(&artifact(path), "combined_audio.m4a")
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "audio/mp4");
        assert_eq!(headers[header::CONTENT_LENGTH], "14");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"combined_audio.m4a\""
        );

        let body = axum::body::to_bytes(response.into_body(), 1_000)
            .await
            .unwrap();
        assert_eq!(&body[..], b"fake-m4a-bytes");
    }

    #[tokio::test]
    async fn download_name_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.m4a");
        std::fs::write(&path, b"x").unwrap();

        let response = deliver(&artifact(path), "../my \"mix\".m4a").await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"my_mix.m4a\""
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = deliver(&artifact(dir.path().join("gone.m4a")), "combined_audio.m4a")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "File 'combined_audio.m4a' not found.");
    }
}

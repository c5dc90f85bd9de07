//! Erreurs du service et leur traduction en réponses HTTP.
//!
//! Toutes les réponses d'erreur partagent l'enveloppe JSON `{code, name, description}`.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Violation de contrat de la charge utile de `/splice-videos` (toujours 400).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing splice_offset: request body did not contain the 'splice_offset' field")]
    MissingSpliceOffset,
    #[error("splice_offset must be an integer")]
    SpliceOffsetNotInteger,
    #[error("missing video_details_list: request body did not contain the 'video_details_list' field")]
    MissingVideoDetailsList,
    #[error("video_details_list must be an array")]
    VideoDetailsListNotArray,
    #[error("malformed segment entry at video_details_list[{index}]: {reason}")]
    MalformedSegment { index: usize, reason: String },
    #[error("splice_offset must be greater than or equal to 0")]
    NegativeSpliceOffset,
    #[error("splice_offset must be less than or equal to {max}")]
    SpliceOffsetTooLarge { max: u64 },
    #[error("at least one segment required in video_details_list")]
    EmptySegments,
    #[error("start_time must be greater than or equal to 0 (video_details_list[{index}])")]
    NegativeStartTime { index: usize },
    #[error("end_time must be greater than or equal to 0 (video_details_list[{index}])")]
    NegativeEndTime { index: usize },
    #[error("start_time must be less than or equal to end_time (video_details_list[{index}])")]
    StartAfterEnd { index: usize },
    #[error("video_details_list durations plus splice_offset gaps must total at most {max} seconds")]
    OutputTooLong { max: u64 },
}

/// Échec du téléchargement d'un segment par yt-dlp.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("yt-dlp exited with status {code}: {details}")]
    ToolFailed { code: i32, details: String },
    #[error("unable to execute yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("downloaded file not found in {}", .0.display())]
    OutputMissing(PathBuf),
    #[error("unable to prepare download directory: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Code d'erreur exposé à l'appelant: le code de sortie de l'outil, sinon `-1`.
    pub fn code(&self) -> i32 {
        match self {
            Self::ToolFailed { code, .. } => *code,
            _ => -1,
        }
    }
}

/// Échec de décodage, de concaténation ou d'encodage audio.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio file not found: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("unable to execute ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffmpeg exited with status {code}: {details}")]
    ToolFailed { code: i32, details: String },
    #[error("audio format mismatch: expected {expected:?} (rate, channels), found {found:?}")]
    FormatMismatch {
        expected: (u32, u16),
        found: (u32, u16),
    },
}

/// Échec du pipeline de splice.
#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    #[error("segment {index} ({video_id}) could not be downloaded: {source}")]
    Fetch {
        index: usize,
        video_id: String,
        #[source]
        source: FetchError,
    },
    #[error("audio processing failed: {0}")]
    Audio(#[from] AudioError),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Erreur exposée par les handlers HTTP.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("The method is not allowed for the requested URL.")]
    MethodNotAllowed,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<SpliceError> for ApiError {
    fn from(err: SpliceError) -> Self {
        match err {
            SpliceError::Fetch { index, source, .. } => Self::Internal(format!(
                "Error occurred while downloading YouTube video (segment {index}). Error code: {}",
                source.code()
            )),
            SpliceError::Audio(_) => {
                Self::Internal("Error occurred while processing audio.".to_string())
            }
            SpliceError::Io(_) => {
                Self::Internal("Error occurred while preparing the combined audio file.".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "code": status.as_u16(),
            "name": status.canonical_reason().unwrap_or("Error"),
            "description": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

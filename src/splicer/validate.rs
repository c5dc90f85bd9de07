//! Validation de la charge utile JSON de `/splice-videos`.
//!
//! Une seule violation est remontée: la première trouvée, dans un ordre fixe
//! (présence et type des champs, forme des entrées, puis contraintes numériques).

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;

use super::types::{SegmentBoundsError, SegmentSpec, SpliceRequest};

/// Plafonds appliqués à une requête avant tout téléchargement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceLimits {
    /// Durée maximale d'un silence entre deux segments.
    pub max_splice_offset_secs: u64,
    /// Durée maximale de l'audio combiné, silences compris. Borne la mémoire d'un splice.
    pub max_output_secs: u64,
}

/// Forme brute attendue pour chaque entrée de `video_details_list`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSegment {
    video_id: String,
    start_time: f64,
    end_time: f64,
}

/// Convertit la charge utile non typée en [`SpliceRequest`] ou renvoie la première violation.
pub fn validate_request(
    payload: &Value,
    limits: SpliceLimits,
) -> Result<SpliceRequest, ValidationError> {
    let splice_offset = match payload.get("splice_offset") {
        None | Some(Value::Null) => return Err(ValidationError::MissingSpliceOffset),
        Some(value) => integer_value(value).ok_or(ValidationError::SpliceOffsetNotInteger)?,
    };

    let items = match payload.get("video_details_list") {
        None | Some(Value::Null) => return Err(ValidationError::MissingVideoDetailsList),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::VideoDetailsListNotArray),
    };

    let mut raw_segments = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let raw = RawSegment::deserialize(item).map_err(|e| ValidationError::MalformedSegment {
            index,
            reason: e.to_string(),
        })?;
        raw_segments.push(raw);
    }

    if splice_offset < 0 {
        return Err(ValidationError::NegativeSpliceOffset);
    }
    let splice_offset = splice_offset as u64;
    if splice_offset > limits.max_splice_offset_secs {
        return Err(ValidationError::SpliceOffsetTooLarge {
            max: limits.max_splice_offset_secs,
        });
    }

    if raw_segments.is_empty() {
        return Err(ValidationError::EmptySegments);
    }

    // Bornes vérifiées segment par segment: start < 0, end < 0, puis start > end.
    let mut segments = Vec::with_capacity(raw_segments.len());
    for (index, raw) in raw_segments.into_iter().enumerate() {
        let segment = SegmentSpec::new(raw.video_id, raw.start_time, raw.end_time)
            .map_err(|e| bounds_error(e, index))?;
        segments.push(segment);
    }

    let audio_secs: f64 = segments.iter().map(|s| s.end_time() - s.start_time()).sum();
    let silence_secs = (segments.len() - 1) as f64 * splice_offset as f64;
    if audio_secs + silence_secs > limits.max_output_secs as f64 {
        return Err(ValidationError::OutputTooLong {
            max: limits.max_output_secs,
        });
    }

    SpliceRequest::new(splice_offset, segments).ok_or(ValidationError::EmptySegments)
}

/// Entier JSON strict: les flottants (même `3.0`), booléens et chaînes sont refusés.
fn integer_value(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        _ => None,
    }
}

fn bounds_error(err: SegmentBoundsError, index: usize) -> ValidationError {
    match err {
        SegmentBoundsError::NegativeStart => ValidationError::NegativeStartTime { index },
        SegmentBoundsError::NegativeEnd => ValidationError::NegativeEndTime { index },
        SegmentBoundsError::StartAfterEnd => ValidationError::StartAfterEnd { index },
    }
}

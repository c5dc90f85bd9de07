use std::path::PathBuf;
use std::time::Duration;

/// Un segment demandé: l'audio d'une vidéo restreint à une fenêtre temporelle.
///
/// Les champs sont privés: une fois construit via [`SegmentSpec::new`], le segment
/// respecte toujours `0 <= start_time <= end_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    video_id: String,
    start_time: f64,
    end_time: f64,
}

impl SegmentSpec {
    /// Construit un segment après vérification de ses bornes.
    pub fn new(
        video_id: impl Into<String>,
        start_time: f64,
        end_time: f64,
    ) -> Result<Self, SegmentBoundsError> {
        if start_time < 0.0 {
            return Err(SegmentBoundsError::NegativeStart);
        }
        if end_time < 0.0 {
            return Err(SegmentBoundsError::NegativeEnd);
        }
        if start_time > end_time {
            return Err(SegmentBoundsError::StartAfterEnd);
        }
        Ok(Self {
            video_id: video_id.into(),
            start_time,
            end_time,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}

/// Violation des bornes temporelles d'un segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentBoundsError {
    NegativeStart,
    NegativeEnd,
    StartAfterEnd,
}

/// Requête de splice validée: décalage de silence et segments ordonnés (au moins un).
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceRequest {
    splice_offset: u64,
    segments: Vec<SegmentSpec>,
}

impl SpliceRequest {
    /// Retourne `None` si la liste de segments est vide.
    pub fn new(splice_offset: u64, segments: Vec<SegmentSpec>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            splice_offset,
            segments,
        })
    }

    /// Silence inséré entre deux segments consécutifs, en secondes.
    pub fn splice_offset(&self) -> u64 {
        self.splice_offset
    }

    pub fn splice_offset_duration(&self) -> Duration {
        Duration::from_secs(self.splice_offset)
    }

    pub fn segments(&self) -> &[SegmentSpec] {
        &self.segments
    }
}

/// Fichier audio combiné produit par une requête.
#[derive(Debug, Clone)]
pub struct CombinedAudioArtifact {
    pub request_id: String,
    pub path: PathBuf,
    pub duration: Duration,
    pub segment_count: usize,
}

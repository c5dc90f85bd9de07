use std::fs;
use std::sync::Arc;

use crate::error::SpliceError;
use crate::utils::path::partial_path;
use crate::utils::temp_dir::TempDirGuard;

use super::artifact::RequestContext;
use super::audio::{AudioCodec, AudioSegment};
use super::fetch::SegmentFetcher;
use super::types::{CombinedAudioArtifact, SpliceRequest};

/// Orchestration fetch → décodage → concaténation → encodage pour une requête.
///
/// Les segments sont traités strictement l'un après l'autre, dans l'ordre de la requête.
#[derive(Clone)]
pub struct Splicer {
    fetcher: Arc<dyn SegmentFetcher>,
    codec: Arc<dyn AudioCodec>,
}

impl Splicer {
    pub fn new(fetcher: Arc<dyn SegmentFetcher>, codec: Arc<dyn AudioCodec>) -> Self {
        Self { fetcher, codec }
    }

    /// Produit l'artefact combiné de `request` aux emplacements de `ctx`.
    ///
    /// Le silence de `splice_offset` secondes est inséré entre chaque paire de segments
    /// consécutifs, jamais avant le premier ni après le dernier. Le répertoire de travail
    /// est supprimé quelle que soit l'issue.
    pub fn splice(
        &self,
        ctx: &RequestContext,
        request: &SpliceRequest,
    ) -> Result<CombinedAudioArtifact, SpliceError> {
        remove_if_exists(&ctx.artifact_path)?;
        let work_dir = TempDirGuard::create_fresh(&ctx.work_dir)?;

        let total = request.segments().len();
        let gap = request.splice_offset_duration();
        let mut combined: Option<AudioSegment> = None;

        for (index, segment) in request.segments().iter().enumerate() {
            log::info!(
                "[{}] Fetching segment {}/{}: {} [{}s - {}s]",
                ctx.request_id,
                index + 1,
                total,
                segment.video_id(),
                segment.start_time(),
                segment.end_time()
            );

            let destination = work_dir.path().join(format!("{index:03}"));
            let downloaded = self.fetcher.fetch(segment, &destination).map_err(|source| {
                log::error!(
                    "[{}] Download failed for segment {} ({}): {}",
                    ctx.request_id,
                    index,
                    segment.video_id(),
                    source
                );
                SpliceError::Fetch {
                    index,
                    video_id: segment.video_id().to_string(),
                    source,
                }
            })?;

            let decoded = self.codec.decode(&downloaded)?;
            match combined.as_mut() {
                None => combined = Some(decoded),
                Some(buffer) => {
                    buffer.append_silence(gap);
                    buffer.append(&decoded)?;
                }
            }
        }

        if let Err(e) = work_dir.remove() {
            log::warn!(
                "[{}] Unable to remove working directory {}: {}",
                ctx.request_id,
                ctx.work_dir.display(),
                e
            );
        }

        // SpliceRequest garantit au moins un segment.
        let combined = combined.unwrap_or_else(|| AudioSegment::from_samples(0, 1, Vec::new()));

        if let Err(e) = self.write_artifact(ctx, &combined) {
            discard_request_output(ctx);
            return Err(e);
        }

        log::info!(
            "[{}] Combined {} segment(s) into {} ({:.3}s)",
            ctx.request_id,
            total,
            ctx.artifact_path.display(),
            combined.duration().as_secs_f64()
        );

        Ok(CombinedAudioArtifact {
            request_id: ctx.request_id.clone(),
            path: ctx.artifact_path.clone(),
            duration: combined.duration(),
            segment_count: total,
        })
    }

    /// Encode vers `.part` puis renomme vers le chemin final.
    fn write_artifact(
        &self,
        ctx: &RequestContext,
        combined: &AudioSegment,
    ) -> Result<(), SpliceError> {
        if let Some(parent) = ctx.artifact_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let part = partial_path(&ctx.artifact_path);
        self.codec.encode(combined, &part)?;
        fs::rename(&part, &ctx.artifact_path)?;
        Ok(())
    }
}

/// Supprime la sortie propre à la requête après un échec d'encodage ou de renommage.
fn discard_request_output(ctx: &RequestContext) {
    let result = match ctx.artifact_path.parent() {
        Some(dir) => fs::remove_dir_all(dir),
        None => fs::remove_file(partial_path(&ctx.artifact_path)),
    };
    if let Err(e) = result {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!(
                "[{}] Unable to remove output of failed request: {}",
                ctx.request_id,
                e
            );
        }
    }
}

fn remove_if_exists(path: &std::path::Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

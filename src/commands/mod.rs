use std::path::PathBuf;
use std::sync::Arc;

use crate::splicer::{ArtifactStore, SpliceLimits, Splicer};

/// Livraison de l'artefact combiné.
pub mod delivery;
/// Diagnostic des binaires et endpoint de santé.
pub mod diagnostics;
/// Accueil et réponses de repli.
pub mod home;
/// Endpoint principal de splice.
pub mod splice;

/// État partagé passé aux handlers axum.
#[derive(Clone)]
pub struct AppState {
    pub splicer: Splicer,
    pub store: Arc<ArtifactStore>,
    pub limits: SpliceLimits,
    /// Chemins explicites configurés, repris par le diagnostic des binaires.
    pub ffmpeg_override: Option<PathBuf>,
    pub yt_dlp_override: Option<PathBuf>,
}

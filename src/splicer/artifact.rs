use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use super::types::CombinedAudioArtifact;

/// Contexte propre à une requête: identifiant unique et chemins qu'il isole.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub work_dir: PathBuf,
    pub artifact_path: PathBuf,
}

/// Emplacements des répertoires de travail et des artefacts, plus le dernier artefact retenu.
///
/// Un seul artefact réussi est conservé: publier un nouvel artefact supprime le précédent.
/// Une requête en échec ne touche jamais à l'artefact retenu.
#[derive(Debug)]
pub struct ArtifactStore {
    temp_root: PathBuf,
    output_root: PathBuf,
    artifact_file_name: String,
    latest: Mutex<Option<CombinedAudioArtifact>>,
}

impl ArtifactStore {
    pub fn new(
        temp_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        artifact_file_name: impl Into<String>,
    ) -> Self {
        Self {
            temp_root: temp_root.into(),
            output_root: output_root.into(),
            artifact_file_name: artifact_file_name.into(),
            latest: Mutex::new(None),
        }
    }

    pub fn artifact_file_name(&self) -> &str {
        &self.artifact_file_name
    }

    /// Alloue un nouveau contexte de requête (UUID v7, ordonné dans le temps).
    pub fn new_context(&self) -> RequestContext {
        let request_id = Uuid::now_v7().to_string();
        RequestContext {
            work_dir: self.temp_root.join(&request_id),
            artifact_path: self
                .output_root
                .join(&request_id)
                .join(&self.artifact_file_name),
            request_id,
        }
    }

    /// Dernier artefact publié, s'il existe.
    pub fn latest(&self) -> Option<CombinedAudioArtifact> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Retient `artifact` comme dernier résultat et supprime l'artefact précédent.
    pub fn publish(&self, artifact: CombinedAudioArtifact) {
        let previous = {
            let mut latest = self
                .latest
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            latest.replace(artifact)
        };

        if let Some(previous) = previous {
            self.discard(&previous.path);
        }
    }

    /// Supprime un artefact et son répertoire de requête.
    pub fn discard(&self, artifact_path: &Path) {
        let target = artifact_path
            .parent()
            .filter(|dir| dir.starts_with(&self.output_root) && *dir != self.output_root);
        let result = match target {
            Some(dir) => fs::remove_dir_all(dir),
            None => fs::remove_file(artifact_path),
        };
        if let Err(e) = result {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "Unable to remove previous artifact {}: {}",
                    artifact_path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn artifact_at(ctx: &RequestContext) -> CombinedAudioArtifact {
        fs::create_dir_all(ctx.artifact_path.parent().unwrap()).unwrap();
        fs::write(&ctx.artifact_path, b"m4a").unwrap();
        CombinedAudioArtifact {
            request_id: ctx.request_id.clone(),
            path: ctx.artifact_path.clone(),
            duration: Duration::from_secs(1),
            segment_count: 1,
        }
    }

    #[test]
    fn contexts_are_namespaced_per_request() {
        let store = ArtifactStore::new("/srv/temp", "/srv/output", "combined_audio.m4a");
        let a = store.new_context();
        let b = store.new_context();
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.work_dir, PathBuf::from("/srv/temp").join(&a.request_id));
        assert_eq!(
            a.artifact_path,
            PathBuf::from("/srv/output")
                .join(&a.request_id)
                .join("combined_audio.m4a")
        );
    }

    #[test]
    fn publishing_replaces_previous_artifact() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(
            root.path().join("temp"),
            root.path().join("output"),
            "combined_audio.m4a",
        );

        let first_ctx = store.new_context();
        let first = artifact_at(&first_ctx);
        store.publish(first);
        assert!(first_ctx.artifact_path.exists());

        let second_ctx = store.new_context();
        let second = artifact_at(&second_ctx);
        store.publish(second);

        assert!(!first_ctx.artifact_path.exists());
        assert!(!first_ctx.artifact_path.parent().unwrap().exists());
        assert!(second_ctx.artifact_path.exists());
        assert_eq!(
            store.latest().map(|a| a.request_id),
            Some(second_ctx.request_id)
        );
        assert!(root.path().join("output").exists());
    }
}

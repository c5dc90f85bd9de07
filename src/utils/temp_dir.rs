use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Garde RAII qui supprime un répertoire de travail et tout son contenu à la sortie de scope.
pub struct TempDirGuard {
    path: PathBuf,
    armed: bool,
}

impl TempDirGuard {
    /// Crée un répertoire vide, en le recréant s'il existait déjà (exécution précédente inachevée).
    pub fn create_fresh(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if path.exists() {
            log::warn!(
                "Working directory {} already exists, recreating it",
                path.display()
            );
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Supprime le répertoire immédiatement et remonte l'éventuelle erreur.
    pub fn remove(mut self) -> io::Result<()> {
        self.armed = false;
        fs::remove_dir_all(&self.path)
    }
}

impl Drop for TempDirGuard {
    /// Tente de supprimer le répertoire sans propager d'erreur.
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                log::warn!("Unable to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let work = root.path().join("work");
        {
            let guard = TempDirGuard::create_fresh(&work).unwrap();
            fs::create_dir_all(guard.path().join("000")).unwrap();
            fs::write(guard.path().join("000").join("a.m4a"), b"x").unwrap();
        }
        assert!(!work.exists());
    }

    #[test]
    fn create_fresh_clears_leftovers() {
        let root = tempfile::tempdir().unwrap();
        let work = root.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("stale.m4a"), b"old").unwrap();

        let guard = TempDirGuard::create_fresh(&work).unwrap();
        assert!(guard.path().exists());
        assert!(!work.join("stale.m4a").exists());
        guard.remove().unwrap();
        assert!(!work.exists());
    }
}

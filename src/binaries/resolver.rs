use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::utils::process::{configure_command_no_window, first_non_empty_line};

use super::diagnostics::{BinaryDiagnostic, BinaryResolutionAttempt, BinaryResolveError};

/// Ajoute l'extension `.exe` sous Windows.
fn exe_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Retourne la liste ordonnee des emplacements connus pour un binaire donne.
fn binary_candidates(bin: &str) -> Vec<PathBuf> {
    let mut paths = vec![Path::new("binaries").join(bin)];

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join("binaries").join(bin));
            paths.push(dir.join(bin));
        }
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(Path::new("/usr/local/bin").join(bin));
        paths.push(Path::new("/usr/bin").join(bin));
        paths.push(Path::new("/bin").join(bin));
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(Path::new("/opt/homebrew/bin").join(bin));
        paths.push(Path::new("/usr/local/bin").join(bin));
        paths.push(Path::new("/opt/local/bin").join(bin));
    }

    dedupe_paths(paths)
}

/// Supprime les chemins dupliques en conservant l'ordre.
fn dedupe_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();
    for path in paths {
        let key = path.to_string_lossy().to_string();
        if seen.insert(key) {
            deduped.push(path);
        }
    }
    deduped
}

/// Classe une erreur de lancement de process en resultat applicatif stable.
fn classify_spawn_error(error: &std::io::Error) -> (&'static str, String) {
    if error.kind() == ErrorKind::NotFound {
        return ("missing", "Binary not found".to_string());
    }

    if error.kind() == ErrorKind::PermissionDenied {
        return (
            "not_executable",
            "Permission denied while executing binary".to_string(),
        );
    }

    let msg = error.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("exec format error")
        || lower.contains("bad cpu type")
        || lower.contains("cannot execute")
    {
        return ("not_executable", msg);
    }

    ("exec_failed", msg)
}

/// Retourne les arguments de probe appropries pour un binaire donne.
fn probe_args_for(binary_name: &str) -> &'static [&'static str] {
    let normalized = binary_name
        .strip_suffix(".exe")
        .unwrap_or(binary_name)
        .to_ascii_lowercase();

    match normalized.as_str() {
        "yt-dlp" => &["--version"],
        _ => &["-version"],
    }
}

/// Execute la probe de version et renvoie la premiere ligne de sortie.
fn probe_version(binary: &str, binary_name: &str) -> Result<String, (String, String)> {
    let mut cmd = Command::new(binary);
    cmd.args(probe_args_for(binary_name));
    configure_command_no_window(&mut cmd);
    match cmd.output() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if output.status.success() {
                return Ok(first_non_empty_line(&stdout));
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = first_non_empty_line(&stderr);
            let detail = if detail.is_empty() {
                first_non_empty_line(&stdout)
            } else {
                detail
            };
            Err((
                "exec_failed".to_string(),
                if detail.is_empty() {
                    "Binary returned non-zero exit status".to_string()
                } else {
                    detail
                },
            ))
        }
        Err(error) => {
            let (outcome, detail) = classify_spawn_error(&error);
            Err((outcome.to_string(), detail))
        }
    }
}

/// Teste un candidat et enregistre la tentative. Retourne la ligne de version si utilisable.
fn try_candidate(
    candidate: &str,
    name: &str,
    source: &str,
    attempts: &mut Vec<BinaryResolutionAttempt>,
) -> Option<String> {
    match probe_version(candidate, name) {
        Ok(version) => {
            attempts.push(BinaryResolutionAttempt {
                candidate: candidate.to_string(),
                source: source.to_string(),
                outcome: "ok".to_string(),
                detail: None,
            });
            Some(version)
        }
        Err((outcome, detail)) => {
            attempts.push(BinaryResolutionAttempt {
                candidate: candidate.to_string(),
                source: source.to_string(),
                outcome,
                detail: Some(detail),
            });
            None
        }
    }
}

/// Construit l'erreur finale a partir de l'historique des tentatives.
fn resolve_error(name: &str, attempts: Vec<BinaryResolutionAttempt>) -> BinaryResolveError {
    let has_not_executable = attempts.iter().any(|a| a.outcome == "not_executable");
    let has_exec_failed = attempts.iter().any(|a| a.outcome == "exec_failed");
    let details = attempts
        .iter()
        .find_map(|a| a.detail.clone())
        .unwrap_or_else(|| format!("No usable binary found for {name}"));
    let code = if has_not_executable {
        "BINARY_NOT_EXECUTABLE"
    } else if has_exec_failed {
        "BINARY_EXEC_FAILED"
    } else {
        "BINARY_NOT_FOUND"
    };

    BinaryResolveError {
        code: code.to_string(),
        details,
        attempts,
    }
}

/// Resout un binaire et retourne (chemin, version, tentatives).
///
/// Ordre: chemin explicite de configuration, emplacements connus, puis PATH systeme.
/// Un chemin explicite inutilisable n'empeche pas la suite de la recherche.
fn resolve_binary_with_attempts(
    name: &str,
    configured: Option<&Path>,
) -> Result<(String, String, Vec<BinaryResolutionAttempt>), BinaryResolveError> {
    let bin = exe_name(name);
    let mut attempts = Vec::new();

    if let Some(path) = configured {
        let candidate = path.to_string_lossy().to_string();
        if let Some(version) = try_candidate(&candidate, name, "configuration", &mut attempts) {
            return Ok((candidate, version, attempts));
        }
    }

    for path in binary_candidates(&bin) {
        if !path.exists() {
            attempts.push(BinaryResolutionAttempt {
                candidate: path.to_string_lossy().to_string(),
                source: "known_path".to_string(),
                outcome: "missing".to_string(),
                detail: None,
            });
            continue;
        }
        let canonical = path.canonicalize().unwrap_or(path);
        let candidate = canonical.to_string_lossy().to_string();
        if let Some(version) = try_candidate(&candidate, name, "known_path", &mut attempts) {
            return Ok((candidate, version, attempts));
        }
    }

    if let Some(version) = try_candidate(&bin, name, "system_path", &mut attempts) {
        return Ok((bin, version, attempts));
    }

    Err(resolve_error(name, attempts))
}

/// Retourne le chemin du binaire ou une erreur structuree.
pub fn resolve_binary_detailed(
    name: &str,
    configured: Option<&Path>,
) -> Result<String, BinaryResolveError> {
    resolve_binary_with_attempts(name, configured).map(|(path, _, _)| path)
}

/// Retourne un diagnostic complet de resolution d'un binaire.
pub fn diagnose_binary(name: &str, configured: Option<&Path>) -> BinaryDiagnostic {
    match resolve_binary_with_attempts(name, configured) {
        Ok((path, version, attempts)) => BinaryDiagnostic {
            name: name.to_string(),
            resolved_path: Some(path),
            error_code: None,
            error_details: None,
            attempts,
            version_output: Some(version).filter(|v| !v.is_empty()),
        },
        Err(err) => BinaryDiagnostic {
            name: name.to_string(),
            resolved_path: None,
            error_code: Some(err.code),
            error_details: Some(err.details),
            attempts: err.attempts,
            version_output: None,
        },
    }
}

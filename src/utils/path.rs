use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// Nom de repli quand la sanitisation ne laisse rien d'exploitable.
const FALLBACK_FILE_NAME: &str = "combined_audio.m4a";

/// Retourne une version sûre d'un nom de fichier pour un en-tête `Content-Disposition`.
///
/// Les caractères non ASCII sont ignorés, les séparateurs de chemin deviennent des
/// espaces, les blancs consécutifs sont remplacés par `_` puis tout caractère hors
/// `[A-Za-z0-9_.-]` est retiré. Les `.` et `_` en tête et en fin sont supprimés.
pub fn secure_filename(raw: &str) -> String {
    let ascii: String = raw.chars().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ajoute un suffixe `.part` au chemin donné, pour une écriture suivie d'un renommage atomique.
pub fn partial_path(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".part");
    std::path::PathBuf::from(os)
}

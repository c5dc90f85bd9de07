use std::process::{Command, ExitStatus, Output};

/// Configure la commande pour éviter l'ouverture d'une fenêtre console sur Windows.
pub fn configure_command_no_window(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    {
        let _ = cmd;
    }
}

/// Extrait un message d'erreur lisible depuis la sortie d'un process.
///
/// stderr est prioritaire; stdout sert de repli quand l'outil écrit ses erreurs
/// sur la sortie standard (cas fréquent avec yt-dlp).
pub fn sanitize_cmd_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Code de sortie numérique d'un process, `-1` s'il a été tué par un signal.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Retourne la première ligne non vide d'un texte.
pub fn first_non_empty_line(text: &str) -> String {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Retourne la dernière ligne non vide d'un texte, si elle existe.
pub fn last_non_empty_line(text: &str) -> Option<String> {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_skips_blank_lines() {
        assert_eq!(first_non_empty_line("\n\n  ffmpeg version 6.1\nmore"), "ffmpeg version 6.1");
        assert_eq!(first_non_empty_line("   "), "");
    }

    #[test]
    fn last_line_skips_trailing_blank_lines() {
        assert_eq!(
            last_non_empty_line("[download] 100%\n/tmp/work/000/Song.m4a\n\n"),
            Some("/tmp/work/000/Song.m4a".to_string())
        );
        assert_eq!(last_non_empty_line("\n \n"), None);
    }
}

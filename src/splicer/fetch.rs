use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::FetchError;
use crate::utils::process::{
    configure_command_no_window, exit_code, last_non_empty_line, sanitize_cmd_error,
};

use super::types::SegmentSpec;

/// Capacité « récupérer l'audio de la vidéo V restreint à [start, end] ».
pub trait SegmentFetcher: Send + Sync {
    /// Télécharge l'audio du segment dans `destination_dir` et retourne le chemin du fichier écrit.
    fn fetch(&self, segment: &SegmentSpec, destination_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// Téléchargement via yt-dlp, le découpage temporel étant délégué à ffmpeg (`-ss`/`-to`).
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    yt_dlp_path: String,
    ffmpeg_dir: Option<PathBuf>,
    video_url_base: String,
}

impl YtDlpFetcher {
    pub fn new(
        yt_dlp_path: impl Into<String>,
        ffmpeg_dir: Option<PathBuf>,
        video_url_base: impl Into<String>,
    ) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            ffmpeg_dir,
            video_url_base: video_url_base.into(),
        }
    }

    fn video_url(&self, video_id: &str) -> String {
        format!("{}{}", self.video_url_base, video_id)
    }

    fn build_args(&self, segment: &SegmentSpec, destination_dir: &Path) -> Vec<String> {
        let output_pattern = destination_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string();
        let ffmpeg_input_args = format!(
            "ffmpeg_i:-ss {} -to {}",
            segment.start_time(),
            segment.end_time()
        );

        let mut args: Vec<String> = vec![
            "--force-ipv4".into(),
            "--no-playlist".into(),
            "--no-progress".into(),
            "--no-simulate".into(),
            "--format".into(),
            "m4a/bestaudio/best".into(),
            "--external-downloader".into(),
            "ffmpeg".into(),
            "--external-downloader-args".into(),
            ffmpeg_input_args,
        ];
        if let Some(dir) = &self.ffmpeg_dir {
            args.push("--ffmpeg-location".into());
            args.push(dir.to_string_lossy().to_string());
        }
        args.extend([
            "--print".into(),
            "after_move:filepath".into(),
            "-o".into(),
            output_pattern,
            self.video_url(segment.video_id()),
        ]);
        args
    }
}

impl SegmentFetcher for YtDlpFetcher {
    fn fetch(&self, segment: &SegmentSpec, destination_dir: &Path) -> Result<PathBuf, FetchError> {
        fs::create_dir_all(destination_dir)?;

        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args(self.build_args(segment, destination_dir));
        configure_command_no_window(&mut cmd);
        let output = cmd.output().map_err(FetchError::Spawn)?;

        if !output.status.success() {
            return Err(FetchError::ToolFailed {
                code: exit_code(&output.status),
                details: sanitize_cmd_error(&output),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        log::debug!("yt-dlp output: {}", stdout.trim());
        resolve_downloaded_file(&stdout, destination_dir)
    }
}

/// Retrouve le fichier téléchargé: chemin imprimé par yt-dlp, sinon premier fichier du répertoire.
fn resolve_downloaded_file(stdout: &str, destination_dir: &Path) -> Result<PathBuf, FetchError> {
    if let Some(printed) = last_non_empty_line(stdout) {
        let path = PathBuf::from(printed);
        if path.is_file() {
            return Ok(path);
        }
    }

    let mut files: Vec<PathBuf> = fs::read_dir(destination_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && !is_partial_download(path))
        .collect();
    files.sort();
    files
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::OutputMissing(destination_dir.to_path_buf()))
}

fn is_partial_download(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "part" || ext == "ytdl")
}

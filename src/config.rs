//! Configuration du service, lue depuis l'environnement au démarrage.
//!
//! Chaque variable `AUDIO_SPLICER_*` est optionnelle; les répertoires relatifs
//! sont résolus par rapport au répertoire courant du process au démarrage.

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Préfixe commun des variables d'environnement.
pub const ENV_PREFIX: &str = "AUDIO_SPLICER_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
    #[error("unable to determine current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SplicerConfig {
    pub host: String,
    pub port: u16,
    /// Racine des répertoires de travail, un sous-répertoire par requête.
    pub temp_dir: PathBuf,
    /// Racine des artefacts produits, un sous-répertoire par requête.
    pub output_dir: PathBuf,
    /// Nom de l'artefact final, aussi utilisé comme nom de téléchargement.
    pub artifact_file_name: String,
    pub ffmpeg_path: Option<PathBuf>,
    pub yt_dlp_path: Option<PathBuf>,
    pub sample_rate: u32,
    pub channels: u16,
    pub audio_bitrate: String,
    pub max_splice_offset_secs: u64,
    /// Durée maximale de l'audio combiné, silences compris.
    pub max_output_secs: u64,
    pub video_url_base: String,
}

impl Default for SplicerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            temp_dir: PathBuf::from("temp"),
            output_dir: PathBuf::from("output"),
            artifact_file_name: "combined_audio.m4a".to_string(),
            ffmpeg_path: None,
            yt_dlp_path: None,
            sample_rate: 44_100,
            channels: 2,
            audio_bitrate: "192k".to_string(),
            max_splice_offset_secs: 3600,
            max_output_secs: 3600,
            video_url_base: "https://www.youtube.com/watch?v=".to_string(),
        }
    }
}

impl SplicerConfig {
    /// Charge la configuration depuis les variables d'environnement du process.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir()?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Construit la configuration depuis une source de variables arbitraire.
    pub fn from_lookup<F>(lookup: F, base_dir: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let mut config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            temp_dir: get("TEMP_DIR").map(PathBuf::from).unwrap_or(defaults.temp_dir),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            artifact_file_name: get("ARTIFACT_NAME").unwrap_or(defaults.artifact_file_name),
            ffmpeg_path: get("FFMPEG").map(PathBuf::from),
            yt_dlp_path: get("YT_DLP").map(PathBuf::from),
            sample_rate: parse_or("SAMPLE_RATE", get("SAMPLE_RATE"), defaults.sample_rate)?,
            channels: parse_or("CHANNELS", get("CHANNELS"), defaults.channels)?,
            audio_bitrate: get("AUDIO_BITRATE").unwrap_or(defaults.audio_bitrate),
            max_splice_offset_secs: parse_or(
                "MAX_SPLICE_OFFSET",
                get("MAX_SPLICE_OFFSET"),
                defaults.max_splice_offset_secs,
            )?,
            max_output_secs: parse_or(
                "MAX_OUTPUT_DURATION",
                get("MAX_OUTPUT_DURATION"),
                defaults.max_output_secs,
            )?,
            video_url_base: get("VIDEO_URL_BASE").unwrap_or(defaults.video_url_base),
        };

        if config.sample_rate == 0 {
            return Err(invalid("SAMPLE_RATE", "0", "must be greater than 0"));
        }
        if config.channels == 0 {
            return Err(invalid("CHANNELS", "0", "must be greater than 0"));
        }
        if config.max_output_secs == 0 {
            return Err(invalid("MAX_OUTPUT_DURATION", "0", "must be greater than 0"));
        }
        if config.artifact_file_name.contains(['/', '\\']) {
            let value = config.artifact_file_name.clone();
            return Err(invalid("ARTIFACT_NAME", &value, "must be a bare file name"));
        }

        config.temp_dir = absolutize(base_dir, config.temp_dir);
        config.output_dir = absolutize(base_dir, config.output_dir);
        Ok(config)
    }

    /// Adresse d'écoute `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn absolutize(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: format!("{ENV_PREFIX}{name}"),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|e| invalid(name, &value, &e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SplicerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), v.to_string()))
            .collect();
        SplicerConfig::from_lookup(|key| map.get(key).cloned(), Path::new("/srv/splicer"))
    }

    #[test]
    fn defaults_resolve_against_base_dir() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.temp_dir, PathBuf::from("/srv/splicer/temp"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/splicer/output"));
        assert_eq!(config.artifact_file_name, "combined_audio.m4a");
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert!(config.ffmpeg_path.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("PORT", "8080"),
            ("TEMP_DIR", "/var/tmp/splice"),
            ("FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
            ("CHANNELS", "1"),
            ("MAX_SPLICE_OFFSET", "10"),
            ("MAX_OUTPUT_DURATION", "900"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.temp_dir, PathBuf::from("/var/tmp/splice"));
        assert_eq!(
            config.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.channels, 1);
        assert_eq!(config.max_splice_offset_secs, 10);
        assert_eq!(config.max_output_secs, 900);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("PORT", "  "), ("HOST", "")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("AUDIO_SPLICER_PORT"));

        let err = load(&[("SAMPLE_RATE", "0")]).unwrap_err();
        assert!(err.to_string().contains("AUDIO_SPLICER_SAMPLE_RATE"));

        let err = load(&[("MAX_OUTPUT_DURATION", "0")]).unwrap_err();
        assert!(err.to_string().contains("AUDIO_SPLICER_MAX_OUTPUT_DURATION"));

        let err = load(&[("ARTIFACT_NAME", "../x.m4a")]).unwrap_err();
        assert!(err.to_string().contains("AUDIO_SPLICER_ARTIFACT_NAME"));
    }
}

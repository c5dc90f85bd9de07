use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::AudioError;
use crate::utils::process::{configure_command_no_window, exit_code, sanitize_cmd_error};

/// Audio PCM signé 16 bits entrelacé, gardé en mémoire pendant le splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
}

impl AudioSegment {
    /// Construit un segment à partir d'échantillons entrelacés.
    ///
    /// Les échantillons en trop (trame incomplète) sont ignorés.
    pub fn from_samples(sample_rate: u32, channels: u16, mut samples: Vec<i16>) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Décode des octets `s16le` bruts tels que produits par ffmpeg.
    pub fn from_s16le_bytes(sample_rate: u32, channels: u16, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::from_samples(sample_rate, channels, samples)
    }

    /// Silence (échantillons nuls) de la durée donnée.
    #[cfg(test)]
    pub fn silent(duration: Duration, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let frames = frames_for(duration, sample_rate);
        Self {
            sample_rate,
            channels,
            samples: vec![0; frames * channels as usize],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[cfg(test)]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Ajoute `other` à la fin du segment. Les deux formats doivent être identiques.
    pub fn append(&mut self, other: &AudioSegment) -> Result<(), AudioError> {
        if self.sample_rate != other.sample_rate || self.channels != other.channels {
            return Err(AudioError::FormatMismatch {
                expected: (self.sample_rate, self.channels),
                found: (other.sample_rate, other.channels),
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Ajoute un silence de la durée donnée, au format du segment.
    pub fn append_silence(&mut self, duration: Duration) {
        let frames = frames_for(duration, self.sample_rate);
        let new_len = self.samples.len() + frames * self.channels as usize;
        self.samples.resize(new_len, 0);
    }

    /// Écrit les échantillons en `s16le`, par blocs de taille fixe.
    pub fn write_s16le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buffer = Vec::with_capacity(WRITE_CHUNK_SAMPLES * 2);
        for chunk in self.samples.chunks(WRITE_CHUNK_SAMPLES) {
            buffer.clear();
            for sample in chunk {
                buffer.extend_from_slice(&sample.to_le_bytes());
            }
            writer.write_all(&buffer)?;
        }
        writer.flush()
    }
}

const WRITE_CHUNK_SAMPLES: usize = 32 * 1024;

fn frames_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

/// Capacité de décodage/encodage utilisée par le splicer.
pub trait AudioCodec: Send + Sync {
    /// Décode un fichier audio en PCM au format de sortie du codec.
    fn decode(&self, path: &Path) -> Result<AudioSegment, AudioError>;

    /// Encode le segment dans le conteneur de sortie, au chemin donné.
    fn encode(&self, segment: &AudioSegment, output_path: &Path) -> Result<(), AudioError>;
}

/// Codec adossé au binaire ffmpeg: décodage vers `s16le` sur stdout, encodage AAC/m4a depuis stdin.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg_path: String,
    sample_rate: u32,
    channels: u16,
    bitrate: String,
}

impl FfmpegCodec {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        sample_rate: u32,
        channels: u16,
        bitrate: impl Into<String>,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            sample_rate,
            channels,
            bitrate: bitrate.into(),
        }
    }

    /// Répertoire contenant ffmpeg, transmis à yt-dlp via `--ffmpeg-location`.
    pub fn binary_dir(&self) -> Option<PathBuf> {
        Path::new(&self.ffmpeg_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    fn decode_args(&self, path: &Path) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            path.to_string_lossy().to_string(),
            "-vn".into(),
            "-f".into(),
            "s16le".into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ar".into(),
            self.sample_rate.to_string(),
            "-ac".into(),
            self.channels.to_string(),
            "pipe:1".into(),
        ]
    }

    fn encode_args(&self, segment: &AudioSegment, output_path: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "s16le".into(),
            "-ar".into(),
            segment.sample_rate().to_string(),
            "-ac".into(),
            segment.channels().to_string(),
            "-i".into(),
            "pipe:0".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            self.bitrate.clone(),
            // Le chemin peut porter un suffixe `.part`: le muxer m4a est explicite.
            "-f".into(),
            "ipod".into(),
            output_path.to_string_lossy().to_string(),
        ]
    }
}

impl AudioCodec for FfmpegCodec {
    fn decode(&self, path: &Path) -> Result<AudioSegment, AudioError> {
        if !path.exists() {
            return Err(AudioError::SourceMissing(path.to_path_buf()));
        }

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(self.decode_args(path));
        configure_command_no_window(&mut cmd);
        let output = cmd.output().map_err(AudioError::Spawn)?;
        if !output.status.success() {
            return Err(AudioError::ToolFailed {
                code: exit_code(&output.status),
                details: sanitize_cmd_error(&output),
            });
        }

        let segment =
            AudioSegment::from_s16le_bytes(self.sample_rate, self.channels, &output.stdout);
        log::debug!(
            "Decoded {} ({} frames, {:.3}s)",
            path.display(),
            segment.frame_count(),
            segment.duration().as_secs_f64()
        );
        Ok(segment)
    }

    fn encode(&self, segment: &AudioSegment, output_path: &Path) -> Result<(), AudioError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(self.encode_args(segment, output_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        configure_command_no_window(&mut cmd);

        let mut child = cmd.spawn().map_err(AudioError::Spawn)?;
        let stdin = child.stdin.take();

        // stdin est alimenté depuis un thread dédié pendant que stderr est drainé ici.
        let (output, write_result) = std::thread::scope(|scope| {
            let writer = stdin.map(|mut stdin| {
                scope.spawn(move || segment.write_s16le(&mut stdin))
            });
            let output = child.wait_with_output();
            let write_result = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (output, write_result)
        });
        let output = output.map_err(AudioError::Spawn)?;

        if !output.status.success() {
            return Err(AudioError::ToolFailed {
                code: exit_code(&output.status),
                details: sanitize_cmd_error(&output),
            });
        }
        write_result.map_err(AudioError::Spawn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_expected_length() {
        let silence = AudioSegment::silent(Duration::from_secs(2), 8_000, 2);
        assert_eq!(silence.frame_count(), 16_000);
        assert_eq!(silence.samples().len(), 32_000);
        assert!(silence.samples().iter().all(|s| *s == 0));
        assert_eq!(silence.duration(), Duration::from_secs(2));
    }

    #[test]
    fn zero_silence_is_empty() {
        let mut seg = AudioSegment::from_samples(8_000, 1, vec![1, 2, 3]);
        seg.append_silence(Duration::ZERO);
        assert_eq!(seg.samples(), &[1, 2, 3]);
    }

    #[test]
    fn append_concatenates_in_order() {
        let mut a = AudioSegment::from_samples(8_000, 1, vec![1, 1]);
        let b = AudioSegment::from_samples(8_000, 1, vec![2, 2, 2]);
        a.append_silence(Duration::from_millis(1));
        a.append(&b).unwrap();
        assert_eq!(a.samples(), &[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2]);
    }

    #[test]
    fn append_rejects_format_mismatch() {
        let mut a = AudioSegment::from_samples(8_000, 1, vec![1]);
        let b = AudioSegment::from_samples(16_000, 1, vec![2]);
        assert!(matches!(
            a.append(&b),
            Err(AudioError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn s16le_bytes_decode_little_endian_and_drop_partial_frames() {
        // 3 échantillons stéréo: la dernière trame incomplète est ignorée.
        let bytes = [0x01, 0x00, 0xff, 0xff, 0x00, 0x80];
        let seg = AudioSegment::from_s16le_bytes(8_000, 2, &bytes);
        assert_eq!(seg.samples(), &[1, -1]);
        let mut out = Vec::new();
        seg.write_s16le(&mut out).unwrap();
        assert_eq!(out, vec![0x01, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn s16le_writer_spans_multiple_chunks() {
        let samples: Vec<i16> = (0..(WRITE_CHUNK_SAMPLES * 2 + 3))
            .map(|i| (i % 1000) as i16 - 500)
            .collect();
        let seg = AudioSegment::from_samples(8_000, 1, samples.clone());

        let mut out = Vec::new();
        seg.write_s16le(&mut out).unwrap();

        assert_eq!(out.len(), samples.len() * 2);
        let back = AudioSegment::from_s16le_bytes(8_000, 1, &out);
        assert_eq!(back.samples(), samples.as_slice());
    }

    #[cfg(unix)]
    #[test]
    fn encode_drains_stderr_while_feeding_stdin() {
        use std::os::unix::fs::PermissionsExt;

        // Faux ffmpeg: inonde stderr avant de lire stdin.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\nhead -c 262144 /dev/zero | tr '\\0' x >&2\ncat > /dev/null\nexit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let codec = FfmpegCodec::new(script.to_string_lossy(), 8_000, 1, "64k");
        let seg = AudioSegment::silent(Duration::from_secs(30), 8_000, 1);
        let output = dir.path().join("out.m4a");
        // ETXTBSY possible si un autre test fork pendant l'écriture du script.
        let mut result = codec.encode(&seg, &output);
        for _ in 0..5 {
            match &result {
                Err(AudioError::Spawn(e)) if e.raw_os_error() == Some(26) => {
                    std::thread::sleep(Duration::from_millis(50));
                    result = codec.encode(&seg, &output);
                }
                _ => break,
            }
        }
        result.unwrap();
    }

    #[test]
    fn ffmpeg_args_pin_output_format() {
        let codec = FfmpegCodec::new("/opt/ffmpeg/bin/ffmpeg", 44_100, 2, "192k");
        let decode = codec.decode_args(Path::new("/tmp/in.m4a"));
        assert!(decode.windows(2).any(|w| w == ["-ar", "44100"]));
        assert!(decode.windows(2).any(|w| w == ["-ac", "2"]));
        assert_eq!(decode.last().map(String::as_str), Some("pipe:1"));

        let seg = AudioSegment::silent(Duration::from_millis(10), 44_100, 2);
        let encode = codec.encode_args(&seg, Path::new("/tmp/out.m4a.part"));
        assert!(encode.windows(2).any(|w| w == ["-f", "ipod"]));
        assert!(encode.windows(2).any(|w| w == ["-b:a", "192k"]));
        assert_eq!(
            encode.last().map(String::as_str),
            Some("/tmp/out.m4a.part")
        );
        assert_eq!(codec.binary_dir(), Some(PathBuf::from("/opt/ffmpeg/bin")));
    }

    #[test]
    fn bare_binary_name_has_no_dir() {
        let codec = FfmpegCodec::new("ffmpeg", 44_100, 2, "192k");
        assert_eq!(codec.binary_dir(), None);
    }

    #[test]
    fn decode_reports_missing_source() {
        let codec = FfmpegCodec::new("ffmpeg", 44_100, 2, "192k");
        let err = codec
            .decode(Path::new("/definitely/not/here.m4a"))
            .unwrap_err();
        assert!(matches!(err, AudioError::SourceMissing(_)));
    }
}

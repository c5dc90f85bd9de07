use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::binaries;
use crate::commands::AppState;
use crate::config::{ConfigError, SplicerConfig};
use crate::splicer::{ArtifactStore, FfmpegCodec, SpliceLimits, Splicer, YtDlpFetcher};

mod routes;

pub use routes::build_router;

/// Erreur fatale au démarrage du service.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("unable to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("unable to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Initialise le logging: les macros `log` sont redirigées vers `tracing-subscriber`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Résout un binaire externe; à défaut, conserve le nom nu pour une résolution via PATH à l'exécution.
fn resolve_or_fallback(name: &str, configured: Option<&Path>) -> String {
    match binaries::resolve_binary_detailed(name, configured) {
        Ok(path) => {
            log::info!("Using {} at {}", name, path);
            path
        }
        Err(err) => {
            log::warn!(
                "{} could not be resolved ({}); requests will fail until it is installed",
                name,
                err
            );
            configured
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| name.to_string())
        }
    }
}

/// Construit l'état partagé des handlers à partir de la configuration.
pub fn build_state(config: &SplicerConfig) -> AppState {
    let ffmpeg_path = resolve_or_fallback("ffmpeg", config.ffmpeg_path.as_deref());
    let yt_dlp_path = resolve_or_fallback("yt-dlp", config.yt_dlp_path.as_deref());

    let codec = FfmpegCodec::new(
        ffmpeg_path,
        config.sample_rate,
        config.channels,
        config.audio_bitrate.clone(),
    );
    let fetcher = YtDlpFetcher::new(yt_dlp_path, codec.binary_dir(), config.video_url_base.clone());

    AppState {
        splicer: Splicer::new(Arc::new(fetcher), Arc::new(codec)),
        store: Arc::new(ArtifactStore::new(
            config.temp_dir.clone(),
            config.output_dir.clone(),
            config.artifact_file_name.clone(),
        )),
        limits: SpliceLimits {
            max_splice_offset_secs: config.max_splice_offset_secs,
            max_output_secs: config.max_output_secs,
        },
        ffmpeg_override: config.ffmpeg_path.clone(),
        yt_dlp_override: config.yt_dlp_path.clone(),
    }
}

async fn serve(config: SplicerConfig) -> Result<(), StartupError> {
    let state = build_state(&config);
    let router = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    log::info!(
        "Audio splicer listening on {} (work: {}, output: {})",
        addr,
        config.temp_dir.display(),
        config.output_dir.display()
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

/// Charge la configuration, démarre le runtime tokio et sert l'API HTTP jusqu'à l'arrêt.
pub fn run() -> Result<(), StartupError> {
    init_logging();
    let config = SplicerConfig::from_env()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;
    runtime.block_on(serve(config))
}

/// Types et invariants du domaine splice.
pub mod types;

mod artifact;
mod audio;
mod fetch;
mod pipeline;
mod validate;

pub use artifact::ArtifactStore;
pub use audio::FfmpegCodec;
pub use fetch::YtDlpFetcher;
pub use pipeline::Splicer;
pub use validate::{validate_request, SpliceLimits};

#[cfg(test)]
pub(crate) use pipeline::fakes;

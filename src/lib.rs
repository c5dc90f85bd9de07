//! Service HTTP d'assemblage audio: télécharge des extraits de vidéos et les
//! concatène avec des silences configurables.
//!
//! Cette unité reste volontairement mince: elle déclare les modules de domaine
//! puis délègue l'exécution à `app::run()`.

mod app;
mod binaries;
mod commands;
mod config;
mod error;
mod splicer;
mod utils;

pub use app::StartupError;

/// Lance le service HTTP.
pub fn run() -> Result<(), StartupError> {
    app::run()
}

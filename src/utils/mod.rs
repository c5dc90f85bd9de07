/// Utilitaires transverses de sanitisation de noms de fichiers.
pub mod path;
/// Utilitaires transverses de gestion de process externes.
pub mod process;
/// Utilitaires transverses de gestion de répertoires temporaires.
pub mod temp_dir;

/// Decrit une tentative de resolution d'un binaire.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BinaryResolutionAttempt {
    /// Chemin ou nom tente.
    pub candidate: String,
    /// Source de la tentative (configuration, chemin connu, PATH systeme).
    pub source: String,
    /// Resultat de la tentative.
    pub outcome: String,
    /// Detail eventuel en cas d'erreur.
    pub detail: Option<String>,
}

/// Erreur structuree de resolution d'un binaire.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{code}: {details}")]
pub struct BinaryResolveError {
    /// Code d'erreur stable cote application.
    pub code: String,
    /// Message de diagnostic principal.
    pub details: String,
    /// Historique complet des tentatives.
    pub attempts: Vec<BinaryResolutionAttempt>,
}

/// Diagnostic complet d'un binaire, expose par l'endpoint de sante.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BinaryDiagnostic {
    /// Nom logique du binaire demande.
    pub name: String,
    /// Chemin resolu si succes.
    pub resolved_path: Option<String>,
    /// Code d'erreur en cas d'echec.
    pub error_code: Option<String>,
    /// Detail d'erreur en cas d'echec.
    pub error_details: Option<String>,
    /// Liste des tentatives effectuees.
    pub attempts: Vec<BinaryResolutionAttempt>,
    /// Premiere ligne de version si executable.
    pub version_output: Option<String>,
}

impl BinaryDiagnostic {
    pub fn is_resolved(&self) -> bool {
        self.resolved_path.is_some()
    }
}

use axum::response::Html;

use crate::error::ApiError;

/// `GET /`: texte d'accueil statique.
pub async fn home() -> Html<&'static str> {
    Html("<h1>Welcome to Audio Splicer! POST a splice request to /splice-videos to get started.</h1>")
}

/// Route inconnue.
pub async fn not_found() -> ApiError {
    ApiError::NotFound(
        "The requested URL was not found on the server. If you entered the URL manually please check your spelling and try again.".to_string(),
    )
}

/// Méthode non supportée sur une route connue.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

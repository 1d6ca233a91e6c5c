//! Catch-all for unmatched routes.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;

const DEFAULT_NOT_FOUND_PAGE: &str = "<!DOCTYPE html>
<html>
<head><title>404 Not Found</title></head>
<body>
<h1>404 Not Found</h1>
<p>The page you are looking for does not exist.</p>
</body>
</html>
";

/// Fallback: 404 with the configured HTML page, or a built-in one.
pub async fn not_found(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let page = match &state.config.server.not_found_page {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read not-found page");
                DEFAULT_NOT_FOUND_PAGE.to_string()
            }
        },
        None => DEFAULT_NOT_FOUND_PAGE.to_string(),
    };

    (StatusCode::NOT_FOUND, Html(page))
}

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

/// Serve a built chat client from `dir`.
///
/// API routes already on the router win; any other path that is not a file falls back to
/// `index.html` so client-side routing keeps working.
pub fn attach(router: Router, dir: &Path) -> Router {
    let index = ServeFile::new(dir.join("index.html"));
    router.fallback_service(ServeDir::new(dir).fallback(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_text(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_static_files_and_index_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>chat</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();

        let api = Router::new().route("/health", get(|| async { "api" }));
        let router = attach(api, dir.path());

        assert_eq!(
            get_text(router.clone(), "/app.js").await,
            (StatusCode::OK, "console.log('hi')".to_string())
        );
        assert_eq!(
            get_text(router.clone(), "/qwen/history").await,
            (StatusCode::OK, "<html>chat</html>".to_string())
        );
        assert_eq!(
            get_text(router, "/health").await,
            (StatusCode::OK, "api".to_string())
        );
    }
}

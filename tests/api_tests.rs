//! # API Tests Module
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`.


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use image::DynamicImage;
    use ocr_binarizer::api::{create_router, AppState};
    use ocr_binarizer::instance_manager::OcrInstanceManager;
    use ocr_binarizer::ocr_config::OcrConfig;
    use ocr_binarizer::ocr_engine::OcrEngine;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    const MAX_BODY: usize = 1024 * 1024;

    struct TestApp {
        router: Router,
        manager: Arc<OcrInstanceManager>,
        _static_dir: TempDir,
    }

    fn test_app(engine: impl OcrEngine + 'static) -> TestApp {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            static_dir.path().join("index.html"),
            "<html><body>binarizer</body></html>",
        )
        .unwrap();

        let manager = manager_with(engine);
        let state = AppState::new(Arc::clone(&manager), OcrConfig::default(), CancellationToken::new());
        TestApp {
            router: create_router(state, static_dir.path(), MAX_BODY),
            manager,
            _static_dir: static_dir,
        }
    }

    fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.into()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn preprocess_body(image: &DynamicImage, threshold: Option<i64>) -> String {
        let mut body = serde_json::json!({ "imageData": png_data_uri(image) });
        if let Some(t) = threshold {
            body["threshold"] = serde_json::json!(t);
        }
        body.to_string()
    }

    #[tokio::test]
    async fn test_preprocess_returns_binary_png() {
        let app = test_app(EchoEngine::default());

        let response = app
            .router
            .oneshot(post_json(
                "/api/preprocess",
                preprocess_body(&gray_2x2([100, 150, 128, 200]), Some(128)),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let processed = json["processedImage"].as_str().unwrap();
        let (prefix, output) = decode_data_uri(processed);
        assert_eq!(prefix, "data:image/png;base64");
        assert_eq!(output.to_luma8().into_raw(), vec![0, 255, 0, 255]);
    }

    #[tokio::test]
    async fn test_preprocess_defaults_threshold_to_128() {
        let app = test_app(EchoEngine::default());

        let response = app
            .router
            .oneshot(post_json(
                "/api/preprocess",
                preprocess_body(&gray_2x2([128, 129, 0, 255]), None),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let (_, output) = decode_data_uri(json["processedImage"].as_str().unwrap());
        assert_eq!(output.to_luma8().into_raw(), vec![0, 255, 0, 255]);
    }

    #[tokio::test]
    async fn test_preprocess_rejects_out_of_range_threshold() {
        let app = test_app(EchoEngine::default());

        let response = app
            .router
            .oneshot(post_json(
                "/api/preprocess",
                preprocess_body(&gray_2x2([0; 4]), Some(300)),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Invalid request: "));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        for uri in ["/api/preprocess", "/api/recognize"] {
            let app = test_app(EchoEngine::default());
            let response = app.router.oneshot(post_json(uri, "{not json")).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let json = body_json(response).await;
            assert!(json["error"].as_str().unwrap().starts_with("Invalid request: "));
        }
    }

    #[tokio::test]
    async fn test_undecodable_image_is_processing_error() {
        let app = test_app(EchoEngine::default());

        let response = app
            .router
            .oneshot(post_json(
                "/api/preprocess",
                r#"{"imageData":"data:image/png;base64,@@@@"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Processing error: "));
    }

    #[tokio::test]
    async fn test_recognize_returns_engine_text() {
        let app = test_app(EchoEngine::default());
        let body = serde_json::json!({ "imageData": format!("data:image/png;base64,{}", to_base64(b"ramen")) });

        let response = app
            .router
            .oneshot(post_json("/api/recognize", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["text"], "ramen");
    }

    #[tokio::test]
    async fn test_recognize_engine_failure_is_server_error() {
        let app = test_app(RejectingEngine);
        let body = serde_json::json!({ "imageData": to_base64(b"junk") });

        let response = app
            .router
            .oneshot(post_json("/api/recognize", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Recognition error: "));
    }

    #[tokio::test]
    async fn test_recognize_after_release_is_unavailable() {
        let app = test_app(EchoEngine::default());
        app.manager.release().unwrap();
        let body = serde_json::json!({ "imageData": to_base64(b"late") });

        let response = app
            .router
            .oneshot(post_json("/api/recognize", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_non_post_is_method_not_allowed() {
        for uri in ["/api/preprocess", "/api/recognize"] {
            let app = test_app(EchoEngine::default());
            let response = app
                .router
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = test_app(EchoEngine::default());
        let body = format!(r#"{{"imageData":"{}"}}"#, "A".repeat(MAX_BODY + 16));

        let response = app
            .router
            .oneshot(post_json("/api/recognize", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Invalid request: "));
    }

    fn wrap_lines(base64: &str) -> String {
        base64
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    #[tokio::test]
    async fn test_line_wrapped_base64_is_accepted_by_preprocess() {
        let app = test_app(EchoEngine::default());
        let bytes = encode(&gradient_rgb(24, 24), image::ImageFormat::Png);
        let wrapped = wrap_lines(&to_base64(&bytes));
        assert!(wrapped.contains('\n'));
        let body = serde_json::json!({ "imageData": format!("data:image/png;base64,{}", wrapped) });

        let response = app
            .router
            .oneshot(post_json("/api/preprocess", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let (prefix, output) = decode_data_uri(json["processedImage"].as_str().unwrap());
        assert_eq!(prefix, "data:image/png;base64");
        assert_eq!((output.width(), output.height()), (24, 24));
    }

    #[tokio::test]
    async fn test_line_wrapped_base64_is_accepted_by_recognize() {
        let app = test_app(EchoEngine::default());
        let text = "いただきます ".repeat(12);
        let wrapped = wrap_lines(&to_base64(text.as_bytes()));
        assert!(wrapped.contains('\n'));
        let body = serde_json::json!({ "imageData": wrapped });

        let response = app
            .router
            .oneshot(post_json("/api/recognize", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["text"], text.as_str());
    }

    #[tokio::test]
    async fn test_static_files_are_served_at_root() {
        let app = test_app(EchoEngine::default());

        let response = app
            .router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("binarizer"));
    }

    #[tokio::test]
    async fn test_unknown_static_file_is_not_found() {
        let app = test_app(EchoEngine::default());

        let response = app
            .router
            .oneshot(Request::builder().uri("/missing.css").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

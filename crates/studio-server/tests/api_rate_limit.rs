mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn generation_endpoints_are_rate_limited_per_ip() {
    let (imagen, _) = mock_imagen(StatusCode::OK, png_prediction()).await;
    let test = test_app_with(
        Services {
            imagen: Some(imagen),
            ..Services::default()
        },
        |config| config.rate_limit.generate_per_minute = 2,
    );

    let body = json!({
        "name": "Amara",
        "skinTone": "medium",
        "hairStyle": "braids",
        "clothing": "professional_suit",
        "personality": "warm_friendly",
        "background": "office"
    });

    for i in 1..=3 {
        let response = test
            .router
            .clone()
            .oneshot(json_request("/avatar/generate", body.clone()))
            .await
            .unwrap();

        if i <= 2 {
            assert_eq!(response.status(), StatusCode::OK, "request {} should succeed", i);
        } else {
            assert_eq!(
                response.status(),
                StatusCode::TOO_MANY_REQUESTS,
                "request {} should be rate limited",
                i
            );
            assert!(response.headers().contains_key("retry-after"));
        }
    }

    // Catalog endpoints are not limited.
    for _ in 0..5 {
        let response = test
            .router
            .clone()
            .oneshot(get_request("/avatar/configurations"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

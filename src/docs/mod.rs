//! Interactive documentation endpoints
//!
//! - `GET {path}` serves a Swagger UI page
//! - `GET {path}/openapi.json` serves the assembled document

use crate::binder::join_path;
use crate::error::Result;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::openapi::OpenApi;

const SWAGGER_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/swagger-ui-dist@5";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    /// Where the UI is mounted, e.g. `/docs`.
    pub path: String,
    pub title: String,
    /// Base URL for the Swagger UI assets.
    pub swagger_cdn_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            path: "/docs".to_string(),
            title: "API Documentation".to_string(),
            swagger_cdn_url: SWAGGER_CDN_URL.to_string(),
        }
    }
}

impl DocsConfig {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: join_path(&[path.as_ref()]),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn swagger_cdn_url(mut self, url: impl Into<String>) -> Self {
        self.swagger_cdn_url = url.into();
        self
    }

    /// Route serving the JSON document.
    pub fn spec_path(&self) -> String {
        join_path(&[&self.path, "openapi.json"])
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Swagger UI page loading its document from `spec_url`.
pub fn swagger_ui_html(config: &DocsConfig, spec_url: &str) -> String {
    let title = html_escape(&config.title);
    let cdn = &config.swagger_cdn_url;
    let spec_url = html_escape(spec_url);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="icon" type="image/png" href="{cdn}/favicon-32x32.png" sizes="32x32" />
    <link rel="stylesheet" type="text/css" href="{cdn}/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="{cdn}/swagger-ui-bundle.js"></script>
    <script src="{cdn}/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: "{spec_url}",
                dom_id: "#swagger-ui",
                deepLinking: true,
                presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                layout: "StandaloneLayout"
            }});
        }};
    </script>
</body>
</html>"##
    )
}

/// Router serving the UI and the document.
///
/// The document is serialized once, here.
pub fn router(config: &DocsConfig, doc: &OpenApi) -> Result<Router> {
    let spec = Arc::new(serde_json::to_value(doc)?);
    let spec_path = config.spec_path();
    let page = Html(swagger_ui_html(config, &spec_path));

    tracing::debug!(ui = %config.path, spec = %spec_path, "Mounting documentation");

    Ok(Router::new()
        .route(&config.path, get(move || async move { page }))
        .route(
            &spec_path,
            get(move || {
                let spec = Arc::clone(&spec);
                async move { Json(spec.as_ref().clone()) }
            }),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;
    use utoipa::openapi::{InfoBuilder, OpenApiBuilder};

    fn doc() -> OpenApi {
        OpenApiBuilder::new()
            .info(InfoBuilder::new().title("Pets").version("1.0.0").build())
            .build()
    }

    #[test]
    fn test_spec_path_is_under_docs_path() {
        assert_eq!(DocsConfig::new("reference/").spec_path(), "/reference/openapi.json");
        assert_eq!(DocsConfig::default().spec_path(), "/docs/openapi.json");
    }

    #[test]
    fn test_title_is_escaped() {
        let html = swagger_ui_html(&DocsConfig::default().title("<Pets & Co>"), "/docs/openapi.json");
        assert!(html.contains("<title>&lt;Pets &amp; Co&gt;</title>"));
        assert!(html.contains(r#"url: "/docs/openapi.json""#));
        assert!(html.contains(SWAGGER_CDN_URL));
        assert!(html.contains(r##"dom_id: "#swagger-ui""##));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn test_serves_ui_and_document() {
        let app = router(&DocsConfig::default(), &doc()).unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let response = app
            .oneshot(Request::get("/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["info"]["title"], "Pets");
    }
}

//! Application bootstrap
//!
//! Registers controllers, assembles the OpenAPI document and serves both.

use super::shutdown_signal;
use crate::binder::RouteTable;
use crate::config::ServerConfig;
use crate::controller::Controller;
use crate::docs::{self, DocsConfig};
use crate::error::{ApiError, Result, handle_panic};
use crate::metadata::HttpMethod;
use crate::openapi::{ApiDocument, DocumentInfo, write_spec};
use axum::Router;
use axum::http::{Method, StatusCode, Uri};
use std::any::type_name;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// A set of bound controllers and the document describing them.
///
/// # Example
///
/// ```rust,ignore
/// use oasbind::Application;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     Application::builder()
///         .title("Pet Store")
///         .controller(PetController::new(store))
///         .build()?
///         .listen()
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Application {
    config: ServerConfig,
    info: DocumentInfo,
    docs: DocsConfig,
    routes: RouteTable,
    document: ApiDocument,
}

impl Application {
    pub fn new(config: ServerConfig, info: DocumentInfo) -> Self {
        let docs = DocsConfig::new(&config.docs_path).title(format!("{} - Docs", info.title));
        Self {
            config,
            info,
            docs,
            routes: RouteTable::new(),
            document: ApiDocument::new(),
        }
    }

    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// Bind the routes of `controller` and add it to the document.
    pub fn register<C: Controller>(&mut self, controller: C) -> Result<&mut Self> {
        self.register_shared(Arc::new(controller))
    }

    pub fn register_shared<C: Controller>(&mut self, controller: Arc<C>) -> Result<&mut Self> {
        let bound = self.routes.bind(controller, &self.config.route_prefix())?;
        self.document.add_controller::<C>(&bound);

        tracing::info!(
            controller = type_name::<C>(),
            base_path = C::base_path(),
            operations = bound.len(),
            "Registered controller"
        );
        Ok(self)
    }

    /// The assembled OpenAPI document.
    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        self.document.build(&self.info, &self.config.public_url())
    }

    /// Controller routes plus the documentation routes, with the catch-all
    /// error handling applied.
    pub fn router(&self) -> Result<Router> {
        self.router_for(&self.openapi())
    }

    fn router_for(&self, doc: &utoipa::openapi::OpenApi) -> Result<Router> {
        self.routes.check(HttpMethod::Get, &self.docs.path)?;
        self.routes.check(HttpMethod::Get, &self.docs.spec_path())?;

        Ok(self
            .routes
            .router()
            .merge(docs::router(&self.docs, doc)?)
            .fallback(fallback)
            .method_not_allowed_fallback(method_not_allowed)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CatchPanicLayer::custom(handle_panic)),
            ))
    }

    /// Write the document to the configured file, then serve until a
    /// shutdown signal arrives.
    pub async fn listen(self) -> Result<()> {
        let doc = self.openapi();
        write_spec(&doc, &self.config.spec_file)?;

        let router = self.router_for(&doc)?;
        let listener = TcpListener::bind(self.config.bind_addr()).await?;

        tracing::info!(addr = %listener.local_addr()?, "Server listening");
        tracing::info!("API available at {}", self.config.public_url());
        tracing::info!("Documentation available at {}", self.config.docs_url());

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn fallback(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {} {}", method, uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method {} not allowed for {}", method, uri.path()),
    )
}

type Registration = Box<dyn FnOnce(&mut Application) -> Result<()> + Send>;

/// Builder for [`Application`].
///
/// Without an explicit [`ServerConfig`], `build` reads one from the
/// environment.
#[derive(Default)]
pub struct ApplicationBuilder {
    config: Option<ServerConfig>,
    info: DocumentInfo,
    registrations: Vec<Registration>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.info.title = title.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.info.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    pub fn controller<C: Controller>(self, controller: C) -> Self {
        self.shared_controller(Arc::new(controller))
    }

    pub fn shared_controller<C: Controller>(mut self, controller: Arc<C>) -> Self {
        self.registrations.push(Box::new(move |app: &mut Application| {
            app.register_shared(controller).map(|_| ())
        }));
        self
    }

    /// Create the application and register every controller in order.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or clashing routes.
    pub fn build(self) -> Result<Application> {
        let config = match self.config {
            Some(config) => config,
            None => ServerConfig::from_env()?,
        };

        tracing::info!(title = %self.info.title, prefix = %config.route_prefix(), "Building application");

        let mut app = Application::new(config, self.info);
        for register in self.registrations {
            register(&mut app)?;
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerInfo, Operation};
    use crate::error::BinderError;
    use crate::marshal::Arguments;
    use crate::metadata::OperationSpec;
    use crate::reply::Reply;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    struct PingController;

    impl ControllerInfo for PingController {
        fn base_path() -> &'static str {
            "/ping"
        }

        fn tag() -> &'static str {
            "Ping"
        }
    }

    impl Controller for PingController {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::new(
                    OperationSpec::new(HttpMethod::Get, "/", "ping"),
                    |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::new("pong")) },
                ),
                Operation::new(
                    OperationSpec::new(HttpMethod::Get, "/panic", "panic"),
                    |_: Arc<Self>, _: Arguments| async move {
                        if true {
                            panic!("handler exploded");
                        }
                        Ok::<_, ApiError>(Reply::empty())
                    },
                ),
            ]
        }
    }

    struct DocsClashController;

    impl ControllerInfo for DocsClashController {
        fn base_path() -> &'static str {
            "/docs"
        }

        fn tag() -> &'static str {
            "Docs"
        }
    }

    impl Controller for DocsClashController {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::new(
                OperationSpec::new(HttpMethod::Get, "/", "docs"),
                |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::empty()) },
            )]
        }
    }

    fn config() -> ServerConfig {
        ServerConfig {
            path: "/".to_string(),
            version: String::new(),
            ..ServerConfig::default()
        }
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_routes_are_served_under_prefix() {
        let app = Application::builder()
            .config(ServerConfig::default())
            .controller(PingController)
            .build()
            .unwrap();

        let (status, body) = call(app.router().unwrap(), "/api/v1/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_body() {
        let app = Application::builder().config(config()).build().unwrap();

        let (status, body) = call(app.router().unwrap(), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No route for GET /missing");
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_panics_become_internal_errors() {
        let app = Application::builder()
            .config(config())
            .controller(PingController)
            .build()
            .unwrap();

        let (status, body) = call(app.router().unwrap(), "/ping/panic").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[test]
    fn test_duplicate_registration_fails_build() {
        let result = Application::builder()
            .config(config())
            .controller(PingController)
            .controller(PingController)
            .build();
        assert!(matches!(result, Err(BinderError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_controller_clashing_with_docs_is_rejected() {
        let app = Application::builder()
            .config(config())
            .controller(DocsClashController)
            .build()
            .unwrap();
        assert!(app.router().is_err());
    }

    #[test]
    fn test_document_uses_builder_info() {
        let app = Application::builder()
            .config(ServerConfig::default())
            .title("Ping")
            .version("0.3.0")
            .description("Ping service")
            .controller(PingController)
            .build()
            .unwrap();

        let doc = serde_json::to_value(app.openapi()).unwrap();
        assert_eq!(doc["info"]["title"], "Ping");
        assert_eq!(doc["info"]["version"], "0.3.0");
        assert_eq!(doc["servers"][0]["url"], "http://localhost:3000/api/v1");
        assert!(doc["paths"].get("/ping").is_some());
        assert!(doc["paths"].get("/ping/panic").is_some());
    }
}

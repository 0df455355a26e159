//! Route binding
//!
//! Walks a controller's declared operations and registers one axum route per
//! operation. The route handler gathers the raw request values, marshals them
//! into arguments, invokes the controller method and maps the returned value
//! to a status code.

mod path;

pub use path::join_path;
pub(crate) use path::route_shape;
use path::{path_params, validate_route};

use crate::controller::{Controller, Handler};
use crate::error::{ApiError, BinderError, Result};
use crate::marshal::{RequestSources, marshal};
use crate::metadata::{HttpMethod, OperationSpec, ParameterLocation};
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection, RawPathParamsRejection};
use axum::extract::{Query, RawPathParams};
use axum::handler::Handler as AxumHandler;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, on};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type PathExtract = std::result::Result<RawPathParams, RawPathParamsRejection>;
type QueryExtract = std::result::Result<Query<Vec<(String, String)>>, QueryRejection>;
type BodyExtract = std::result::Result<Bytes, BytesRejection>;

/// An operation after binding: its spec plus where it was mounted.
#[derive(Debug, Clone)]
pub struct BoundOperation {
    pub spec: OperationSpec,
    /// Full route, including the application prefix.
    pub route: String,
    /// Path relative to the server URL, as it appears in the document.
    pub document_path: String,
}

struct RouteEntry {
    path: String,
    methods: BTreeSet<HttpMethod>,
    router: Option<MethodRouter>,
}

/// All routes bound so far, keyed by route shape.
#[derive(Default)]
pub struct RouteTable {
    routes: BTreeMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct route paths.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register every operation of `C` under `prefix`.
    ///
    /// Nothing is registered if any operation clashes with an existing route
    /// or with another operation of the same controller.
    pub fn bind<C: Controller>(
        &mut self,
        controller: Arc<C>,
        prefix: &str,
    ) -> Result<Vec<BoundOperation>> {
        let mut pending: Vec<(BoundOperation, Handler<C>)> = Vec::new();

        for operation in C::operations() {
            let (spec, handler) = operation.into_parts();
            let document_path = join_path(&[C::base_path(), &spec.path]);
            let route = join_path(&[prefix, &document_path]);

            validate_operation(&spec, &route)?;
            self.check(spec.method, &route)?;
            for (other, _) in &pending {
                check_pair(spec.method, &route, other.spec.method, &other.route)?;
            }

            pending.push((
                BoundOperation {
                    spec,
                    route,
                    document_path,
                },
                handler,
            ));
        }

        let mut bound = Vec::with_capacity(pending.len());
        for (operation, handler) in pending {
            tracing::debug!(
                method = %operation.spec.method,
                route = %operation.route,
                operation = %operation.spec.operation_id,
                "Binding route"
            );

            let spec = Arc::new(operation.spec.clone());
            let controller = Arc::clone(&controller);
            let route_handler = move |path: PathExtract,
                                      query: QueryExtract,
                                      headers: HeaderMap,
                                      body: BodyExtract| {
                let spec = Arc::clone(&spec);
                let handler = Arc::clone(&handler);
                let controller = Arc::clone(&controller);
                async move {
                    let sources = match collect_sources(&spec, path, query, headers, body) {
                        Ok(sources) => sources,
                        Err(err) => return err.into_response(),
                    };
                    dispatch(&spec, &handler, controller, sources).await
                }
            };

            self.insert(operation.spec.method, &operation.route, route_handler);
            bound.push(operation);
        }

        Ok(bound)
    }

    /// The bound routes as one router.
    pub fn router(&self) -> Router {
        self.routes
            .values()
            .fold(Router::new(), |router, entry| match &entry.router {
                Some(method_router) => router.route(&entry.path, method_router.clone()),
                None => router,
            })
    }

    pub(crate) fn check(&self, method: HttpMethod, route: &str) -> Result<()> {
        match self.routes.get(&route_shape(route)) {
            Some(entry) if entry.path != route => Err(BinderError::ConflictingRoute {
                path: route.to_string(),
                existing: entry.path.clone(),
            }),
            Some(entry) if entry.methods.contains(&method) => Err(BinderError::DuplicateRoute {
                method: method.to_string(),
                path: route.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn insert<H, T>(&mut self, method: HttpMethod, route: &str, handler: H)
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        let entry = self
            .routes
            .entry(route_shape(route))
            .or_insert_with(|| RouteEntry {
                path: route.to_string(),
                methods: BTreeSet::new(),
                router: None,
            });
        entry.methods.insert(method);

        let filter = method.method_filter();
        entry.router = Some(match entry.router.take() {
            Some(method_router) => method_router.on(filter, handler),
            None => on(filter, handler),
        });
    }
}

fn validate_operation(spec: &OperationSpec, route: &str) -> Result<()> {
    let invalid = |message: String| BinderError::InvalidRoute {
        path: route.to_string(),
        message,
    };

    validate_route(route).map_err(invalid)?;

    let captures = path_params(route);
    for param in spec.parameters() {
        if param.location == ParameterLocation::Path && !captures.contains(&param.name.as_str()) {
            return Err(invalid(format!(
                "operation `{}` reads path parameter `{}`, which the route does not capture",
                spec.operation_id, param.name
            )));
        }
    }
    Ok(())
}

fn check_pair(method: HttpMethod, route: &str, other_method: HttpMethod, other: &str) -> Result<()> {
    if route_shape(route) != route_shape(other) {
        Ok(())
    } else if route != other {
        Err(BinderError::ConflictingRoute {
            path: route.to_string(),
            existing: other.to_string(),
        })
    } else if method == other_method {
        Err(BinderError::DuplicateRoute {
            method: method.to_string(),
            path: route.to_string(),
        })
    } else {
        Ok(())
    }
}

fn collect_sources(
    spec: &OperationSpec,
    path: PathExtract,
    query: QueryExtract,
    headers: HeaderMap,
    body: BodyExtract,
) -> std::result::Result<RequestSources, ApiError> {
    let path_params: Vec<(String, String)> = match path {
        Ok(params) => params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        Err(_)
            if !spec
                .parameters()
                .any(|p| p.location == ParameterLocation::Path) =>
        {
            Vec::new()
        }
        Err(rejection) => {
            return Err(ApiError::bad_request("Invalid path parameters").with_error(json!({
                "location": "path",
                "message": rejection.body_text(),
            })));
        }
    };

    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request("Invalid query string").with_error(json!({
            "location": "query",
            "message": rejection.body_text(),
        }))
    })?;

    let body = body.map_err(|rejection| {
        ApiError::new(rejection.status(), "Invalid request body").with_error(json!({
            "location": "body",
            "message": rejection.body_text(),
        }))
    })?;

    Ok(RequestSources::new()
        .with_path(path_params)
        .with_query(query)
        .with_headers(headers)
        .with_body(body))
}

async fn dispatch<C>(
    spec: &OperationSpec,
    handler: &Handler<C>,
    controller: Arc<C>,
    sources: RequestSources,
) -> Response {
    let args = match marshal(spec, &sources) {
        Ok(args) => args,
        Err(err) => return err.into_response(),
    };

    match handler(controller, args).await {
        Ok(reply) => {
            let status = spec.status_for(reply.type_id());
            tracing::debug!(
                operation = %spec.operation_id,
                reply = reply.type_name(),
                status = status.as_u16(),
                "Mapped reply to status"
            );
            reply.into_response(status)
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerInfo, Operation};
    use crate::marshal::Arguments;
    use crate::metadata::{ArgumentSpec, ParameterSpec, ResponseMapping, ScalarType};
    use crate::reply::Reply;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde::Serialize;
    use serde_json::Value;
    use tower::ServiceExt;
    use utoipa::ToSchema;

    #[derive(Serialize, ToSchema)]
    struct Echo {
        id: i64,
    }

    #[derive(Serialize, ToSchema)]
    struct Rejected {
        id: i64,
    }

    struct EchoController;

    impl ControllerInfo for EchoController {
        fn base_path() -> &'static str {
            "/echo"
        }

        fn tag() -> &'static str {
            "echo"
        }
    }

    impl Controller for EchoController {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::new(
                    OperationSpec::new(HttpMethod::Get, "/{id}", "get_echo")
                        .argument(ArgumentSpec::parameter(ParameterSpec::new(
                            "id",
                            ParameterLocation::Path,
                            ScalarType::Integer,
                        )))
                        .response(ResponseMapping::new::<Echo>(200))
                        .response(ResponseMapping::new::<Rejected>(422)),
                    |_: Arc<Self>, mut args: Arguments| async move {
                        let id: i64 = args.take(0)?;
                        if id < 0 {
                            Ok::<_, ApiError>(Reply::new(Rejected { id }))
                        } else {
                            Ok(Reply::new(Echo { id }))
                        }
                    },
                ),
                Operation::new(
                    OperationSpec::new(HttpMethod::Delete, "/{id}", "delete_echo")
                        .argument(ArgumentSpec::parameter(ParameterSpec::new(
                            "id",
                            ParameterLocation::Path,
                            ScalarType::Integer,
                        ))),
                    |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::empty()) },
                ),
            ]
        }
    }

    struct ClashingController;

    impl ControllerInfo for ClashingController {
        fn base_path() -> &'static str {
            "/echo"
        }

        fn tag() -> &'static str {
            "clash"
        }
    }

    impl Controller for ClashingController {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::new(
                OperationSpec::new(HttpMethod::Get, "/{key}", "get_clash"),
                |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::empty()) },
            )]
        }
    }

    struct LegacyController;

    impl ControllerInfo for LegacyController {
        fn base_path() -> &'static str {
            "/legacy"
        }

        fn tag() -> &'static str {
            "legacy"
        }
    }

    impl Controller for LegacyController {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::new(
                    OperationSpec::new(HttpMethod::Get, "/", "list_legacy"),
                    |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::empty()) },
                ),
                Operation::new(
                    OperationSpec::new(HttpMethod::Get, "/:id", "get_legacy"),
                    |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::empty()) },
                ),
            ]
        }
    }

    struct MisnamedController;

    impl ControllerInfo for MisnamedController {
        fn base_path() -> &'static str {
            "/owners/{owner_id}"
        }

        fn tag() -> &'static str {
            "owners"
        }
    }

    impl Controller for MisnamedController {
        fn operations() -> Vec<Operation<Self>> {
            let param = |name: &str| {
                ArgumentSpec::parameter(ParameterSpec::new(
                    name,
                    ParameterLocation::Path,
                    ScalarType::Integer,
                ))
            };
            vec![Operation::new(
                OperationSpec::new(HttpMethod::Get, "/pets/{pet_id}", "get_owner_pet")
                    .argument(param("owner_id"))
                    .argument(param("id")),
                |_: Arc<Self>, _: Arguments| async move { Ok::<_, ApiError>(Reply::empty()) },
            )]
        }
    }

    async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, Option<Value>) {
        let response = router
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_bound_routes_dispatch_and_map_status() {
        let mut table = RouteTable::new();
        let bound = table.bind(Arc::new(EchoController), "/api/v1").unwrap();

        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].route, "/api/v1/echo/{id}");
        assert_eq!(bound[0].document_path, "/echo/{id}");
        assert_eq!(table.len(), 1);

        let (status, body) = send(table.router(), "GET", "/api/v1/echo/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["id"], 7);

        let (status, _) = send(table.router(), "GET", "/api/v1/echo/-1").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(table.router(), "DELETE", "/api/v1/echo/3").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_coercion_failure_is_bad_request() {
        let mut table = RouteTable::new();
        table.bind(Arc::new(EchoController), "/").unwrap();

        let (status, body) = send(table.router(), "GET", "/echo/seven").await;
        let body = body.unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request validation failed");
        assert_eq!(body["errors"][0]["name"], "id");
        assert_eq!(body["errors"][0]["location"], "path");
    }

    #[test]
    fn test_duplicate_controller_is_rejected() {
        let mut table = RouteTable::new();
        table.bind(Arc::new(EchoController), "/").unwrap();

        let err = table.bind(Arc::new(EchoController), "/").unwrap_err();
        assert!(matches!(err, BinderError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_conflicting_parameter_names_are_rejected() {
        let mut table = RouteTable::new();
        table.bind(Arc::new(EchoController), "/").unwrap();

        let err = table.bind(Arc::new(ClashingController), "/").unwrap_err();
        assert!(matches!(err, BinderError::ConflictingRoute { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_invalid_route_syntax_is_rejected() {
        let mut table = RouteTable::new();

        let err = table.bind(Arc::new(LegacyController), "/api").unwrap_err();
        match err {
            BinderError::InvalidRoute { path, message } => {
                assert_eq!(path, "/api/legacy/:id");
                assert!(message.contains("`:id`"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(table.is_empty());
        // Nothing half-registered, so the router can still be built.
        let _ = table.router();
    }

    #[test]
    fn test_path_parameter_must_be_captured() {
        let mut table = RouteTable::new();

        let err = table.bind(Arc::new(MisnamedController), "/").unwrap_err();
        match err {
            BinderError::InvalidRoute { path, message } => {
                assert_eq!(path, "/owners/{owner_id}/pets/{pet_id}");
                assert!(message.contains("`id`"));
                assert!(!message.contains("`owner_id`"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_pair() {
        assert!(check_pair(HttpMethod::Get, "/a/{id}", HttpMethod::Post, "/a/{id}").is_ok());
        assert!(check_pair(HttpMethod::Get, "/a/{id}", HttpMethod::Get, "/a/{id}").is_err());
        assert!(check_pair(HttpMethod::Get, "/a/{id}", HttpMethod::Post, "/a/{key}").is_err());
        assert!(check_pair(HttpMethod::Get, "/a", HttpMethod::Get, "/b").is_ok());
    }
}

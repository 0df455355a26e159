//! Declared operation metadata
//!
//! These types are what the `#[routes]` macro emits for every annotated
//! controller method. The binder walks them to register routes and marshal
//! arguments, and the document assembler turns them into OpenAPI operations.

mod model;

pub use model::{ModelRef, SchemaCollection};

use axum::http::StatusCode;
use axum::routing::MethodFilter;
use std::any::TypeId;
use std::fmt;
use utoipa::openapi::path::{HttpMethod as OpenApiMethod, ParameterIn};
use utoipa::openapi::schema::{ArrayBuilder, KnownFormat, ObjectBuilder, SchemaFormat, Type};
use utoipa::openapi::{RefOr, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub(crate) fn method_filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Delete => MethodFilter::DELETE,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Head => MethodFilter::HEAD,
            HttpMethod::Options => MethodFilter::OPTIONS,
        }
    }
}

impl From<HttpMethod> for OpenApiMethod {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => OpenApiMethod::Get,
            HttpMethod::Post => OpenApiMethod::Post,
            HttpMethod::Put => OpenApiMethod::Put,
            HttpMethod::Delete => OpenApiMethod::Delete,
            HttpMethod::Patch => OpenApiMethod::Patch,
            HttpMethod::Head => OpenApiMethod::Head,
            HttpMethod::Options => OpenApiMethod::Options,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl From<ParameterLocation> for ParameterIn {
    fn from(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Path => ParameterIn::Path,
            ParameterLocation::Query => ParameterIn::Query,
            ParameterLocation::Header => ParameterIn::Header,
            ParameterLocation::Cookie => ParameterIn::Cookie,
        }
    }
}

/// OpenAPI type of a parameter, used to coerce its raw string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ScalarType>),
}

impl ScalarType {
    pub fn array(items: ScalarType) -> Self {
        ScalarType::Array(Box::new(items))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Array(_) => "array",
        }
    }

    pub fn schema(&self) -> RefOr<Schema> {
        let schema = match self {
            ScalarType::String => ObjectBuilder::new().schema_type(Type::String).build(),
            ScalarType::Integer => ObjectBuilder::new()
                .schema_type(Type::Integer)
                .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64)))
                .build(),
            ScalarType::Number => ObjectBuilder::new()
                .schema_type(Type::Number)
                .format(Some(SchemaFormat::KnownFormat(KnownFormat::Double)))
                .build(),
            ScalarType::Boolean => ObjectBuilder::new().schema_type(Type::Boolean).build(),
            ScalarType::Array(items) => {
                return RefOr::T(Schema::Array(
                    ArrayBuilder::new().items(items.schema()).build(),
                ));
            }
        };
        RefOr::T(Schema::Object(schema))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub scalar: ScalarType,
    pub required: bool,
    pub description: Option<String>,
}

impl ParameterSpec {
    /// Path parameters are always required; everything else starts optional.
    pub fn new(name: impl Into<String>, location: ParameterLocation, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            location,
            scalar,
            required: location == ParameterLocation::Path,
            description: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.location == ParameterLocation::Path;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// JSON request body bound to one method argument.
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub name: String,
    pub model: ModelRef,
    pub required: bool,
    pub description: Option<String>,
}

impl BodySpec {
    pub fn new<T: utoipa::ToSchema + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: ModelRef::of::<T>(),
            required: true,
            description: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One slot of the method's argument list.
#[derive(Debug, Clone)]
pub enum ArgumentSpec {
    Parameter(ParameterSpec),
    Body(BodySpec),
}

impl ArgumentSpec {
    pub fn parameter(spec: ParameterSpec) -> Self {
        ArgumentSpec::Parameter(spec)
    }

    pub fn body(spec: BodySpec) -> Self {
        ArgumentSpec::Body(spec)
    }

    pub fn name(&self) -> &str {
        match self {
            ArgumentSpec::Parameter(p) => &p.name,
            ArgumentSpec::Body(b) => &b.name,
        }
    }
}

/// Declared response model for a status code.
#[derive(Debug, Clone)]
pub struct ResponseMapping {
    pub status: u16,
    pub model: ModelRef,
    pub description: String,
}

impl ResponseMapping {
    pub fn new<T: utoipa::ToSchema + 'static>(status: u16) -> Self {
        Self::with_model(status, ModelRef::of::<T>())
    }

    /// A response without a body, matched by `()` and [`crate::Reply::empty`].
    pub fn empty(status: u16) -> Self {
        Self::with_model(status, ModelRef::unit())
    }

    fn with_model(status: u16, model: ModelRef) -> Self {
        let description = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Response")
            .to_string();
        Self {
            status,
            model,
            description,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Everything declared about one controller method.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub method: HttpMethod,
    /// Path relative to the controller's base path, `{name}` for parameters.
    pub path: String,
    pub operation_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub arguments: Vec<ArgumentSpec>,
    pub responses: Vec<ResponseMapping>,
}

impl OperationSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            arguments: Vec::new(),
            responses: Vec::new(),
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn response(mut self, response: ResponseMapping) -> Self {
        self.responses.push(response);
        self
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.arguments.iter().filter_map(|a| match a {
            ArgumentSpec::Parameter(p) => Some(p),
            ArgumentSpec::Body(_) => None,
        })
    }

    pub fn body(&self) -> Option<&BodySpec> {
        self.arguments.iter().find_map(|a| match a {
            ArgumentSpec::Body(b) => Some(b),
            ArgumentSpec::Parameter(_) => None,
        })
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// Status for a returned value of run-time type `type_id`.
    ///
    /// The first declared mapping whose model matches wins. Without a match,
    /// an empty reply maps to 204 and anything else to 200.
    pub fn status_for(&self, type_id: TypeId) -> StatusCode {
        self.responses
            .iter()
            .find(|r| r.model.type_id() == type_id)
            .map(ResponseMapping::status_code)
            .unwrap_or_else(|| {
                if type_id == TypeId::of::<()>() {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::OK
                }
            })
    }
}

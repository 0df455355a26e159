//! OpenAPI document assembly
//!
//! Each registered controller contributes a fragment: its operations, the
//! component schemas they reference and its tag. [`ApiDocument`] keeps the
//! fragments and [`ApiDocument::build`] turns them into the final document.

use crate::binder::BoundOperation;
use crate::controller::ControllerInfo;
use crate::error::Result;
use crate::metadata::{BodySpec, OperationSpec, ParameterSpec, SchemaCollection};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use utoipa::openapi::path::{OperationBuilder, ParameterBuilder, PathItem, Paths};
use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
use utoipa::openapi::server::ServerBuilder;
use utoipa::openapi::tag::{Tag, TagBuilder};
use utoipa::openapi::{
    ComponentsBuilder, ContentBuilder, Deprecated, InfoBuilder, OpenApi, OpenApiBuilder, Ref,
    RefOr, Required, Response, ResponseBuilder, Schema,
};

const JSON: &str = "application/json";

/// Title, version and description of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

/// Accumulated per-controller fragments.
#[derive(Clone, Default)]
pub struct ApiDocument {
    paths: Paths,
    schemas: BTreeMap<String, RefOr<Schema>>,
    tags: Vec<Tag>,
}

impl fmt::Debug for ApiDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiDocument")
            .field("paths", &self.paths.paths.keys().collect::<Vec<_>>())
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("tags", &self.tags.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}

impl ApiDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Merge the operations bound for controller `C`.
    pub fn add_controller<C: ControllerInfo>(&mut self, operations: &[BoundOperation]) {
        self.add_tag(C::tag(), C::description());

        for bound in operations {
            let operation = self.operation(&bound.spec, C::tag());
            let item = PathItem::new(bound.spec.method.into(), operation);
            match self.paths.paths.get_mut(&bound.document_path) {
                Some(existing) => existing.merge_operations(item),
                None => {
                    self.paths.paths.insert(bound.document_path.clone(), item);
                }
            }
        }
    }

    /// Final document; `server_url` is where the paths are served from.
    pub fn build(&self, info: &DocumentInfo, server_url: &str) -> OpenApi {
        let components = self
            .schemas
            .iter()
            .fold(ComponentsBuilder::new(), |components, (name, schema)| {
                components.schema(name.clone(), schema.clone())
            })
            .build();

        OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title(info.title.clone())
                    .version(info.version.clone())
                    .description(info.description.clone())
                    .build(),
            )
            .servers(Some(vec![ServerBuilder::new().url(server_url).build()]))
            .paths(self.paths.clone())
            .components(Some(components))
            .tags(Some(self.tags.clone()))
            .build()
    }

    fn add_tag(&mut self, name: &str, description: Option<&str>) {
        if self.tags.iter().any(|t| t.name == name) {
            return;
        }
        self.tags.push(
            TagBuilder::new()
                .name(name)
                .description(description.map(str::to_string))
                .build(),
        );
    }

    /// Register a model's schemas and return the `$ref` to it.
    fn schema_ref(&mut self, collect: impl FnOnce(&mut SchemaCollection) -> Option<String>) -> Option<Ref> {
        let mut collected = SchemaCollection::new();
        let name = collect(&mut collected)?;
        for (schema_name, schema) in collected {
            self.schemas.entry(schema_name).or_insert(schema);
        }
        Some(Ref::from_schema_name(name))
    }

    fn operation(&mut self, spec: &OperationSpec, default_tag: &str) -> utoipa::openapi::path::Operation {
        let mut builder = OperationBuilder::new()
            .operation_id(Some(spec.operation_id.clone()))
            .summary(spec.summary.clone())
            .description(spec.description.clone());

        if spec.tags.is_empty() {
            builder = builder.tag(default_tag);
        } else {
            for tag in &spec.tags {
                self.add_tag(tag, None);
                builder = builder.tag(tag.clone());
            }
        }

        if spec.deprecated {
            builder = builder.deprecated(Some(Deprecated::True));
        }

        for param in spec.parameters() {
            builder = builder.parameter(parameter(param));
        }

        if let Some(body) = spec.body() {
            builder = builder.request_body(Some(self.request_body(body)));
        }

        if spec.responses.is_empty() {
            builder = builder.response("200", ResponseBuilder::new().description("OK").build());
        }
        for mapping in &spec.responses {
            let response: Response = match self.schema_ref(|out| mapping.model.collect_schemas(out)) {
                Some(reference) => ResponseBuilder::new()
                    .description(mapping.description.clone())
                    .content(JSON, ContentBuilder::new().schema(Some(reference)).build())
                    .build(),
                None => ResponseBuilder::new()
                    .description(mapping.description.clone())
                    .build(),
            };
            builder = builder.response(mapping.status.to_string(), response);
        }

        builder.build()
    }

    fn request_body(&mut self, body: &BodySpec) -> RequestBody {
        let reference = self.schema_ref(|out| body.model.collect_schemas(out));
        RequestBodyBuilder::new()
            .description(body.description.clone())
            .content(JSON, ContentBuilder::new().schema(reference).build())
            .required(Some(if body.required {
                Required::True
            } else {
                Required::False
            }))
            .build()
    }
}

fn parameter(param: &ParameterSpec) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(param.name.clone())
        .parameter_in(param.location.into())
        .required(if param.required {
            Required::True
        } else {
            Required::False
        })
        .description(param.description.clone())
        .schema(Some(param.scalar.schema()))
        .build()
}

/// Write `doc` to `path` as pretty-printed JSON, creating parent directories.
pub fn write_spec(doc: &OpenApi, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.to_pretty_json()?)?;
    tracing::info!(path = %path.display(), "Wrote OpenAPI document");
    Ok(())
}

use std::any::{TypeId, type_name};
use std::fmt;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{PartialSchema, ToSchema};

/// Named component schemas, in the order they were discovered.
pub type SchemaCollection = Vec<(String, RefOr<Schema>)>;

type SchemaCollector = fn(&mut SchemaCollection) -> String;

/// Type-erased handle on a Rust model.
///
/// Carries the model's `TypeId`, used to match returned values against
/// declared responses, and a collector that emits its component schema plus
/// every schema it references.
#[derive(Clone, Copy)]
pub struct ModelRef {
    type_id: TypeId,
    type_name: &'static str,
    collector: Option<SchemaCollector>,
}

impl ModelRef {
    pub fn of<T: ToSchema + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            collector: Some(collect_schema::<T>),
        }
    }

    /// The empty model, `()`, which has no schema.
    pub fn unit() -> Self {
        Self {
            type_id: TypeId::of::<()>(),
            type_name: type_name::<()>(),
            collector: None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_unit(&self) -> bool {
        self.collector.is_none()
    }

    /// Push this model's schemas into `out` and return its component name.
    pub fn collect_schemas(&self, out: &mut SchemaCollection) -> Option<String> {
        self.collector.map(|collect| collect(out))
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModelRef {}

fn collect_schema<T: ToSchema>(out: &mut SchemaCollection) -> String {
    let name = T::name().into_owned();
    // The model's own schema goes first so it is never shadowed by a ref.
    out.push((name.clone(), <T as PartialSchema>::schema()));
    T::schemas(out);
    name
}

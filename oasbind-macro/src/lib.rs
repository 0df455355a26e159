use proc_macro::TokenStream;

mod controller;
mod docs;
mod http_methods;
mod params;
mod routes;

/// Attribute macro declaring a controller and its base path
///
/// Implements `oasbind::ControllerInfo`. The tag defaults to the struct name
/// without its `Controller` suffix; the description defaults to the struct's
/// doc comment.
///
/// # Example
/// ```ignore
/// use oasbind::controller;
///
/// /// Everything about pets
/// #[controller(path = "/pets", tag = "pets")]
/// pub struct PetController {
///     store: Arc<PetStore>,
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::controller_attribute(attr, item)
}

/// Attribute macro turning the route methods of an impl block into operations
///
/// Implements `oasbind::Controller`. Every method carrying an HTTP method
/// attribute becomes one operation; its arguments are bound with
/// `#[path]`, `#[query]`, `#[header]`, `#[cookie]` or `#[body]`, each
/// optionally taking `name = "..."`, `type = "..."` and `description = "..."`.
///
/// # Example
/// ```ignore
/// #[routes]
/// impl PetController {
///     /// List pets
///     #[get("/")]
///     #[response(200, PetPage)]
///     async fn list(&self, #[query] limit: Option<u32>, #[header] x_tenant: String) -> Reply {
///         // ...
///     }
///
///     #[post("/", operation_id = "createPet")]
///     #[response(201, Pet, "Created")]
///     async fn create(&self, #[body] pet: NewPet) -> Result<Pet, ApiError> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::routes_attribute(attr, item)
}

/// HTTP GET method attribute for controller methods
#[proc_macro_attribute]
pub fn get(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("get", attr, item)
}

/// HTTP POST method attribute for controller methods
#[proc_macro_attribute]
pub fn post(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("post", attr, item)
}

/// HTTP PUT method attribute for controller methods
#[proc_macro_attribute]
pub fn put(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("put", attr, item)
}

/// HTTP DELETE method attribute for controller methods
#[proc_macro_attribute]
pub fn delete(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("delete", attr, item)
}

/// HTTP PATCH method attribute for controller methods
#[proc_macro_attribute]
pub fn patch(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("patch", attr, item)
}

/// HTTP HEAD method attribute for controller methods
#[proc_macro_attribute]
pub fn head(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("head", attr, item)
}

/// HTTP OPTIONS method attribute for controller methods
#[proc_macro_attribute]
pub fn options(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("options", attr, item)
}

/// Declared response: `#[response(status, Model?, "description"?)]`
///
/// A returned value whose type is `Model` is sent with `status`. Without a
/// model the mapping applies to `()` and the response has no body.
#[proc_macro_attribute]
pub fn response(_attr: TokenStream, _item: TokenStream) -> TokenStream {
    http_methods::outside_routes_error("#[response]")
}

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    bracketed, parse::Parse, parse::ParseStream, punctuated::Punctuated, Ident, LitInt, LitStr,
    Token, Type,
};

pub const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

/// Arguments of `#[get("/path", operation_id = "...", ...)]` and friends.
#[derive(Default)]
pub struct RouteArgs {
    pub path: Option<String>,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
}

impl Parse for RouteArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = RouteArgs::default();

        if input.peek(LitStr) {
            args.path = Some(route_path(input.parse::<LitStr>()?)?);
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        while !input.is_empty() {
            let name: Ident = input.parse()?;
            match name.to_string().as_str() {
                "deprecated" => {
                    args.deprecated = if input.peek(Token![=]) {
                        input.parse::<Token![=]>()?;
                        input.parse::<syn::LitBool>()?.value
                    } else {
                        true
                    };
                }
                "tags" => {
                    input.parse::<Token![=]>()?;
                    let content;
                    bracketed!(content in input);
                    let tags = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                    args.tags = tags.iter().map(LitStr::value).collect();
                }
                "path" => {
                    input.parse::<Token![=]>()?;
                    args.path = Some(route_path(input.parse::<LitStr>()?)?);
                }
                key @ ("operation_id" | "summary" | "description") => {
                    input.parse::<Token![=]>()?;
                    let value = input.parse::<LitStr>()?.value();
                    match key {
                        "operation_id" => args.operation_id = Some(value),
                        "summary" => args.summary = Some(value),
                        _ => args.description = Some(value),
                    }
                }
                other => {
                    return Err(syn::Error::new(
                        name.span(),
                        format!("unknown route argument `{}`", other),
                    ))
                }
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

/// Route path literal; every capture must be a whole `{name}` or trailing
/// `{*name}` segment.
fn route_path(lit: LitStr) -> syn::Result<String> {
    let path = lit.value();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for (index, segment) in segments.iter().enumerate() {
        let message = if segment.starts_with(':') || segment.starts_with('*') {
            Some(format!("`{}`: use `{{name}}` to capture a segment", segment))
        } else if segment.contains(['{', '}']) {
            let name = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .map(|s| s.strip_prefix('*').unwrap_or(s));
            match name {
                Some(name) if name.is_empty() || name.contains(['{', '}', '*']) => {
                    Some(format!("`{}` is not a valid capture", segment))
                }
                Some(_) if segment.starts_with("{*") && index + 1 != segments.len() => {
                    Some(format!("wildcard `{}` must be the last segment", segment))
                }
                Some(_) => None,
                None => Some(format!("`{}`: a capture must fill the whole segment", segment)),
            }
        } else {
            None
        };

        if let Some(message) = message {
            return Err(syn::Error::new(lit.span(), format!("invalid route path: {}", message)));
        }
    }
    Ok(path)
}

/// `#[response(404, NotFound, "No such pet")]`; the model and description are
/// optional, and no model means an empty body.
pub struct ResponseArgs {
    pub status: u16,
    pub model: Option<Type>,
    pub description: Option<String>,
}

impl Parse for ResponseArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let lit: LitInt = input.parse()?;
        let status: u16 = lit.base10_parse()?;
        if !(100..=599).contains(&status) {
            return Err(syn::Error::new(
                lit.span(),
                "status code must be between 100 and 599",
            ));
        }

        let mut model = None;
        let mut description = None;
        while input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            if input.peek(LitStr) {
                description = Some(input.parse::<LitStr>()?.value());
            } else if model.is_none() && description.is_none() {
                model = Some(input.parse::<Type>()?);
            } else {
                return Err(input.error("expected `status, Model, \"description\"`"));
            }
        }

        Ok(ResponseArgs {
            status,
            model,
            description,
        })
    }
}

/// Method attributes only have meaning inside a `#[routes]` impl block,
/// which consumes them.
pub fn http_method_attribute(method: &str, _attr: TokenStream, _item: TokenStream) -> TokenStream {
    outside_routes_error(&format!("#[{}]", method))
}

pub fn outside_routes_error(attr: &str) -> TokenStream {
    let message = format!("{} can only be used on methods of a #[routes] impl block", attr);
    let error: TokenStream2 = syn::Error::new(Span::call_site(), message).to_compile_error();
    TokenStream::from(quote! { #error })
}

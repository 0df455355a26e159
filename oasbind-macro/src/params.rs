use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    ext::IdentExt, parse::ParseStream, spanned::Spanned, Attribute, GenericArgument, Ident,
    LitStr, Meta, Pat, PathArguments, Token, Type,
};

pub const PARAM_ATTRS: [&str; 5] = ["path", "query", "header", "cookie", "body"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
}

impl Location {
    fn tokens(self) -> TokenStream2 {
        match self {
            Location::Path => quote! { ::oasbind::metadata::ParameterLocation::Path },
            Location::Query => quote! { ::oasbind::metadata::ParameterLocation::Query },
            Location::Header => quote! { ::oasbind::metadata::ParameterLocation::Header },
            Location::Cookie => quote! { ::oasbind::metadata::ParameterLocation::Cookie },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<Scalar>),
}

impl Scalar {
    fn parse(name: &str) -> Option<Self> {
        if let Some(items) = name.strip_suffix("[]") {
            return Scalar::parse(items).map(|s| Scalar::Array(Box::new(s)));
        }
        match name {
            "string" => Some(Scalar::String),
            "integer" => Some(Scalar::Integer),
            "number" => Some(Scalar::Number),
            "boolean" => Some(Scalar::Boolean),
            _ => None,
        }
    }

    fn tokens(&self) -> TokenStream2 {
        match self {
            Scalar::String => quote! { ::oasbind::metadata::ScalarType::String },
            Scalar::Integer => quote! { ::oasbind::metadata::ScalarType::Integer },
            Scalar::Number => quote! { ::oasbind::metadata::ScalarType::Number },
            Scalar::Boolean => quote! { ::oasbind::metadata::ScalarType::Boolean },
            Scalar::Array(items) => {
                let items = items.tokens();
                quote! { ::oasbind::metadata::ScalarType::array(#items) }
            }
        }
    }
}

/// One typed argument of a route method.
pub enum Argument {
    Parameter {
        name: String,
        location: Location,
        scalar: Scalar,
        required: bool,
        description: Option<String>,
    },
    Body {
        name: String,
        model: Type,
        required: bool,
        description: Option<String>,
    },
}

impl Argument {
    /// Build the `ArgumentSpec` expression.
    pub fn spec_tokens(&self) -> TokenStream2 {
        match self {
            Argument::Parameter {
                name,
                location,
                scalar,
                required,
                description,
            } => {
                let location = location.tokens();
                let scalar = scalar.tokens();
                let description = description
                    .as_ref()
                    .map(|d| quote! { .description(#d) });
                quote! {
                    ::oasbind::metadata::ArgumentSpec::parameter(
                        ::oasbind::metadata::ParameterSpec::new(#name, #location, #scalar)
                            .required(#required)
                            #description
                    )
                }
            }
            Argument::Body {
                name,
                model,
                required,
                description,
            } => {
                let description = description
                    .as_ref()
                    .map(|d| quote! { .description(#d) });
                quote! {
                    ::oasbind::metadata::ArgumentSpec::body(
                        ::oasbind::metadata::BodySpec::new::<#model>(#name)
                            .required(#required)
                            #description
                    )
                }
            }
        }
    }
}

#[derive(Default)]
struct ParamOptions {
    name: Option<String>,
    scalar: Option<Scalar>,
    description: Option<String>,
}

fn parse_options(attr: &Attribute) -> syn::Result<ParamOptions> {
    let mut options = ParamOptions::default();
    if let Meta::Path(_) = attr.meta {
        return Ok(options);
    }

    attr.parse_args_with(|input: ParseStream| {
        while !input.is_empty() {
            // `type` is a keyword, hence `parse_any`.
            let key = Ident::parse_any(input)?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;
            match key.to_string().as_str() {
                "name" => options.name = Some(value.value()),
                "description" => options.description = Some(value.value()),
                "type" => {
                    let scalar = Scalar::parse(&value.value()).ok_or_else(|| {
                        syn::Error::new(
                            value.span(),
                            "expected one of string, integer, number, boolean, optionally suffixed with []",
                        )
                    })?;
                    options.scalar = Some(scalar);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown parameter argument `{}`", other),
                    ))
                }
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(())
    })?;
    Ok(options)
}

/// The single type argument of `Wrapper<T>` when the last path segment is
/// `wrapper`.
fn unwrap_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Scalar type of a (non-`Option`) argument type.
pub fn infer_scalar(ty: &Type) -> syn::Result<Scalar> {
    if let Type::Reference(reference) = ty {
        return Err(syn::Error::new(
            reference.span(),
            "route arguments must be owned types",
        ));
    }
    if let Some(items) = unwrap_generic(ty, "Vec") {
        return Ok(Scalar::Array(Box::new(infer_scalar(items)?)));
    }

    let ident = match ty {
        Type::Path(type_path) => type_path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    };
    Ok(match ident.as_deref() {
        Some(
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize",
        ) => Scalar::Integer,
        Some("f32" | "f64") => Scalar::Number,
        Some("bool") => Scalar::Boolean,
        _ => Scalar::String,
    })
}

/// Build the argument description from its attributes.
///
/// Returns `Ok(None)` when the argument carries no parameter attribute.
pub fn parse_argument(attrs: &[Attribute], pat: &Pat, ty: &Type) -> syn::Result<Option<Argument>> {
    let mut found = attrs
        .iter()
        .filter(|attr| PARAM_ATTRS.iter().any(|name| attr.path().is_ident(name)));
    let Some(attr) = found.next() else {
        return Ok(None);
    };
    if let Some(extra) = found.next() {
        return Err(syn::Error::new(
            extra.span(),
            "an argument can only be bound to one request source",
        ));
    }

    let options = parse_options(attr)?;
    let ident_name = match pat {
        Pat::Ident(pat_ident) => Some(pat_ident.ident.unraw().to_string()),
        _ => None,
    };

    let (inner, optional) = match unwrap_generic(ty, "Option") {
        Some(inner) => (inner, true),
        None => (ty, false),
    };

    let kind = attr
        .path()
        .get_ident()
        .map(|ident| ident.to_string())
        .unwrap_or_default();

    let name = match (options.name, ident_name) {
        (Some(name), _) => name,
        (None, Some(ident)) if kind == "header" => ident.replace('_', "-"),
        (None, Some(ident)) => ident,
        (None, None) => {
            return Err(syn::Error::new(
                pat.span(),
                "argument patterns need an explicit `name = \"...\"`",
            ))
        }
    };

    if kind == "body" {
        if options.scalar.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "`type` does not apply to a request body",
            ));
        }
        return Ok(Some(Argument::Body {
            name,
            model: inner.clone(),
            required: !optional,
            description: options.description,
        }));
    }

    let location = match kind.as_str() {
        "path" => Location::Path,
        "query" => Location::Query,
        "header" => Location::Header,
        _ => Location::Cookie,
    };
    if location == Location::Path && optional {
        return Err(syn::Error::new(ty.span(), "path parameters cannot be optional"));
    }

    let scalar = match options.scalar {
        Some(scalar) => scalar,
        None => infer_scalar(inner)?,
    };

    Ok(Some(Argument::Parameter {
        name,
        location,
        scalar,
        required: !optional,
        description: options.description,
    }))
}

pub fn is_param_attr(attr: &Attribute) -> bool {
    PARAM_ATTRS.iter().any(|name| attr.path().is_ident(name))
}

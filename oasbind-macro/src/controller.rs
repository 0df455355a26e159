use crate::docs::DocText;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, Ident, ItemStruct, LitStr, Token,
};

struct ControllerArgs {
    path: String,
    tag: Option<String>,
    description: Option<String>,
}

impl Parse for ControllerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ControllerArgs {
            path: "/".to_string(),
            tag: None,
            description: None,
        };

        // `#[controller("/pets")]` is shorthand for `path = "/pets"`.
        if input.peek(LitStr) {
            args.path = input.parse::<LitStr>()?.value();
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        while !input.is_empty() {
            let name: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;
            match name.to_string().as_str() {
                "path" => args.path = value.value(),
                "tag" => args.tag = Some(value.value()),
                "description" => args.description = Some(value.value()),
                other => {
                    return Err(syn::Error::new(
                        name.span(),
                        format!("unknown controller argument `{}`", other),
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

pub fn controller_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ControllerArgs);
    let input = parse_macro_input!(item as ItemStruct);
    TokenStream::from(generate_controller_impl(&args, &input))
}

/// `PetController` is tagged `Pet`.
fn default_tag(struct_name: &str) -> String {
    match struct_name.strip_suffix("Controller") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => struct_name.to_string(),
    }
}

fn generate_controller_impl(args: &ControllerArgs, input: &ItemStruct) -> TokenStream2 {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let base_path = &args.path;
    let tag = args
        .tag
        .clone()
        .unwrap_or_else(|| default_tag(&struct_name.to_string()));
    let description = match args
        .description
        .clone()
        .or_else(|| DocText::from_attrs(&input.attrs).full())
    {
        Some(text) => quote! { ::std::option::Option::Some(#text) },
        None => quote! { ::std::option::Option::None },
    };

    quote! {
        #input

        impl #impl_generics ::oasbind::ControllerInfo for #struct_name #ty_generics #where_clause {
            fn base_path() -> &'static str {
                #base_path
            }

            fn tag() -> &'static str {
                #tag
            }

            fn description() -> ::std::option::Option<&'static str> {
                #description
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tag_strips_suffix() {
        assert_eq!(default_tag("PetController"), "Pet");
        assert_eq!(default_tag("Health"), "Health");
        assert_eq!(default_tag("Controller"), "Controller");
    }

    #[test]
    fn test_parses_arguments() {
        let args: ControllerArgs =
            syn::parse_str(r#"path = "/pets", tag = "pets", description = "Pet store""#).unwrap();
        assert_eq!(args.path, "/pets");
        assert_eq!(args.tag.as_deref(), Some("pets"));
        assert_eq!(args.description.as_deref(), Some("Pet store"));

        let args: ControllerArgs = syn::parse_str(r#""/owners""#).unwrap();
        assert_eq!(args.path, "/owners");
        assert!(args.tag.is_none());
    }

    #[test]
    fn test_rejects_unknown_argument() {
        assert!(syn::parse_str::<ControllerArgs>(r#"prefix = "/x""#).is_err());
    }
}

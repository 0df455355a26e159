use crate::docs::DocText;
use crate::http_methods::{ResponseArgs, RouteArgs, HTTP_METHODS};
use crate::params::{is_param_attr, parse_argument, Argument};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl};

struct RouteInfo {
    method: String,
    args: RouteArgs,
    fn_name: syn::Ident,
    is_async: bool,
    docs: DocText,
    arguments: Vec<(Argument, syn::Type)>,
    responses: Vec<ResponseArgs>,
}

pub fn routes_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    match generate_routes_impl(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn http_method_of(attr: &Attribute) -> Option<&'static str> {
    HTTP_METHODS
        .iter()
        .copied()
        .find(|name| attr.path().is_ident(name))
}

fn is_route_attr(attr: &Attribute) -> bool {
    http_method_of(attr).is_some() || attr.path().is_ident("response")
}

fn generate_routes_impl(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    if input.trait_.is_some() {
        return Err(syn::Error::new(
            input.span(),
            "#[routes] must be placed on an inherent impl block",
        ));
    }

    let mut routes: Vec<RouteInfo> = Vec::new();
    let mut errors: Option<syn::Error> = None;

    for item in input.items.iter_mut() {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        match extract_route_info(method) {
            Ok(Some(route)) => routes.push(route),
            Ok(None) => {}
            Err(err) => match errors.as_mut() {
                Some(existing) => existing.combine(err),
                None => errors = Some(err),
            },
        }

        method.attrs.retain(|attr| !is_route_attr(attr));
        for arg in method.sig.inputs.iter_mut() {
            if let FnArg::Typed(pat_type) = arg {
                pat_type.attrs.retain(|attr| !is_param_attr(attr));
            }
        }
    }

    if let Some(err) = errors {
        return Err(err);
    }

    let operations = routes.iter().map(generate_operation);
    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::oasbind::Controller for #self_ty #where_clause {
            fn operations() -> ::std::vec::Vec<::oasbind::Operation<Self>> {
                ::std::vec![#(#operations),*]
            }
        }
    })
}

fn extract_route_info(method: &ImplItemFn) -> syn::Result<Option<RouteInfo>> {
    let mut http_method = None;
    let mut args = RouteArgs::default();
    let mut responses = Vec::new();

    for attr in &method.attrs {
        if let Some(name) = http_method_of(attr) {
            if http_method.is_some() {
                return Err(syn::Error::new(
                    attr.span(),
                    "a method can only be bound to one HTTP method",
                ));
            }
            http_method = Some(name.to_uppercase());
            if let syn::Meta::List(_) = attr.meta {
                args = attr.parse_args()?;
            }
        } else if attr.path().is_ident("response") {
            responses.push(attr.parse_args::<ResponseArgs>()?);
        }
    }

    let Some(http_method) = http_method else {
        if let Some(attr) = method.attrs.iter().find(|a| a.path().is_ident("response")) {
            return Err(syn::Error::new(
                attr.span(),
                "#[response] requires an HTTP method attribute such as #[get]",
            ));
        }
        return Ok(None);
    };

    match method.sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                method.sig.span(),
                "route methods must take `&self`",
            ))
        }
    }

    let mut arguments = Vec::new();
    for input in method.sig.inputs.iter() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        match parse_argument(&pat_type.attrs, &pat_type.pat, &pat_type.ty)? {
            Some(argument) => arguments.push((argument, (*pat_type.ty).clone())),
            None => {
                return Err(syn::Error::new(
                    pat_type.span(),
                    "route arguments need one of #[path], #[query], #[header], #[cookie] or #[body]",
                ))
            }
        }
    }

    Ok(Some(RouteInfo {
        method: http_method,
        args,
        fn_name: method.sig.ident.clone(),
        is_async: method.sig.asyncness.is_some(),
        docs: DocText::from_attrs(&method.attrs),
        arguments,
        responses,
    }))
}

fn generate_operation(route: &RouteInfo) -> TokenStream2 {
    let method = match route.method.as_str() {
        "GET" => quote! { ::oasbind::metadata::HttpMethod::Get },
        "POST" => quote! { ::oasbind::metadata::HttpMethod::Post },
        "PUT" => quote! { ::oasbind::metadata::HttpMethod::Put },
        "DELETE" => quote! { ::oasbind::metadata::HttpMethod::Delete },
        "PATCH" => quote! { ::oasbind::metadata::HttpMethod::Patch },
        "HEAD" => quote! { ::oasbind::metadata::HttpMethod::Head },
        _ => quote! { ::oasbind::metadata::HttpMethod::Options },
    };

    let fn_name = &route.fn_name;
    let path = route.args.path.clone().unwrap_or_else(|| "/".to_string());
    let operation_id = route
        .args
        .operation_id
        .clone()
        .unwrap_or_else(|| fn_name.to_string());

    let summary = route
        .args
        .summary
        .clone()
        .or_else(|| route.docs.summary())
        .map(|s| quote! { .summary(#s) });
    let description = route
        .args
        .description
        .clone()
        .or_else(|| route.docs.description())
        .map(|d| quote! { .description(#d) });
    let tags = route.args.tags.iter().map(|t| quote! { .tag(#t) });
    let deprecated = route.args.deprecated.then(|| quote! { .deprecated(true) });

    let argument_specs = route
        .arguments
        .iter()
        .map(|(argument, _)| argument.spec_tokens());

    let responses = route.responses.iter().map(|response| {
        let status = response.status;
        let mapping = match &response.model {
            Some(model) => quote! { ::oasbind::metadata::ResponseMapping::new::<#model>(#status) },
            None => quote! { ::oasbind::metadata::ResponseMapping::empty(#status) },
        };
        let description = response
            .description
            .as_ref()
            .map(|d| quote! { .description(#d) });
        quote! { .response(#mapping #description) }
    });

    let arg_idents: Vec<_> = (0..route.arguments.len())
        .map(|i| format_ident!("__arg_{}", i))
        .collect();
    let takes = route
        .arguments
        .iter()
        .zip(&arg_idents)
        .enumerate()
        .map(|(index, ((_, ty), ident))| {
            quote! {
                let #ident: #ty = match __args.take(#index) {
                    ::std::result::Result::Ok(value) => value,
                    ::std::result::Result::Err(err) => return ::std::result::Result::Err(err),
                };
            }
        });

    let args_param = if route.arguments.is_empty() {
        quote! { _: ::oasbind::Arguments }
    } else {
        quote! { mut __args: ::oasbind::Arguments }
    };
    let call = if route.is_async {
        quote! { __controller.#fn_name(#(#arg_idents),*).await }
    } else {
        quote! { __controller.#fn_name(#(#arg_idents),*) }
    };

    quote! {
        ::oasbind::Operation::new(
            ::oasbind::metadata::OperationSpec::new(#method, #path, #operation_id)
                #summary
                #description
                #(#tags)*
                #deprecated
                #(.argument(#argument_specs))*
                #(#responses)*,
            |__controller: ::std::sync::Arc<Self>, #args_param| async move {
                #(#takes)*
                ::oasbind::IntoReply::into_reply(#call)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: ItemImpl) -> syn::Result<String> {
        generate_routes_impl(input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_strips_route_attributes() {
        let output = expand(parse_quote! {
            impl PetController {
                /// Find a pet
                #[get("/{id}")]
                #[response(200, Pet)]
                async fn find(&self, #[path] id: i64) -> Reply {
                    todo!()
                }

                fn helper(&self) {}
            }
        })
        .unwrap();

        assert!(output.contains("impl :: oasbind :: Controller for PetController"));
        assert!(output.contains("ResponseMapping :: new :: < Pet >"));
        assert!(output.contains("200u16"));
        assert!(output.contains("\"Find a pet\""));
        assert!(output.contains(". await"));
        assert!(!output.contains("# [get"));
        assert!(!output.contains("# [path]"));
        assert!(output.contains("fn helper"));
    }

    #[test]
    fn test_sync_methods_are_not_awaited() {
        let output = expand(parse_quote! {
            impl HealthController {
                #[get]
                fn health(&self) -> Reply {
                    todo!()
                }
            }
        })
        .unwrap();
        assert!(!output.contains(". await"));
        assert!(output.contains("_ : :: oasbind :: Arguments"));
    }

    #[test]
    fn test_requires_shared_receiver() {
        let err = expand(parse_quote! {
            impl PetController {
                #[get("/")]
                async fn list(self) -> Reply { todo!() }
            }
        });
        assert!(err.is_err());

        let err = expand(parse_quote! {
            impl PetController {
                #[get("/")]
                async fn list(&mut self) -> Reply { todo!() }
            }
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_requires_argument_sources() {
        let err = expand(parse_quote! {
            impl PetController {
                #[get("/")]
                async fn list(&self, limit: u32) -> Reply { todo!() }
            }
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_response_without_method() {
        let err = expand(parse_quote! {
            impl PetController {
                #[response(200, Pet)]
                async fn list(&self) -> Reply { todo!() }
            }
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_two_methods() {
        let err = expand(parse_quote! {
            impl PetController {
                #[get("/")]
                #[post("/")]
                async fn list(&self) -> Reply { todo!() }
            }
        });
        assert!(err.is_err());
    }
}

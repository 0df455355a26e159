use syn::{Attribute, Expr, ExprLit, Lit, Meta};

/// Lines of `///` comments attached to an item.
pub struct DocText {
    lines: Vec<String>,
}

impl DocText {
    pub fn from_attrs(attrs: &[Attribute]) -> Self {
        let lines = attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
            .filter_map(|attr| match &attr.meta {
                Meta::NameValue(nv) => match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        Self { lines }
    }

    /// First non-empty line.
    pub fn summary(&self) -> Option<String> {
        self.lines.iter().find(|l| !l.is_empty()).cloned()
    }

    /// Everything after the summary line.
    pub fn description(&self) -> Option<String> {
        let start = self.lines.iter().position(|l| !l.is_empty())? + 1;
        non_empty(self.lines[start..].join("\n"))
    }

    pub fn full(&self) -> Option<String> {
        non_empty(self.lines.join("\n"))
    }
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_splits_summary_and_description() {
        let item: syn::ItemFn = parse_quote! {
            ///
            /// Find a pet
            ///
            /// Looks the pet up by id.
            /// Deleted pets are not returned.
            fn find() {}
        };
        let doc = DocText::from_attrs(&item.attrs);
        assert_eq!(doc.summary().as_deref(), Some("Find a pet"));
        assert_eq!(
            doc.description().as_deref(),
            Some("Looks the pet up by id.\nDeleted pets are not returned.")
        );
    }

    #[test]
    fn test_undocumented_item() {
        let item: syn::ItemFn = parse_quote! {
            #[inline]
            fn find() {}
        };
        let doc = DocText::from_attrs(&item.attrs);
        assert!(doc.summary().is_none());
        assert!(doc.description().is_none());
        assert!(doc.full().is_none());
    }
}

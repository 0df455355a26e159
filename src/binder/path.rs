/// Join route segments into one absolute path.
///
/// Empty segments and duplicate slashes are dropped; the result always
/// starts with `/` and never ends with one, except for the root itself.
pub fn join_path(segments: &[&str]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .flat_map(|segment| segment.split('/'))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Path with every `{param}` segment replaced by `{}`; two routes with the
/// same shape would be ambiguous to the router.
pub(crate) fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Name of a `{param}` or `{*param}` segment.
fn capture(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(|name| name.strip_prefix('*').unwrap_or(name))
}

/// Parameter names captured by `path`, in order.
pub(crate) fn path_params(path: &str) -> Vec<&str> {
    path.split('/').filter_map(capture).collect()
}

/// Check `path` against the route syntax the router accepts.
///
/// A capture must fill its whole segment, and a `{*rest}` wildcard can only
/// be the last segment. Segments may not start with `:` or `*`.
pub(crate) fn validate_route(path: &str) -> Result<(), String> {
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let mut names: Vec<&str> = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(format!(
                "segment `{}` must use `{{name}}` capture syntax",
                segment
            ));
        }

        match capture(segment) {
            Some(name) => {
                if name.is_empty() || name.contains(['{', '}', '*']) {
                    return Err(format!("invalid capture `{}`", segment));
                }
                if segment.starts_with("{*") && index + 1 != segments.len() {
                    return Err(format!("wildcard `{}` must be the last segment", segment));
                }
                if names.contains(&name) {
                    return Err(format!("capture `{}` appears twice", name));
                }
                names.push(name);
            }
            None if segment.contains(['{', '}']) => {
                return Err(format!(
                    "segment `{}` mixes text and braces; a capture must fill the whole segment",
                    segment
                ));
            }
            None => {}
        }
    }
    Ok(())
}

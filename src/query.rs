use crate::parse::Endpoint;

/// Endpoints with `query` in any of path, method, owner, handler or
/// framework tag, compared case-insensitively. An empty query keeps
/// everything in its original order.
pub fn filter(endpoints: &[Endpoint], query: &str) -> Vec<Endpoint> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return endpoints.to_vec();
    }
    endpoints
        .iter()
        .filter(|e| matches(e, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lowercase.
pub fn matches(endpoint: &Endpoint, needle: &str) -> bool {
    let framework = endpoint.framework.map(|f| f.tag()).unwrap_or_default();
    [
        endpoint.path.as_str(),
        endpoint.method.as_str(),
        endpoint.owner.as_str(),
        endpoint.handler.as_str(),
        framework,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

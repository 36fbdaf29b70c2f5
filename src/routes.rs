// Route path constants - single source of truth for all built-in paths

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use axum::handler::Handler;
use axum::routing::{on, MethodFilter, MethodRouter};

pub const API_PREFIX: &str = "/api";
pub const TEST: &str = "/api/test";
pub const HEALTH: &str = "/api/health";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// HTTP verbs a route descriptor may be mounted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl RouteMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RouteMethod::Get),
            "POST" => Ok(RouteMethod::Post),
            "PUT" => Ok(RouteMethod::Put),
            "DELETE" => Ok(RouteMethod::Delete),
            "PATCH" => Ok(RouteMethod::Patch),
            other => bail!("Unsupported route method: '{}'", other),
        }
    }
}

impl From<RouteMethod> for MethodFilter {
    fn from(method: RouteMethod) -> Self {
        match method {
            RouteMethod::Get => MethodFilter::GET,
            RouteMethod::Post => MethodFilter::POST,
            RouteMethod::Put => MethodFilter::PUT,
            RouteMethod::Delete => MethodFilter::DELETE,
            RouteMethod::Patch => MethodFilter::PATCH,
        }
    }
}

/// A handler to be mounted at `{method} /api{path}`
pub struct RouteDescriptor {
    pub method: RouteMethod,
    pub path: String,
    pub(crate) handler: MethodRouter,
}

impl RouteDescriptor {
    pub fn new<H, T>(method: RouteMethod, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            method,
            path: path.into(),
            handler: on(method.into(), handler),
        }
    }

    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(RouteMethod::Get, path, handler)
    }

    pub fn post<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(RouteMethod::Post, path, handler)
    }

    pub fn put<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(RouteMethod::Put, path, handler)
    }

    pub fn delete<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(RouteMethod::Delete, path, handler)
    }

    pub fn patch<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(RouteMethod::Patch, path, handler)
    }

    /// Path the descriptor is served under, including the `/api` prefix
    pub fn full_path(&self) -> String {
        format!("{}{}", API_PREFIX, self.path)
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Validated set of route descriptors
///
/// Construction fails instead of letting the router panic later on paths it
/// cannot register.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        // Capture segment registered after each path prefix
        let mut captures: HashMap<String, String> = HashMap::new();

        for route in &routes {
            validate_path(&route.path)?;
            check_capture_names(&route.path, &mut captures)?;

            let full_path = route.full_path();
            if route.method == RouteMethod::Get && (full_path == TEST || full_path == HEALTH) {
                bail!("Route GET {} is reserved", full_path);
            }

            if !seen.insert((route.method, route.path.clone())) {
                bail!("Duplicate route: {} {}", route.method, full_path);
            }
        }

        Ok(Self { routes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }
}

impl IntoIterator for RouteTable {
    type Item = RouteDescriptor;
    type IntoIter = std::vec::IntoIter<RouteDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        bail!("Route path must start with '/': '{}'", path);
    }

    let segments: Vec<&str> = path.split('/').collect();
    for (position, segment) in segments.iter().enumerate() {
        if let Some(name) = segment.strip_prefix(':') {
            bail!(
                "Route path '{}' uses ':{}'; write captures as '{{{}}}'",
                path, name, name
            );
        }
        if let Some(name) = segment.strip_prefix('*') {
            bail!(
                "Route path '{}' uses '*{}'; write wildcards as '{{*{}}}'",
                path, name, name
            );
        }

        if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let (name, wildcard) = match inner.strip_prefix('*') {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if name.is_empty() || name.contains(['{', '}', '*']) {
                bail!("Route path '{}' has a malformed capture '{}'", path, segment);
            }
            if wildcard && position + 1 != segments.len() {
                bail!("Route path '{}' has a wildcard before its last segment", path);
            }
        } else if segment.contains(['{', '}']) {
            bail!("Route path '{}' has an unbalanced brace in '{}'", path, segment);
        }
    }

    Ok(())
}

/// Routes sharing a prefix must name the capture that follows it identically
fn check_capture_names(path: &str, captures: &mut HashMap<String, String>) -> Result<()> {
    let segments: Vec<&str> = path.split('/').collect();

    for (position, segment) in segments.iter().enumerate() {
        if !segment.starts_with('{') {
            continue;
        }

        let prefix = segments[..position].join("/");
        match captures.get(&prefix) {
            Some(existing) if existing != segment => bail!(
                "Route path '{}' captures '{}' where another route captures '{}'",
                path, segment, existing
            ),
            Some(_) => {}
            None => {
                captures.insert(prefix, segment.to_string());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop() -> &'static str {
        "ok"
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<RouteMethod>().unwrap(), RouteMethod::Get);
        assert_eq!("Post".parse::<RouteMethod>().unwrap(), RouteMethod::Post);
        assert_eq!("PATCH".parse::<RouteMethod>().unwrap(), RouteMethod::Patch);

        let error = "OPTIONS".parse::<RouteMethod>().unwrap_err();
        assert!(error.to_string().contains("OPTIONS"));
    }

    #[test]
    fn test_full_path_is_prefixed_verbatim() {
        let route = RouteDescriptor::get("/items/{id}", noop);
        assert_eq!(route.full_path(), "/api/items/{id}");
    }

    #[test]
    fn test_valid_table() {
        let table = RouteTable::new(vec![
            RouteDescriptor::get("/items", noop),
            RouteDescriptor::post("/items", noop),
            RouteDescriptor::delete("/items/{id}", noop),
            // Only GET /test is reserved
            RouteDescriptor::post("/test", noop),
        ])
        .unwrap();

        assert_eq!(table.len(), 4);
        assert!(!table.is_empty());
        assert!(RouteTable::empty().is_empty());
    }

    #[test]
    fn test_path_without_leading_slash() {
        let error = RouteTable::new(vec![RouteDescriptor::get("items", noop)]).unwrap_err();
        assert!(error.to_string().contains("must start with '/'"));

        assert!(RouteTable::new(vec![RouteDescriptor::get("", noop)]).is_err());
    }

    #[test]
    fn test_colon_and_star_captures_rejected() {
        let error = RouteTable::new(vec![RouteDescriptor::get("/items/:id", noop)]).unwrap_err();
        assert!(error.to_string().contains("{id}"));

        let error = RouteTable::new(vec![RouteDescriptor::get("/files/*rest", noop)]).unwrap_err();
        assert!(error.to_string().contains("{*rest}"));
    }

    #[test]
    fn test_malformed_braces_rejected() {
        for path in ["/items/{id", "/items/id}", "/items/{}", "/items/{*}", "/items/{*rest}/tail"] {
            let result = RouteTable::new(vec![RouteDescriptor::get(path, noop)]);
            assert!(result.is_err(), "{} should be rejected", path);
        }
    }

    #[test]
    fn test_conflicting_capture_names_rejected() {
        let error = RouteTable::new(vec![
            RouteDescriptor::get("/items/{id}", noop),
            RouteDescriptor::delete("/items/{item_id}", noop),
        ])
        .unwrap_err();
        assert!(error.to_string().contains("{item_id}"));

        let error = RouteTable::new(vec![
            RouteDescriptor::get("/files/{id}", noop),
            RouteDescriptor::get("/files/{*rest}", noop),
        ])
        .unwrap_err();
        assert!(error.to_string().contains("{*rest}"));
    }

    #[test]
    fn test_shared_capture_names_accepted() {
        let table = RouteTable::new(vec![
            RouteDescriptor::get("/items/{id}", noop),
            RouteDescriptor::delete("/items/{id}", noop),
            RouteDescriptor::get("/items/{id}/tags/{tag}", noop),
            RouteDescriptor::get("/items/recent", noop),
            RouteDescriptor::get("/files/{*rest}", noop),
        ])
        .unwrap();
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_duplicate_route() {
        let error = RouteTable::new(vec![
            RouteDescriptor::put("/items", noop),
            RouteDescriptor::put("/items", noop),
        ])
        .unwrap_err();
        assert!(error.to_string().contains("Duplicate route: PUT /api/items"));
    }

    #[test]
    fn test_reserved_routes() {
        assert!(RouteTable::new(vec![RouteDescriptor::get("/test", noop)]).is_err());
        assert!(RouteTable::new(vec![RouteDescriptor::get("/health", noop)]).is_err());
    }
}

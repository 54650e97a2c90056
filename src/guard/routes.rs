use crate::config::{RouteDef, RoutesConfig};
use crate::utils::redirect::path_of;

/// A route flattened out of the configured tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: String,
    /// Set when this route or any of its ancestors is protected.
    pub requires_auth: bool,
}

/// One navigation attempt, consumed by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTransition {
    pub from: String,
    /// Destination as requested, query included.
    pub to: String,
    pub requires_auth: bool,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: String,
}

impl RouteTable {
    pub fn new(config: &RoutesConfig) -> Self {
        let mut routes = Vec::new();
        for def in &config.table {
            flatten(def, "", false, &mut routes);
        }
        Self {
            routes,
            fallback: normalize(&config.fallback_path),
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn find(&self, location: &str) -> Option<&Route> {
        let path = normalize(path_of(location));
        self.routes.iter().find(|r| r.path == path)
    }

    /// Unknown locations resolve to the fallback route.
    pub fn resolve(&self, location: &str) -> Option<&Route> {
        self.find(location).or_else(|| self.find(&self.fallback))
    }

    /// Build the transition for navigating to `to`. An unknown destination
    /// is replaced by the fallback path.
    pub fn transition(&self, from: &str, to: &str) -> RouteTransition {
        let (to, requires_auth) = match self.find(to) {
            Some(route) => (to.to_string(), route.requires_auth),
            None => (
                self.fallback.clone(),
                self.find(&self.fallback).is_some_and(|r| r.requires_auth),
            ),
        };
        RouteTransition {
            from: from.to_string(),
            to,
            requires_auth,
        }
    }
}

fn flatten(def: &RouteDef, parent: &str, inherited: bool, out: &mut Vec<Route>) {
    let path = if def.path.starts_with('/') {
        normalize(&def.path)
    } else {
        normalize(&format!("{}/{}", parent.trim_end_matches('/'), def.path))
    };
    let requires_auth = inherited || def.requires_auth;
    out.push(Route {
        path: path.clone(),
        name: def.name.clone(),
        requires_auth,
    });
    for child in &def.children {
        flatten(child, &path, requires_auth, out);
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

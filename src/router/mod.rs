pub mod pattern;

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::sanitize::{self, DEFAULT_PATH};

pub use pattern::{default_routes, RouteName, RoutePattern};

/// Outcome of resolving one fragment; also the payload handed to listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    pub route: RouteName,
    pub params: BTreeMap<String, String>,
    /// Sanitized path the route was matched against.
    pub path: String,
}

impl ResolvedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteState {
    Unresolved,
    Resolved(RouteName),
}

type Listener = Box<dyn FnMut(&ResolvedRoute)>;

/// Fragment router. Owns the fragment history the way a browser tab owns
/// its location; every navigation resolves synchronously and notifies
/// listeners before returning.
pub struct Router {
    routes: Vec<RoutePattern>,
    history: Vec<String>,
    current: Option<ResolvedRoute>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("history", &self.history)
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_routes(default_routes())
    }

    /// Patterns are tried in the given order; the first match wins. The
    /// table should contain a `/` route, which unmatched fragments fall
    /// back to.
    pub fn with_routes(routes: Vec<RoutePattern>) -> Self {
        Self {
            routes,
            history: Vec::new(),
            current: None,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ResolvedRoute) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> RouteState {
        match &self.current {
            Some(resolved) => RouteState::Resolved(resolved.route),
            None => RouteState::Unresolved,
        }
    }

    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    /// The fragment currently shown, `#` included.
    pub fn location(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Resolves a fragment that arrived from outside (initial load, user
    /// edit, link click) and makes it the current location.
    pub fn resolve(&mut self, raw_fragment: &str) -> ResolvedRoute {
        let fragment = as_fragment(raw_fragment);
        if self.location() != Some(fragment.as_str()) {
            self.history.push(fragment);
        }
        self.dispatch()
    }

    /// Moves to `path`; with `replace` the current history entry is
    /// overwritten instead of a new one being pushed.
    pub fn navigate(&mut self, path: &str, replace: bool) -> ResolvedRoute {
        let fragment = as_fragment(path);
        self.set_location(fragment, replace);
        self.dispatch()
    }

    /// Returns to the previous fragment, or `None` at the start of history.
    pub fn back(&mut self) -> Option<ResolvedRoute> {
        if self.history.len() < 2 {
            return None;
        }
        self.history.pop();
        Some(self.dispatch())
    }

    fn set_location(&mut self, fragment: String, replace: bool) {
        match (replace, self.history.last_mut()) {
            (true, Some(last)) => *last = fragment,
            _ => self.history.push(fragment),
        }
    }

    fn dispatch(&mut self) -> ResolvedRoute {
        let raw = self.location().unwrap_or_default().to_string();
        let path = sanitize::sanitize_fragment(&raw);

        let resolved = match self.match_path(&path) {
            Some(resolved) => resolved,
            None => {
                warn!("no route for '{path}', redirecting home");
                self.set_location(as_fragment(DEFAULT_PATH), true);
                self.match_path(DEFAULT_PATH).unwrap_or_else(|| ResolvedRoute {
                    route: RouteName::Home,
                    params: BTreeMap::new(),
                    path: DEFAULT_PATH.to_string(),
                })
            }
        };

        debug!("route resolved: {} {:?}", resolved.route, resolved.params);
        self.current = Some(resolved.clone());
        for listener in self.listeners.iter_mut() {
            listener(&resolved);
        }
        resolved
    }

    fn match_path(&self, path: &str) -> Option<ResolvedRoute> {
        for pattern in self.routes.iter() {
            match pattern.match_path(path) {
                Ok(Some(params)) => {
                    return Some(ResolvedRoute {
                        route: pattern.name(),
                        params,
                        path: path.to_string(),
                    })
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("rejected route {}: {e}", pattern.template());
                    continue;
                }
            }
        }
        None
    }

    /// Inverse of the route table. Missing parameters fall back to `/`.
    pub fn build_url(route: RouteName, params: &BTreeMap<String, String>) -> String {
        let with_param = |prefix: &str, key: &str| match params.get(key) {
            Some(value) if !value.is_empty() => {
                format!("{prefix}{}", urlencoding::encode(value))
            }
            _ => DEFAULT_PATH.to_string(),
        };
        match route {
            RouteName::Home => DEFAULT_PATH.to_string(),
            RouteName::Game => with_param("/game/", "slug"),
            RouteName::Favorites => "/favorites".to_string(),
            RouteName::Recent => "/recent".to_string(),
            RouteName::Category => with_param("/category/", "category"),
        }
    }
}

fn as_fragment(path: &str) -> String {
    if path.starts_with('#') {
        path.to_string()
    } else {
        format!("#{path}")
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::sanitize::{self, ParamError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteName {
    Home,
    Game,
    Favorites,
    Recent,
    Category,
}

impl RouteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Game => "game",
            Self::Favorites => "favorites",
            Self::Recent => "recent",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path template such as `/game/:slug` bound to a route name.
///
/// Parameter values are validated by [`sanitize::decode_param`], which picks
/// its rule from the parameter name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePattern {
    template: String,
    name: RouteName,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn new(template: &str, name: RouteName) -> Self {
        let segments = split_path(template)
            .map(|part| match part.strip_prefix(':') {
                Some(param) => Segment::Param(param.to_string()),
                None => Segment::Literal(part.to_string()),
            })
            .collect();
        Self {
            template: template.to_string(),
            name,
            segments,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn name(&self) -> RouteName {
        self.name
    }

    /// `Ok(None)` when the shape differs, `Err` when the shape fits but a
    /// parameter fails validation.
    pub fn match_path(&self, path: &str) -> Result<Option<BTreeMap<String, String>>, ParamError> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return Ok(None);
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return Ok(None);
                    }
                }
                Segment::Param(name) => {
                    let value = sanitize::decode_param(name, part)?;
                    params.insert(name.clone(), value);
                }
            }
        }
        Ok(Some(params))
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|p| !p.is_empty())
}

/// The portal's route table in match order.
pub fn default_routes() -> Vec<RoutePattern> {
    vec![
        RoutePattern::new("/", RouteName::Home),
        RoutePattern::new("/game/:slug", RouteName::Game),
        RoutePattern::new("/favorites", RouteName::Favorites),
        RoutePattern::new("/recent", RouteName::Recent),
        RoutePattern::new("/category/:category", RouteName::Category),
    ]
}

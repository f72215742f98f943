//! Request routing: path → partition + strategy.

use lessonlink_settings::{FetchStrategy, RouteSettings};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Pattern {
    Prefix(String),
    Suffix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('*') {
            Some(suffix) => Self::Suffix(suffix.to_owned()),
            None => Self::Prefix(raw.to_owned()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => path.ends_with(suffix.as_str()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Route {
    pattern: Pattern,
    partition: Option<String>,
    strategy: FetchStrategy,
}

/// Outcome of routing one request path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Partition to read and write; `None` for network-only traffic.
    pub partition: Option<&'a str>,
    /// Strategy to apply.
    pub strategy: FetchStrategy,
}

impl RouteMatch<'_> {
    const NETWORK_ONLY: Self = Self {
        partition: None,
        strategy: FetchStrategy::NetworkOnly,
    };
}

/// Ordered rules; the first match wins and unmatched paths go network-only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Build from configured rules, preserving their order.
    pub fn from_settings(routes: &[RouteSettings]) -> Self {
        let routes = routes
            .iter()
            .map(|route| Route {
                pattern: Pattern::parse(&route.pattern),
                partition: route.partition.clone(),
                strategy: route.strategy,
            })
            .collect();
        Self { routes }
    }

    /// Route `path`. Query string and fragment are ignored.
    pub fn resolve(&self, path: &str) -> RouteMatch<'_> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.routes
            .iter()
            .find(|route| route.pattern.matches(path))
            .map_or(RouteMatch::NETWORK_ONLY, |route| match route.strategy {
                FetchStrategy::NetworkOnly => RouteMatch::NETWORK_ONLY,
                strategy => match route.partition.as_deref() {
                    Some(partition) => RouteMatch {
                        partition: Some(partition),
                        strategy,
                    },
                    None => RouteMatch::NETWORK_ONLY,
                },
            })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// No rules; everything goes network-only.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

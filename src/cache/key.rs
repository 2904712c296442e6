//! Cache keys

use crate::api::QueryEndpoint;

/// Identity of a cache entry: the operation plus its serialized arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    endpoint: &'static str,
    args: String,
}

impl QueryKey {
    pub fn new<Q: QueryEndpoint>(args: &Q::Args) -> Self {
        Self {
            endpoint: Q::NAME,
            // Args are plain data (unit, ids); serialization cannot fail for them
            args: serde_json::to_string(args).unwrap_or_default(),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn args(&self) -> &str {
        &self.args
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}

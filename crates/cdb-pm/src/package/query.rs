/// Filter for the package listing endpoint.
///
/// Only the fields that are set are sent; an empty query lists the whole
/// catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub query: Option<String>,
    pub package_type: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub random: Option<String>,
    pub limit: Option<String>,
    pub hide: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub protocol_version: Option<String>,
    pub engine_version: Option<String>,
    pub format: Option<String>,
}

impl Query {
    /// Free-text search
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Only mods
    pub fn mods() -> Self {
        Self::default().with_type("mod")
    }

    /// Filter by type: `mod`, `game` or `txp`
    pub fn with_type(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = Some(package_type.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sort field: name, title, score, reviews, downloads, created_at,
    /// approved_at, last_release
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self
    }

    /// Sort direction: `asc` or `desc`
    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn with_engine_version(mut self, version: impl Into<String>) -> Self {
        self.engine_version = Some(version.into());
        self
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    /// Request parameters, empty fields omitted
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let mut push = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        };

        push("q", &self.query);
        push("type", &self.package_type);
        push("author", &self.author);
        push("random", &self.random);
        push("limit", &self.limit);
        push("hide", &self.hide);
        push("sort", &self.sort);
        push("order", &self.order);
        push("engine_version", &self.engine_version);
        push("protocol_version", &self.protocol_version);
        push("fmt", &self.format);

        for tag in self.tags.iter().filter(|t| !t.is_empty()) {
            pairs.push(("tag", tag.clone()));
        }

        pairs
    }
}

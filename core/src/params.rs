//! Query options for IGDB requests and their serialization.
//!
//! `ParameterBuilder` collects options in fluent style and renders them as
//! `<ids>?<key>=<value>&...`. List options (`fields`, `filters`, `expand`,
//! `ids`) append on every call; scalar options replace the previous value.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in query keys and values. RFC 3986 unreserved
/// characters stay as-is, as do `,` (IGDB reads comma-separated lists
/// literally) and the `*` field wildcard.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',')
    .remove(b'*');

/// Characters escaped in the ids path segment. Only `,` survives beyond the
/// unreserved set, so `/` or `?` inside an id can't change the route.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

/// Accumulated query options for one IGDB request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBuilder {
    expand: Vec<String>,
    fields: Vec<String>,
    filters: Vec<String>,
    ids: Vec<String>,
    limit: Option<u32>,
    offset: Option<u32>,
    order: Option<String>,
    search: Option<String>,
    scroll: Option<String>,
}

impl ParameterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand a relation inline, e.g. `"game"` on `/pulses/`.
    pub fn expand(mut self, relation: impl Into<String>) -> Self {
        self.expand.push(relation.into());
        self
    }

    /// Select a field (or an already comma-separated list of fields).
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields.push(fields.into());
        self
    }

    /// Add a filter fragment such as `[rating][gt]=75`.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Select resources by id. Accepts a single id or a comma-separated list.
    pub fn ids(mut self, ids: impl Into<String>) -> Self {
        self.ids.push(ids.into());
        self
    }

    pub fn id(self, id: u64) -> Self {
        self.ids(id.to_string())
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sort expression such as `popularity:desc`.
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Scroll token. IGDB starts a scroll cursor when this is `1`.
    pub fn scroll(mut self, token: impl Into<String>) -> Self {
        self.scroll = Some(token.into());
        self
    }

    pub fn enable_scroll(self) -> Self {
        self.scroll("1")
    }

    /// Render the options as `<ids>?<query>`.
    ///
    /// The ids become a path prefix instead of a query parameter, `fields`
    /// defaults to `*` and unset options are left out.
    pub fn build_query_string(&self) -> String {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(",")
        };

        let lists = [
            ("expand", join(&self.expand)),
            ("fields", Some(fields)),
            ("filters", join(&self.filters)),
        ];
        let scalars = [
            ("limit", self.limit.map(|n| n.to_string())),
            ("offset", self.offset.map(|n| n.to_string())),
            ("order", self.order.clone()),
            ("search", self.search.clone()),
            ("scroll", self.scroll.clone()),
        ];

        let query = lists
            .into_iter()
            .chain(scalars)
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .map(|(key, value)| format!("{}={}", encode(key), encode(&value)))
            .collect::<Vec<_>>()
            .join("&");

        let joined_ids = self.ids.join(",");
        let ids = utf8_percent_encode(&joined_ids, PATH_SEGMENT);
        format!("{ids}?{query}")
    }
}

fn join(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_VALUE).to_string()
}

//! OData query URL builder.
//!
//! # Example
//!
//! ```rust,ignore
//! use bpm_odata_data::ODataQuery;
//!
//! let url = ODataQuery::new("Contact")
//!     .select("Name, Owner/Name, Owner/Email")
//!     .filter("Name eq 'Jane'")
//!     .skip(40)
//!     .to_url("https://bpm.example.com/0/ServiceModel/EntityDataService.svc/");
//! // .../ContactCollection?$select=Id,Name,Owner/Name,Owner/Email&$filter=...&$skip=40&$expand=Owner
//! ```

use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Suffix the service appends to every entity set name.
pub const COLLECTION_SUFFIX: &str = "Collection";

/// Escape a value for use inside a quoted OData string literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// How a field value is matched by the unique-field lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// `<field> eq <value>`
    #[default]
    Eq,
    /// `substringof('<value>',<field>)`
    Contains,
}

impl MatchMode {
    /// Build the filter expression for `field` and `value`.
    ///
    /// In `Eq` mode, `true` and `false` are passed unquoted; everything else
    /// becomes a quoted string literal.
    pub fn filter(&self, field: &str, value: &str) -> String {
        match self {
            MatchMode::Eq if value == "true" || value == "false" => {
                format!("{field} eq {value}")
            }
            MatchMode::Eq => format!("{field} eq '{}'", escape_literal(value)),
            MatchMode::Contains => format!("substringof('{}',{field})", escape_literal(value)),
        }
    }
}

impl FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "equals" => Ok(Self::Eq),
            "contains" => Ok(Self::Contains),
            other => Err(Error::new(ErrorKind::InvalidInput(format!(
                "unknown match mode: {other}"
            )))),
        }
    }
}

/// Split a field list on `,`, `;` and spaces and put `Id` first, exactly once.
pub fn select_fields(fields: &str) -> Vec<String> {
    let mut selected = vec!["Id".to_string()];
    selected.extend(
        split_fields(fields)
            .filter(|f| *f != "Id")
            .map(str::to_string),
    );
    selected
}

/// Distinct relation paths (everything before the last `/`) of the selected
/// fields, in first-seen order.
pub fn expand_paths(fields: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for field in split_fields(fields) {
        if let Some((path, _)) = field.rsplit_once('/') {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
    }
    paths
}

fn split_fields(fields: &str) -> impl Iterator<Item = &str> {
    fields
        .split([',', ';', ' '])
        .map(str::trim)
        .filter(|f| !f.is_empty())
}

/// Builder for collection query URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    collection: String,
    select: Vec<String>,
    expand: Vec<String>,
    filter: Option<String>,
    skip: usize,
    top: Option<usize>,
    inline_count: bool,
}

impl ODataQuery {
    /// Start a query on a collection, named without the `Collection` suffix.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Select fields. `Id` is always included; nested paths such as
    /// `Owner/Name` add the matching `$expand`. An empty list selects nothing.
    pub fn select(mut self, fields: &str) -> Self {
        if split_fields(fields).next().is_none() {
            return self;
        }
        self.select = select_fields(fields);
        self.expand = expand_paths(fields);
        self
    }

    /// Set the `$filter` expression. An empty expression is ignored.
    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        self.filter = (!expression.trim().is_empty()).then_some(expression);
        self
    }

    /// Skip the first `n` entries. Zero sends no `$skip`.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Limit the page to `n` entries.
    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }

    /// Ask for the total entry count (`$inlinecount=allpages`).
    pub fn inline_count(mut self) -> Self {
        self.inline_count = true;
        self
    }

    /// The collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Selected fields, `Id` first.
    pub fn selected(&self) -> &[String] {
        &self.select
    }

    /// Relation paths to expand.
    pub fn expanded(&self) -> &[String] {
        &self.expand
    }

    /// Query string without the leading `?`; values are percent-encoded.
    pub fn query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();

        if !self.select.is_empty() {
            params.push(("$select", self.select.join(",")));
        }
        if let Some(filter) = &self.filter {
            params.push(("$filter", filter.clone()));
        }
        if self.skip > 0 {
            params.push(("$skip", self.skip.to_string()));
        }
        if !self.expand.is_empty() {
            params.push(("$expand", self.expand.join(", ")));
        }
        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }
        if self.inline_count {
            params.push(("$inlinecount", "allpages".to_string()));
        }

        params
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full URL below the data service root.
    pub fn to_url(&self, data_service_url: &str) -> String {
        let base = format!("{data_service_url}{}{COLLECTION_SUFFIX}", self.collection);
        let query = self.query_string();
        if query.is_empty() {
            base
        } else {
            format!("{base}?{query}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://bpm.example.com/0/ServiceModel/EntityDataService.svc/";

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_literal("plain"), "plain");
    }

    #[test]
    fn test_match_mode_filters() {
        assert_eq!(MatchMode::Eq.filter("Name", "Jane"), "Name eq 'Jane'");
        assert_eq!(MatchMode::Eq.filter("Name", "O'Brien"), "Name eq 'O''Brien'");
        assert_eq!(MatchMode::Eq.filter("IsActive", "true"), "IsActive eq true");
        assert_eq!(
            MatchMode::Contains.filter("Email", "@example"),
            "substringof('@example',Email)"
        );
        assert_eq!("contains".parse::<MatchMode>().unwrap(), MatchMode::Contains);
        assert_eq!("equals".parse::<MatchMode>().unwrap(), MatchMode::Eq);
        assert!("like".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_id_is_selected_exactly_once() {
        for fields in ["Name,Email", "Id,Name,Email", "Name;Id Email", "Name, Id, Id"] {
            let selected = select_fields(fields);
            assert_eq!(selected[0], "Id");
            assert_eq!(selected.iter().filter(|f| *f == "Id").count(), 1, "{fields}");
        }
        assert_eq!(select_fields("Name; Email"), vec!["Id", "Name", "Email"]);
    }

    #[test]
    fn test_expand_paths_are_distinct() {
        assert_eq!(
            expand_paths("Name,Owner/Name,Owner/Email,Account/Type/Name"),
            vec!["Owner", "Account/Type"]
        );
        assert!(expand_paths("Name,Email").is_empty());
    }

    #[test]
    fn test_query_url() {
        let url = ODataQuery::new("Contact")
            .select("Name,Owner/Name,Owner/Email")
            .filter("Name eq 'Jane'")
            .skip(40)
            .to_url(ROOT);

        assert_eq!(
            url,
            format!(
                "{ROOT}ContactCollection?$select=Id%2CName%2COwner%2FName%2COwner%2FEmail\
                 &$filter=Name%20eq%20%27Jane%27&$skip=40&$expand=Owner"
            )
        );
    }

    #[test]
    fn test_plain_collection_url() {
        let url = ODataQuery::new("Contact").filter("").skip(0).select("").to_url(ROOT);
        assert_eq!(url, format!("{ROOT}ContactCollection"));
    }

    #[test]
    fn test_count_query() {
        let url = ODataQuery::new("Contact")
            .inline_count()
            .select("Id")
            .top(1)
            .to_url(ROOT);
        assert_eq!(
            url,
            format!("{ROOT}ContactCollection?$select=Id&$top=1&$inlinecount=allpages")
        );
    }
}

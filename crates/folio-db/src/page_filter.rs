//! Page search filter query builder.
//!
//! Turns a [`PageSearchRequest`] into a parameterized WHERE clause fragment
//! over the `page` table (aliased `p`).

use folio_core::PageSearchRequest;

use crate::escape_like;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Single string parameter.
    String(String),
    /// Array of strings (for ANY and overlap operations).
    StringArray(Vec<String>),
}

/// Numeric sort key for a page number; non-numeric values sort as 0.
///
/// Mirrors `folio_core::page_number_value`: optional sign, at most
/// `PAGE_NUMBER_MAX_DIGITS` digits.
pub const PAGE_NUMBER_SORT_EXPR: &str =
    r"CASE WHEN p.page_number ~ '^\s*[+-]?[0-9]{1,18}\s*$' THEN btrim(p.page_number, E' \t\n\r')::bigint ELSE 0 END";

/// Generates SQL WHERE clause fragments for page search.
///
/// # Example
///
/// ```rust,ignore
/// use folio_db::page_filter::PageFilterQueryBuilder;
///
/// let request = PageSearchRequest { volume: vec!["Log Book 3".into()], ..Default::default() };
/// let (sql, params) = PageFilterQueryBuilder::new(&request, 0).build();
/// // sql: "p.volume_title = ANY($1::text[])"
/// ```
pub struct PageFilterQueryBuilder<'a> {
    request: &'a PageSearchRequest,
    param_offset: usize,
}

impl<'a> PageFilterQueryBuilder<'a> {
    /// Maximum number of values across all filter lists.
    const MAX_FILTER_ELEMENTS: usize = 1000;

    /// `param_offset` is the number of parameters already in the query.
    pub fn new(request: &'a PageSearchRequest, param_offset: usize) -> Self {
        Self {
            request,
            param_offset,
        }
    }

    /// Build the WHERE fragment and its parameters, in binding order.
    ///
    /// An empty request yields `("TRUE", [])`; an oversized one matches
    /// nothing.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let r = self.request;
        let total_elements = r.volume.len()
            + r.page_number.len()
            + r.date.len()
            + r.topics.len()
            + r.keywords.len();
        if total_elements > Self::MAX_FILTER_ELEMENTS {
            return ("FALSE".to_string(), vec![]);
        }

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        if !r.volume.is_empty() {
            param_idx += 1;
            clauses.push(format!("p.volume_title = ANY(${}::text[])", param_idx));
            params.push(QueryParam::StringArray(r.volume.clone()));
        }

        if !r.page_number.is_empty() {
            param_idx += 1;
            clauses.push(format!("trim(p.page_number) = ANY(${}::text[])", param_idx));
            params.push(QueryParam::StringArray(r.page_number.clone()));
        }

        if !r.date.is_empty() {
            param_idx += 1;
            clauses.push(format!("p.date = ANY(${}::text[])", param_idx));
            params.push(QueryParam::StringArray(r.date.clone()));
        }

        if !r.topics.is_empty() {
            param_idx += 1;
            clauses.push(format!("p.topics && ${}::text[]", param_idx));
            params.push(QueryParam::StringArray(r.topics.clone()));
        }

        // Any keyword may match, in either the keyword field or the page text
        if !r.keywords.is_empty() {
            param_idx += 1;
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM unnest(${}::text[]) AS k WHERE p.keywords ILIKE '%' || k || '%' ESCAPE '\\' OR p.text ILIKE '%' || k || '%' ESCAPE '\\')",
                param_idx
            ));
            params.push(QueryParam::StringArray(
                r.keywords.iter().map(|k| escape_like(k)).collect(),
            ));
        }

        if let Some(year) = &r.year {
            param_idx += 1;
            clauses.push(format!(
                "p.date LIKE '%' || ${}::text || '%' ESCAPE '\\'",
                param_idx
            ));
            params.push(QueryParam::String(escape_like(year)));
        }

        let sql = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };

        (sql, params)
    }
}

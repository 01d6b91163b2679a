use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;
use crate::filter::FilterData;

/// Parses a path id, naming the resource in the error ("Invalid building ID").
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}

pub fn parse_coordinate(raw: &str, name: &str) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::bad_request(format!("Invalid {}: {}", name, raw)))
}

/// Validated paging window. The row offset always fits the SQL `OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
    offset: i32,
}

impl Page {
    pub fn from_query(page: Option<u32>, limit: Option<u32>, max: u32) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::field("page", "Page must be a positive integer"));
        }
        let limit = limit.unwrap_or(config::config().api.default_page_size.min(max));
        if limit < 1 || limit > max {
            return Err(ApiError::field("limit", format!("Limit must be between 1 and {}", max)));
        }
        let offset = (i64::from(page) - 1)
            .checked_mul(i64::from(limit))
            .and_then(|offset| i32::try_from(offset).ok())
            .ok_or_else(|| ApiError::field("page", "Page is out of range"))?;
        Ok(Self { page, limit, offset })
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }
}

/// Optional `limit` bounded by `max`.
pub fn bounded_limit(limit: Option<u32>, default: u32, max: u32) -> Result<u32, ApiError> {
    match limit {
        None => Ok(default),
        Some(n) if (1..=max).contains(&n) => Ok(n),
        Some(_) => Err(ApiError::field("limit", format!("Limit must be between 1 and {}", max))),
    }
}

/// Maps an API sort field onto a column, rejecting unknown fields.
/// `default` is the `(field, direction)` used when the query leaves them out.
pub fn sort_order(
    sort_by: Option<&str>,
    sort_order: Option<&str>,
    columns: &[(&str, &str)],
    default: (&str, &str),
) -> Result<Value, ApiError> {
    let field = sort_by.unwrap_or(default.0);
    let column = columns
        .iter()
        .find(|(api, _)| *api == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| ApiError::field("sortBy", format!("Cannot sort by {}", field)))?;
    let direction = match sort_order.unwrap_or(default.1).to_lowercase().as_str() {
        "asc" => "asc",
        "desc" => "desc",
        _ => return Err(ApiError::field("sortOrder", "Sort order must be asc or desc")),
    };
    Ok(json!({ column: direction }))
}

/// `%term%` with LIKE wildcards in the term escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term.trim().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// `$or` of case-insensitive matches of `term` across `columns`.
pub fn search_clause(term: &str, columns: &[&str]) -> Value {
    let pattern = like_pattern(term);
    Value::Array(columns.iter().map(|c| json!({ *c: { "$ilike": pattern } })).collect())
}

/// Combines a list of conditions into a filter page.
pub fn page_filter(conditions: Vec<Value>, order: Value, page: Page) -> FilterData {
    FilterData {
        where_clause: Some(json!({ "$and": conditions })),
        order: Some(order),
        limit: Some(page.limit as i32),
        offset: Some(page.offset()),
    }
}

pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_name_the_resource() {
        let err = parse_id("abc", "building").unwrap_err();
        assert_eq!(err.message(), "Invalid building ID");
        assert!(parse_id(&Uuid::new_v4().to_string(), "path").is_ok());
    }

    #[test]
    fn page_bounds() {
        assert_eq!(Page::from_query(Some(3), Some(20), 100).unwrap().offset(), 40);
        assert!(Page::from_query(Some(0), None, 100).is_err());
        assert!(Page::from_query(None, Some(101), 100).is_err());
        assert!(Page::from_query(Some(30_000_000), Some(100), 100).is_err());
        assert!(Page::from_query(Some(u32::MAX), Some(100), 100).is_err());
        assert_eq!(Page::from_query(Some(20_000_000), Some(100), 100).unwrap().offset(), 1_999_999_900);
        assert_eq!(bounded_limit(None, 20, 50).unwrap(), 20);
        assert!(bounded_limit(Some(51), 20, 50).is_err());
    }

    #[test]
    fn sort_fields_map_to_columns() {
        let cols = [("name", "name"), ("createdAt", "created_at")];
        let default = ("name", "asc");
        assert_eq!(sort_order(Some("createdAt"), Some("DESC"), &cols, default).unwrap(), json!({ "created_at": "desc" }));
        assert_eq!(sort_order(None, None, &cols, default).unwrap(), json!({ "name": "asc" }));
        assert_eq!(sort_order(None, None, &cols, ("createdAt", "desc")).unwrap(), json!({ "created_at": "desc" }));
        assert!(sort_order(Some("password_hash"), None, &cols, default).is_err());
        assert!(sort_order(None, Some("sideways"), &cols, default).is_err());
    }

    #[test]
    fn like_escapes_wildcards() {
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }

    #[test]
    fn coordinates_must_be_finite() {
        assert_eq!(parse_coordinate("-25.43", "latitude").unwrap(), -25.43);
        assert!(parse_coordinate("NaN", "latitude").is_err());
        assert!(parse_coordinate("north", "latitude").is_err());
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Page metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: i64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit = limit.max(1);
        let total_pages = ((total.max(0) as u64 + limit as u64 - 1) / limit as u64) as u32;
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }

    /// A single page holding every item.
    pub fn single(count: usize) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: count as i64,
            items_per_page: count as u32,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub message: Option<String>,
    pub extra: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            message: None,
            extra: Map::new(),
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::success(data)
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.extra.insert("pagination".to_string(), json!(pagination));
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.extra.insert("count".to_string(), json!(count));
        self
    }

    /// Marks the payload as sample data served while the store is down.
    pub fn fallback(mut self) -> Self {
        self.extra.insert("fallback".to_string(), Value::Bool(true));
        self.message
            .get_or_insert_with(|| "Using offline data - database unavailable".to_string());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR"
                    })),
                )
                    .into_response();
            }
        };

        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));
        envelope.insert("data".to_string(), data_value);
        if let Some(message) = self.message {
            envelope.insert("message".to_string(), Value::String(message));
        }
        envelope.extend(self.extra);

        (status, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(2, 10, 21);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let value = json!(Pagination::single(2));
        assert_eq!(
            value,
            json!({
                "currentPage": 1,
                "totalPages": 1,
                "totalItems": 2,
                "itemsPerPage": 2,
                "hasNextPage": false,
                "hasPrevPage": false
            })
        );
    }

    #[test]
    fn fallback_sets_default_message() {
        let response = ApiResponse::success(Vec::<u8>::new()).fallback();
        assert_eq!(response.extra.get("fallback"), Some(&Value::Bool(true)));
        assert_eq!(response.message.as_deref(), Some("Using offline data - database unavailable"));
    }
}

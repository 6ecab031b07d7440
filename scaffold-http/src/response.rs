//! The JSON envelopes every endpoint answers with.

use serde::Serialize;

/// `{ "error"?: string, "data"?: T }`
///
/// Both members are omitted when unset, so an empty response serializes as `{}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            error: None,
            data: Some(data),
        }
    }

    pub fn empty() -> Self {
        Self {
            error: None,
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            data: None,
        }
    }
}

/// A listing response: the envelope plus the page position.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<T>>,
    pub count: usize,
    pub page: usize,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: usize) -> Self {
        Self {
            error: None,
            count: items.len(),
            data: Some(items),
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_members_are_omitted() {
        assert_eq!(serde_json::to_value(ApiResponse::<()>::empty()).unwrap(), json!({}));
        assert_eq!(
            serde_json::to_value(ApiResponse::error("not found")).unwrap(),
            json!({ "error": "not found" })
        );
    }

    #[test]
    fn pages_carry_their_position() {
        let value = serde_json::to_value(PaginatedResponse::new(vec![1, 2], 3)).unwrap();

        assert_eq!(value, json!({ "data": [1, 2], "count": 2, "page": 3 }));
    }
}

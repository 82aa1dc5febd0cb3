use super::error::ApiError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_key: Option<String>,
}

/// Envelope shared by every endpoint except the health probe.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            meta: None,
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: None,
            meta: None,
            error: Some(error),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        let total = items.len();
        ApiResponse {
            meta: Some(Meta {
                total,
                space_key: None,
            }),
            ..ApiResponse::ok(items)
        }
    }

    /// A list scoped to one Confluence space.
    pub fn space_list(space_key: impl Into<String>, items: Vec<T>) -> Self {
        let total = items.len();
        ApiResponse {
            meta: Some(Meta {
                total,
                space_key: Some(space_key.into()),
            }),
            ..ApiResponse::ok(items)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
            meta: None,
            error: None,
        }
    }
}

use serde::Serialize;

/// Envelope for every JSON response:
///
/// ```json
/// { "success": true, "data": { ... }, "message": "Course created" }
/// ```
///
/// Failures set `success` to `false`. Their `data` is empty, except for
/// reorder failures, which carry the stored order.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error response with default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }

    /// Error response that still carries a payload.
    pub fn error_with_data(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            message: message.into(),
        }
    }
}

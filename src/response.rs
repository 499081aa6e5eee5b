use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// Success with no payload (removals, clears).
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: None,
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let resp = ApiResponse::success("OK", serde_json::json!({"n": 1}), Some(Meta::empty()));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "OK");
        assert_eq!(value["data"]["n"], 1);
    }

    #[test]
    fn empty_success_has_null_data() {
        let resp = ApiResponse::<serde_json::Value>::success_empty("Removed");
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value["data"].is_null());
        assert!(value.get("meta").is_none());
    }
}

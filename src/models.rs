//! Data models for Google Drive API responses.

use serde::Deserialize;

/// Identity of a file returned by the list query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl std::fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mime = self.mime_type.as_deref().unwrap_or("-");
        write!(f, "{} ({}) ({})", self.name, self.id, mime)
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_descriptor_deserialize() {
        let json = r#"{
            "id": "abc123",
            "name": "report.pdf",
            "mimeType": "application/pdf"
        }"#;

        let file: FileDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abc123");
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.mime_type, Some("application/pdf".to_string()));
    }

    #[test]
    fn test_file_descriptor_without_mime_type() {
        let json = r#"{"id": "abc123", "name": "mystery"}"#;

        let file: FileDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(file.mime_type, None);
    }

    #[test]
    fn test_file_descriptor_display() {
        let file = FileDescriptor {
            id: "abc123".to_string(),
            name: "notes.txt".to_string(),
            mime_type: Some("text/plain".to_string()),
        };

        assert_eq!(format!("{}", file), "notes.txt (abc123) (text/plain)");
    }

    #[test]
    fn test_file_list_response_deserialize() {
        let json = r#"{
            "files": [
                {"id": "f1", "name": "one.txt"},
                {"id": "f2", "name": "two.txt"}
            ],
            "nextPageToken": "token123"
        }"#;

        let response: FileListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.files.len(), 2);
        assert_eq!(response.next_page_token, Some("token123".to_string()));
    }

    #[test]
    fn test_file_list_response_empty() {
        let response: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.files.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn test_api_error_response_deserialize() {
        let json = r#"{
            "error": {"code": 403, "message": "Rate limit exceeded"}
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error.code, 403);
        assert_eq!(response.error.message, "Rate limit exceeded");
    }
}

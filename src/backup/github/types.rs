//! GitHub 内容 API DTO

use serde::Serialize;
use serde_json::Value;

/// 远端文件（GET /contents 的响应）
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub path: String,
    /// 版本标识，更新已有文件时必须回传
    pub sha: Option<String>,
    /// base64 内容，可能按行折断
    pub content: Option<String>,
}

impl RemoteFile {
    /// 从响应 JSON 中提取字段；目录等非文件响应没有字符串类型的 content
    pub fn from_value(path: &str, body: &Value) -> Self {
        let text = |field: &str| body.get(field).and_then(Value::as_str).map(str::to_string);
        Self {
            path: path.to_string(),
            sha: text("sha"),
            content: text("content"),
        }
    }
}

/// PUT /contents 请求体
#[derive(Debug, Clone, Serialize)]
pub struct PutContentsRequest {
    pub message: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha_is_omitted_when_absent() {
        let body = serde_json::to_value(PutContentsRequest {
            message: "Update tokens.json - 2025-01-01 00:00:00".to_string(),
            content: "W10=".to_string(),
            sha: None,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"message": "Update tokens.json - 2025-01-01 00:00:00", "content": "W10="})
        );
    }

    #[test]
    fn directory_listing_has_no_content() {
        let file = RemoteFile::from_value("tokens.json", &json!([{"name": "a"}]));
        assert_eq!(file.sha, None);
        assert_eq!(file.content, None);

        let file = RemoteFile::from_value("tokens.json", &json!({"sha": "abc", "content": 5}));
        assert_eq!(file.sha.as_deref(), Some("abc"));
        assert_eq!(file.content, None);
    }
}

//! 配置模块，负责从JSON文件加载请求配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{parse_options, DocumentError};
use crate::query::{build_query_string, build_url, QueryOptions};

/// 请求配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置文件 {path} 中的查询无效: {source}")]
    Query {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// 请求配置结构
///
/// ```text
/// {
///   "baseUrl": "https://example.com/People",
///   "query": { "filter": { "name": "John" }, "top": 10 }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// 没有基础URL时只输出查询字符串
    #[serde(default)]
    pub base_url: Option<String>,
    /// 查询文档, 格式见 `document` 模块
    #[serde(default)]
    pub query: serde_json::Value,
}

impl RequestConfig {
    /// 从JSON文件加载请求配置, 并校验其中的查询文档
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        let config: RequestConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path_ref.to_path_buf(),
                source,
            })?;

        config.options().map_err(|source| ConfigError::Query {
            path: path_ref.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path_ref.display(), "loaded request config");
        Ok(config)
    }

    /// 解析查询文档, 缺省时返回空选项
    pub fn options(&self) -> Result<QueryOptions, DocumentError> {
        if self.query.is_null() {
            return Ok(QueryOptions::default());
        }
        parse_options(&self.query)
    }

    /// 生成完整URL, 或在没有基础URL时生成查询字符串
    pub fn build(&self) -> Result<String, DocumentError> {
        let options = self.options()?;
        Ok(match &self.base_url {
            Some(base_url) => build_url(base_url, Some(&options)),
            None => build_query_string(&options),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_valid_json_config() {
        let file = write_temp(
            r#"{
                "baseUrl": "https://example.com",
                "query": {
                    "filter": {"name": "John", "age": ["ge", 20]},
                    "orderBy": ["name", "asc"]
                }
            }"#,
        );

        let config = RequestConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(
            config.build().unwrap(),
            "https://example.com?$filter=(name eq 'John') and (age ge 20)&$orderby=name asc"
        );
    }

    #[test]
    fn test_without_base_url_builds_query_string() {
        let file = write_temp(r#"{"query": {"top": 5, "skip": 10}}"#);
        let config = RequestConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.build().unwrap(), "$top=5&$skip=10");
    }

    #[test]
    fn test_missing_query_is_empty() {
        let file = write_temp(r#"{"baseUrl": "https://x"}"#);
        let config = RequestConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.build().unwrap(), "https://x");
    }

    #[test]
    fn test_invalid_json_config() {
        let file = write_temp("invalid json");
        let result = RequestConfig::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_query_in_config() {
        let file = write_temp(r#"{"query": {"top": "ten"}}"#);
        let result = RequestConfig::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Query { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = RequestConfig::from_json_file("non_existent_file.json");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, AppResult, FileError};
use crate::models::request::BaseQuestionRequest;

/// 支持的请求文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestFormat {
    Json,
    Toml,
}

impl RequestFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Some(RequestFormat::Json),
            Some("toml") => Some(RequestFormat::Toml),
            _ => None,
        }
    }
}

/// 从 JSON 或 TOML 文件加载生成请求
pub async fn load_request(path: &Path) -> AppResult<BaseQuestionRequest> {
    let format = RequestFormat::from_path(path).ok_or_else(|| FileError::UnsupportedFormat {
        path: path.display().to_string(),
    })?;

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let parse_failed = |message: String| FileError::ParseFailed {
        path: path.display().to_string(),
        message,
    };

    let request = match format {
        RequestFormat::Json => {
            serde_json::from_str(&content).map_err(|e| parse_failed(e.to_string()))?
        }
        RequestFormat::Toml => toml::from_str(&content).map_err(|e| parse_failed(e.to_string()))?,
    };

    Ok(request)
}

/// 从文件夹中加载所有请求文件，单个文件失败只记录警告
pub async fn load_all_requests(folder: &Path) -> AppResult<Vec<(PathBuf, BaseQuestionRequest)>> {
    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder.display().to_string(), e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder.display().to_string(), e))?
    {
        let path = entry.path();
        if RequestFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到请求文件", folder.display());
    }

    let mut requests = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        match load_request(&path).await {
            Ok(request) => requests.push((path, request)),
            Err(e) => tracing::warn!("加载文件失败 {}: {}", path.display(), e),
        }
    }

    Ok(requests)
}

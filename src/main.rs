use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::{json, Value as JsonValue};
use tracing::{error, info};

use copy_questions::utils::logging::{log_startup, print_final_stats};
use copy_questions::{
    load_all_requests, load_request, logger, AppResult, BaseQuestionRequest, Config,
    GeneratedQuestion, QuestionFlow,
};

const USAGE: &str = "usage: copy_questions <request.json|request.toml|request-folder>";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 加载配置
    let config = Config::reload();

    // 初始化日志
    logger::init(config.verbose_logging);

    let path = std::env::args().nth(1).map(PathBuf::from).context(USAGE)?;

    let (output, all_ok) = if path.is_dir() {
        run_folder(&path).await?
    } else {
        run_single(&path).await
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("无法序列化输出")?
    );

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// 处理单个请求文件
async fn run_single(path: &Path) -> (JsonValue, bool) {
    let result = match load_request(path).await {
        Ok(request) => generate(&request).await,
        Err(e) => Err(e),
    };
    response_body(result)
}

/// 依次处理文件夹中的全部请求文件
async fn run_folder(folder: &Path) -> Result<(JsonValue, bool)> {
    let requests = load_all_requests(folder)
        .await
        .with_context(|| format!("无法加载请求文件夹: {}", folder.display()))?;
    log_startup(requests.len());

    let mut results = Vec::with_capacity(requests.len());
    let mut success = 0;
    for (path, request) in &requests {
        info!("📄 处理请求: {}", path.display());
        let (mut body, ok) = response_body(generate(request).await);
        if ok {
            success += 1;
        }
        body["file"] = json!(path.display().to_string());
        results.push(body);
    }

    print_final_stats(success, requests.len() - success, requests.len());
    Ok((json!({ "results": results }), success == requests.len()))
}

/// 每个请求都重新读取配置，使 .env 中轮换的 API Key 立即生效
async fn generate(request: &BaseQuestionRequest) -> AppResult<Vec<GeneratedQuestion>> {
    let config = Config::reload();
    let flow = QuestionFlow::from_config(&config).await?;
    flow.run(request).await
}

fn response_body(result: AppResult<Vec<GeneratedQuestion>>) -> (JsonValue, bool) {
    match result {
        Ok(questions) => (json!({ "questions": questions }), true),
        Err(e) => {
            error!("❌ 生成失败: {}", e);
            (
                json!({ "error": e.to_string(), "status": e.status_code() }),
                false,
            )
        }
    }
}

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use odata_query_builder::config::RequestConfig;
use odata_query_builder::document::parse_options_str;
use odata_query_builder::query::{append_query, assemble_with_diagnostics};

const ENV_LOG: &str = "ODATA_QB_LOG";

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    match std::env::args().nth(1) {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

/// 读取请求配置文件并输出生成的URL
fn run_file(path: &str) -> Result<()> {
    let config = RequestConfig::from_json_file(path)
        .with_context(|| format!("加载请求配置失败: {}", path))?;
    let url = config.build().context("生成查询失败")?;
    println!("{}", url);
    Ok(())
}

/// 交互模式: 每行输入一个JSON查询文档
fn run_repl() -> Result<()> {
    println!("--- OData 查询构建器 ---");
    println!("输入 JSON 查询文档, 例如: {{\"filter\": {{\"name\": \"John\"}}, \"top\": 10}}");
    println!("命令: :base <url> 设置基础URL, :base 清除, :quit 退出\n");

    let mut editor = DefaultEditor::new().context("无法初始化行编辑器")?;
    let mut base_url: Option<String> = None;

    loop {
        match editor.readline("odata> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(line) {
                    tracing::debug!(error = %e, "failed to record history entry");
                }

                if line == ":quit" || line == ":q" {
                    break;
                }
                if let Some(rest) = line.strip_prefix(":base") {
                    let rest = rest.trim();
                    base_url = (!rest.is_empty()).then(|| rest.to_string());
                    match &base_url {
                        Some(url) => println!("基础URL: {}", url),
                        None => println!("已清除基础URL"),
                    }
                    continue;
                }

                evaluate(line, base_url.as_deref());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("读取输入失败"),
        }
    }

    Ok(())
}

fn evaluate(line: &str, base_url: Option<&str>) {
    let options = match parse_options_str(line) {
        Ok(options) => options,
        Err(e) => {
            println!("✗ 解析失败: {}", e);
            return;
        }
    };

    let result = assemble_with_diagnostics(&options);
    for diagnostic in &result.diagnostics {
        println!("⚠️ {}", diagnostic);
    }

    let output = match base_url {
        Some(url) => append_query(url, &result.query),
        None => result.query,
    };
    println!("{}", output);
}

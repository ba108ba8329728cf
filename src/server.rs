//! Line-delimited JSON tool server.
//!
//! Each input line is one request:
//!
//! ```json
//! {"id": 1, "tool": "crawl_news_article", "arguments": {"url": "https://..."}}
//! {"id": 2, "method": "list_tools"}
//! ```
//!
//! and produces exactly one output line `{"id": ..., "result": ...}`.
//! Logging goes to stderr, so stdout carries responses only.

use crate::crawler::NewsCrawler;
use crate::error::CrawlError;
use crate::models::ArticleResult;
use crate::session::PageSource;
use crate::tools;
use crate::utils::truncate_for_log;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    tool: Option<String>,
    method: Option<String>,
    #[serde(default)]
    arguments: Value,
}

fn invalid_request(message: String) -> Value {
    serde_json::to_value(ArticleResult::failure("", &CrawlError::Validation(message)))
        .unwrap_or_else(|_| json!({ "success": false }))
}

/// Answer one request line.
pub async fn handle_line<S: PageSource>(crawler: &NewsCrawler<'_, S>, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, line = %truncate_for_log(line, 200), "Malformed request");
            return json!({ "id": Value::Null, "result": invalid_request(format!("malformed request: {e}")) });
        }
    };

    let result = match (request.tool.as_deref(), request.method.as_deref()) {
        (Some(tool), _) => tools::call(crawler, tool, request.arguments).await,
        (None, Some("list_tools")) => tools::tool_definitions(),
        (None, Some(method)) => invalid_request(format!("unknown method: {method}")),
        (None, None) => invalid_request("request needs a 'tool' or 'method'".to_string()),
    };
    json!({ "id": request.id, "result": result })
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
#[instrument(level = "info", skip_all)]
pub async fn serve<S, R, W>(crawler: &NewsCrawler<'_, S>, reader: R, mut writer: W) -> io::Result<()>
where
    S: PageSource,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0usize;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(crawler, &line).await;
        let mut encoded = response.to_string();
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
        debug!(handled, "Wrote response");
    }
    info!(handled, "Input closed; stopping server");
    Ok(())
}

/// Serve on the process's stdin/stdout.
pub async fn serve_stdio<S: PageSource>(crawler: &NewsCrawler<'_, S>) -> io::Result<()> {
    info!("Serving tools on stdio");
    serve(crawler, BufReader::new(io::stdin()), io::stdout()).await
}

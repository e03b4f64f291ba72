//! Static file serving module
//!
//! Serves the modeler front end out of the data directory: path cleaning
//! and canonicalization against traversal, index-file fallback, MIME
//! lookup, conditional GET and single-range responses.

use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;

/// Serve one static asset request
pub async fn serve(
    ctx: &RequestContext<'_>,
    data_dir: &Path,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    match load(data_dir, ctx.path, index_files).await {
        Some((content, content_type)) => build_response(&content, content_type, ctx),
        None => http::build_404_response(),
    }
}

/// Resolve and read the file backing a URL path
///
/// Returns None for anything that should surface as 404: missing files,
/// unreadable files, and paths that escape the data directory.
async fn load(
    data_dir: &Path,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and neutralize parent-directory segments
    let clean_path = path.trim_start_matches('/').replace("..", "");
    let mut file_path = data_dir.join(&clean_path);

    let Ok(data_dir_canonical) = data_dir.canonicalize() else {
        logger::log_warning(&format!(
            "Data directory not found or inaccessible: '{}'",
            data_dir.display()
        ));
        return None;
    };

    // Directory targets fall back to index files
    if file_path.is_dir() || clean_path.is_empty() || clean_path.ends_with('/') {
        if let Some(index) = pick_index_file(&file_path, index_files) {
            file_path = index;
        }
    }

    // Missing files are an ordinary 404, not worth a log line
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&data_dir_canonical) {
        logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path_canonical.display()
            ));
            return None;
        }
    };

    let content_type =
        mime::content_type_for(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

fn pick_index_file(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    index_files
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Build the asset response honoring conditional and range headers
fn build_response(
    data: &[u8],
    content_type: &'static str,
    ctx: &RequestContext<'_>,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    let total_size = data.len();

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);

            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data[start..=end].to_vec())
            };

            http::response::build_partial_response(
                body,
                content_type,
                &etag,
                start,
                end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => {
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data.to_owned())
            };
            http::response::build_cached_response(body, content_type, &etag, ctx.is_head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use tempfile::tempdir;

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string()]
    }

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            is_head: false,
            if_none_match: None,
            range_header: None,
        }
    }

    #[tokio::test]
    async fn test_load_serves_asset_with_content_type() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("app.js"), "console.log(1);").expect("write");

        let (content, content_type) = load(dir.path(), "/app.js", &index_files())
            .await
            .expect("asset found");
        assert_eq!(content, b"console.log(1);");
        assert_eq!(content_type, "application/javascript");
    }

    #[tokio::test]
    async fn test_root_falls_back_to_index_file() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<html></html>").expect("write");

        let (content, content_type) = load(dir.path(), "/", &index_files())
            .await
            .expect("index found");
        assert_eq!(content, b"<html></html>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempdir().expect("tempdir");
        assert!(load(dir.path(), "/nope.css", &index_files()).await.is_none());
    }

    #[tokio::test]
    async fn test_traversal_cannot_escape_data_dir() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<html></html>").expect("write");

        assert!(load(dir.path(), "/../../etc/passwd", &index_files())
            .await
            .is_none());
        assert!(load(dir.path(), "/..%2F..%2Fetc/passwd", &index_files())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_conditional_get_yields_304() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("style.css"), "body{}").expect("write");

        let first = serve(&ctx("/style.css"), dir.path(), &index_files()).await;
        assert_eq!(first.status(), StatusCode::OK);
        let etag = first
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .expect("etag present")
            .to_string();

        let conditional = RequestContext {
            path: "/style.css",
            is_head: false,
            if_none_match: Some(etag),
            range_header: None,
        };
        let second = serve(&conditional, dir.path(), &index_files()).await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_range_request_yields_206() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("bundle.js"), "0123456789").expect("write");

        let ranged = RequestContext {
            path: "/bundle.js",
            is_head: false,
            if_none_match: None,
            range_header: Some("bytes=0-3".to_string()),
        };
        let resp = serve(&ranged, dir.path(), &index_files()).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers()
                .get("Content-Range")
                .and_then(|v| v.to_str().ok()),
            Some("bytes 0-3/10")
        );
    }
}

//! Diagram resource module
//!
//! Read and write of the single current diagram. Every response from this
//! endpoint carries the permissive CORS header set so the modeler front end
//! can talk to it from any origin.

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};

use crate::http::response;
use crate::logger;
use crate::storage::{DiagramStore, StoreError};

/// GET: stream the current diagram verbatim
pub async fn fetch(store: &DiagramStore) -> Response<Full<Bytes>> {
    match store.load().await {
        Ok(content) => response::build_diagram_xml_response(Bytes::from(content)),
        Err(StoreError::NotFound) => {
            response::build_diagram_error_response(StatusCode::NOT_FOUND, "No diagram found")
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read diagram: {e}"));
            response::build_diagram_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading diagram",
            )
        }
    }
}

/// POST: collect the raw body and persist it as the new diagram
///
/// The body is not validated; whatever bytes arrive become the diagram.
pub async fn save(req: Request<Incoming>, store: &DiagramStore) -> Response<Full<Bytes>> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read diagram request body: {e}"));
            return response::build_diagram_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading request body",
            );
        }
    };

    store_body(store, &body).await
}

/// Persist collected body bytes (split out of [`save`] for testability)
pub async fn store_body(store: &DiagramStore, body: &[u8]) -> Response<Full<Bytes>> {
    match store.save(body).await {
        Ok(()) => response::build_diagram_saved_response(),
        Err(e) => {
            logger::log_error(&format!("Failed to save diagram: {e}"));
            response::build_diagram_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error saving diagram",
            )
        }
    }
}

/// OPTIONS: CORS preflight
pub fn preflight() -> Response<Full<Bytes>> {
    response::build_diagram_preflight_response()
}

/// Any method other than GET/POST/OPTIONS
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    response::build_diagram_error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;
    use tempfile::{tempdir, TempDir};

    fn file_store(dir: &TempDir) -> DiagramStore {
        DiagramStore::file_only(FileStore::new(
            dir.path().to_str().expect("utf-8 path"),
            "diagram.bpmn",
        ))
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body()
            .collect()
            .await
            .expect("infallible body")
            .to_bytes()
    }

    fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_fetch_without_diagram_is_404() {
        let dir = tempdir().expect("tempdir");
        let store = file_store(&dir);

        let resp = fetch(&store).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"No diagram found"));
    }

    #[tokio::test]
    async fn test_store_then_fetch_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = file_store(&dir);

        let xml = b"<bpmn:definitions xmlns:bpmn=\"x\"/>";
        let resp = store_body(&store, xml).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_bytes(resp).await,
            Bytes::from_static(b"Diagram saved successfully")
        );

        let resp = fetch(&store).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            header(&resp, "Content-Type"),
            Some("application/xml; charset=utf-8")
        );
        assert_eq!(body_bytes(resp).await, Bytes::copy_from_slice(xml));
    }

    #[tokio::test]
    async fn test_fetch_serves_fallback_bpmn_file() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("other.bpmn"), "<other/>").expect("write");
        let store = file_store(&dir);

        let resp = fetch(&store).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"<other/>"));
    }

    #[tokio::test]
    async fn test_preflight_is_empty_200_with_cors() {
        let resp = preflight();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            header(&resp, "Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(
            header(&resp, "Access-Control-Allow-Headers"),
            Some("Content-Type, Authorization")
        );
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_405_with_cors() {
        let resp = method_not_allowed();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"Method not allowed"));
    }

    #[tokio::test]
    async fn test_save_failure_reports_500() {
        let dir = tempdir().expect("tempdir");
        // Point the store at a directory that does not exist so the write fails
        let store = DiagramStore::file_only(FileStore::new(
            dir.path().join("missing").to_str().expect("utf-8 path"),
            "diagram.bpmn",
        ));

        let resp = store_body(&store, b"<x/>").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"Error saving diagram"));
    }
}

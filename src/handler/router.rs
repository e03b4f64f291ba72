//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Dispatch is driven by an
//! explicit (method, path) routing table so the contract is testable
//! without a socket.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::{Method, Request, Response, StatusCode, Version};

use crate::config::{AppState, RoutesConfig};
use crate::handler::{diagram, static_files};
use crate::http::{self, response};
use crate::logger::{self, AccessLogEntry};

/// The single diagram resource path
pub const DIAGRAM_PATH: &str = "/diagram";

/// Request context handed to the static file component
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Operations on the diagram resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramAction {
    Fetch,
    Save,
    Preflight,
    MethodNotAllowed,
}

/// Outcome of the routing table for one (method, path) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Diagram(DiagramAction),
    Health,
    StaticAsset { is_head: bool },
    Options,
    MethodNotAllowed,
}

/// Map (method, path) to the handler that owns the request
pub fn resolve_route(method: &Method, path: &str, routes: &RoutesConfig) -> RouteDecision {
    if path == DIAGRAM_PATH {
        return RouteDecision::Diagram(match *method {
            Method::GET => DiagramAction::Fetch,
            Method::POST => DiagramAction::Save,
            Method::OPTIONS => DiagramAction::Preflight,
            _ => DiagramAction::MethodNotAllowed,
        });
    }

    if routes.health.enabled
        && path == routes.health.liveness_path
        && (*method == Method::GET || *method == Method::HEAD)
    {
        return RouteDecision::Health;
    }

    match *method {
        Method::GET => RouteDecision::StaticAsset { is_head: false },
        Method::HEAD => RouteDecision::StaticAsset { is_head: true },
        Method::OPTIONS => RouteDecision::Options,
        _ => RouteDecision::MethodNotAllowed,
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);

    // Captured up front, the POST arm consumes the request below
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_label(req.version());
    let referer = header_value(&req, "referer");
    let user_agent = header_value(&req, "user-agent");

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let response = match check_body_size(&req, state.config.http.max_body_size) {
        Some(resp) => resp,
        None => dispatch(req, &state).await,
    };

    if access_log {
        let mut entry = AccessLogEntry::new(peer_addr.to_string(), method, path);
        entry.query = query;
        entry.http_version = http_version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route the request to its handler
async fn dispatch(req: Request<Incoming>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let decision = resolve_route(req.method(), req.uri().path(), &state.config.routes);

    match decision {
        RouteDecision::Diagram(DiagramAction::Save) => diagram::save(req, &state.store).await,
        RouteDecision::Diagram(DiagramAction::Fetch) => diagram::fetch(&state.store).await,
        RouteDecision::Diagram(DiagramAction::Preflight) => diagram::preflight(),
        RouteDecision::Diagram(DiagramAction::MethodNotAllowed) => diagram::method_not_allowed(),
        RouteDecision::Health => http::build_health_response("ok"),
        RouteDecision::StaticAsset { is_head } => {
            let ctx = RequestContext {
                path: req.uri().path(),
                is_head,
                if_none_match: header_value(&req, "if-none-match"),
                range_header: header_value(&req, "range"),
            };
            static_files::serve(
                &ctx,
                state.store.files().data_dir(),
                &state.config.routes.index_files,
            )
            .await
        }
        RouteDecision::Options => http::build_options_response(),
        RouteDecision::MethodNotAllowed => {
            logger::log_warning(&format!("Method not allowed: {}", req.method()));
            http::build_405_response()
        }
    }
}

/// Validate the Content-Length header and reject oversized bodies early
fn check_body_size(req: &Request<Incoming>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let size_str = content_length.to_str().ok().or_else(|| {
        logger::log_warning("Content-Length header contains non-ASCII characters");
        None
    })?;

    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            // The diagram endpoint promises CORS headers on every response
            if req.uri().path() == DIAGRAM_PATH {
                Some(response::build_diagram_error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Payload too large",
                ))
            } else {
                Some(http::build_413_response())
            }
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

fn header_value(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> RoutesConfig {
        RoutesConfig::default()
    }

    #[test]
    fn test_diagram_method_dispatch() {
        let routes = routes();
        assert_eq!(
            resolve_route(&Method::GET, "/diagram", &routes),
            RouteDecision::Diagram(DiagramAction::Fetch)
        );
        assert_eq!(
            resolve_route(&Method::POST, "/diagram", &routes),
            RouteDecision::Diagram(DiagramAction::Save)
        );
        assert_eq!(
            resolve_route(&Method::OPTIONS, "/diagram", &routes),
            RouteDecision::Diagram(DiagramAction::Preflight)
        );
    }

    #[test]
    fn test_diagram_rejects_other_methods() {
        let routes = routes();
        for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            assert_eq!(
                resolve_route(&method, "/diagram", &routes),
                RouteDecision::Diagram(DiagramAction::MethodNotAllowed),
                "{method} should not reach a diagram handler"
            );
        }
    }

    #[test]
    fn test_everything_else_is_static() {
        let routes = routes();
        assert_eq!(
            resolve_route(&Method::GET, "/", &routes),
            RouteDecision::StaticAsset { is_head: false }
        );
        assert_eq!(
            resolve_route(&Method::GET, "/app.js", &routes),
            RouteDecision::StaticAsset { is_head: false }
        );
        assert_eq!(
            resolve_route(&Method::HEAD, "/index.html", &routes),
            RouteDecision::StaticAsset { is_head: true }
        );
        assert_eq!(
            resolve_route(&Method::POST, "/app.js", &routes),
            RouteDecision::MethodNotAllowed
        );
        assert_eq!(
            resolve_route(&Method::OPTIONS, "/app.js", &routes),
            RouteDecision::Options
        );
    }

    #[test]
    fn test_health_route() {
        let mut routes = routes();
        assert_eq!(
            resolve_route(&Method::GET, "/healthz", &routes),
            RouteDecision::Health
        );
        // POST to the probe path is not a probe
        assert_eq!(
            resolve_route(&Method::POST, "/healthz", &routes),
            RouteDecision::MethodNotAllowed
        );

        routes.health.enabled = false;
        assert_eq!(
            resolve_route(&Method::GET, "/healthz", &routes),
            RouteDecision::StaticAsset { is_head: false }
        );
    }

    #[test]
    fn test_diagram_subpaths_are_static() {
        let routes = routes();
        assert_eq!(
            resolve_route(&Method::GET, "/diagram.bpmn", &routes),
            RouteDecision::StaticAsset { is_head: false }
        );
        assert_eq!(
            resolve_route(&Method::GET, "/diagram/x", &routes),
            RouteDecision::StaticAsset { is_head: false }
        );
    }
}

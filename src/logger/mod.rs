//! Logger module
//!
//! Logging for the diagram server: lifecycle messages, warnings and errors
//! on stderr, access log lines on stdout in a configurable format.

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    println!("======================================");
    println!("BPMN diagram server started");
    println!("Listening on: http://{addr}");
    println!("Log level: {}", config.logging.level);
    println!("Data directory: {}", config.storage.data_dir);
    if config.storage.database_url.is_some() {
        println!("Storage: PostgreSQL with file mirror");
    } else {
        println!("Storage: file ({})", config.storage.diagram_file);
    }
    if let Some(workers) = config.server.workers {
        println!("Worker threads: {workers}");
    }
    println!("Using Tokio runtime for concurrency");
    println!("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    println!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        println!("[Headers] Count: {count}");
    }
}

/// Log a formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    println!("{}", entry.format(format));
}

pub fn log_shutdown() {
    println!("\n[Shutdown] Stop signal received, closing listener");
    println!("[Shutdown] In-flight connections will finish in the background");
}

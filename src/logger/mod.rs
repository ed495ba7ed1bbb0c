//! Logger module
//!
//! Provides logging utilities for the image host including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Storage events (uploads, deletions)
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, upload_dir: &std::path::Path) {
    write_info("======================================");
    write_info("Image host started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Upload directory: {}", upload_dir.display()));
    write_info(&format!(
        "Static files: {}/<filename>",
        config.storage.public_prefix
    ));
    write_info(&format!(
        "Max upload size: {} bytes",
        config.upload.max_body_size
    ));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(max) = config.performance.max_connections {
        write_info(&format!("Max connections: {max}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    match writer::get() {
        Some(w) => w.write_access(&entry.format(format)),
        None => println!("{}", entry.format(format)),
    }
}

pub fn log_image_stored(filename: &str, original_name: &str, size_bytes: u64) {
    write_info(&format!(
        "[UPLOAD] {original_name} -> {filename} ({size_bytes} bytes)"
    ));
}

pub fn log_image_deleted(filename: &str) {
    write_info(&format!("[DELETE] {filename}"));
}

pub fn log_shutdown(active_connections: usize) {
    write_info(&format!(
        "\n[SHUTDOWN] Stopped accepting connections, {active_connections} still active"
    ));
}

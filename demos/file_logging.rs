//! File logging example
//!
//! Demonstrates logging to console and a rotating JSON-lines file at the
//! same time.
//!
//! Run with: cargo run --example file_logging

use rust_structured_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Structured Logger - File Logging Example ===\n");

    let policy = RotationPolicy::new()
        .with_max_size(64 * 1024)
        .with_max_files(3)
        .with_compression(true);

    let logger = StructuredLogger::builder()
        .transport(ConsoleTransport::new())
        .transport(FileTransport::with_policy("logs/application.log", policy)?)
        .environment("production")
        .build();

    println!("1. Logging to both console and file:");
    logger.info("Application started");
    logger.debug("Loading configuration... (hidden at INFO)");
    logger.warn("Using default settings for some options");

    println!("\n2. Performing some operations:");
    let worker = logger.with_context(LogContext::new().with_component("importer"));
    for i in 1..=5 {
        worker
            .entry(LogLevel::Info, format!("Processing item {}/5", i))
            .field("item", i)
            .tag("import")
            .log();
    }

    logger.flush()?;
    logger.shutdown()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/application.log' for the full log output");

    Ok(())
}

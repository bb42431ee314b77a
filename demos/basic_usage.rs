//! Basic logger usage example
//!
//! Demonstrates level gating, derived loggers with request context,
//! redaction and an operation timer on the console transport.
//!
//! Run with: cargo run --example basic_usage

use rust_structured_logger::prelude::*;
use rust_structured_logger::info;

fn main() -> Result<()> {
    println!("=== Rust Structured Logger - Basic Usage Example ===\n");

    let logger = StructuredLogger::builder()
        .min_level(LogLevel::Debug)
        .transport(ConsoleTransport::pretty())
        .environment("development")
        .version(env!("CARGO_PKG_VERSION"))
        .build();

    println!("1. Logging at different levels (TRACE is below the threshold):");
    logger.trace("This is a trace message (hidden)");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");

    println!("\n2. Derived logger carrying request context:");
    let request = logger.with_context(
        LogContext::new()
            .with_request_id("req-1024")
            .with_user_id("user-7")
            .with_component("checkout"),
    );
    info!(request, "Cart contains {} items", 3);

    println!("\n3. Secrets are redacted before any transport sees them:");
    request.log_with_context(
        LogLevel::Info,
        "Login with password=hunter2",
        LogContext::new().with_metadata("apiKey", "sk-live-123"),
    );

    println!("\n4. Timing an operation:");
    let timer = request.create_timer("charge_card");
    std::thread::sleep(std::time::Duration::from_millis(25));
    timer.info("Card authorized", LogContext::new());
    timer.end();

    println!("\n5. Logging an error value:");
    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "payment gateway timeout");
    request.error_with_source("Charge failed", &err, LogContext::new());

    logger.shutdown()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}

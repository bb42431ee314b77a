//! Remote logging example
//!
//! Builds the pipeline from environment variables. Set `LOG_REMOTE=true` and
//! `LOG_REMOTE_ENDPOINT` to ship batches to a collector; without them only
//! the console transport is active.
//!
//! Run with: LOG_REMOTE=true LOG_REMOTE_ENDPOINT=http://localhost:8080/logs cargo run --example remote_logging

use rust_structured_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Structured Logger - Remote Logging Example ===\n");

    let config = LoggerConfig::from_env()?;
    println!(
        "remote enabled: {}, batch size: {}, flush interval: {}ms\n",
        config.remote.enabled, config.remote.batch_size, config.remote.flush_interval_ms
    );

    let logger = config.build_logger()?;
    for i in 0..250 {
        logger.log_with_context(
            LogLevel::Info,
            format!("event {}", i),
            LogContext::new().with_metadata("sequence", i),
        );
    }

    // Remaining buffered entries are sent before shutdown returns
    logger.shutdown()?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}

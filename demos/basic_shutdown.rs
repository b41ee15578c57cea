//! Runs a ticking worker until Ctrl-C (or 3 seconds), then drains cleanups.
//!
//! ```text
//! cargo run --example basic_shutdown
//! ```

use std::time::Duration;

use closer::{Closer, TaskError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let closer = Closer::new();

    closer.to_close(|_deadline| async move {
        println!("[cleanup] database pool closed");
        Ok(())
    });
    closer.to_close_named("http server", |deadline| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(200)) => Ok(()),
            _ = deadline.expired() => Err(TaskError::fail("http drain timed out")),
        }
    });

    closer.go(|ctx| async move {
        let mut tick = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
                _ = tick.tick() => println!("[worker] tick"),
            }
        }
    });

    let timer = closer.clone();
    closer.go(move |ctx| async move {
        tokio::select! {
            _ = ctx.cancelled() => Err(TaskError::Canceled),
            _ = tokio::time::sleep(Duration::from_secs(3)) => {
                println!("[timer] done, shutting down");
                timer.close(Duration::from_secs(5)).await.map_err(TaskError::fail)
            }
        }
    });

    closer.wait().await?;
    println!("[main] shutdown complete");
    Ok(())
}

use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use devsmith_logger::noop_sink::NoopSink;
use devsmith_logger::{Logger, LoggerConfig};

#[tokio::main]
async fn main() {
    let config = LoggerConfig::new("load-key", "", "load-test", "load")
        .with_batch_size(1_000)
        .with_flush_interval(Duration::from_millis(200))
        .with_max_buffered(50_000);
    let logger = match Logger::with_sink(config, Arc::new(NoopSink)) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("invalid config: {e}");
            return;
        }
    };

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let _ = logger.error(format!("load test error {i}"), None, &[]);
    }

    let elapsed = start.elapsed();
    println!("logged {} entries in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    let _ = logger.close().await;
    println!("{:?}", logger.stats());
}

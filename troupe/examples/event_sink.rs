// Event sink demo
//
// A fixed troupe absorbs a burst of events. Roughly one event in ten fails
// with a domain error, which the error handler singles out by downcasting.
// The caller retries submissions that were refused because the chosen
// actor's mailbox was full.
//
// Run with: cargo run --example event_sink

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use troupe::{Troupe, TroupeConfig, TroupeError};

#[derive(Debug, Clone)]
struct StuffHappenedEvent {
    id: u64,
    stuff: String,
}

#[derive(Debug, thiserror::Error)]
#[error("event {0} could not be recorded")]
struct StuffHappenedError(u64);

fn submit_with_retry(troupe: &Troupe, event: StuffHappenedEvent) -> Result<(), TroupeError> {
    loop {
        let event = event.clone();
        let outcome = troupe.submit(move || {
            if event.id % 10 == 9 {
                return Err(StuffHappenedError(event.id).into());
            }
            std::thread::sleep(Duration::from_millis(1));
            info!(id = event.id, stuff = %event.stuff, "event recorded");
            Ok(())
        });
        match outcome {
            Err(err) if err.is_retryable() => std::thread::yield_now(),
            other => return other,
        }
    }
}

fn main() -> anyhow::Result<()> {
    troupe::logging::init_default();

    let special = Arc::new(AtomicUsize::new(0));
    let other = Arc::new(AtomicUsize::new(0));
    let (special_count, other_count) = (special.clone(), other.clone());

    let config = TroupeConfig::fixed(10)
        .with_mailbox_size(100)
        .with_error_handler(move |err| match err.downcast_ref::<StuffHappenedError>() {
            Some(e) => {
                special_count.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "special error detected");
            }
            None => {
                other_count.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "default error detected");
            }
        });
    let troupe = Troupe::new(config)?;

    for id in 0..1000 {
        let event = StuffHappenedEvent { id, stuff: format!("stuff #{id}") };
        submit_with_retry(&troupe, event)?;
    }

    troupe.shutdown()?;
    troupe.join();

    info!(
        special = special.load(Ordering::Relaxed),
        other = other.load(Ordering::Relaxed),
        "event sink drained"
    );
    Ok(())
}

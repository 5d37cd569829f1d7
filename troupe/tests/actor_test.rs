// Integration tests for troupe::actor

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use troupe::{Actor, ActorConfig, ActorError, ActorStatus, ErrorHandler};

/// Put the actor to work on an item that runs until released.
fn occupy(actor: &Actor) -> mpsc::Sender<()> {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    actor
        .accept(Box::new(move || {
            started_tx.send(()).ok();
            release_rx.recv().ok();
            Ok(())
        }))
        .unwrap();
    started_rx.recv().unwrap();
    release_tx
}

fn record(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> troupe::Work {
    let log = log.clone();
    Box::new(move || {
        log.lock().unwrap().push(value);
        Ok(())
    })
}

#[test]
fn test_mailbox_overflow() {
    troupe::logging::init_test();
    let actor = Actor::spawn(&ActorConfig::new(1)).unwrap();
    let release = occupy(&actor);
    let log = Arc::new(Mutex::new(Vec::new()));

    actor.accept(record(&log, 1)).unwrap();
    let err = actor.accept(record(&log, 2)).unwrap_err();
    assert_eq!(err, ActorError::Full { capacity: 1 });
    assert_eq!(actor.queued(), 1);

    release.send(()).unwrap();
    actor.stop();
    actor.join();
    assert_eq!(*log.lock().unwrap(), vec![1]);
}

#[test]
fn test_drain_before_terminate() {
    let actor = Actor::spawn(&ActorConfig::new(2)).unwrap();
    let release = occupy(&actor);
    let log = Arc::new(Mutex::new(Vec::new()));

    actor.accept(record(&log, 1)).unwrap();
    actor.accept(record(&log, 2)).unwrap();
    assert!(actor.stop());

    assert!(actor.is_shutdown());
    assert_eq!(actor.accept(record(&log, 3)).unwrap_err(), ActorError::ShuttingDown);
    assert_ne!(actor.status(), ActorStatus::Terminated);

    release.send(()).unwrap();
    actor.join();

    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    assert_eq!(actor.status(), ActorStatus::Terminated);
    assert_eq!(actor.queued(), 0);
}

// Stop while another thread is accepting: the flag is visible immediately
#[test]
fn test_shutdown_visible_immediately() {
    let actor = Arc::new(Actor::spawn(&ActorConfig::new(5)).unwrap());
    let accepter = {
        let actor = actor.clone();
        std::thread::spawn(move || {
            actor.accept(Box::new(|| {
                std::thread::sleep(Duration::from_millis(20));
                Ok(())
            }))
        })
    };
    actor.stop();
    assert!(actor.is_shutdown());

    let outcome = accepter.join().unwrap();
    assert!(matches!(outcome, Ok(()) | Err(ActorError::ShuttingDown)));
    actor.join();
    assert!(actor.is_terminated());
}

#[derive(Debug, thiserror::Error)]
#[error("stuff happened: {0}")]
struct StuffHappened(String);

#[test]
fn test_error_handler_classifies_domain_errors() {
    let special = Arc::new(Mutex::new(Vec::new()));
    let other = Arc::new(AtomicBool::new(false));
    let (special_sink, other_sink) = (special.clone(), other.clone());
    let config = ActorConfig {
        mailbox_size: 4,
        error_handler: Some(ErrorHandler::new(move |err| match err.downcast_ref::<StuffHappened>() {
            Some(stuff) => special_sink.lock().unwrap().push(stuff.0.clone()),
            None => other_sink.store(true, Ordering::SeqCst),
        })),
        ..Default::default()
    };
    let actor = Actor::spawn(&config).unwrap();

    actor.accept(Box::new(|| Err(StuffHappened("barf".to_string()).into()))).unwrap();
    actor.accept(Box::new(|| Err(anyhow::anyhow!("plain")))).unwrap();
    actor.accept(Box::new(|| Ok(()))).unwrap();
    actor.stop();
    actor.join();

    assert_eq!(*special.lock().unwrap(), vec!["barf".to_string()]);
    assert!(other.load(Ordering::SeqCst));
}

#[test]
fn test_errors_without_handler_are_dropped() {
    let actor = Actor::spawn(&ActorConfig::new(2)).unwrap();
    let ran = Arc::new(AtomicBool::new(false));
    let ran_after = ran.clone();

    actor.accept(Box::new(|| Err(anyhow::anyhow!("nobody listens")))).unwrap();
    actor
        .accept(Box::new(move || {
            ran_after.store(true, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();
    actor.stop();
    actor.join();

    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn test_timestamps_are_ordered() {
    let actor = Actor::spawn(&ActorConfig::default()).unwrap();
    assert!(actor.last_accepted().is_none());
    assert!(actor.last_finished().is_none());

    actor.accept(Box::new(|| Ok(()))).unwrap();
    actor.stop();
    actor.join();

    let stats = actor.stats();
    let accepted = stats.last_accepted.unwrap();
    let finished = stats.last_finished.unwrap();
    assert!(finished >= accepted);
    assert_eq!(stats.capacity, 1);
    assert_eq!(stats.status, ActorStatus::Terminated);
}

#[test]
fn test_dropped_actor_drains() {
    let actor = Actor::spawn(&ActorConfig::new(2)).unwrap();
    let (tx, rx) = mpsc::channel();
    actor
        .accept(Box::new(move || {
            tx.send(42).ok();
            Ok(())
        }))
        .unwrap();
    drop(actor);

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
}

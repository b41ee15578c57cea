use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use closer::{Closer, Event, EventKind, ShutdownError, Subscribe, TaskError};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    fn errors_of(&self, kind: EventKind) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| e.error.as_deref().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn closer_with_recorder() -> (Closer, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let closer = Closer::builder(Default::default())
        .with_signals(&[])
        .with_logger(rec.clone())
        .build()
        .unwrap();
    (closer, rec)
}

fn push_name(closer: &Closer, list: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) {
    let list = list.clone();
    closer.to_close(move |_| async move {
        list.lock().unwrap().push(name);
        Ok(())
    });
}

#[tokio::test]
async fn empty_coordinator_closes_cleanly() {
    let (closer, rec) = closer_with_recorder();

    assert_eq!(closer.close(Duration::from_secs(60)).await, Ok(()));
    assert_eq!(rec.count(EventKind::NothingToClose), 1);
    assert_eq!(closer.wait().await, Ok(()));
}

#[tokio::test]
async fn cleanups_run_in_reverse_registration_order() {
    let (closer, _rec) = closer_with_recorder();
    let list = Arc::new(Mutex::new(Vec::new()));
    for name in ["A", "B", "C"] {
        push_name(&closer, &list, name);
    }

    assert_eq!(closer.close(Duration::from_secs(60)).await, Ok(()));
    assert_eq!(*list.lock().unwrap(), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn first_error_wins_and_every_error_is_logged() {
    let (closer, rec) = closer_with_recorder();
    let list = Arc::new(Mutex::new(Vec::new()));
    push_name(&closer, &list, "A");
    let l = list.clone();
    closer.to_close(move |_| async move {
        l.lock().unwrap().push("B");
        Err(TaskError::fail("bx"))
    });
    let l = list.clone();
    closer.to_close(move |_| async move {
        l.lock().unwrap().push("C");
        Err(TaskError::fail("cx"))
    });

    let err = closer.close(Duration::from_secs(60)).await.unwrap_err();

    assert_eq!(err.to_string(), "cx");
    assert_eq!(*list.lock().unwrap(), vec!["C", "B", "A"]);
    assert_eq!(rec.errors_of(EventKind::CloserFailed), vec!["cx", "bx"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_task_triggers_shutdown() {
    let (closer, _rec) = closer_with_recorder();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    closer.to_close(move |_| async move {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    closer.go(|_ctx| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err(TaskError::fail("t!"))
    });

    let err = closer.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "t!");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_abandons_remaining_cleanups() {
    let (closer, _rec) = closer_with_recorder();
    let q_ran = Arc::new(AtomicBool::new(false));
    let s_entered = Arc::new(AtomicBool::new(false));

    let q = q_ran.clone();
    closer.to_close(move |_| async move {
        q.store(true, Ordering::SeqCst);
        Ok(())
    });
    let s = s_entered.clone();
    closer.to_close(move |_| async move {
        s.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    });

    let err = closer.close(Duration::from_millis(50)).await.unwrap_err();

    assert!(matches!(err, ShutdownError::DeadlineExceeded { .. }));
    assert!(s_entered.load(Ordering::SeqCst));
    assert!(!q_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn cleanup_panic_is_contained() {
    let (closer, rec) = closer_with_recorder();
    closer.to_close(|_| async {
        if true {
            panic!("P exploded");
        }
        Ok(())
    });
    let q_ran = Arc::new(AtomicBool::new(false));
    let q = q_ran.clone();
    closer.to_close(move |_| async move {
        q.store(true, Ordering::SeqCst);
        Ok(())
    });

    let err = closer.close(Duration::from_secs(60)).await.unwrap_err();

    assert_eq!(err.to_string(), "panic recovered in closer");
    assert!(q_ran.load(Ordering::SeqCst));
    assert_eq!(rec.count(EventKind::CloserPanicked), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_close_runs_drain_once_with_identical_results() {
    let (closer, rec) = closer_with_recorder();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    closer.to_close(move |_| async move {
        r.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err(TaskError::fail("only once"))
    });

    let mut handles = Vec::new();
    for _ in 0..16 {
        let c = closer.clone();
        handles.push(tokio::spawn(async move {
            c.close(Duration::from_secs(5)).await
        }));
    }
    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.unwrap());
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(rec.count(EventKind::ShutdownStarting), 1);
    let first = results[0].clone();
    assert!(first.is_err());
    assert!(results.iter().all(|r| *r == first));
}

#[tokio::test]
async fn close_and_wait_are_idempotent() {
    let (closer, _rec) = closer_with_recorder();
    closer.to_close(|_| async { Err(TaskError::fail("boom")) });

    let first = closer.close(Duration::from_secs(1)).await;
    let second = closer.close(Duration::from_millis(1)).await;
    let waited = tokio::time::timeout(Duration::from_secs(1), closer.wait())
        .await
        .unwrap();

    assert!(first.is_err());
    assert_eq!(first, second);
    assert_eq!(first, waited);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn root_cancellation_precedes_every_cleanup() {
    let (closer, _rec) = closer_with_recorder();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..3 {
        let root = closer.context();
        let seen = seen.clone();
        closer.to_close(move |_| async move {
            seen.lock().unwrap().push(root.is_cancelled());
            Ok(())
        });
    }
    let (tx, rx) = tokio::sync::oneshot::channel();
    closer.go(move |ctx| async move {
        ctx.cancelled().await;
        let _ = tx.send(());
        Err(TaskError::Canceled)
    });

    closer.close(Duration::from_secs(1)).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![true, true, true]);
    tokio::time::timeout(Duration::from_secs(1), rx)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn canceled_task_result_is_treated_as_success() {
    let (closer, rec) = closer_with_recorder();
    closer.go(|ctx| async move {
        ctx.cancelled().await;
        Err(TaskError::Canceled)
    });

    assert_eq!(closer.close(Duration::from_secs(1)).await, Ok(()));
    assert_eq!(closer.wait().await, Ok(()));
    assert_eq!(rec.count(EventKind::TaskFailed), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn set_logger_applies_to_already_registered_named_cleanups() {
    let (closer, first) = closer_with_recorder();
    closer.to_close_named("cache", |_| async { Ok(()) });

    let second = Arc::new(Recorder::default());
    closer.set_logger(second.clone());
    closer.close(Duration::from_secs(1)).await.unwrap();

    assert_eq!(first.count(EventKind::DependencyClosing), 0);
    assert_eq!(second.count(EventKind::DependencyClosing), 1);
    assert_eq!(second.count(EventKind::DependencyClosed), 1);
}

#[tokio::test]
async fn close_without_a_real_deadline_runs_every_cleanup() {
    let (closer, _rec) = closer_with_recorder();
    let list = Arc::new(Mutex::new(Vec::new()));
    push_name(&closer, &list, "A");
    push_name(&closer, &list, "B");

    assert_eq!(closer.close(Duration::MAX).await, Ok(()));
    assert_eq!(*list.lock().unwrap(), vec!["B", "A"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_task_with_unbounded_shutdown_timeout_still_drains() {
    let closer = Closer::builder(Default::default())
        .with_signals(&[])
        .with_shutdown_timeout(Duration::MAX)
        .with_logger(Arc::new(Recorder::default()))
        .build()
        .unwrap();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    closer.to_close(move |_| async move {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    closer.go(|_ctx| async move { Err(TaskError::fail("down")) });

    let err = tokio::time::timeout(Duration::from_secs(5), closer.wait())
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.to_string(), "down");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

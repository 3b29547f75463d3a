use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use extension_bridge::framework::mock::InMemoryContainer;
use extension_bridge::lifecycle::{ExtensionSystem, HookOwnership, ShutdownRoutine};

fn counting_system() -> (ExtensionSystem, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let routine = ShutdownRoutine::new().with_step("destroy", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (ExtensionSystem::new(routine), runs)
}

/// Closing either of two containers runs teardown once; closing the other does not rerun it.
#[test]
fn test_close_either_container_tears_down_once() {
    for close_first in [0usize, 1] {
        let (system, runs) = counting_system();
        let containers = [
            Arc::new(InMemoryContainer::new("orders")),
            Arc::new(InMemoryContainer::managed("billing")),
        ];
        for container in &containers {
            system.register_container(container.clone());
        }
        assert_eq!(system.coordinator().ownership(), HookOwnership::Container);

        containers[close_first].close();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        containers[1 - close_first].close();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!system.shutdown());
        assert_eq!(system.coordinator().ownership(), HookOwnership::Destroyed);
    }
}

/// Plain containers leave the process hook in charge.
#[test]
fn test_process_hook_fires_when_no_container_manages_shutdown() {
    let (system, runs) = counting_system();
    let container = Arc::new(InMemoryContainer::new("plain"));
    system.register_container(container.clone());
    assert_eq!(system.coordinator().ownership(), HookOwnership::Process);

    assert!(system.coordinator().fire_process_hook());
    container.close();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// Once a managed container owns shutdown, the process hook stays silent.
#[test]
fn test_process_hook_disarmed_by_managed_container() {
    let (system, runs) = counting_system();
    let managed = Arc::new(InMemoryContainer::managed("managed"));
    system.register_container(managed.clone());
    // Later plain registrations do not re-arm it.
    system.register_container(Arc::new(InMemoryContainer::new("plain")));
    assert_eq!(system.coordinator().ownership(), HookOwnership::Container);

    assert!(!system.coordinator().fire_process_hook());
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    managed.host_exit();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// N concurrent registrations, then N concurrent closes: exactly one teardown.
#[test]
fn test_concurrent_register_and_close_runs_once() {
    const N: usize = 64;

    let (system, runs) = counting_system();
    let system = Arc::new(system);
    let containers: Vec<Arc<InMemoryContainer>> = (0..N)
        .map(|i| {
            if i % 2 == 0 {
                Arc::new(InMemoryContainer::managed(format!("managed_{}", i)))
            } else {
                Arc::new(InMemoryContainer::new(format!("plain_{}", i)))
            }
        })
        .collect();

    let barrier = Arc::new(Barrier::new(N));
    let handles: Vec<_> = containers
        .iter()
        .cloned()
        .map(|container| {
            let system = system.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                system.register_container(container);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(system.registry().len(), N);
    assert_eq!(system.coordinator().ownership(), HookOwnership::Container);

    let barrier = Arc::new(Barrier::new(N));
    let handles: Vec<_> = containers
        .iter()
        .cloned()
        .map(|container| {
            let system = system.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.close();
                // Every closer returns only after teardown has completed.
                assert!(system.coordinator().is_destroyed());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(system.coordinator().report().expect("report").is_clean());
}

/// Async callers can wait for teardown triggered elsewhere.
#[tokio::test]
async fn test_wait_for_teardown_from_container_close() {
    let (system, runs) = counting_system();
    let container = Arc::new(InMemoryContainer::managed("app"));
    system.register_container(container.clone());

    let coordinator = system.coordinator().clone();
    let waiter = tokio::spawn(async move { coordinator.wait_destroyed().await });

    let closer = container.clone();
    tokio::task::spawn_blocking(move || closer.close())
        .await
        .unwrap();

    waiter.await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// A teardown step that closes a registered container does not re-run or block teardown.
#[test]
fn test_step_closing_registered_container_completes() {
    let app = Arc::new(InMemoryContainer::new("app"));
    let closer = app.clone();
    let routine = ShutdownRoutine::new().with_step("close contexts", move || {
        closer.close();
        Ok(())
    });
    let system = Arc::new(ExtensionSystem::new(routine));
    system.register_container(app.clone());

    let (tx, rx) = mpsc::channel();
    let worker = {
        let system = system.clone();
        thread::spawn(move || {
            let _ = tx.send(system.coordinator().fire_process_hook());
        })
    };

    let fired = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("teardown returned");
    worker.join().unwrap();
    assert!(fired);
    assert!(app.is_closed());
    assert!(system.coordinator().is_destroyed());
    assert_eq!(
        system.coordinator().report().expect("report").completed,
        vec!["close contexts"]
    );
}

/// A panicking step is reported, and later triggers on other threads stay no-ops.
#[tokio::test]
async fn test_panicking_step_leaves_teardown_finished() {
    let app = Arc::new(InMemoryContainer::new("app"));
    let system = Arc::new(ExtensionSystem::new(
        ShutdownRoutine::new().with_step("boom", || panic!("step bug")),
    ));
    system.register_container(app.clone());

    assert!(system.shutdown());

    let closed = tokio::task::spawn_blocking({
        let app = app.clone();
        move || app.close()
    })
    .await
    .unwrap();
    assert!(closed);
    assert!(!system.coordinator().fire_process_hook());

    tokio::time::timeout(Duration::from_secs(5), system.coordinator().wait_destroyed())
        .await
        .expect("teardown signalled");
    let report = system.coordinator().report().expect("report");
    assert!(!report.is_clean());
    assert!(report.completed.is_empty());
}

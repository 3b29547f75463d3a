//! # Coordinated Shutdown
//!
//! One process, many containers, one teardown.
//!
//! The [`ShutdownCoordinator`] owns the single [`ShutdownRoutine`] and records
//! which party is in charge of triggering it:
//!
//! - [`HookOwnership::Process`]: the process-level hook armed at startup.
//! - [`HookOwnership::Container`]: a container with a managed lifecycle
//!   registered its own host hook, which disarmed the process-level one.
//!
//! Whoever triggers it, the routine runs at most once. Every attached
//! container subscribes a listener that calls [`ShutdownCoordinator::destroy`]
//! when it closes, and every call after the first is a no-op. That includes
//! calls made from inside the routine itself, such as a step closing a
//! registered container.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::framework::{BridgeError, Container, ContainerEvent};

type StepFn = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// A named unit of teardown work.
struct TeardownStep {
    name: String,
    run: StepFn,
}

/// The process-wide teardown procedure, as an ordered list of steps.
///
/// A failing or panicking step is recorded and the remaining steps still run.
#[derive(Default)]
pub struct ShutdownRoutine {
    steps: Vec<TeardownStep>,
}

impl ShutdownRoutine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(
        mut self,
        name: impl Into<String>,
        step: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.steps.push(TeardownStep {
            name: name.into(),
            run: Box::new(step),
        });
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    fn run(&self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for step in &self.steps {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (step.run)()))
                .unwrap_or_else(|payload| Err(panic_reason(&*payload)));
            match outcome {
                Ok(()) => {
                    debug!(step = %step.name, "Teardown step done");
                    report.completed.push(step.name.clone());
                }
                Err(reason) => {
                    error!(step = %step.name, error = %reason, "Teardown step failed");
                    report.failures.push(BridgeError::TeardownStep {
                        step: step.name.clone(),
                        reason,
                    });
                }
            }
        }
        report
    }
}

/// Outcome of the one teardown execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    pub completed: Vec<String>,
    pub failures: Vec<BridgeError>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Which party is responsible for triggering teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOwnership {
    /// No hook is armed.
    Unarmed,
    /// The process-level hook is armed.
    Process,
    /// A container-managed hook is armed; the process-level hook is disarmed.
    Container,
    /// Teardown has run. Terminal.
    Destroyed,
}

/// Arbitrates hook ownership and runs the [`ShutdownRoutine`] exactly once.
pub struct ShutdownCoordinator {
    ownership: Mutex<HookOwnership>,
    routine: ShutdownRoutine,
    claimed: AtomicBool,
    runner: Mutex<Option<ThreadId>>,
    completed: Mutex<bool>,
    completion: Condvar,
    report: OnceLock<TeardownReport>,
    destroyed: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator with no hook armed.
    pub fn new(routine: ShutdownRoutine) -> Self {
        let (destroyed, _) = watch::channel(false);
        Self {
            ownership: Mutex::new(HookOwnership::Unarmed),
            routine,
            claimed: AtomicBool::new(false),
            runner: Mutex::new(None),
            completed: Mutex::new(false),
            completion: Condvar::new(),
            report: OnceLock::new(),
            destroyed,
        }
    }

    fn state(&self) -> MutexGuard<'_, HookOwnership> {
        lock(&self.ownership)
    }

    pub fn ownership(&self) -> HookOwnership {
        *self.state()
    }

    /// Whether teardown has run to completion.
    pub fn is_destroyed(&self) -> bool {
        *lock(&self.completed)
    }

    /// The teardown report, once teardown has run.
    pub fn report(&self) -> Option<TeardownReport> {
        self.report.get().cloned()
    }

    /// Arms the process-level hook. Only takes effect while nothing is armed.
    pub fn arm(&self) -> bool {
        let mut state = self.state();
        if *state != HookOwnership::Unarmed {
            debug!(ownership = ?*state, "Process hook not armed");
            return false;
        }
        *state = HookOwnership::Process;
        info!("Process shutdown hook armed");
        true
    }

    /// Disarms the process-level hook if it is the armed one.
    pub fn disarm(&self) -> bool {
        let mut state = self.state();
        if *state != HookOwnership::Process {
            return false;
        }
        *state = HookOwnership::Unarmed;
        info!("Process shutdown hook disarmed");
        true
    }

    /// Runs the teardown routine if it has not run yet.
    ///
    /// Returns `true` only for the call that executed it. Callers on other
    /// threads block until that execution has finished. A call made by the
    /// routine itself returns `false` immediately.
    pub fn destroy(&self) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.wait_for_teardown();
            debug!("Teardown already ran");
            return false;
        }
        *lock(&self.runner) = Some(thread::current().id());

        *self.state() = HookOwnership::Destroyed;
        info!(steps = self.routine.steps.len(), "Running teardown");
        let report = self.routine.run();
        info!(
            completed = report.completed.len(),
            failed = report.failures.len(),
            "Teardown complete"
        );

        // Only the claiming caller reaches this point.
        let stored = self.report.set(report).is_ok();
        debug_assert!(stored, "teardown report written twice");

        *lock(&self.completed) = true;
        self.completion.notify_all();
        self.destroyed.send_replace(true);
        true
    }

    fn wait_for_teardown(&self) {
        if *lock(&self.runner) == Some(thread::current().id()) {
            debug!("Teardown re-entered from its own routine");
            return;
        }
        let mut completed = lock(&self.completed);
        while !*completed {
            completed = self
                .completion
                .wait(completed)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Entry point for the process-level hook.
    ///
    /// Runs teardown only while the process hook is the armed owner.
    pub fn fire_process_hook(&self) -> bool {
        let ownership = self.ownership();
        if ownership != HookOwnership::Process {
            debug!(?ownership, "Process hook not in charge, ignoring");
            return false;
        }
        self.destroy()
    }

    /// Wires `container` into coordinated shutdown.
    ///
    /// The close listener is subscribed first, so a container closing while
    /// ownership is transferred still triggers teardown. A container with a
    /// managed lifecycle then registers its own host hook and takes ownership
    /// from the process hook. If that registration fails the current owner
    /// stays armed.
    pub fn attach<C: Container + ?Sized>(self: &Arc<Self>, container: &C) -> HookOwnership {
        let coordinator = Arc::clone(self);
        let name = container.name().to_string();
        container.subscribe(Arc::new(move |event: &ContainerEvent| {
            if *event == ContainerEvent::Closed {
                info!(container = %name, "Container closed, triggering teardown");
                coordinator.destroy();
            }
        }));

        let Some(lifecycle) = container.managed_lifecycle() else {
            debug!(container = container.name(), "No managed lifecycle, ownership unchanged");
            return self.ownership();
        };

        if let Err(e) = lifecycle.register_host_shutdown_hook() {
            warn!(container = container.name(), error = %e, "Keeping current shutdown hook");
            return self.ownership();
        }

        let mut state = self.state();
        match *state {
            HookOwnership::Destroyed => {}
            HookOwnership::Process => {
                info!(container = container.name(), "Process hook disarmed, container owns shutdown");
                *state = HookOwnership::Container;
            }
            HookOwnership::Unarmed | HookOwnership::Container => {
                *state = HookOwnership::Container;
            }
        }
        *state
    }

    /// Resolves once teardown has completed.
    pub async fn wait_destroyed(&self) {
        let mut receiver = self.destroyed.subscribe();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            // The sender lives as long as `self`.
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Waits for Ctrl-C and fires the process hook.
    ///
    /// Returns whether teardown ran as a result.
    pub async fn listen_for_ctrl_c(self: Arc<Self>) -> bool {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                self.fire_process_hook()
            }
            Err(e) => {
                error!(error = %e, "Unable to listen for interrupt");
                false
            }
        }
    }
}

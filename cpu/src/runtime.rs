//! Running the machine on a worker thread.
//!
//! All of the machine's state lives in a [`Pdp8l`] behind a single
//! mutex.  Whoever holds the lock may step the processor or look at
//! the panel, so no memory cycle is ever seen half done.  While the
//! machine is running, a worker thread takes the lock for each step.
//! Stopping the machine waits for the worker to exit.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{event, span, Level};

use crate::clock::Clock;
use crate::config::{ConfigError, SimulatorConfig};
use crate::control::StepOutcome;
use crate::fatal;
use crate::io::{KeyboardSource, PrinterSink, Teletype};
use crate::panel::{PinTable, PinVector};
use crate::pdp8l::{Pdp8l, RegisterSnapshot};

#[derive(Debug)]
struct Shared {
    machine: Mutex<Pdp8l>,
    /// Number of threads waiting for the lock.  The worker gives way
    /// to them between steps.
    waiting: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pdp8l> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let result = self.machine.lock();
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        match result {
            Ok(guard) => guard,
            // Some thread panicked part way through a cycle.
            Err(e) => fatal::abort_with("simulator state is unusable", &e),
        }
    }
}

fn run_worker(shared: Arc<Shared>) {
    let span = span!(Level::DEBUG, "worker");
    let _enter = span.enter();
    event!(Level::DEBUG, "worker started");
    loop {
        {
            let mut machine = shared.lock();
            if !machine.is_running() {
                break;
            }
            if machine.step() == StepOutcome::Halted || !machine.is_running() {
                break;
            }
        }
        while shared.waiting.load(Ordering::SeqCst) > 0 {
            thread::yield_now();
        }
    }
    event!(Level::DEBUG, "worker finished");
}

#[derive(Debug)]
pub struct SimulatorRuntime {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatorRuntime {
    pub fn new(
        config: &SimulatorConfig,
        table: PinTable,
        keyboard: Box<dyn KeyboardSource>,
        printer: Box<dyn PrinterSink>,
        clock: Box<dyn Clock>,
    ) -> Result<SimulatorRuntime, ConfigError> {
        config.validate()?;
        let tty = Teletype::new(config.tty_chars_per_second, keyboard, printer);
        let machine = Pdp8l::new(config, table, tty, clock);
        Ok(SimulatorRuntime {
            shared: Arc::new(Shared {
                machine: Mutex::new(machine),
                waiting: AtomicUsize::new(0),
            }),
            worker: None,
        })
    }

    pub fn read_pins(&self) -> PinVector {
        self.shared.lock().read_pins()
    }

    /// Present new switch and key settings to the front panel.
    pub fn write_pins(&mut self, pins: &PinVector) {
        let write = self.shared.lock().accept_pins(pins);
        if write.stop_requested {
            self.join_worker();
        }
        let start = self.shared.lock().press_keys(&write.keys);
        if start {
            self.start_worker();
        }
    }

    /// Stop the machine if it is running, then advance it by one
    /// major state.
    pub fn single_step(&mut self) -> StepOutcome {
        self.stop();
        self.shared.lock().step()
    }

    pub fn request_interrupt(&self) {
        self.shared.lock().request_interrupt();
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().is_running()
    }

    pub fn registers(&self) -> RegisterSnapshot {
        self.shared.lock().registers()
    }

    /// Stop the machine, and wait until the worker has finished.
    pub fn stop(&mut self) {
        self.shared.lock().stop_running();
        self.join_worker();
    }

    /// Wait for the machine to stop of its own accord (by executing
    /// HLT).
    pub fn wait_for_halt(&mut self) {
        self.join_worker();
    }

    fn start_worker(&mut self) {
        // A worker which saw a HLT may still be on its way out.
        self.join_worker();
        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("pdp8l-worker".to_string())
            .spawn(move || run_worker(shared))
        {
            Ok(handle) => {
                self.worker = Some(handle);
            }
            Err(e) => fatal::abort_with("failed to start the simulator worker thread", &e),
        }
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                fatal::abort_with("simulator worker thread", &"panicked");
            }
        }
    }
}

impl Drop for SimulatorRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

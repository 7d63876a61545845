// Copyright 2025 LiveKit, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{RtcError, RtcErrorType};

type DrainFn = Box<dyn FnMut() + Send>;

enum LoopOp {
    Register(u64, Arc<AtomicBool>, DrainFn),
    Signal(u64),
    Close(u64),
    Stop,
}

/// The execution context every wrapper delivers its callbacks on: one
/// dedicated thread draining wakeup signals in arrival order.
///
/// All wrappers share a process-wide instance, created on first use.
/// Embedders normally only touch [`dispose`] at teardown; after it, wakeup
/// signals are silently dropped.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<LoopOp>,
    next_id: AtomicU64,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let thread = thread::Builder::new()
            .name("wrtc-dispatch".to_owned())
            .spawn(move || run_loop(rx))
            .expect("failed to spawn the dispatch thread");

        Self { tx, next_id: AtomicU64::new(0), thread: Mutex::new(Some(thread)) }
    }

    /// Stops the dispatch thread and waits for it to exit. Signals arriving
    /// afterwards are dropped.
    pub fn stop(&self) -> Result<(), RtcError> {
        let _ = self.tx.send(LoopOp::Stop);
        let Some(thread) = self.thread.lock().take() else {
            return Ok(());
        };

        thread.join().map_err(|_| RtcError {
            error_type: RtcErrorType::Internal,
            message: "the dispatch thread panicked".to_owned(),
        })
    }

    /// Registers a drain callback and hands back its wakeup handle. The
    /// callback runs on the dispatch thread, once per delivered signal.
    pub(crate) fn register(&self, drain: DrainFn) -> Wakeup {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::new(AtomicBool::new(false));
        let _ = self.tx.send(LoopOp::Register(id, pending.clone(), drain));
        Wakeup { id, pending, tx: self.tx.clone() }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Cross-thread wakeup handle. Signals coalesce: while one is pending, later
/// signals schedule no additional drain. The pending flag is cleared right
/// before the drain callback runs, so a signal arriving mid-drain schedules
/// one more pass.
pub(crate) struct Wakeup {
    id: u64,
    pending: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<LoopOp>,
}

impl Wakeup {
    pub fn signal(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(LoopOp::Signal(self.id));
        }
    }
}

impl Drop for Wakeup {
    fn drop(&mut self) {
        let _ = self.tx.send(LoopOp::Close(self.id));
    }
}

fn run_loop(mut rx: mpsc::UnboundedReceiver<LoopOp>) {
    struct Entry {
        pending: Arc<AtomicBool>,
        drain: DrainFn,
    }

    let mut handles: HashMap<u64, Entry> = HashMap::new();
    while let Some(op) = rx.blocking_recv() {
        match op {
            LoopOp::Register(id, pending, drain) => {
                handles.insert(id, Entry { pending, drain });
            }
            LoopOp::Signal(id) => {
                let Some(entry) = handles.get_mut(&id) else {
                    continue;
                };
                entry.pending.store(false, Ordering::Release);
                if panic::catch_unwind(AssertUnwindSafe(|| (entry.drain)())).is_err() {
                    log::error!("drain callback panicked, handle {} disabled", id);
                    handles.remove(&id);
                }
            }
            LoopOp::Close(id) => {
                handles.remove(&id);
            }
            LoopOp::Stop => break,
        }
    }
}

lazy_static! {
    static ref DISPATCHER: Dispatcher = Dispatcher::start();
}

pub(crate) fn global() -> &'static Dispatcher {
    &DISPATCHER
}

/// Tears down the process-wide dispatch thread. Wrappers created afterwards
/// never deliver callbacks; call this only when the host unloads the binding.
pub fn dispose() -> Result<(), RtcError> {
    DISPATCHER.stop()
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc as std_mpsc, time::Duration};

    use super::*;

    #[test]
    fn drain_runs_on_the_dispatch_thread() {
        let _ = env_logger::builder().is_test(true).try_init();

        let dispatcher = Dispatcher::start();
        let (tx, rx) = std_mpsc::channel();
        let wakeup = dispatcher.register(Box::new(move || {
            let name = thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        }));

        wakeup.signal();
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("wrtc-dispatch"));
    }

    #[test]
    fn signals_coalesce_while_pending() {
        let dispatcher = Dispatcher::start();
        let (started_tx, started_rx) = std_mpsc::channel();
        let (gate_tx, gate_rx) = std_mpsc::channel::<()>();

        let wakeup = dispatcher.register(Box::new(move || {
            started_tx.send(()).unwrap();
            let _ = gate_rx.recv();
        }));

        wakeup.signal();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The drain is parked on the gate; these four signals collapse into
        // a single further pass.
        for _ in 0..4 {
            wakeup.signal();
        }
        gate_tx.send(()).unwrap();

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        gate_tx.send(()).unwrap();

        assert!(started_rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn signals_after_stop_are_dropped() {
        let dispatcher = Dispatcher::start();
        let (tx, rx) = std_mpsc::channel();
        let wakeup = dispatcher.register(Box::new(move || {
            tx.send(()).unwrap();
        }));

        dispatcher.stop().unwrap();
        wakeup.signal();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        // Stopping twice is fine.
        dispatcher.stop().unwrap();
    }

    #[test]
    fn a_panicking_drain_does_not_kill_the_loop() {
        let dispatcher = Dispatcher::start();

        let bad = dispatcher.register(Box::new(|| panic!("boom")));
        bad.signal();

        let (tx, rx) = std_mpsc::channel();
        let good = dispatcher.register(Box::new(move || {
            tx.send(()).unwrap();
        }));
        good.signal();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        dispatcher.stop().unwrap();
    }
}

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

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::dispatch::Wakeup;

/// FIFO shared between the engine threads and the dispatch thread, paired
/// with the owning bridge's wakeup handle.
///
/// The mutex is held only for the push or pop itself; drains pop one event
/// per acquisition so processing never runs under the lock. Dropping the
/// queue discards whatever is still queued and closes the wakeup handle.
pub(crate) struct EventQueue<T> {
    events: Mutex<VecDeque<T>>,
    wakeup: Wakeup,
}

impl<T> EventQueue<T> {
    pub fn new(wakeup: Wakeup) -> Self {
        Self { events: Mutex::new(VecDeque::new()), wakeup }
    }

    pub fn push(&self, event: T) {
        self.events.lock().push_back(event);
        self.wakeup.signal();
    }

    pub fn pop(&self) -> Option<T> {
        self.events.lock().pop_front()
    }
}

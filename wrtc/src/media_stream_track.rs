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
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use parking_lot::Mutex;
use wrtc_engine::{self as engine, TrackKind, TrackState};

use crate::{dispatch, event_queue::EventQueue};

pub type OnMute = Box<dyn FnMut() + Send + Sync>;
pub type OnUnmute = Box<dyn FnMut() + Send + Sync>;
pub type OnStarted = Box<dyn FnMut() + Send + Sync>;
pub type OnEnded = Box<dyn FnMut() + Send + Sync>;

enum TrackEvent {
    Change,
    // Reserved until the engine exposes mute notifications; nothing
    // produces these today.
    #[allow(dead_code)]
    Mute,
    #[allow(dead_code)]
    Unmute,
}

#[derive(Clone)]
pub struct MediaStreamTrack {
    inner: Arc<TrackInner>,
}

struct TrackInner {
    handle: engine::MediaStreamTrack,
    observer: Arc<TrackObserver>,
}

impl MediaStreamTrack {
    /// Wraps `handle` and registers as its observer. The handle moves into
    /// the wrapper: the caller's reference is consumed, not duplicated.
    pub fn new(handle: engine::MediaStreamTrack) -> Self {
        let observer = Arc::new_cyclic(|weak: &Weak<TrackObserver>| {
            let weak = weak.clone();
            let wakeup = dispatch::global().register(Box::new(move || {
                if let Some(observer) = weak.upgrade() {
                    observer.drain();
                }
            }));

            TrackObserver {
                handle: handle.clone(),
                events: EventQueue::new(wakeup),
                live: AtomicBool::new(handle.state() == TrackState::Live),
                mute_handler: Mutex::default(),
                unmute_handler: Mutex::default(),
                started_handler: Mutex::default(),
                ended_handler: Mutex::default(),
            }
        });

        handle.register_observer(observer.clone());
        Self { inner: Arc::new(TrackInner { handle, observer }) }
    }

    pub(crate) fn handle(&self) -> &engine::MediaStreamTrack {
        &self.inner.handle
    }

    pub fn id(&self) -> String {
        self.inner.handle.id()
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.handle.kind()
    }

    /// The engine reports no distinct label; upstream surfaces the id here.
    pub fn label(&self) -> String {
        self.inner.handle.id()
    }

    pub fn enabled(&self) -> bool {
        self.inner.handle.enabled()
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.inner.handle.set_enabled(enabled)
    }

    pub fn muted(&self) -> bool {
        false
    }

    pub fn readonly(&self) -> bool {
        false
    }

    pub fn remote(&self) -> bool {
        false
    }

    /// The engine's two-value state enumeration; its `i32` repr is the
    /// numeric encoding hosts see.
    pub fn ready_state(&self) -> TrackState {
        self.inner.handle.state()
    }

    pub fn on_mute(&self, f: Option<OnMute>) {
        *self.inner.observer.mute_handler.lock() = f;
    }

    pub fn on_unmute(&self, f: Option<OnUnmute>) {
        *self.inner.observer.unmute_handler.lock() = f;
    }

    pub fn on_started(&self, f: Option<OnStarted>) {
        *self.inner.observer.started_handler.lock() = f;
    }

    pub fn on_ended(&self, f: Option<OnEnded>) {
        *self.inner.observer.ended_handler.lock() = f;
    }
}

impl Debug for MediaStreamTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStreamTrack")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("enabled", &self.enabled())
            .field("ready_state", &self.ready_state())
            .finish()
    }
}

impl Drop for TrackInner {
    fn drop(&mut self) {
        let observer: Arc<dyn engine::MediaStreamTrackObserver> = self.observer.clone();
        self.handle.unregister_observer(&observer);
    }
}

struct TrackObserver {
    handle: engine::MediaStreamTrack,
    events: EventQueue<TrackEvent>,
    live: AtomicBool,
    mute_handler: Mutex<Option<OnMute>>,
    unmute_handler: Mutex<Option<OnUnmute>>,
    started_handler: Mutex<Option<OnStarted>>,
    ended_handler: Mutex<Option<OnEnded>>,
}

impl TrackObserver {
    /// Runs on the dispatch thread; processes every queued event in FIFO
    /// order before returning.
    fn drain(&self) {
        while let Some(event) = self.events.pop() {
            self.process(event);
        }
    }

    fn process(&self, event: TrackEvent) {
        match event {
            TrackEvent::Change => {
                let live = self.handle.state() == TrackState::Live;
                if self.live.load(Ordering::Acquire) == live {
                    return;
                }
                self.live.store(live, Ordering::Release);
                log::debug!("track {}: live -> {}", self.handle.id(), live);

                let slot = if live { &self.started_handler } else { &self.ended_handler };
                if let Some(f) = slot.lock().as_mut() {
                    f();
                }
            }
            TrackEvent::Mute => {
                if let Some(f) = self.mute_handler.lock().as_mut() {
                    f();
                }
            }
            TrackEvent::Unmute => {
                if let Some(f) = self.unmute_handler.lock().as_mut() {
                    f();
                }
            }
        }
    }
}

impl engine::MediaStreamTrackObserver for TrackObserver {
    fn on_changed(&self) {
        self.events.push(TrackEvent::Change);
    }
}

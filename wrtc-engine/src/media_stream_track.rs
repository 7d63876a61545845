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

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::media_stream::StreamInner;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum TrackState {
    Live,
    Ended,
}

/// Invoked from whichever engine thread performed the mutation. Implementors
/// must not block.
pub trait MediaStreamTrackObserver: Send + Sync {
    fn on_changed(&self);
}

#[derive(Clone)]
pub struct MediaStreamTrack {
    pub(crate) inner: Arc<TrackInner>,
}

pub(crate) struct TrackInner {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    state: Mutex<TrackState>,
    observer: Mutex<Option<Arc<dyn MediaStreamTrackObserver>>>,
    // Streams currently containing this track, so state changes reach their
    // observers as well.
    streams: Mutex<Vec<Weak<StreamInner>>>,
}

impl MediaStreamTrack {
    pub(crate) fn new(id: String, kind: TrackKind) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id,
                kind,
                enabled: AtomicBool::new(true),
                state: Mutex::new(TrackState::Live),
                observer: Mutex::new(None),
                streams: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> String {
        self.inner.id.clone()
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        let prev = self.inner.enabled.swap(enabled, Ordering::AcqRel);
        if prev != enabled {
            self.notify_changed();
        }
        true
    }

    pub fn state(&self) -> TrackState {
        *self.inner.state.lock()
    }

    /// Engine-side control surface: the media pipeline drives live/ended
    /// transitions through here.
    pub fn set_state(&self, state: TrackState) {
        {
            let mut current = self.inner.state.lock();
            if *current == state {
                return;
            }
            *current = state;
        }
        log::trace!("track {}: state -> {:?}", self.inner.id, state);
        self.notify_changed();
    }

    /// Registers `observer`, replacing any previous registration. The object
    /// model keeps a single observer slot: the last registration wins.
    pub fn register_observer(&self, observer: Arc<dyn MediaStreamTrackObserver>) {
        *self.inner.observer.lock() = Some(observer);
    }

    /// Clears the slot only if `observer` is the one currently registered,
    /// so a stale wrapper cannot evict a newer registration.
    pub fn unregister_observer(&self, observer: &Arc<dyn MediaStreamTrackObserver>) {
        let mut slot = self.inner.observer.lock();
        if slot.as_ref().is_some_and(|current| {
            // Compare allocation addresses, not fat pointers.
            std::ptr::eq(Arc::as_ptr(current).cast::<()>(), Arc::as_ptr(observer).cast::<()>())
        }) {
            *slot = None;
        }
    }

    pub(crate) fn attached(&self, stream: &Arc<StreamInner>) {
        self.inner.streams.lock().push(Arc::downgrade(stream));
    }

    pub(crate) fn detached(&self, stream: &Arc<StreamInner>) {
        self.inner
            .streams
            .lock()
            .retain(|weak| !std::ptr::eq(weak.as_ptr(), Arc::as_ptr(stream)));
    }

    pub(crate) fn same_track(&self, other: &MediaStreamTrack) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify_changed(&self) {
        let observer = self.inner.observer.lock().clone();
        if let Some(observer) = observer {
            observer.on_changed();
        }

        let streams: Vec<_> =
            self.inner.streams.lock().iter().filter_map(Weak::upgrade).collect();
        for stream in streams {
            stream.notify_changed();
        }
    }
}

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
use wrtc_engine::{self as engine, TrackState};

use crate::{dispatch, event_queue::EventQueue, media_stream_track::MediaStreamTrack};

pub type OnActive = Box<dyn FnMut() + Send + Sync>;
pub type OnInactive = Box<dyn FnMut() + Send + Sync>;
pub type OnAddTrack = Box<dyn FnMut(MediaStreamTrack) + Send + Sync>;
pub type OnRemoveTrack = Box<dyn FnMut(MediaStreamTrack) + Send + Sync>;

enum StreamEvent {
    Change,
    AddTrack(engine::MediaStreamTrack),
    RemoveTrack(engine::MediaStreamTrack),
}

#[derive(Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

struct StreamInner {
    handle: engine::MediaStream,
    observer: Arc<StreamObserver>,
}

impl MediaStream {
    /// Wraps `handle` and registers as its observer. The handle moves into
    /// the wrapper: the caller's reference is consumed, not duplicated.
    pub fn new(handle: engine::MediaStream) -> Self {
        let observer = Arc::new_cyclic(|weak: &Weak<StreamObserver>| {
            let weak = weak.clone();
            let wakeup = dispatch::global().register(Box::new(move || {
                if let Some(observer) = weak.upgrade() {
                    observer.drain();
                }
            }));

            StreamObserver {
                handle: handle.clone(),
                events: EventQueue::new(wakeup),
                inactive: AtomicBool::new(!is_stream_active(&handle)),
                active_handler: Mutex::default(),
                inactive_handler: Mutex::default(),
                add_track_handler: Mutex::default(),
                remove_track_handler: Mutex::default(),
            }
        });

        handle.register_observer(observer.clone());
        Self { inner: Arc::new(StreamInner { handle, observer }) }
    }

    pub fn id(&self) -> String {
        self.inner.handle.id()
    }

    /// Activity state as of the last drained change notification.
    pub fn inactive(&self) -> bool {
        self.inner.observer.inactive.load(Ordering::Acquire)
    }

    pub fn audio_tracks(&self) -> Vec<MediaStreamTrack> {
        self.inner.handle.audio_tracks().into_iter().map(MediaStreamTrack::new).collect()
    }

    pub fn video_tracks(&self) -> Vec<MediaStreamTrack> {
        self.inner.handle.video_tracks().into_iter().map(MediaStreamTrack::new).collect()
    }

    /// Searches audio tracks first, then video tracks.
    pub fn get_track_by_id(&self, id: &str) -> Option<MediaStreamTrack> {
        self.inner
            .handle
            .find_audio_track(id)
            .or_else(|| self.inner.handle.find_video_track(id))
            .map(MediaStreamTrack::new)
    }

    pub fn add_track(&self, track: &MediaStreamTrack) -> bool {
        self.inner.handle.add_track(track.handle().clone())
    }

    pub fn remove_track(&self, track: &MediaStreamTrack) -> bool {
        self.inner.handle.remove_track(track.handle())
    }

    pub fn on_active(&self, f: Option<OnActive>) {
        *self.inner.observer.active_handler.lock() = f;
    }

    pub fn on_inactive(&self, f: Option<OnInactive>) {
        *self.inner.observer.inactive_handler.lock() = f;
    }

    pub fn on_add_track(&self, f: Option<OnAddTrack>) {
        *self.inner.observer.add_track_handler.lock() = f;
    }

    pub fn on_remove_track(&self, f: Option<OnRemoveTrack>) {
        *self.inner.observer.remove_track_handler.lock() = f;
    }
}

impl Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id())
            .field("inactive", &self.inactive())
            .finish()
    }
}

impl Drop for StreamInner {
    fn drop(&mut self) {
        let observer: Arc<dyn engine::MediaStreamObserver> = self.observer.clone();
        self.handle.unregister_observer(&observer);
    }
}

struct StreamObserver {
    handle: engine::MediaStream,
    events: EventQueue<StreamEvent>,
    inactive: AtomicBool,
    active_handler: Mutex<Option<OnActive>>,
    inactive_handler: Mutex<Option<OnInactive>>,
    add_track_handler: Mutex<Option<OnAddTrack>>,
    remove_track_handler: Mutex<Option<OnRemoveTrack>>,
}

impl StreamObserver {
    /// Runs on the dispatch thread; processes every queued event in FIFO
    /// order before returning.
    fn drain(&self) {
        while let Some(event) = self.events.pop() {
            self.process(event);
        }
    }

    fn process(&self, event: StreamEvent) {
        match event {
            StreamEvent::Change => {
                // The transition decision uses the state at drain time, so
                // rapid changes may coalesce into a single edge.
                let inactive = !is_stream_active(&self.handle);
                if self.inactive.load(Ordering::Acquire) == inactive {
                    return;
                }
                self.inactive.store(inactive, Ordering::Release);
                log::debug!("stream {}: inactive -> {}", self.handle.id(), inactive);

                let slot =
                    if inactive { &self.inactive_handler } else { &self.active_handler };
                if let Some(f) = slot.lock().as_mut() {
                    f();
                }
            }
            StreamEvent::AddTrack(track) => {
                // The wrapper is constructed whether or not a handler is set.
                let track = MediaStreamTrack::new(track);
                if let Some(f) = self.add_track_handler.lock().as_mut() {
                    f(track);
                }
            }
            StreamEvent::RemoveTrack(track) => {
                let track = MediaStreamTrack::new(track);
                if let Some(f) = self.remove_track_handler.lock().as_mut() {
                    f(track);
                }
            }
        }
    }
}

impl engine::MediaStreamObserver for StreamObserver {
    fn on_changed(&self) {
        self.events.push(StreamEvent::Change);
    }

    fn on_track_added(&self, track: engine::MediaStreamTrack) {
        self.events.push(StreamEvent::AddTrack(track));
    }

    fn on_track_removed(&self, track: engine::MediaStreamTrack) {
        self.events.push(StreamEvent::RemoveTrack(track));
    }
}

/// True iff any contained track is live; audio tracks are scanned before
/// video tracks, first match short-circuits.
fn is_stream_active(stream: &engine::MediaStream) -> bool {
    stream
        .audio_tracks()
        .into_iter()
        .chain(stream.video_tracks())
        .any(|track| track.state() == TrackState::Live)
}

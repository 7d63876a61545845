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

use std::sync::Arc;

use parking_lot::Mutex;

use crate::media_stream_track::{MediaStreamTrack, TrackKind};

/// Invoked from whichever engine thread performed the mutation. Implementors
/// must not block.
pub trait MediaStreamObserver: Send + Sync {
    /// The stream's composition or one of its member tracks changed.
    fn on_changed(&self);
    fn on_track_added(&self, track: MediaStreamTrack);
    fn on_track_removed(&self, track: MediaStreamTrack);
}

#[derive(Clone)]
pub struct MediaStream {
    pub(crate) inner: Arc<StreamInner>,
}

pub(crate) struct StreamInner {
    id: String,
    audio_tracks: Mutex<Vec<MediaStreamTrack>>,
    video_tracks: Mutex<Vec<MediaStreamTrack>>,
    observer: Mutex<Option<Arc<dyn MediaStreamObserver>>>,
}

impl MediaStream {
    pub(crate) fn new(id: String) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id,
                audio_tracks: Mutex::new(Vec::new()),
                video_tracks: Mutex::new(Vec::new()),
                observer: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> String {
        self.inner.id.clone()
    }

    pub fn audio_tracks(&self) -> Vec<MediaStreamTrack> {
        self.inner.audio_tracks.lock().clone()
    }

    pub fn video_tracks(&self) -> Vec<MediaStreamTrack> {
        self.inner.video_tracks.lock().clone()
    }

    pub fn find_audio_track(&self, id: &str) -> Option<MediaStreamTrack> {
        self.inner.audio_tracks.lock().iter().find(|t| t.id() == id).cloned()
    }

    pub fn find_video_track(&self, id: &str) -> Option<MediaStreamTrack> {
        self.inner.video_tracks.lock().iter().find(|t| t.id() == id).cloned()
    }

    /// Adds `track` to the list matching its kind. Returns false if a track
    /// with the same id is already present.
    pub fn add_track(&self, track: MediaStreamTrack) -> bool {
        let list = match track.kind() {
            TrackKind::Audio => &self.inner.audio_tracks,
            TrackKind::Video => &self.inner.video_tracks,
        };

        {
            let mut list = list.lock();
            if list.iter().any(|t| t.id() == track.id()) {
                return false;
            }
            list.push(track.clone());
        }

        log::trace!("stream {}: added track {}", self.inner.id, track.id());
        track.attached(&self.inner);
        let observer = self.inner.observer.lock().clone();
        if let Some(observer) = observer {
            observer.on_track_added(track);
        }
        self.inner.notify_changed();
        true
    }

    /// Removes `track` from the list matching its kind. Returns false if the
    /// stream does not contain it.
    pub fn remove_track(&self, track: &MediaStreamTrack) -> bool {
        let list = match track.kind() {
            TrackKind::Audio => &self.inner.audio_tracks,
            TrackKind::Video => &self.inner.video_tracks,
        };

        {
            let mut list = list.lock();
            let Some(index) = list.iter().position(|t| t.same_track(track)) else {
                return false;
            };
            list.remove(index);
        }

        log::trace!("stream {}: removed track {}", self.inner.id, track.id());
        track.detached(&self.inner);
        let observer = self.inner.observer.lock().clone();
        if let Some(observer) = observer {
            observer.on_track_removed(track.clone());
        }
        self.inner.notify_changed();
        true
    }

    /// Registers `observer`, replacing any previous registration. The object
    /// model keeps a single observer slot: the last registration wins.
    pub fn register_observer(&self, observer: Arc<dyn MediaStreamObserver>) {
        *self.inner.observer.lock() = Some(observer);
    }

    /// Clears the slot only if `observer` is the one currently registered,
    /// so a stale wrapper cannot evict a newer registration.
    pub fn unregister_observer(&self, observer: &Arc<dyn MediaStreamObserver>) {
        let mut slot = self.inner.observer.lock();
        if slot.as_ref().is_some_and(|current| {
            // Compare allocation addresses, not fat pointers.
            std::ptr::eq(Arc::as_ptr(current).cast::<()>(), Arc::as_ptr(observer).cast::<()>())
        }) {
            *slot = None;
        }
    }
}

impl StreamInner {
    pub(crate) fn notify_changed(&self) {
        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer.on_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{MediaEngine, TrackState};

    #[derive(Default)]
    struct CountingObserver {
        changed: AtomicUsize,
        added: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    impl MediaStreamObserver for CountingObserver {
        fn on_changed(&self) {
            self.changed.fetch_add(1, Ordering::AcqRel);
        }

        fn on_track_added(&self, track: MediaStreamTrack) {
            self.added.lock().push(track.id());
        }

        fn on_track_removed(&self, track: MediaStreamTrack) {
            self.removed.lock().push(track.id());
        }
    }

    #[test]
    fn add_and_remove_dispatch_on_kind() {
        let _ = env_logger::builder().is_test(true).try_init();

        let engine = MediaEngine::new();
        let stream = engine.create_local_media_stream("s0");
        let audio = engine.create_audio_track("a0");
        let video = engine.create_video_track("v0");

        assert!(stream.add_track(audio.clone()));
        assert!(stream.add_track(video.clone()));
        assert_eq!(stream.audio_tracks().len(), 1);
        assert_eq!(stream.video_tracks().len(), 1);

        // Duplicate ids are rejected.
        assert!(!stream.add_track(engine.create_audio_track("a0")));

        assert!(stream.remove_track(&audio));
        assert!(stream.audio_tracks().is_empty());
        assert!(!stream.remove_track(&audio));
    }

    #[test]
    fn find_is_kind_scoped() {
        let engine = MediaEngine::new();
        let stream = engine.create_local_media_stream("s0");
        stream.add_track(engine.create_audio_track("a0"));
        stream.add_track(engine.create_video_track("v0"));

        assert_eq!(stream.find_audio_track("a0").unwrap().kind(), TrackKind::Audio);
        assert!(stream.find_audio_track("v0").is_none());
        assert_eq!(stream.find_video_track("v0").unwrap().kind(), TrackKind::Video);
        assert!(stream.find_video_track("missing").is_none());
    }

    #[test]
    fn membership_changes_reach_the_observer() {
        let engine = MediaEngine::new();
        let stream = engine.create_local_media_stream("s0");
        let observer = Arc::new(CountingObserver::default());
        stream.register_observer(observer.clone());

        let track = engine.create_audio_track("a0");
        stream.add_track(track.clone());
        assert_eq!(*observer.added.lock(), vec!["a0".to_owned()]);
        assert_eq!(observer.changed.load(Ordering::Acquire), 1);

        stream.remove_track(&track);
        assert_eq!(*observer.removed.lock(), vec!["a0".to_owned()]);
        assert_eq!(observer.changed.load(Ordering::Acquire), 2);
    }

    #[test]
    fn member_track_state_changes_reach_the_stream_observer() {
        let engine = MediaEngine::new();
        let stream = engine.create_local_media_stream("s0");
        let track = engine.create_audio_track("a0");
        stream.add_track(track.clone());

        let observer = Arc::new(CountingObserver::default());
        stream.register_observer(observer.clone());

        track.set_state(TrackState::Ended);
        assert_eq!(observer.changed.load(Ordering::Acquire), 1);

        // Detached tracks no longer notify the stream.
        stream.remove_track(&track);
        let before = observer.changed.load(Ordering::Acquire);
        track.set_state(TrackState::Live);
        assert_eq!(observer.changed.load(Ordering::Acquire), before);
    }
}

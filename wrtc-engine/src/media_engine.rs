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

use crate::{
    media_stream::MediaStream,
    media_stream_track::{MediaStreamTrack, TrackKind},
};

/// Factory surface for local media objects. Created tracks start live.
#[derive(Default)]
pub struct MediaEngine {}

impl MediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_local_media_stream(&self, id: &str) -> MediaStream {
        MediaStream::new(id.to_owned())
    }

    pub fn create_audio_track(&self, id: &str) -> MediaStreamTrack {
        MediaStreamTrack::new(id.to_owned(), TrackKind::Audio)
    }

    pub fn create_video_track(&self, id: &str) -> MediaStreamTrack {
        MediaStreamTrack::new(id.to_owned(), TrackKind::Video)
    }
}

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

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use wrtc_engine::MediaEngine;

use crate::media_stream::MediaStream;

static MEDIA_STREAM_NAME: &str = "node-webrtc";
static AUDIO_TRACK_NAME: &str = "node-webrtc-audio";

lazy_static! {
    static ref MEDIA_ENGINE: MediaEngine = MediaEngine::new();
}

/// The `{audio, video}` options object accepted by [`get_user_media`].
/// Missing fields default to false.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaStreamConstraints {
    pub audio: bool,
    pub video: bool,
}

/// Acquires a local media stream from the process-wide engine: one live
/// audio track when `audio` is set. The `video` flag is accepted and
/// ignored, local video capture is not implemented.
pub fn get_user_media(constraints: &MediaStreamConstraints) -> MediaStream {
    let stream = MEDIA_ENGINE.create_local_media_stream(MEDIA_STREAM_NAME);
    if constraints.audio {
        stream.add_track(MEDIA_ENGINE.create_audio_track(AUDIO_TRACK_NAME));
    }

    MediaStream::new(stream)
}

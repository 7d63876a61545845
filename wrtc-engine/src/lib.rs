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

//! The slice of an RTC engine's media object model that the `wrtc` bridge
//! consumes: reference-counted stream and track handles with observer
//! registration, state queries and thread-safe mutation.

pub mod media_engine;
pub mod media_stream;
pub mod media_stream_track;

pub use media_engine::MediaEngine;
pub use media_stream::{MediaStream, MediaStreamObserver};
pub use media_stream_track::{
    MediaStreamTrack, MediaStreamTrackObserver, TrackKind, TrackState,
};

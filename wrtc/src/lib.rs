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

//! Media-stream and media-stream-track wrappers for hosts with a single
//! cooperative execution thread. Engine observer callbacks are queued and
//! redelivered on a dedicated dispatch thread; no engine thread ever runs
//! host callbacks directly.

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RtcErrorType {
    Internal,
    InvalidState,
}

#[derive(Error, Debug)]
#[error("an RtcError occured: {error_type:?} - {message}")]
pub struct RtcError {
    pub error_type: RtcErrorType,
    pub message: String,
}

pub mod dispatch;
pub mod get_user_media;
pub mod media_stream;
pub mod media_stream_track;
pub mod prelude;

pub(crate) mod event_queue;

pub use wrtc_engine::{TrackKind, TrackState};

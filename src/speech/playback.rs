//! Playback sink: turns a base64 audio payload into sound.
//!
//! [`PlaybackSink::play`] is fire-and-forget: the orchestrator hands over the
//! payload and moves on.  [`RodioPlayback`] decodes on the caller's thread
//! and plays on a dedicated `audio-playback` thread so the async runtime is
//! never blocked by the output device.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};

use crate::diagnostics::Diagnostics;

/// Object-safe, thread-safe audio output.
pub trait PlaybackSink: Send + Sync {
    /// Start playing `base64_audio`.  Problems are reported through
    /// diagnostics, never returned.
    fn play(&self, base64_audio: &str);
}

// Compile-time assertion: Arc<dyn PlaybackSink> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Arc<dyn PlaybackSink>) {}
};

/// Decode a base64 payload, tolerating surrounding whitespace.
pub fn decode_audio(base64_audio: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(base64_audio.trim())
}

// ---------------------------------------------------------------------------
// RodioPlayback
// ---------------------------------------------------------------------------

/// Plays WAV (and any other format `rodio` can decode) on the default output
/// device.
pub struct RodioPlayback {
    diagnostics: Diagnostics,
}

impl RodioPlayback {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

impl PlaybackSink for RodioPlayback {
    fn play(&self, base64_audio: &str) {
        let bytes = match decode_audio(base64_audio) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.diagnostics
                    .error(&format!("playback: invalid base64 audio: {e}"));
                return;
            }
        };

        self.diagnostics
            .info(&format!("playback: starting ({} bytes)", bytes.len()));

        let diagnostics = Arc::clone(&self.diagnostics);
        let spawned = std::thread::Builder::new()
            .name("audio-playback".into())
            .spawn(move || {
                if let Err(message) = play_blocking(bytes) {
                    diagnostics.error(&format!("playback: {message}"));
                }
            });

        if let Err(e) = spawned {
            self.diagnostics
                .error(&format!("playback: cannot spawn playback thread: {e}"));
        }
    }
}

/// Open the default device and block until the clip has finished.
fn play_blocking(bytes: Vec<u8>) -> Result<(), String> {
    let mut stream = rodio::OutputStreamBuilder::open_default_stream()
        .map_err(|e| format!("no audio output device: {e}"))?;
    stream.log_on_drop(false);

    let sink = rodio::Sink::connect_new(stream.mixer());
    let source = rodio::Decoder::new(Cursor::new(bytes))
        .map_err(|e| format!("cannot decode audio: {e}"))?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

// ---------------------------------------------------------------------------
// RecordingPlayback  (test-only)
// ---------------------------------------------------------------------------

/// Test double that remembers every payload it was asked to play.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPlayback {
    played: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingPlayback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl PlaybackSink for RecordingPlayback {
    fn play(&self, base64_audio: &str) {
        self.played.lock().unwrap().push(base64_audio.to_string());
    }
}

//! Shared test doubles for the voice pipeline
//!
//! Everything here runs without audio hardware or network access.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;

use reverie::reflection::ReflectionSource;
use reverie::voice::{AudioSink, PlaybackHandle, SpeechSynthesizer, Voice};
use reverie::{Error, Result};

/// Encode i16 samples as the base64 little-endian payload the TTS API returns
#[must_use]
pub fn pcm_payload(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Synthesizer returning a fixed payload (or a fixed failure) immediately
pub struct MockSynth {
    calls: AtomicUsize,
    response: std::result::Result<String, String>,
}

impl MockSynth {
    #[must_use]
    pub fn ok(payload: String) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Ok(payload),
        }
    }

    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Err(message.to_string()),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynth {
    async fn synthesize(&self, _text: &str, _voice: Voice) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(payload) => Ok(payload.clone()),
            Err(message) => Err(Error::Synthesis(message.clone())),
        }
    }
}

/// Synthesizer that blocks until the test opens its gate
pub struct GatedSynth {
    gate: tokio::sync::Notify,
    calls: AtomicUsize,
    response: std::result::Result<String, String>,
}

impl GatedSynth {
    #[must_use]
    pub fn new(payload: String) -> Self {
        Self {
            gate: tokio::sync::Notify::new(),
            calls: AtomicUsize::new(0),
            response: Ok(payload),
        }
    }

    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            gate: tokio::sync::Notify::new(),
            calls: AtomicUsize::new(0),
            response: Err(message.to_string()),
        }
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for GatedSynth {
    async fn synthesize(&self, _text: &str, _voice: Voice) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        match &self.response {
            Ok(payload) => Ok(payload.clone()),
            Err(message) => Err(Error::Synthesis(message.clone())),
        }
    }
}

/// Flags shared between a mock handle and the test observing it
#[derive(Clone, Default)]
pub struct HandleFlags {
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl HandleFlags {
    #[must_use]
    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Simulate natural end-of-buffer completion
    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

struct MockHandle(HandleFlags);

impl PlaybackHandle for MockHandle {
    fn stop(&mut self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        self.0.finished.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.0.finished.load(Ordering::SeqCst)
    }
}

/// Sink recording every start and exposing the latest handle's flags
#[derive(Default)]
pub struct MockSink {
    starts: AtomicUsize,
    last: Mutex<Option<HandleFlags>>,
}

impl MockSink {
    #[must_use]
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_handle(&self) -> Option<HandleFlags> {
        self.last.lock().unwrap().clone()
    }
}

impl AudioSink for MockSink {
    fn start(&self, _frames: Vec<f32>) -> Result<Box<dyn PlaybackHandle>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let flags = HandleFlags::default();
        *self.last.lock().unwrap() = Some(flags.clone());
        Ok(Box::new(MockHandle(flags)))
    }
}

/// Reflection source returning a fixed reply (or a fixed failure)
pub struct MockReflections {
    calls: AtomicUsize,
    response: std::result::Result<String, String>,
}

impl MockReflections {
    #[must_use]
    pub fn ok(reply: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Ok(reply.to_string()),
        }
    }

    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Err(message.to_string()),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReflectionSource for MockReflections {
    async fn reflect(&self, _user_text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(Error::Generation(message.clone())),
        }
    }
}

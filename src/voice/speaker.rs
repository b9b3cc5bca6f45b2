//! Playback controller
//!
//! Owns at most one live playback handle at a time and runs the
//! fetch-decode-play sequence for an utterance. State moves
//! `Idle -> Fetching -> Playing -> Idle`; a play request while already
//! playing stops the current audio instead of fetching new audio, and a
//! synthesis result that lands after an intervening stop is discarded
//! without being played.

use std::sync::{Arc, Mutex};

use super::pcm;
use super::playback::{AudioSink, PlaybackHandle};
use super::tts::{SpeechSynthesizer, Voice};
use crate::Result;

/// Playback controller state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeakerState {
    /// No utterance active
    #[default]
    Idle,
    /// Synthesis request in flight
    Fetching,
    /// Audio playing
    Playing,
}

/// What a play request ended up doing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// New audio is playing
    Started,
    /// Audio was already playing; it was stopped instead (toggle)
    Stopped,
    /// A synthesis request is already in flight; nothing was done
    Busy,
    /// The synthesis result arrived after a stop and was discarded
    Discarded,
}

struct Inner {
    state: SpeakerState,
    /// Bumped on every stop; a fetch started under an older epoch is stale
    epoch: u64,
    handle: Option<Box<dyn PlaybackHandle>>,
}

impl Inner {
    /// Fold a naturally-finished handle back to `Idle`
    fn refresh(&mut self) {
        if self.state == SpeakerState::Playing
            && self.handle.as_ref().is_none_or(|h| h.is_finished())
        {
            self.handle = None;
            self.state = SpeakerState::Idle;
        }
    }

    fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        self.state = SpeakerState::Idle;
    }
}

/// Speaks reflections aloud, one at a time
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    inner: Arc<Mutex<Inner>>,
}

impl Speaker {
    /// Create a new speaker over a synthesizer and an audio sink
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            synthesizer,
            sink,
            inner: Arc::new(Mutex::new(Inner {
                state: SpeakerState::Idle,
                epoch: 0,
                handle: None,
            })),
        }
    }

    /// Current state, folding natural playback completion into `Idle`
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn state(&self) -> SpeakerState {
        let mut inner = self.inner.lock().unwrap();
        inner.refresh();
        inner.state
    }

    /// True while audio is audible
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state() == SpeakerState::Playing
    }

    /// True while a synthesis request or playback is active
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state() != SpeakerState::Idle
    }

    /// Play `text` with `voice`, or stop if already playing
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Synthesis`] if the request fails or returns
    /// no audio, and [`crate::Error::Audio`] if the output stream cannot be
    /// created. Either way the controller is back in `Idle`. A failure that
    /// resolves after an intervening [`stop`](Self::stop) is reported as
    /// [`PlayOutcome::Discarded`] instead, like a stale success.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn play(&self, text: &str, voice: Voice) -> Result<PlayOutcome> {
        let epoch = {
            let mut inner = self.inner.lock().unwrap();
            inner.refresh();

            match inner.state {
                SpeakerState::Playing => {
                    inner.release();
                    tracing::debug!("playback toggled off");
                    return Ok(PlayOutcome::Stopped);
                }
                SpeakerState::Fetching => return Ok(PlayOutcome::Busy),
                SpeakerState::Idle => {
                    inner.state = SpeakerState::Fetching;
                    inner.epoch
                }
            }
        };

        // No lock held across the request: a stop may land meanwhile and
        // bump the epoch, in which case this result is stale.
        let frames = match self.fetch_frames(text, voice).await {
            Ok(frames) => frames,
            Err(e) => {
                if self.settle(epoch) {
                    return Err(e);
                }
                // The caller already stopped; the failure is moot
                tracing::debug!("stale synthesis failure discarded");
                return Ok(PlayOutcome::Discarded);
            }
        };

        let mut inner = self.inner.lock().unwrap();

        if inner.epoch != epoch {
            tracing::debug!("stale synthesis result discarded");
            return Ok(PlayOutcome::Discarded);
        }

        match self.sink.start(frames) {
            Ok(handle) => {
                inner.handle = Some(handle);
                inner.state = SpeakerState::Playing;
                tracing::debug!(voice = %voice, "playback started");
                Ok(PlayOutcome::Started)
            }
            Err(e) => {
                inner.state = SpeakerState::Idle;
                Err(e)
            }
        }
    }

    /// Stop any active playback and release the handle. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.epoch += 1;
        inner.release();
    }

    /// Synthesize and decode, without touching controller state
    async fn fetch_frames(&self, text: &str, voice: Voice) -> Result<Vec<f32>> {
        let payload = self.synthesizer.synthesize(text, voice).await?;
        pcm::decode_payload(&payload)
    }

    /// Return to `Idle` after a failed fetch; false if a stop intervened
    fn settle(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.epoch == epoch {
            if inner.state == SpeakerState::Fetching {
                inner.state = SpeakerState::Idle;
            }
            true
        } else {
            false
        }
    }
}

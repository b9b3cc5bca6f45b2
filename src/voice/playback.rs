//! Audio playback to speakers
//!
//! `cpal` streams are not `Send`, so each utterance runs on a dedicated
//! thread that owns the stream for its whole lifetime. The controller keeps
//! only a [`PlaybackHandle`], which is `Send` and carries the stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::pcm::TTS_SAMPLE_RATE;
use crate::{Error, Result};

/// Poll interval while waiting for the buffer to drain
const DRAIN_POLL: Duration = Duration::from_millis(20);

/// The live, stoppable audio-output resource for one utterance
pub trait PlaybackHandle: Send {
    /// Stop playback and release the underlying stream. Idempotent.
    fn stop(&mut self);

    /// True once the buffer played to its end or the handle was stopped
    fn is_finished(&self) -> bool;
}

/// Something that can turn playback frames into audible output
pub trait AudioSink: Send + Sync {
    /// Start playing `frames` and return the handle owning the playback
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be created.
    fn start(&self, frames: Vec<f32>) -> Result<Box<dyn PlaybackHandle>>;
}

/// Plays audio to the default output device
pub struct CpalSink {
    config: StreamConfig,
}

impl CpalSink {
    /// Create a new sink, negotiating a 24 kHz output config
    ///
    /// # Errors
    ///
    /// Returns error if no output device or suitable config is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(TTS_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(TTS_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(TTS_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(TTS_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(TTS_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = TTS_SAMPLE_RATE,
            channels = config.channels,
            "audio output initialized"
        );

        Ok(Self { config })
    }
}

impl AudioSink for CpalSink {
    fn start(&self, frames: Vec<f32>) -> Result<Box<dyn PlaybackHandle>> {
        let config = self.config.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);

        let thread = std::thread::spawn(move || {
            play_on_thread(frames, &config, &thread_stop, &thread_finished, &ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalHandle {
                stop,
                finished,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Audio("playback thread exited early".to_string()))
            }
        }
    }
}

/// Build and drive the output stream until the buffer drains or a stop lands
fn play_on_thread(
    frames: Vec<f32>,
    config: &StreamConfig,
    stop: &Arc<AtomicBool>,
    finished: &Arc<AtomicBool>,
    ready_tx: &mpsc::Sender<Result<()>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        finished.store(true, Ordering::SeqCst);
        let _ = ready_tx.send(Err(Error::Audio("no output device".to_string())));
        return;
    };

    let channels = usize::from(config.channels);
    let total = frames.len();
    let mut pos = 0usize;
    let callback_finished = Arc::clone(finished);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let sample = if pos < total {
                    let s = frames[pos];
                    pos += 1;
                    s
                } else {
                    callback_finished.store(true, Ordering::SeqCst);
                    0.0
                };

                for out in frame.iter_mut() {
                    *out = sample;
                }
            }
        },
        |err| {
            tracing::error!(error = %err, "audio playback error");
        },
        None,
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            finished.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(Err(Error::Audio(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        finished.store(true, Ordering::SeqCst);
        let _ = ready_tx.send(Err(Error::Audio(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !finished.load(Ordering::SeqCst) && !stop.load(Ordering::SeqCst) {
        std::thread::sleep(DRAIN_POLL);
    }

    // Grace period so the hardware buffer empties on natural completion
    if !stop.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    drop(stream);
    finished.store(true, Ordering::SeqCst);
    tracing::debug!(samples = total, "playback released");
}

/// Handle for one utterance playing on its dedicated thread
struct CpalHandle {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle for CpalHandle {
    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Voice pipeline integration tests
//!
//! Tests the decode path and the playback controller without audio
//! hardware or network access.

use std::sync::Arc;

use reverie::voice::{pcm, PlayOutcome, Speaker, SpeakerState, Voice, TTS_SAMPLE_RATE};

mod common;
use common::{pcm_payload, GatedSynth, MockSink, MockSynth};

fn speaker_with(synth: Arc<GatedSynth>, sink: Arc<MockSink>) -> Arc<Speaker> {
    Arc::new(Speaker::new(synth, sink))
}

#[test]
fn test_decode_then_build_frame_count() {
    // 12 bytes -> 6 samples -> floor(6 / channels) frames per channel
    let payload = pcm_payload(&[10, -10, 20, -20, 30, -30]);
    let samples = pcm::decode_base64_pcm(&payload).unwrap();
    assert_eq!(samples.len(), 6);

    for channels in 1..=4_usize {
        let built = pcm::build_channels(&samples, channels);
        assert_eq!(built.len(), channels);
        for channel in built {
            assert_eq!(channel.len(), 6 / channels);
        }
    }
}

#[test]
fn test_normalized_output_bounds() {
    let samples: Vec<i16> = vec![i16::MIN, -12345, -1, 0, 1, 12345, i16::MAX];
    let channels = pcm::build_channels(&samples, 1);
    for &value in &channels[0] {
        assert!((-1.0..1.0).contains(&value), "sample {value} out of range");
    }
}

#[tokio::test]
async fn test_play_starts_and_toggles_off() {
    let synth = Arc::new(MockSynth::ok(pcm_payload(&[100, 200, 300])));
    let sink = Arc::new(MockSink::default());
    let speaker = Speaker::new(synth.clone(), sink.clone());

    let outcome = speaker.play("Kore test", Voice::Kore).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Started);
    assert_eq!(speaker.state(), SpeakerState::Playing);
    assert_eq!(sink.starts(), 1);

    // Second play while playing: stop, no new fetch
    let outcome = speaker.play("Kore test", Voice::Kore).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Stopped);
    assert_eq!(speaker.state(), SpeakerState::Idle);
    assert_eq!(synth.calls(), 1);
    assert_eq!(sink.starts(), 1);
    assert!(sink.last_handle().unwrap().was_stopped());
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let synth = Arc::new(MockSynth::ok(pcm_payload(&[1, 2])));
    let sink = Arc::new(MockSink::default());
    let speaker = Speaker::new(synth, sink.clone());

    // Stopping while idle is a no-op
    speaker.stop();
    speaker.stop();
    assert_eq!(speaker.state(), SpeakerState::Idle);

    speaker.play("hello", Voice::Kore).await.unwrap();
    speaker.stop();
    speaker.stop();
    assert_eq!(speaker.state(), SpeakerState::Idle);
    assert!(sink.last_handle().unwrap().was_stopped());
}

#[tokio::test]
async fn test_natural_completion_returns_to_idle() {
    let synth = Arc::new(MockSynth::ok(pcm_payload(&[5, 6, 7])));
    let sink = Arc::new(MockSink::default());
    let speaker = Speaker::new(synth, sink.clone());

    speaker.play("hello", Voice::Kore).await.unwrap();
    assert!(speaker.is_speaking());

    sink.last_handle().unwrap().finish();
    assert_eq!(speaker.state(), SpeakerState::Idle);
    assert!(!speaker.is_speaking());
}

#[tokio::test]
async fn test_synthesis_failure_leaves_idle_without_sink() {
    let synth = Arc::new(MockSynth::failing("response contained no audio"));
    let sink = Arc::new(MockSink::default());
    let speaker = Speaker::new(synth.clone(), sink.clone());

    let err = speaker.play("hello", Voice::Kore).await.unwrap_err();
    assert!(matches!(err, reverie::Error::Synthesis(_)));
    assert_eq!(speaker.state(), SpeakerState::Idle);
    assert_eq!(sink.starts(), 0);
}

#[tokio::test]
async fn test_malformed_payload_leaves_idle_without_sink() {
    let synth = Arc::new(MockSynth::ok("not//valid!base64===".to_string()));
    let sink = Arc::new(MockSink::default());
    let speaker = Speaker::new(synth, sink.clone());

    let err = speaker.play("hello", Voice::Kore).await.unwrap_err();
    assert!(matches!(err, reverie::Error::Synthesis(_)));
    assert_eq!(speaker.state(), SpeakerState::Idle);
    assert_eq!(sink.starts(), 0);
}

#[tokio::test]
async fn test_play_while_fetching_is_busy() {
    let synth = Arc::new(GatedSynth::new(pcm_payload(&[1, 2, 3])));
    let sink = Arc::new(MockSink::default());
    let speaker = speaker_with(Arc::clone(&synth), Arc::clone(&sink));

    let task_speaker = Arc::clone(&speaker);
    let task =
        tokio::spawn(async move { task_speaker.play("hello", Voice::Kore).await.unwrap() });

    while speaker.state() != SpeakerState::Fetching {
        tokio::task::yield_now().await;
    }

    let outcome = speaker.play("hello", Voice::Kore).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Busy);
    assert_eq!(synth.calls(), 1);

    synth.open();
    assert_eq!(task.await.unwrap(), PlayOutcome::Started);
    assert_eq!(speaker.state(), SpeakerState::Playing);
}

#[tokio::test]
async fn test_result_after_stop_is_discarded() {
    let synth = Arc::new(GatedSynth::new(pcm_payload(&[1, 2, 3])));
    let sink = Arc::new(MockSink::default());
    let speaker = speaker_with(Arc::clone(&synth), Arc::clone(&sink));

    let task_speaker = Arc::clone(&speaker);
    let task =
        tokio::spawn(async move { task_speaker.play("hello", Voice::Kore).await.unwrap() });

    while speaker.state() != SpeakerState::Fetching {
        tokio::task::yield_now().await;
    }

    // Stop lands while the request is still in flight
    speaker.stop();
    assert_eq!(speaker.state(), SpeakerState::Idle);

    // The late result must not be played
    synth.open();
    assert_eq!(task.await.unwrap(), PlayOutcome::Discarded);
    assert_eq!(sink.starts(), 0);
    assert_eq!(speaker.state(), SpeakerState::Idle);
}

#[tokio::test]
async fn test_failure_after_stop_is_discarded() {
    let synth = Arc::new(GatedSynth::failing("response contained no audio"));
    let sink = Arc::new(MockSink::default());
    let speaker = speaker_with(Arc::clone(&synth), Arc::clone(&sink));

    let task_speaker = Arc::clone(&speaker);
    let task =
        tokio::spawn(async move { task_speaker.play("hello", Voice::Kore).await.unwrap() });

    while speaker.state() != SpeakerState::Fetching {
        tokio::task::yield_now().await;
    }

    speaker.stop();

    // The caller already stopped; the late failure must not surface
    synth.open();
    assert_eq!(task.await.unwrap(), PlayOutcome::Discarded);
    assert_eq!(sink.starts(), 0);
    assert_eq!(speaker.state(), SpeakerState::Idle);
}

#[test]
fn test_wav_roundtrip() {
    let original: Vec<f32> = vec![0.0, 0.5, -0.5, 0.99, -1.0, 0.25];
    let wav = pcm::samples_to_wav(&original, TTS_SAMPLE_RATE).unwrap();

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");

    let cursor = std::io::Cursor::new(wav);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, TTS_SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read.len(), original.len());
}

//! Interactive reflection session
//!
//! The terminal shell around the reflection and voice pipeline: plain text
//! becomes a reflection request, `/speak` toggles playback of the current
//! reflection, `/voice` switches the voice while nothing is speaking.
//! Errors surface as a single line replacing the prior result; the session
//! stays interactive after any failure.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::reflection::ReflectionSource;
use crate::voice::{PlayOutcome, Speaker, Voice};
use crate::{Error, Result};

/// An interactive session holding the current reflection
pub struct Session {
    reflections: Arc<dyn ReflectionSource>,
    speaker: Speaker,
    voice: Voice,
    current: Option<String>,
}

impl Session {
    /// Create a new session
    #[must_use]
    pub fn new(reflections: Arc<dyn ReflectionSource>, speaker: Speaker, voice: Voice) -> Self {
        Self {
            reflections,
            speaker,
            voice,
            current: None,
        }
    }

    /// The current reflection, if any
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The active voice
    #[must_use]
    pub const fn voice(&self) -> Voice {
        self.voice
    }

    /// Playback state, for surfaces that mirror the play/stop control
    #[must_use]
    pub fn playback_state(&self) -> crate::voice::SpeakerState {
        self.speaker.state()
    }

    /// Submit user text for reflection
    ///
    /// Any active playback is stopped before the request goes out. On
    /// success the new reflection replaces the prior one; on failure the
    /// prior reflection is cleared.
    ///
    /// # Errors
    ///
    /// Returns error for empty input or a failed generation request.
    pub async fn submit(&mut self, text: &str) -> Result<&str> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Generation("nothing to reflect on".to_string()));
        }

        // Text submission always wins over audio
        self.speaker.stop();

        match self.reflections.reflect(text).await {
            Ok(reflection) => {
                self.current = Some(reflection);
                Ok(self.current.as_deref().unwrap_or_default())
            }
            Err(e) => {
                self.current = None;
                Err(e)
            }
        }
    }

    /// Toggle spoken playback of the current reflection
    ///
    /// # Errors
    ///
    /// Returns error if there is no reflection yet or synthesis/playback
    /// fails.
    pub async fn speak(&mut self) -> Result<PlayOutcome> {
        let Some(reflection) = self.current.clone() else {
            return Err(Error::Synthesis("nothing to speak yet".to_string()));
        };

        self.speaker.play(&reflection, self.voice).await
    }

    /// Stop any active playback
    pub fn stop(&mut self) {
        self.speaker.stop();
    }

    /// Switch voices; refused while speaking or synthesizing
    ///
    /// # Errors
    ///
    /// Returns error for an unknown voice name or if audio is active.
    pub fn set_voice(&mut self, name: &str) -> Result<Voice> {
        if self.speaker.is_busy() {
            return Err(Error::Config(
                "voice is locked while audio is active".to_string(),
            ));
        }

        self.voice = name.parse()?;
        Ok(self.voice)
    }

    /// Run the interactive loop until EOF or `/quit`
    ///
    /// # Errors
    ///
    /// Returns error only if reading stdin fails; command failures are
    /// reported inline and the loop continues.
    pub async fn run(&mut self) -> Result<()> {
        println!("reverie - tell me how you feel, and I'll reflect it back.");
        println!("  /speak  play or stop the reflection    /voice NAME  switch voice");
        println!("  /voices list voices                    /quit        leave");
        println!();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            prompt();
            let Some(line) = lines.next_line().await? else {
                break;
            };

            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }

            if let Some(command) = line.strip_prefix('/') {
                if !self.dispatch(command).await {
                    break;
                }
            } else {
                match self.submit(&line).await {
                    Ok(reflection) => println!("\n{reflection}\n"),
                    Err(e) => println!("({e})"),
                }
            }
        }

        self.speaker.stop();
        Ok(())
    }

    /// Handle one slash command; returns false when the session should end
    async fn dispatch(&mut self, command: &str) -> bool {
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(n, a)| (n, a.trim()));

        match name {
            "speak" => match self.speak().await {
                Ok(PlayOutcome::Started) => println!("(speaking - /speak again to stop)"),
                Ok(PlayOutcome::Stopped) => println!("(stopped)"),
                Ok(PlayOutcome::Busy) => println!("(still fetching audio)"),
                Ok(PlayOutcome::Discarded) => {}
                Err(e) => println!("({e})"),
            },
            "stop" => {
                self.stop();
                println!("(stopped)");
            }
            "voice" => {
                if arg.is_empty() {
                    println!("(current voice: {})", self.voice);
                } else {
                    match self.set_voice(arg) {
                        Ok(voice) => println!("(voice set to {voice})"),
                        Err(e) => println!("({e})"),
                    }
                }
            }
            "voices" => {
                for voice in Voice::ALL {
                    let marker = if voice == self.voice { "*" } else { " " };
                    println!("{marker} {voice}");
                }
            }
            "quit" | "q" | "exit" => return false,
            _ => println!("(unknown command: /{name})"),
        }

        true
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

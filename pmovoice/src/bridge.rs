//! Line-oriented JSON link with the voice host.
//!
//! Each line read is one host message; each line written is either a spoken
//! reply or a vocabulary update.

use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::refresh::VocabularySink;
use crate::response::Reply;
use crate::skill::ChromecastSkill;

#[derive(Debug, Serialize)]
struct VocabularyMessage<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    kind: &'a str,
    words: &'a [String],
}

/// Serializes messages as JSON lines onto a shared writer.
pub struct JsonLineWriter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLineWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn write_message<T: Serialize>(&self, message: &T) -> io::Result<()> {
        let line = serde_json::to_string(message)?;
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{}", line)?;
        out.flush()
    }

    /// Writes the reply; silent replies write nothing.
    pub fn write_reply(&self, reply: &Reply) -> io::Result<()> {
        match reply.to_message() {
            Some(message) => self.write_message(&message),
            None => Ok(()),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> VocabularySink for JsonLineWriter<W> {
    fn register_vocabulary(&self, kind: &str, words: &[String]) {
        let message = VocabularyMessage {
            msg_type: "register_vocab",
            kind,
            words,
        };
        if let Err(err) = self.write_message(&message) {
            warn!(kind, error = %err, "Cannot send vocabulary to host");
        }
    }
}

/// Feeds every input line to the skill until end of input.
///
/// Malformed lines and unknown intents are logged and skipped.
pub fn run<R: BufRead, W: Write + Send>(
    skill: &mut ChromecastSkill,
    mut input: R,
    output: &JsonLineWriter<W>,
) -> io::Result<()> {
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if input.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }

        // Invalid UTF-8 is replaced, the line then fails as JSON and is skipped.
        let raw = String::from_utf8_lossy(&buffer);
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match skill.handle_message(line) {
            Ok(reply) => output.write_reply(&reply)?,
            Err(err) => warn!(error = %err, "Ignoring host message"),
        }
    }
    debug!("Host input closed");
    Ok(())
}

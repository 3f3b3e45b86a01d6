use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A captured failure: what went wrong and where.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub type_name: String,
    pub message: String,
    /// Rendered stack frames, innermost call first.
    #[serde(default)]
    pub frames: Vec<String>,
    /// `Display` text of each error in the source chain, outermost first.
    #[serde(default)]
    pub causes: Vec<String>,
}

impl Failure {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            frames: Vec::new(),
            causes: Vec::new(),
        }
    }

    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames.extend(frames.into_iter().map(Into::into));
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Capture an error and its source chain.
    ///
    /// No backtrace is taken, so the same error reported from two places
    /// groups under one signature. Use [`Failure::with_backtrace`] to opt in.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + 'static,
    {
        let mut failure = Self::new(std::any::type_name::<E>(), err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            failure.causes.push(cause.to_string());
            source = cause.source();
        }
        failure
    }

    /// Append the frames of a captured backtrace. A disabled or unsupported
    /// backtrace adds nothing.
    pub fn with_backtrace(mut self, backtrace: &Backtrace) -> Self {
        if backtrace.status() == BacktraceStatus::Captured {
            self.frames.extend(parse_backtrace(&backtrace.to_string()));
        }
        self
    }

    /// Recover a failure from a panic payload (e.g. `JoinError::into_panic`).
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self::new("panic", message)
    }

    /// One-line `type: message` form.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.type_name, self.message)
    }

    /// Full diagnostic text. Doubles as the deduplication signature, so the
    /// layout must stay stable.
    pub fn render(&self) -> String {
        let mut out = self.summary();
        for frame in &self.frames {
            let _ = write!(out, "\n  at {frame}");
        }
        for cause in &self.causes {
            let _ = write!(out, "\nCaused by: {cause}");
        }
        out.push('\n');
        out
    }
}

/// Turn std's backtrace text into one `symbol (file:line:col)` entry per
/// frame, dropping the frames of the capture itself.
fn parse_backtrace(text: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    let mut skipping = false;
    for line in text.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if !skipping {
                if let Some(last) = frames.last_mut() {
                    let _ = write!(last, " ({location})");
                }
            }
            continue;
        }
        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        skipping = is_capture_frame(symbol);
        if !skipping {
            frames.push(symbol.to_string());
        }
    }
    frames
}

fn is_capture_frame(symbol: &str) -> bool {
    symbol.starts_with("std::backtrace")
        || symbol.starts_with("<std::backtrace")
        || symbol.starts_with("backtrace::")
}

/// Short stable label for a signature: first 12 hex digits of its SHA-256.
pub fn fingerprint(signature: &str) -> String {
    let digest = Sha256::digest(signature.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(12);
    hex
}

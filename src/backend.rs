// 🔌 AI Backend Boundary - "given a prompt, returns free text"
// The identity and transport of the model behind this trait is an external
// concern. The core only assumes the call can fail, and that the reply
// should - but is not guaranteed to - contain JSON.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// A text-completion backend. Implementations are injected into the
/// extractor and explainer at construction time - no process-wide
/// singleton clients.
pub trait AiBackend {
    /// Human-readable backend name, used in log lines
    fn name(&self) -> &str;

    /// Send one prompt, get one free-text reply.
    /// Any transport or rate-limit failure surfaces as an error; callers
    /// must treat such errors as recoverable.
    fn complete(&self, prompt: &str, temperature: f64) -> Result<String>;
}

// ============================================================================
// REPLAY BACKEND (canned replies: offline runs, tests, captured sessions)
// ============================================================================

/// Backend that replays a fixed reply regardless of the prompt.
/// Lets the whole pipeline run deterministically offline against
/// previously captured model output.
pub struct ReplayBackend {
    name: String,
    reply: String,
}

impl ReplayBackend {
    pub fn new(name: &str, reply: &str) -> Self {
        ReplayBackend {
            name: name.to_string(),
            reply: reply.to_string(),
        }
    }

    /// Load the canned reply from a file (a captured model response)
    pub fn from_file<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let reply = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow!("Failed to read reply file {:?}: {}", path.as_ref(), e)
        })?;
        Ok(ReplayBackend::new(name, &reply))
    }
}

impl AiBackend for ReplayBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete(&self, _prompt: &str, _temperature: f64) -> Result<String> {
        Ok(self.reply.clone())
    }
}

// ============================================================================
// NULL BACKEND (always unavailable)
// ============================================================================

/// Backend that fails every call. Profiling against it exercises the
/// deterministic fallback path end to end.
pub struct NullBackend;

impl AiBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn complete(&self, _prompt: &str, _temperature: f64) -> Result<String> {
        Err(anyhow!("no backend configured"))
    }
}

// ============================================================================
// TESTS
// ============================================================================

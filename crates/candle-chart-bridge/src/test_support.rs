use serde_json::Value;

use crate::error::RendererError;
use crate::renderer::Renderer;

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// Entry points exist; every script returns `true`.
    Acknowledge,
    /// Entry points are missing; every script returns `false`.
    MissingEntryPoint,
    Fail,
    Panic,
}

/// Renderer double that records every script it is handed.
pub struct RecordingRenderer {
    pub mode: Mode,
    pub scripts: Vec<String>,
}

impl RecordingRenderer {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            scripts: Vec::new(),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, RendererError> {
        self.scripts.push(script.to_string());
        match self.mode {
            Mode::Acknowledge => Ok(Value::Bool(true)),
            Mode::MissingEntryPoint => Ok(Value::Bool(false)),
            Mode::Fail => Err(RendererError::Script("TypeError: boom".into())),
            Mode::Panic => panic!("renderer exploded"),
        }
    }
}

use std::io::Write;

use serde_json::Value;

use crate::error::RendererError;

/// The chart surface the bridge drives through textual commands.
///
/// Implementations are not required to be thread-safe; the bridge only calls them
/// from the task that owns it.
pub trait Renderer {
    /// Renderer name (for logging).
    fn name(&self) -> &str;

    /// Evaluate one command script and return its result.
    ///
    /// Renderers that cannot report a result return [`Value::Null`]. A result of
    /// `false` means the script's entry point was not present.
    fn evaluate(&mut self, script: &str) -> Result<Value, RendererError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, RendererError> {
        (**self).evaluate(script)
    }
}

/// Writes every command to a sink, one per line, and acknowledges nothing.
pub struct ScriptWriter<W: Write> {
    out: W,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for ScriptWriter<W> {
    fn name(&self) -> &str {
        "script-writer"
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, RendererError> {
        writeln!(self.out, "{script}")?;
        self.out.flush()?;
        Ok(Value::Null)
    }
}

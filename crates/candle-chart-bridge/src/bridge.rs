//! The bridge between a parsed series and a renderer.
//!
//! Public operations never fail. Anything that goes wrong on the way to the
//! renderer is logged here and reported as an outcome value at most.

use std::panic::{AssertUnwindSafe, catch_unwind};

use candle_chart_core::series::CandleSeries;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::overlay::HorizontalLine;
use crate::renderer::Renderer;
use crate::script::{self, HORIZONTAL_LINE_ENTRY_POINT, UPDATE_ENTRY_POINT};

/// Renderer lifecycle as seen by the bridge.
///
/// The only transitions are `Loading -> Ready` (ready signal) and
/// `Ready -> DataDelivered` (first successful delivery).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeState {
    Loading,
    Ready,
    DataDelivered,
}

/// What happened to a [`ChartBridge::deliver`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    Delivered,
    /// The renderer has not signalled readiness; nothing was sent.
    NotReady,
    /// Data went out earlier; nothing was sent.
    AlreadyDelivered,
    /// The renderer has no update entry point.
    MissingEntryPoint,
    /// Serialization or the renderer itself failed.
    Failed,
}

enum Outcome {
    Done,
    Missing,
    Failed,
}

pub struct ChartBridge<R> {
    renderer: R,
    state: BridgeState,
}

impl<R: Renderer> ChartBridge<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            state: BridgeState::Loading,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Record the renderer's ready signal. Returns false if it was already consumed.
    pub fn mark_ready(&mut self) -> bool {
        if self.state != BridgeState::Loading {
            debug!(state = ?self.state, "duplicate ready signal ignored");
            return false;
        }
        self.state = BridgeState::Ready;
        info!(renderer = self.renderer.name(), "renderer ready");
        true
    }

    /// Send the whole series to the renderer as one bulk update.
    ///
    /// Only acts in [`BridgeState::Ready`]; repeated calls after a successful
    /// delivery are no-ops.
    pub fn deliver(&mut self, series: &CandleSeries) -> Delivery {
        match self.state {
            BridgeState::Loading => {
                error!("renderer not ready, refusing to deliver chart data");
                return Delivery::NotReady;
            }
            BridgeState::DataDelivered => {
                debug!("chart data already delivered");
                return Delivery::AlreadyDelivered;
            }
            BridgeState::Ready => {}
        }

        let payload = match script::payload(series) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to serialize candle series");
                return Delivery::Failed;
            }
        };
        info!(
            renderer = self.renderer.name(),
            candles = series.len(),
            bytes = payload.len(),
            "delivering chart data"
        );

        match self.evaluate("set data", &script::set_data(&payload)) {
            Outcome::Done => {
                self.state = BridgeState::DataDelivered;
                Delivery::Delivered
            }
            Outcome::Missing => {
                error!(entry_point = UPDATE_ENTRY_POINT, "renderer entry point not available");
                Delivery::MissingEntryPoint
            }
            Outcome::Failed => Delivery::Failed,
        }
    }

    /// Draw a horizontal price line. Fire and forget: failures are only logged.
    pub fn add_horizontal_line(&mut self, line: &HorizontalLine) {
        if self.state == BridgeState::Loading {
            error!(
                entry_point = HORIZONTAL_LINE_ENTRY_POINT,
                price = line.price,
                "renderer not ready, horizontal line skipped"
            );
            return;
        }

        let script = match script::add_horizontal_line(line) {
            Ok(script) => script,
            Err(e) => {
                error!(price = line.price, label = %line.label, error = %e, "failed to encode horizontal line");
                return;
            }
        };

        if let Outcome::Missing = self.evaluate("add horizontal line", &script) {
            error!(
                entry_point = HORIZONTAL_LINE_ENTRY_POINT,
                "renderer entry point not available"
            );
        }
    }

    fn evaluate(&mut self, command: &str, script: &str) -> Outcome {
        let renderer = &mut self.renderer;
        let result = catch_unwind(AssertUnwindSafe(|| renderer.evaluate(script)));

        match result {
            Ok(Ok(Value::Bool(false))) => Outcome::Missing,
            Ok(Ok(_)) => Outcome::Done,
            Ok(Err(e)) => {
                error!(renderer = self.renderer.name(), command, error = %e, script, "renderer command failed");
                Outcome::Failed
            }
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(renderer = self.renderer.name(), command, panic = %msg, "renderer panicked");
                Outcome::Failed
            }
        }
    }
}

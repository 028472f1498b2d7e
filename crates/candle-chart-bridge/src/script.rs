//! The textual command protocol spoken to the renderer.
//!
//! Each command is a self-contained JavaScript expression that evaluates to `true`
//! when its entry point exists and was called, and `false` when it is missing.
//! Every argument is JSON-encoded, so labels and colors cannot break out of
//! their string literal.

use candle_chart_core::series::CandleSeries;

use crate::error::RendererError;
use crate::overlay::HorizontalLine;

/// Global function that replaces the chart's candle data.
pub const UPDATE_ENTRY_POINT: &str = "updateChartWithData";

/// Method that draws a horizontal price line.
pub const HORIZONTAL_LINE_ENTRY_POINT: &str = "chartManager.addHorizontalLine";

/// The JSON array the renderer receives as its candle data.
pub fn payload(series: &CandleSeries) -> Result<String, RendererError> {
    Ok(serde_json::to_string(series)?)
}

/// Pretty-printed [`payload`], for humans.
pub fn payload_pretty(series: &CandleSeries) -> Result<String, RendererError> {
    Ok(serde_json::to_string_pretty(series)?)
}

/// Store `payload` as `window.chartData` and hand it to the update entry point.
pub fn set_data(payload: &str) -> String {
    format!(
        "(function () {{ window.chartData = {payload}; \
         if (typeof window.{UPDATE_ENTRY_POINT} !== 'function') {{ return false; }} \
         window.{UPDATE_ENTRY_POINT}(window.chartData); return true; }})()"
    )
}

/// Draw a horizontal line through the chart manager.
pub fn add_horizontal_line(line: &HorizontalLine) -> Result<String, RendererError> {
    if !line.price.is_finite() {
        return Err(RendererError::NonFinitePrice(line.price));
    }
    let price = serde_json::to_string(&line.price)?;
    let color = serde_json::to_string(&line.color)?;
    let label = serde_json::to_string(&line.label)?;

    Ok(format!(
        "(function () {{ var manager = window.chartManager; \
         if (!manager || typeof manager.addHorizontalLine !== 'function') {{ return false; }} \
         manager.addHorizontalLine({price}, {color}, {label}, {width}, {style}); return true; }})()",
        width = line.line_width,
        style = line.line_style.code(),
    ))
}

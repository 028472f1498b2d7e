//! A renderer that writes a standalone Lightweight Charts page.
//!
//! The page defines the entry points the command protocol calls
//! (`updateChartWithData` and `chartManager.addHorizontalLine`); commands the
//! bridge issues are replayed in order once the chart has been created.

use serde_json::Value;

use crate::error::RendererError;
use crate::renderer::Renderer;

const DEFAULT_TITLE: &str = "Candle Chart";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>__TITLE__</title>
    <script src="https://unpkg.com/lightweight-charts@4.1.0/dist/lightweight-charts.standalone.production.js"></script>
    <style>
        html, body { margin: 0; padding: 0; height: 100%; background: #ffffff; }
        #chart-container { position: absolute; inset: 0; }
    </style>
</head>
<body>
    <div id="chart-container"></div>
    <script>
        class ChartManager {
            constructor(container) {
                this.chart = LightweightCharts.createChart(container, {
                    width: container.clientWidth,
                    height: container.clientHeight,
                    layout: { background: { type: 'solid', color: '#ffffff' }, textColor: 'rgba(0, 0, 0, 0.9)' },
                    grid: { vertLines: { color: 'rgba(0, 0, 0, 0.1)' }, horzLines: { color: 'rgba(0, 0, 0, 0.1)' } },
                    crosshair: { mode: LightweightCharts.CrosshairMode.Normal },
                    rightPriceScale: { borderColor: 'rgba(0, 0, 0, 0.1)' },
                    timeScale: { borderColor: 'rgba(0, 0, 0, 0.1)', timeVisible: true, secondsVisible: false },
                });
                this.candlestickSeries = this.chart.addCandlestickSeries({
                    upColor: '#26a69a',
                    downColor: '#ef5350',
                    borderVisible: false,
                    wickUpColor: '#26a69a',
                    wickDownColor: '#ef5350',
                });
                window.addEventListener('resize', () => {
                    this.chart.applyOptions({ width: container.clientWidth, height: container.clientHeight });
                });
            }

            updateChart(data) {
                this.candlestickSeries.setData(data || []);
                this.chart.timeScale().fitContent();
            }

            addHorizontalLine(price, color, title, lineWidth, lineStyle) {
                return this.candlestickSeries.createPriceLine({
                    price: price,
                    color: color,
                    lineWidth: lineWidth,
                    lineStyle: lineStyle,
                    axisLabelVisible: true,
                    title: title,
                });
            }
        }

        window.updateChartWithData = function (data) {
            window.chartManager.updateChart(data);
        };

        document.addEventListener('DOMContentLoaded', () => {
            window.chartManager = new ChartManager(document.getElementById('chart-container'));
__COMMANDS__
        });
    </script>
</body>
</html>
"#;

/// Collects commands into an HTML document instead of executing them.
#[derive(Debug, Default)]
pub struct HtmlPage {
    title: Option<String>,
    commands: Vec<String>,
}

impl HtmlPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The complete document with every recorded command in order.
    pub fn render(&self) -> String {
        let title = escape_html(self.title.as_deref().unwrap_or(DEFAULT_TITLE));
        let commands: String = self
            .commands
            .iter()
            .map(|c| format!("            {};\n", escape_script(c)))
            .collect();
        PAGE_TEMPLATE
            .replace("__TITLE__", &title)
            .replace("__COMMANDS__\n", &commands)
    }
}

impl Renderer for HtmlPage {
    fn name(&self) -> &str {
        "html-page"
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, RendererError> {
        self.commands.push(script.to_string());
        Ok(Value::Null)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Keep `</script>` inside string literals from closing the script element.
fn escape_script(script: &str) -> String {
    script.replace("</", "<\\/")
}

//! The single task that owns the renderer.
//!
//! Everything that touches the renderer runs here: the one-shot ready signal
//! triggers the initial delivery, and other code (including delayed tasks on
//! the timer) can only reach the renderer by posting a [`UiCommand`].
//!
//! ```ignore
//! let (event_loop, handle, ready) = ChartEventLoop::new(renderer, series);
//! let _line = handle.schedule(Duration::from_secs(1), UiCommand::horizontal_line(line));
//! drop(handle);
//! // ...renderer finishes loading...
//! ready.fire();
//! let bridge = event_loop.run().await;
//! ```

use std::time::Duration;

use candle_chart_core::series::CandleSeries;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::ChartBridge;
use crate::overlay::HorizontalLine;
use crate::renderer::Renderer;

/// Delay before supplementary overlay commands run after startup.
pub const DEFAULT_OVERLAY_DELAY: Duration = Duration::from_secs(1);

/// Work posted to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    AddHorizontalLine(HorizontalLine),
    /// Stop the loop without waiting for pending commands.
    Shutdown,
}

impl UiCommand {
    pub fn horizontal_line(line: HorizontalLine) -> Self {
        Self::AddHorizontalLine(line)
    }
}

/// Fired once by the renderer side when it has finished loading.
pub struct ReadySignal {
    tx: oneshot::Sender<()>,
}

impl ReadySignal {
    pub fn fire(self) {
        if self.tx.send(()).is_err() {
            debug!("event loop gone before ready signal");
        }
    }
}

/// Posts commands onto the event loop. Cheap to clone.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiCommand>,
}

impl UiHandle {
    /// Queue a command. Returns false if the loop has stopped.
    pub fn post(&self, command: UiCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Queue a command after `delay`. The timer only posts; the command itself
    /// runs on the event loop. Must be called from within a Tokio runtime.
    pub fn schedule(&self, delay: Duration, command: UiCommand) -> ScheduledTask {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(command).is_err() {
                debug!("event loop stopped before scheduled command");
            }
        });
        ScheduledTask { handle }
    }
}

/// A pending delayed command. Dropping it does not cancel it.
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.handle.abort();
    }}

pub struct ChartEventLoop<R> {
    bridge: ChartBridge<R>,
    series: CandleSeries,
    commands: mpsc::UnboundedReceiver<UiCommand>,
    ready: oneshot::Receiver<()>,
}

impl<R: Renderer> ChartEventLoop<R> {
    pub fn new(renderer: R, series: CandleSeries) -> (Self, UiHandle, ReadySignal) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let event_loop = Self {
            bridge: ChartBridge::new(renderer),
            series,
            commands: cmd_rx,
            ready: ready_rx,
        };
        (
            event_loop,
            UiHandle { tx: cmd_tx },
            ReadySignal { tx: ready_tx },
        )
    }

    /// Run until shutdown, or until the ready signal has resolved and every
    /// handle (including scheduled tasks) is gone. Returns the bridge.
    pub async fn run(self) -> ChartBridge<R> {
        let Self {
            mut bridge,
            series,
            mut commands,
            ready,
        } = self;
        let mut ready = Some(ready);
        let mut open = true;

        info!(candles = series.len(), "chart event loop started");

        while ready.is_some() || open {
            tokio::select! {
                biased;

                signal = wait_ready(&mut ready), if ready.is_some() => {
                    ready = None;
                    match signal {
                        Ok(()) => {
                            if bridge.mark_ready() {
                                let outcome = bridge.deliver(&series);
                                debug!(?outcome, "initial delivery");
                            }
                        }
                        Err(_) => warn!("ready signal dropped, chart data will not be delivered"),
                    }
                }

                command = commands.recv(), if open => match command {
                    Some(UiCommand::AddHorizontalLine(line)) => bridge.add_horizontal_line(&line),
                    Some(UiCommand::Shutdown) => {
                        info!("chart event loop shutting down");
                        break;
                    }
                    None => open = false,
                },
            }
        }

        debug!(state = ?bridge.state(), "chart event loop stopped");
        bridge
    }
}

async fn wait_ready(
    ready: &mut Option<oneshot::Receiver<()>>,
) -> Result<(), oneshot::error::RecvError> {
    match ready {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}

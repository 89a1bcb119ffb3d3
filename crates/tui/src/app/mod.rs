pub mod config;
pub mod monitor;
pub mod view;

use crate::{
    error::TuiResult,
    ui::dashboard::Dashboard,
    utils::{
        events::{AppEvent, EventHandler},
        terminal::Tui,
    },
};
use config::XrayConfig;
use monitor::Monitor;
use tokio_util::sync::CancellationToken;
use view::MonitorView;
use xray_core::ServiceHandle;

pub struct App {
    monitors: Vec<Monitor>,
    views: Vec<MonitorView>,
    event_handler: EventHandler,
    handles: Vec<ServiceHandle>,
    shutdown: CancellationToken,
}

impl App {
    /// Starts one background task per configured chain
    pub fn new(config: &XrayConfig) -> TuiResult<Self> {
        let shutdown = CancellationToken::new();
        let mut monitors = Vec::with_capacity(config.chains.len());
        let mut handles = Vec::with_capacity(config.chains.len());

        for chain in &config.chains {
            match Monitor::spawn(chain, config, &shutdown) {
                Ok((monitor, handle)) => {
                    tracing::info!(monitor = monitor.name(), "Started monitor");
                    monitors.push(monitor);
                    handles.push(handle);
                }
                Err(e) => {
                    shutdown.cancel();
                    return Err(e);
                }
            }
        }

        let views = monitors
            .iter()
            .map(|monitor| MonitorView::empty(monitor.name()))
            .collect();

        Ok(Self {
            monitors,
            views,
            event_handler: EventHandler::new(config.redraw_interval()),
            handles,
            shutdown,
        })
    }

    pub fn views(&self) -> &[MonitorView] {
        &self.views
    }

    pub async fn refresh_views(&mut self) {
        self.views = futures::future::join_all(self.monitors.iter().map(Monitor::view)).await;
    }

    pub async fn run(&mut self, terminal: &mut Tui) -> TuiResult<()> {
        loop {
            match self.event_handler.next_event()? {
                AppEvent::Quit => break,
                AppEvent::Refresh => {
                    self.refresh_views().await;
                    terminal.draw(|frame| Dashboard::render(frame, frame.area(), &self.views))?;
                }
                AppEvent::Key(_) | AppEvent::Tick => {}
            }
        }

        Ok(())
    }

    /// Cancels every monitor and waits for in-flight ticks to finish
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            handle.stop_and_join().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChainType;
    use config::ChainConfig;

    #[tokio::test]
    async fn test_app_starts_and_stops_monitors() {
        let config = XrayConfig {
            chains: vec![
                ChainConfig::new(ChainType::Cosmos, "http://127.0.0.1:1"),
                ChainConfig::new(ChainType::EthSub, "ws://127.0.0.1:1"),
            ],
            ..XrayConfig::default()
        };

        let mut app = App::new(&config).unwrap();
        assert_eq!(app.views().len(), 2);
        assert!(app.views()[0].panels.is_empty());

        app.refresh_views().await;
        assert_eq!(app.views()[0].panels[0].title, "Mempool (0 txs)");
        assert_eq!(app.views()[1].panels[0].title, "Pending Transactions");

        app.shutdown().await;
    }
}

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Refresh,
    Quit,
}

/// Maps a key press to the event the dashboard acts on
pub fn classify_key(key: KeyEvent) -> AppEvent {
    if key.kind != KeyEventKind::Press {
        return AppEvent::Tick;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => AppEvent::Quit,
        KeyCode::Char('q') | KeyCode::Esc => AppEvent::Quit,
        _ => AppEvent::Key(key),
    }
}

#[derive(Debug)]
pub struct EventHandler {
    pub redraw_interval: Duration,
    last_refresh: Instant,
}

impl EventHandler {
    pub fn new(redraw_interval: Duration) -> Self {
        Self {
            redraw_interval,
            // Set last_refresh far in the past to trigger an immediate first draw
            last_refresh: Instant::now()
                .checked_sub(redraw_interval)
                .unwrap_or_else(Instant::now),
        }
    }

    pub fn next_event(&mut self) -> std::io::Result<AppEvent> {
        let wait = self
            .redraw_interval
            .saturating_sub(self.last_refresh.elapsed())
            .min(Duration::from_millis(50));
        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                let event = classify_key(key);
                if event != AppEvent::Tick {
                    return Ok(event);
                }
            }
        }

        if self.last_refresh.elapsed() >= self.redraw_interval {
            self.last_refresh = Instant::now();
            Ok(AppEvent::Refresh)
        } else {
            Ok(AppEvent::Tick)
        }
    }
}

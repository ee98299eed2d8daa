//! Terminal event reader running in a background tokio task.
//!
//! Produces key presses and resizes plus two clocks: a layout tick that
//! advances the force simulation and a render tick that redraws.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// Advance the layout one step.
    LayoutTick,
    /// Redraw the frame.
    Render,
}

pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the background reader with the given layout and render periods.
    pub fn new(layout_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut terminal_events = EventStream::new();
            let mut layout_interval = tokio::time::interval(layout_rate);
            let mut render_interval = tokio::time::interval(render_rate);
            layout_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            render_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = layout_interval.tick() => Event::LayoutTick,
                    _ = render_interval.tick() => Event::Render,
                    Some(Ok(event)) = terminal_events.next() => match event {
                        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                        CrosstermEvent::Resize(..) => Event::Resize,
                        _ => continue,
                    },
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Receive the next event. Returns `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

//! Recording input dispatcher
//!
//! Records every dispatched call instead of touching a browser. Used by the
//! tests and by the binary's dry run.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::{InputDispatcher, Viewport};
use crate::Error;

/// A dispatched input call
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Move { x: f64, y: f64, steps: u32 },
    MouseDown,
    MouseUp,
    Char(char),
    Delete,
    Insert(String),
    Scroll { dx: f64, dy: f64 },
}

/// Dispatcher that records calls
#[derive(Debug)]
pub struct RecordingDispatcher {
    id: String,
    viewport: Viewport,
    events: Arc<Mutex<Vec<InputEvent>>>,
    /// Fail every call once this many calls have succeeded
    fail_after: Option<usize>,
    calls: AtomicUsize,
    detached: Arc<AtomicBool>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::with_viewport(Viewport::default())
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            viewport,
            events: Arc::new(Mutex::new(Vec::new())),
            fail_after: None,
            calls: AtomicUsize::new(0),
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail every call after `calls` successful ones
    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Simulate the page going away
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Relaxed);
    }

    pub async fn events(&self) -> Vec<InputEvent> {
        self.events.lock().await.clone()
    }

    /// Input contents after applying every character, delete and insert
    pub async fn typed_text(&self) -> String {
        let mut text = String::new();
        for event in self.events.lock().await.iter() {
            match event {
                InputEvent::Char(c) => text.push(*c),
                InputEvent::Delete => {
                    text.pop();
                }
                InputEvent::Insert(s) => text.push_str(s),
                _ => {}
            }
        }
        text
    }

    /// Last pointer position, if the pointer ever moved
    pub async fn pointer(&self) -> Option<(f64, f64)> {
        self.events.lock().await.iter().rev().find_map(|event| match event {
            InputEvent::Move { x, y, .. } => Some((*x, *y)),
            _ => None,
        })
    }

    async fn record(&self, event: InputEvent) -> Result<(), Error> {
        if self.detached.load(Ordering::Relaxed) {
            return Err(Error::input(format!("dispatcher {} is detached", self.id)));
        }
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if matches!(self.fail_after, Some(limit) if call >= limit) {
            return Err(Error::input(format!("call {} rejected", call)));
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputDispatcher for RecordingDispatcher {
    async fn move_pointer(&self, x: f64, y: f64, steps: u32) -> Result<(), Error> {
        self.record(InputEvent::Move { x, y, steps }).await
    }

    async fn mouse_down(&self) -> Result<(), Error> {
        self.record(InputEvent::MouseDown).await
    }

    async fn mouse_up(&self) -> Result<(), Error> {
        self.record(InputEvent::MouseUp).await
    }

    async fn send_char(&self, ch: char) -> Result<(), Error> {
        self.record(InputEvent::Char(ch)).await
    }

    async fn delete_previous(&self) -> Result<(), Error> {
        self.record(InputEvent::Delete).await
    }

    async fn insert_text(&self, text: &str) -> Result<(), Error> {
        self.record(InputEvent::Insert(text.to_string())).await
    }

    async fn viewport(&self) -> Result<Viewport, Error> {
        if self.detached.load(Ordering::Relaxed) {
            return Err(Error::input(format!("dispatcher {} is detached", self.id)));
        }
        Ok(self.viewport)
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<(), Error> {
        self.record(InputEvent::Scroll { dx, dy }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_replays_text() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.send_char('h').await.unwrap();
        dispatcher.send_char('x').await.unwrap();
        dispatcher.delete_previous().await.unwrap();
        dispatcher.send_char('i').await.unwrap();
        dispatcher.insert_text(" there").await.unwrap();

        assert_eq!(dispatcher.typed_text().await, "hi there");
        assert_eq!(dispatcher.events().await.len(), 5);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let dispatcher = RecordingDispatcher::new().failing_after(1);
        assert!(dispatcher.move_pointer(1.0, 2.0, 1).await.is_ok());
        assert!(matches!(dispatcher.mouse_down().await, Err(Error::Input(_))));
        assert_eq!(dispatcher.pointer().await, Some((1.0, 2.0)));
    }

    #[tokio::test]
    async fn test_detached_dispatcher() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.detach();
        assert!(dispatcher.viewport().await.is_err());
        assert!(dispatcher.scroll_by(0.0, 100.0).await.is_err());
    }
}

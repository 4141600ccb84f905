//! Input dispatch layer
//!
//! Abstract interface to the browser's low-level input plus a recording
//! implementation for tests and dry runs.

pub mod traits;
pub mod mock;

pub use traits::{InputDispatcher, Viewport};
pub use mock::{InputEvent, RecordingDispatcher};

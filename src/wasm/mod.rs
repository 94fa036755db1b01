//! WASM module for running FeedbackLoop in the browser.
//!
//! State is persisted in `window.localStorage` under the same three keys the
//! native file backend uses, so the JavaScript layer only has to render.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            JavaScript Layer               │
//! │  - Form handling and validation           │
//! │  - Leaderboard / feed rendering           │
//! │  - HTML escaping of user text             │
//! └────────────────┬─────────────────────────┘
//!                  │ wasm-bindgen
//! ┌────────────────▼─────────────────────────┐
//! │              FeedbackApp                  │
//! │  - StateStore (login/logout/addInsight)   │
//! │  - LocalStorageBackend                    │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! Build with `wasm-pack build --target web --features wasm`:
//!
//! ```javascript
//! import init, { FeedbackApp } from './feedbackloop.js';
//!
//! await init();
//! const app = new FeedbackApp();
//! app.login('Kari Svendsen');
//! const state = JSON.parse(app.addInsight('Dev', 'faster builds', 'ship sooner'));
//! ```

mod bindings;
mod local_storage;

use crate::logging::LineLayer;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use wasm_bindgen::JsValue;
use web_sys::console;

pub use bindings::FeedbackApp;
pub use local_storage::LocalStorageBackend;

/// Initialize WASM panic hook for better error messages in browser console
///
/// This should be called once at startup to convert Rust panics into
/// readable JavaScript errors with stack traces.
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Route `tracing` events at INFO and above to the devtools console.
///
/// Storage failures arrive as `console.warn`. Safe to call more than once;
/// only the first call installs the subscriber.
pub fn init_logging() {
    let layer = LineLayer::new(console_sink).with_filter(LevelFilter::INFO);
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

fn console_sink(level: Level, line: &str) {
    let line = JsValue::from_str(line);
    match level {
        Level::ERROR => console::error_1(&line),
        Level::WARN => console::warn_1(&line),
        _ => console::log_1(&line),
    }
}

/// Version information for the WASM module
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

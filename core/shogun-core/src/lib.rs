//! # shogun-core
//!
//! Client engine for the shogun dashboard: polls the backend, reconciles
//! snapshots into UI state, dispatches operator commands and projects
//! everything into display-agnostic view models.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Poll loops run on plain threads.
//! - **One state object**: [`AppState`] holds every mutable flag; the
//!   [`DashboardEngine`] owns it behind a mutex and never holds the lock
//!   across network I/O.
//! - **Ordered responses**: each poll stream carries a generation counter,
//!   so a slow response can never overwrite a newer one.
//! - **Graceful degradation**: a failed poll keeps the last good render and
//!   surfaces in the header; preferences fall back to memory.
//! - **Swappable bindings**: renderers produce [`DashboardView`]; the text
//!   and HTML bindings under [`render`] are two of many possible adapters.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shogun_core::{DashboardEngine, Preferences, SnapshotFetcher, StorageConfig};
//!
//! let storage = StorageConfig::from_home()?;
//! let config = shogun_core::load_config_with_storage(&storage);
//! let prefs = Preferences::open_or_memory(&storage.preferences_file());
//! let fetcher = SnapshotFetcher::http(&config.base_url);
//! let mut engine = DashboardEngine::new(config, fetcher, prefs, notifier, sink);
//! engine.start()?;
//! ```

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod i18n;
pub mod identity;
pub mod notifier;
pub mod panes;
pub mod patterns;
pub mod preferences;
pub mod render;
pub mod scheduler;
pub mod storage;
pub mod types;

pub use app_state::AppState;
pub use config::*;
pub use dispatch::{CommandAccepted, CommandDispatcher, Confirmer, DeleteOutcome};
pub use engine::{DashboardEngine, NullSink, SharedState, ViewSink};
pub use error::{DispatchError, FetchError, Result, ShogunError};
pub use fetcher::{HttpTransport, SnapshotFetcher, Transport};
pub use i18n::{Language, Localizer};
pub use notifier::{Notification, NotificationCapability, NotificationSink, NoNotifications};
pub use preferences::{JsonFileStore, MemoryStore, PreferenceStore, Preferences};
pub use render::DashboardView;
pub use scheduler::Scheduler;
pub use storage::StorageConfig;
pub use types::*;

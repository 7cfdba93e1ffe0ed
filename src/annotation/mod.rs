//! Interactive point annotation
//!
//! The session is a plain state machine over one volume. Surfaces feed it
//! through `SessionController` and redraw from its annotation list.

pub mod errors;
pub mod store;
pub mod session;
pub mod viewport;
pub mod controller;
pub mod terminal;

pub use errors::{SessionError, SessionResult, StoreError, StoreResult};
pub use store::{session_store_path, Annotation, AnnotationStore, Point, STORE_HEADER};
pub use session::{AnnotationSession, ConfirmOutcome, Counters, LoadOutcome, SessionState, DEFAULT_STORE_SUFFIX};
pub use viewport::{ViewRect, Viewport, MIN_VIEW_SIZE, ZOOM_STEP};
pub use controller::{AnnotationSurface, SessionController, SurfaceEvent};
pub use terminal::TerminalSurface;

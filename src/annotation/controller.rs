//! Adapter between an interactive surface and the annotation session
//!
//! A surface delivers discrete events and answers tag prompts; the
//! controller turns each event into at most one session transition and asks
//! the surface to redraw from the session afterwards. Events are taken one
//! at a time and each is fully handled before the next is read, so no
//! transition ever starts while another is running.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::utils::preview_utils;

use super::errors::SessionError;
use super::session::{AnnotationSession, ConfirmOutcome, SessionState};
use super::store::Annotation;
use super::viewport::Viewport;

/// Input delivered by a surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Place the unconfirmed point at slice coordinates
    PrimaryClick { x: f64, y: f64 },
    /// Confirm the unconfirmed point
    SecondaryClick { x: f64, y: f64 },
    /// Zoom in (positive) or out (negative) around a slice position
    Scroll { delta: i32, x: f64, y: f64 },
    /// Confirm key
    Confirm,
    /// Return to the initial framing
    ResetView,
    NewLine,
    Undo,
    Save,
    /// Open another volume
    Load(PathBuf),
    /// Write the current view as a PNG
    Render(PathBuf),
    Quit,
}

/// What the session needs from a display and input backend
pub trait AnnotationSurface {
    /// Next event, or `None` once input is exhausted
    fn next_event(&mut self) -> Option<SurfaceEvent>;

    /// Ask for the tag of the point about to be labelled `L<line>_C<column>`
    ///
    /// `None` means the operator cancelled.
    fn prompt_tag(&mut self, line: u32, column: u32) -> Option<String>;

    /// Show the session's current annotations and unconfirmed point
    fn redraw(&mut self, annotations: &[Annotation], pending: Option<(i64, i64)>, viewport: &Viewport);

    /// Replace the status line
    fn status(&mut self, text: &str);

    /// Report a failure the operator must see
    fn alert(&mut self, title: &str, message: &str);
}

/// Drives an `AnnotationSession` from a surface's events
pub struct SessionController<S: AnnotationSurface> {
    session: AnnotationSession,
    surface: S,
    viewport: Option<Viewport>,
}

impl<S: AnnotationSurface> SessionController<S> {
    pub fn new(session: AnnotationSession, surface: S) -> Self {
        SessionController {
            session,
            surface,
            viewport: None,
        }
    }

    /// Handles events until the surface is exhausted or asks to quit
    ///
    /// Returns the number of events handled.
    pub fn run(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.surface.next_event() {
            handled += 1;
            if !self.handle(event) {
                break;
            }
        }
        info!("Annotation session ended after {} events", handled);
        handled
    }

    /// Applies one event; returns `false` when the session should end
    pub fn handle(&mut self, event: SurfaceEvent) -> bool {
        debug!("Handling {:?} in state {:?}", event, self.session.state());

        match event {
            SurfaceEvent::Load(path) => self.load(&path),
            SurfaceEvent::PrimaryClick { x, y } => self.primary_click(x, y),
            SurfaceEvent::SecondaryClick { .. } | SurfaceEvent::Confirm => self.confirm(),
            SurfaceEvent::Scroll { delta, x, y } => {
                if let Some(viewport) = self.viewport.as_mut() {
                    viewport.zoom(delta, x, y);
                    self.redraw();
                }
            }
            SurfaceEvent::ResetView => {
                if let Some(viewport) = self.viewport.as_mut() {
                    viewport.reset();
                    self.redraw();
                    self.surface.status("View reset.");
                }
            }
            SurfaceEvent::NewLine => {
                if self.session.new_line().is_ok() {
                    self.show_status();
                }
            }
            SurfaceEvent::Undo => self.undo(),
            SurfaceEvent::Save => self.save(),
            SurfaceEvent::Render(path) => self.render(&path),
            SurfaceEvent::Quit => return false,
        }

        true
    }

    fn load(&mut self, path: &Path) {
        match self.session.load_volume(path) {
            Ok(outcome) => {
                self.viewport = self.session.volume()
                    .map(|volume| Viewport::new(volume.width(), volume.height()));
                self.redraw();

                match outcome.store_error {
                    Some(e) => {
                        self.surface.alert("Error loading CSV", &e.to_string());
                        self.show_status();
                    }
                    None if outcome.restored > 0 => self.surface.status("Loaded existing annotations."),
                    None => self.show_status(),
                }
            }
            Err(SessionError::NotAVolume(reason)) => {
                warn!("Rejected {}: {}", path.display(), reason);
                self.surface.alert("Error", "Selected file is not a 3D TIF.");
            }
            Err(e) => self.surface.alert("Error", &e.to_string()),
        }
    }

    fn primary_click(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            debug!("Ignoring click at non-finite position ({}, {})", x, y);
            return;
        }
        match self.session.primary_click(x.floor() as i64, y.floor() as i64) {
            Ok(()) => {
                self.redraw();
                self.show_status();
            }
            // Clicks off the slice or before a load are ignored
            Err(e) => debug!("Ignoring click: {}", e),
        }
    }

    fn confirm(&mut self) {
        if self.session.state() != SessionState::Pending {
            return;
        }

        let surface = &mut self.surface;
        let outcome = self.session.request_confirm(|line, column| surface.prompt_tag(line, column));

        match outcome {
            Ok(ConfirmOutcome::Confirmed(annotation)) => {
                info!("Labelled {} at {}", annotation.label, annotation.point);
                if let Some(viewport) = self.viewport.as_mut() {
                    viewport.reset();
                }
                self.redraw();
                self.show_status();
            }
            Ok(ConfirmOutcome::Cancelled) => {
                self.redraw();
                self.surface.status("Labeling cancelled.");
            }
            Err(e) => debug!("Confirm refused: {}", e),
        }
    }

    fn undo(&mut self) {
        match self.session.undo() {
            Ok(removed) => {
                self.redraw();
                self.surface.status(&format!("Deleted: {}. {}", removed.label, self.session.status_line()));
            }
            Err(e) => self.surface.status(&e.to_string()),
        }
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(path) => {
                let name = path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.surface.status(&format!("Saved to: {}", name));
            }
            Err(SessionError::NoVolume) => {}
            Err(e) => self.surface.alert("Error saving CSV", &e.to_string()),
        }
    }

    fn render(&mut self, path: &Path) {
        let (Some(volume), Some(z), Some(viewport)) =
            (self.session.volume(), self.session.display_slice(), self.viewport.as_ref()) else {
            return;
        };

        let window = viewport.pixel_window(volume.width(), volume.height());
        let rendered = preview_utils::render_annotated_slice(
            volume, z, self.session.annotations(), self.session.pending(), window);

        match rendered.map(|image| preview_utils::save_preview(&image, path)) {
            Some(Ok(written)) => self.surface.status(&format!("Preview written to {}", written.display())),
            Some(Err(e)) => self.surface.alert("Error writing preview", &e.to_string()),
            None => self.surface.alert("Error writing preview", "Nothing visible to render"),
        }
    }

    fn redraw(&mut self) {
        if let Some(viewport) = self.viewport.as_ref() {
            self.surface.redraw(self.session.annotations(), self.session.pending(), viewport);
        }
    }

    fn show_status(&mut self) {
        let text = self.session.status_line();
        self.surface.status(&text);
    }

    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn into_parts(self) -> (AnnotationSession, S) {
        (self.session, self.surface)
    }
}

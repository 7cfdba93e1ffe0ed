//! Annotation session state machine
//!
//! One session annotates one volume at a time on its middle slice. The
//! session owns the annotation list, the unconfirmed point and the
//! line/column counters; whatever draws the slice only reads them back.
//!
//! Counters are never persisted. They are re-derived from the label of the
//! last annotation whenever the list changes from outside the normal
//! confirm flow (store load, undo).

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::codec::label;
use crate::tiff::volume_reader::VolumeReader;
use crate::volume::Volume;

use super::errors::{SessionError, SessionResult, StoreError};
use super::store::{session_store_path, Annotation, AnnotationStore, Point};

/// Default suffix appended to the volume's stem to name its store
pub const DEFAULT_STORE_SUFFIX: &str = "_labels.csv";

/// Where the session is in the labelling workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No volume loaded
    Idle,
    /// Volume loaded, nothing awaiting a label
    Ready,
    /// One clicked point awaits a label
    Pending,
}

/// Line and column the next confirmed point will be labelled with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub line: u32,
    pub column: u32,
}

impl Default for Counters {
    fn default() -> Self {
        Counters { line: 1, column: 1 }
    }
}

impl Counters {
    /// Counters that continue after the store's last annotation
    ///
    /// Falls back to (1, 1) for an empty store or an unparseable label.
    pub fn derive(store: &AnnotationStore) -> Self {
        let Some(last) = store.last() else {
            return Counters::default();
        };

        match label::decode(&last.label) {
            Ok((line, column)) => Counters { line, column: column.saturating_add(1) },
            Err(e) => {
                debug!("Resetting counters, last label unparseable: {}", e);
                Counters::default()
            }
        }
    }
}

/// Result of asking the operator for a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The pending point became this annotation
    Confirmed(Annotation),
    /// Empty or cancelled tag; the pending point was dropped
    Cancelled,
}

/// What a volume load brought back
#[derive(Debug)]
pub struct LoadOutcome {
    /// Where the store is read from and saved to
    pub store_path: PathBuf,
    /// Annotations restored from an existing store
    pub restored: usize,
    /// Set when a store existed but could not be read
    pub store_error: Option<StoreError>,
}

/// Interactive annotation state for one volume
pub struct AnnotationSession {
    store_suffix: String,
    volume: Option<Volume>,
    volume_path: Option<PathBuf>,
    store: AnnotationStore,
    pending: Option<(i64, i64)>,
    counters: Counters,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_SUFFIX)
    }
}

impl AnnotationSession {
    pub fn new(store_suffix: &str) -> Self {
        AnnotationSession {
            store_suffix: store_suffix.to_string(),
            volume: None,
            volume_path: None,
            store: AnnotationStore::new(),
            pending: None,
            counters: Counters::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.volume, &self.pending) {
            (None, _) => SessionState::Idle,
            (Some(_), None) => SessionState::Ready,
            (Some(_), Some(_)) => SessionState::Pending,
        }
    }

    /// Reads a volume file and starts annotating it
    ///
    /// The file is probed before it is decoded. On any failure the session
    /// keeps its previous volume and annotations.
    pub fn load_volume(&mut self, path: &Path) -> SessionResult<LoadOutcome> {
        let mut reader = VolumeReader::new();
        let info = reader.probe(path)?;
        if !info.is_volume() {
            return Err(SessionError::NotAVolume(format!(
                "{} page(s), {} sample(s) per pixel", info.pages, info.samples_per_pixel)));
        }

        let volume = reader.read_file(path)?;
        self.attach_volume(volume, path)
    }

    /// Starts annotating an already decoded volume
    ///
    /// `path` names the volume file; the store lives next to it.
    pub fn attach_volume(&mut self, volume: Volume, path: &Path) -> SessionResult<LoadOutcome> {
        if volume.depth() < 2 {
            return Err(SessionError::NotAVolume(format!("{} has a single slice", path.display())));
        }

        info!("Annotating {} ({})", path.display(), volume);
        self.volume = Some(volume);
        self.volume_path = Some(path.to_path_buf());
        self.store.clear();
        self.pending = None;
        self.counters = Counters::default();

        let store_path = session_store_path(path, &self.store_suffix);
        let mut outcome = LoadOutcome { store_path: store_path.clone(), restored: 0, store_error: None };

        if store_path.exists() {
            match AnnotationStore::load(&store_path) {
                Ok(store) => {
                    self.store = store;
                    self.counters = Counters::derive(&self.store);
                    outcome.restored = self.store.len();
                }
                Err(e) => {
                    warn!("Could not read {}: {}", store_path.display(), e);
                    outcome.store_error = Some(e);
                }
            }
        }

        Ok(outcome)
    }

    /// Places the unconfirmed point, replacing any previous one
    pub fn primary_click(&mut self, x: i64, y: i64) -> SessionResult<()> {
        let volume = self.volume.as_ref().ok_or(SessionError::NoVolume)?;
        let (width, height) = (volume.width(), volume.height());

        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            return Err(SessionError::OutsideSlice { x, y, width, height });
        }

        if let Some((px, py)) = self.pending.replace((x, y)) {
            debug!("Discarding unconfirmed point ({}, {})", px, py);
        }
        Ok(())
    }

    /// Asks for a tag and turns the pending point into an annotation
    ///
    /// `prompt` receives the current line and column and returns the tag,
    /// or `None` when the operator cancels.
    pub fn request_confirm<F>(&mut self, prompt: F) -> SessionResult<ConfirmOutcome>
    where
        F: FnOnce(u32, u32) -> Option<String>,
    {
        let (x, y) = self.pending.ok_or(SessionError::NoPendingPoint)?;
        let z = self.display_slice().ok_or(SessionError::NoVolume)? as i64;

        let tag = prompt(self.counters.line, self.counters.column);
        self.pending = None;

        match tag {
            Some(tag) if !tag.is_empty() => {
                let full_label = label::encode(self.counters.line, self.counters.column, &tag);
                let point = Point::new(x, y, z);
                self.store.append(point, full_label.clone());
                self.counters.column += 1;

                debug!("Confirmed {} at {}", full_label, point);
                Ok(ConfirmOutcome::Confirmed(Annotation { point, label: full_label }))
            }
            _ => Ok(ConfirmOutcome::Cancelled),
        }
    }

    /// Starts a new line; the next confirmed point gets column 1
    pub fn new_line(&mut self) -> SessionResult<Counters> {
        if self.volume.is_none() {
            return Err(SessionError::NoVolume);
        }
        self.counters.line += 1;
        self.counters.column = 1;
        Ok(self.counters)
    }

    /// Removes the last annotation and re-derives the counters
    pub fn undo(&mut self) -> SessionResult<Annotation> {
        let removed = self.store.pop_last().ok_or(SessionError::NothingToUndo)?;
        self.counters = Counters::derive(&self.store);
        Ok(removed)
    }

    /// Writes the annotations next to the volume
    ///
    /// The pending point is never saved.
    pub fn save(&self) -> SessionResult<PathBuf> {
        let path = self.store_path().ok_or(SessionError::NoVolume)?;
        self.store.save(&path)?;
        Ok(path)
    }

    pub fn store_path(&self) -> Option<PathBuf> {
        self.volume_path.as_deref()
            .map(|path| session_store_path(path, &self.store_suffix))
    }

    pub fn volume(&self) -> Option<&Volume> {
        self.volume.as_ref()
    }

    pub fn volume_path(&self) -> Option<&Path> {
        self.volume_path.as_deref()
    }

    /// Slice shown to the operator; every annotation gets this z
    pub fn display_slice(&self) -> Option<usize> {
        self.volume.as_ref().map(Volume::middle_index)
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn pending(&self) -> Option<(i64, i64)> {
        self.pending
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// One-line summary of the counters and the next expected action
    pub fn status_line(&self) -> String {
        match self.state() {
            SessionState::Idle => "No volume loaded".to_string(),
            SessionState::Ready => format!(
                "Line: {}, Column: {} - Left-click to add, Right-click or Enter to label",
                self.counters.line, self.counters.column),
            SessionState::Pending => format!(
                "Line {}, Column {} - Right-click or press Enter to confirm",
                self.counters.line, self.counters.column),
        }
    }
}

impl fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("state", &self.state())
            .field("volume_path", &self.volume_path)
            .field("annotations", &self.store.len())
            .field("pending", &self.pending)
            .field("counters", &self.counters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::SampleType;

    fn ready_session(dir: &Path) -> AnnotationSession {
        let mut session = AnnotationSession::default();
        let volume = Volume::zeros((9, 32, 48), SampleType::U8);
        session.attach_volume(volume, &dir.join("cube.tif")).unwrap();
        session
    }

    fn click_and_label(session: &mut AnnotationSession, x: i64, y: i64, tag: &str) -> ConfirmOutcome {
        session.primary_click(x, y).unwrap();
        session.request_confirm(|_, _| Some(tag.to_string())).unwrap()
    }

    #[test]
    fn idle_session_rejects_transitions() {
        let mut session = AnnotationSession::default();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(session.primary_click(1, 1), Err(SessionError::NoVolume)));
        assert!(matches!(session.new_line(), Err(SessionError::NoVolume)));
        assert!(matches!(session.save(), Err(SessionError::NoVolume)));
    }

    #[test]
    fn consecutive_confirmations_advance_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());

        for i in 0..4 {
            click_and_label(&mut session, i, i, "cell");
        }

        assert_eq!(session.counters(), Counters { line: 1, column: 5 });
        assert_eq!(session.annotations()[3].label, "L1_C4__cell");
        assert!(session.annotations().iter().all(|a| a.point.z == 4));
    }

    #[test]
    fn new_line_resets_column_and_keeps_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        click_and_label(&mut session, 1, 1, "a");
        click_and_label(&mut session, 2, 2, "b");

        session.primary_click(3, 3).unwrap();
        session.new_line().unwrap();
        assert_eq!(session.state(), SessionState::Pending);

        let outcome = session.request_confirm(|_, _| Some("c".to_string())).unwrap();
        match outcome {
            ConfirmOutcome::Confirmed(annotation) => {
                assert_eq!(label::decode(&annotation.label), Ok((2, 1)));
                assert_eq!(annotation.point, Point::new(3, 3, 4));
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
    }

    #[test]
    fn second_click_replaces_pending_point() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        session.primary_click(5, 6).unwrap();
        session.primary_click(7, 8).unwrap();
        assert_eq!(session.pending(), Some((7, 8)));
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn empty_or_cancelled_tag_discards_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());

        session.primary_click(5, 6).unwrap();
        assert_eq!(session.request_confirm(|_, _| Some(String::new())).unwrap(), ConfirmOutcome::Cancelled);
        session.primary_click(5, 6).unwrap();
        assert_eq!(session.request_confirm(|_, _| None).unwrap(), ConfirmOutcome::Cancelled);

        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.annotations().is_empty());
        assert_eq!(session.counters(), Counters::default());
        assert!(matches!(session.request_confirm(|_, _| None), Err(SessionError::NoPendingPoint)));
    }

    #[test]
    fn prompt_sees_current_counters() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        session.new_line().unwrap();
        session.primary_click(0, 0).unwrap();

        let mut seen = None;
        session.request_confirm(|line, column| {
            seen = Some((line, column));
            Some("x".to_string())
        }).unwrap();
        assert_eq!(seen, Some((2, 1)));
    }

    #[test]
    fn click_outside_slice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        assert!(matches!(session.primary_click(48, 0), Err(SessionError::OutsideSlice { .. })));
        assert!(matches!(session.primary_click(0, -1), Err(SessionError::OutsideSlice { .. })));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn undo_is_inverse_of_confirm() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        click_and_label(&mut session, 1, 1, "a");
        click_and_label(&mut session, 2, 2, "b");
        let before = (session.annotations().to_vec(), session.counters());

        click_and_label(&mut session, 3, 3, "c");
        let removed = session.undo().unwrap();

        assert_eq!(removed.label, "L1_C3__c");
        assert_eq!((session.annotations().to_vec(), session.counters()), before);
    }

    #[test]
    fn undo_falls_back_to_first_counters() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        session.new_line().unwrap();
        click_and_label(&mut session, 1, 1, "a");

        session.undo().unwrap();
        assert_eq!(session.counters(), Counters::default());
        assert!(matches!(session.undo(), Err(SessionError::NothingToUndo)));
    }

    #[test]
    fn resumed_session_continues_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        click_and_label(&mut session, 1, 1, "a");
        session.new_line().unwrap();
        click_and_label(&mut session, 2, 2, "b");
        let saved_to = session.save().unwrap();
        assert_eq!(saved_to, dir.path().join("cube_labels.csv"));

        let resumed = ready_session(dir.path());
        assert_eq!(resumed.annotations(), session.annotations());
        assert_eq!(resumed.counters(), Counters { line: 2, column: 2 });
    }

    #[test]
    fn unparseable_last_label_resets_counters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cube_labels.csv"), "x,y,z,label\n1,1,4,L3_C2__a\n2,2,4,free text\n").unwrap();

        let session = ready_session(dir.path());
        assert_eq!(session.annotations().len(), 2);
        assert_eq!(session.counters(), Counters::default());
    }

    #[test]
    fn corrupt_store_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cube_labels.csv"), "x,y,z,label\n1,one,4,L1_C1__a\n").unwrap();

        let mut session = AnnotationSession::default();
        let outcome = session
            .attach_volume(Volume::zeros((3, 4, 4), SampleType::U8), &dir.path().join("cube.tif"))
            .unwrap();

        assert!(matches!(outcome.store_error, Some(StoreError::Corrupt { line: 2, .. })));
        assert!(session.annotations().is_empty());
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn single_slice_is_not_a_volume() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ready_session(dir.path());
        click_and_label(&mut session, 1, 1, "a");

        let flat = Volume::zeros((1, 4, 4), SampleType::U8);
        assert!(matches!(
            session.attach_volume(flat, &dir.path().join("flat.tif")),
            Err(SessionError::NotAVolume(_))
        ));
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(session.volume_path(), Some(dir.path().join("cube.tif").as_path()));
    }
}

//! Time-windowed observation aggregation.
//!
//! Buckets raw observations by lookback window and feeds the active
//! window's points into the spatial field, recomputing on window change or
//! resize. Mutation is serialized so the field is never accumulated twice
//! in overlapping fashion: selection state lives behind a `Mutex`, the grid
//! behind a `RwLock`, and every write path locks selection first, then the
//! grid. Color reads share the grid's read lock and observe a consistent
//! snapshot.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::heatmap::{FieldPoint, SpatialField};
use crate::types::{HeatmapConfig, Observation, Rgba, TimeWindow};

struct Selection {
    /// Full observation set, in arrival order.
    observations: Vec<Observation>,
    window: TimeWindow,
    /// Active window's selection, newest first. Cached so a resize can
    /// re-accumulate without re-deciding "now".
    current: Vec<Observation>,
}

/// Owns one spatial field and the observation set feeding it.
pub struct ObservationAggregator {
    selection: Mutex<Selection>,
    field: RwLock<SpatialField>,
}

impl ObservationAggregator {
    pub fn new(width: u32, height: u32, config: HeatmapConfig, window: TimeWindow) -> Self {
        Self {
            selection: Mutex::new(Selection {
                observations: Vec::new(),
                window,
                current: Vec::new(),
            }),
            field: RwLock::new(SpatialField::new(width, height, config)),
        }
    }

    /// Append an observation to the full set.
    ///
    /// The rendered field refreshes on the next `set_window`/`refresh` call;
    /// arrival alone does not trigger a re-accumulate.
    pub fn push(&self, observation: Observation) {
        let mut selection = self.selection.lock();
        selection.observations.push(observation);
        log::debug!(
            "observation stored ({} total)",
            selection.observations.len()
        );
    }

    pub fn push_all(&self, observations: impl IntoIterator<Item = Observation>) {
        let mut selection = self.selection.lock();
        selection.observations.extend(observations);
    }

    /// Switch the active window and re-accumulate the field from the
    /// observations inside `now − lookback(window)`, newest first, truncated
    /// to the window's cap. Returns the selection. Idempotent modulo new
    /// observations arriving.
    pub fn set_window(&self, window: TimeWindow, now: DateTime<Utc>) -> Vec<Observation> {
        let mut selection = self.selection.lock();
        selection.window = window;
        self.reselect(&mut selection, now)
    }

    /// Re-run selection for the current window (e.g. after new observations
    /// arrived) without changing it.
    pub fn refresh(&self, now: DateTime<Utc>) -> Vec<Observation> {
        let mut selection = self.selection.lock();
        self.reselect(&mut selection, now)
    }

    /// Resize the field and re-accumulate the cached selection. Repeated
    /// resize to the same dimensions reproduces an identical grid.
    pub fn on_resize(&self, width: u32, height: u32) {
        let selection = self.selection.lock();
        let points: Vec<FieldPoint> = selection.current.iter().map(FieldPoint::from).collect();
        let mut field = self.field.write();
        field.resize(width, height);
        field.accumulate(&points);
    }

    pub fn window(&self) -> TimeWindow {
        self.selection.lock().window
    }

    pub fn observation_count(&self) -> usize {
        self.selection.lock().observations.len()
    }

    /// Gradient color at a point of the current field snapshot.
    pub fn query_color(&self, x: f64, y: f64) -> Rgba {
        self.field.read().query_color(x, y)
    }

    /// Normalized intensity in [0, 1] at a point of the current snapshot.
    pub fn intensity_at(&self, x: f64, y: f64) -> f64 {
        self.field.read().intensity_at(x, y)
    }

    /// Run `f` against the current field snapshot (zone ranking, cell dumps).
    pub fn with_field<R>(&self, f: impl FnOnce(&SpatialField) -> R) -> R {
        f(&self.field.read())
    }

    /// Select the active window's observations and rebuild the grid.
    /// Caller holds the selection lock, so accumulate calls cannot
    /// interleave; last writer wins.
    fn reselect(&self, selection: &mut Selection, now: DateTime<Utc>) -> Vec<Observation> {
        let cutoff = now - selection.window.lookback();
        let mut selected: Vec<Observation> = selection
            .observations
            .iter()
            .filter(|obs| obs.detected_at >= cutoff && obs.detected_at <= now)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        selected.truncate(selection.window.max_points());

        let points: Vec<FieldPoint> = selected.iter().map(FieldPoint::from).collect();
        self.field.write().accumulate(&points);

        log::debug!(
            "window {} selected {} of {} observations",
            selection.window.as_str(),
            selected.len(),
            selection.observations.len()
        );

        selection.current = selected.clone();
        selected
    }
}

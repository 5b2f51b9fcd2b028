use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;

use crate::chart::{ChartDescription, ChartLayout};
use crate::controller::ChartController;
use crate::data::filter::RangeSelection;
use crate::data::loader::{Loader, LoaderSettings};
use crate::data::model::Dataset;
use crate::data::source::{DataSource, DataSourceError};

// ---------------------------------------------------------------------------
// Chart session: the interaction state once a dataset is loaded
// ---------------------------------------------------------------------------

/// Interface phase derived from the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No complete selection; the last chart stays on screen.
    Idle,
    Filtered { start: NaiveDate, end: NaiveDate },
}

/// Picker state plus the chart currently on screen.
pub struct ChartSession {
    controller: Arc<ChartController>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    chart: ChartDescription,
    /// Bumped every time `chart` is replaced.
    revision: u64,
}

impl ChartSession {
    pub fn new(controller: Arc<ChartController>) -> Self {
        let chart = controller.initial_chart();
        Self {
            controller,
            start: None,
            end: None,
            chart,
            revision: 0,
        }
    }

    pub fn chart(&self) -> &ChartDescription {
        &self.chart
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn record_count(&self) -> usize {
        self.controller.record_count()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Calendar days the picker may offer.
    pub fn selectable_dates(&self) -> (NaiveDate, NaiveDate) {
        let (min, max) = self.controller.selectable_bounds();
        (min.date(), max.date())
    }

    pub fn phase(&self) -> Phase {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Phase::Filtered { start, end },
            _ => Phase::Idle,
        }
    }

    pub fn set_start(&mut self, date: Option<NaiveDate>) {
        self.start = date.map(|d| self.clamp(d));
        self.refilter();
    }

    pub fn set_end(&mut self, date: Option<NaiveDate>) {
        self.end = date.map(|d| self.clamp(d));
        self.refilter();
    }

    fn clamp(&self, date: NaiveDate) -> NaiveDate {
        let (min, max) = self.selectable_dates();
        date.clamp(min, max)
    }

    /// Ask the controller for a chart matching the picker. `NoUpdate` keeps
    /// the current chart and revision.
    fn refilter(&mut self) {
        let selection = RangeSelection::from_dates(self.start, self.end);
        let update = self
            .controller
            .on_range_changed(selection.start, selection.end);
        if let Some(chart) = update.into_chart() {
            self.chart = chart;
            self.revision += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Load state: explicit pre-ready phase while the loader runs
// ---------------------------------------------------------------------------

pub enum LoadState {
    /// Loader running on a background thread.
    Loading(Receiver<Result<Dataset, DataSourceError>>),
    Ready(ChartSession),
    /// Fatal: no chart is ever shown.
    Failed(String),
}

/// Run the loader off the UI thread. The receiver yields exactly one result.
pub fn spawn_load(
    source: Box<dyn DataSource>,
    settings: LoaderSettings,
) -> Receiver<Result<Dataset, DataSourceError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = Loader::new(settings).load(source.as_ref());
        // The UI may be gone already; nothing to do then.
        let _ = tx.send(result);
    });
    rx
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub load: LoadState,
    /// Layout handed to the controller once the dataset arrives.
    layout: ChartLayout,
}

impl AppState {
    pub fn new(rx: Receiver<Result<Dataset, DataSourceError>>, layout: ChartLayout) -> Self {
        Self {
            load: LoadState::Loading(rx),
            layout,
        }
    }

    /// Check on a pending load. Returns `true` when the state changed.
    pub fn poll_load(&mut self) -> bool {
        let LoadState::Loading(rx) = &self.load else {
            return false;
        };
        let next = match rx.try_recv() {
            Ok(Ok(dataset)) => {
                let controller = ChartController::new(dataset, self.layout.clone());
                LoadState::Ready(ChartSession::new(Arc::new(controller)))
            }
            Ok(Err(e)) => {
                log::error!("Failed to load dataset: {e:#}");
                LoadState::Failed(format_error_chain(&e))
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                log::error!("Loader thread ended without a result");
                LoadState::Failed("loader thread ended without a result".to_string())
            }
        };
        self.load = next;
        true
    }

    pub fn session(&self) -> Option<&ChartSession> {
        match &self.load {
            LoadState::Ready(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut ChartSession> {
        match &mut self.load {
            LoadState::Ready(session) => Some(session),
            _ => None,
        }
    }
}

/// `error: cause: cause` on one line.
fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::loader::IngestionWindow;
    use crate::data::model::fixtures::{at, three_minutes};
    use crate::data::model::RawReading;

    fn session() -> ChartSession {
        ChartSession::new(Arc::new(ChartController::new(
            three_minutes(),
            ChartLayout::default(),
        )))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn starts_idle_with_full_chart() {
        let s = session();
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.revision(), 0);
        assert_eq!(s.chart().len(), 3);
    }

    #[test]
    fn partial_selection_keeps_chart() {
        let mut s = session();
        s.set_start(Some(day(1)));
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.revision(), 0);
        assert_eq!(s.chart().len(), 3);
    }

    #[test]
    fn idle_to_filtered_and_back() {
        let mut s = session();
        s.set_start(Some(day(1)));
        s.set_end(Some(day(1)));
        assert_eq!(
            s.phase(),
            Phase::Filtered {
                start: day(1),
                end: day(1)
            }
        );
        assert_eq!(s.revision(), 1);
        let filtered = s.chart().clone();

        // Clearing one bound goes back to Idle but the chart stays.
        s.set_end(None);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.revision(), 1);
        assert_eq!(s.chart(), &filtered);
    }

    #[test]
    fn first_day_picked_twice_charts_single_point() {
        let mut s = session();
        let (min_day, _) = s.selectable_dates();
        s.set_start(Some(min_day));
        s.set_end(Some(min_day));
        assert_eq!(s.chart().len(), 1);
        assert_eq!(s.chart().timestamps, vec![at(0, 0)]);
    }

    #[test]
    fn picked_dates_are_clamped_to_bounds() {
        let mut s = session();
        s.set_start(Some(day(20)));
        assert_eq!(s.start(), Some(day(1)));
        assert_eq!(s.selectable_dates(), (day(1), day(1)));
    }

    struct FixedSource(Vec<RawReading>);

    impl DataSource for FixedSource {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        fn fetch(&self) -> Result<Vec<RawReading>, DataSourceError> {
            Ok(self.0.clone())
        }
    }

    fn settings() -> LoaderSettings {
        LoaderSettings {
            window: IngestionWindow {
                start: at(0, 0),
                end: at(1, 0),
            },
            co2_divisor: 1000.0,
        }
    }

    fn wait_for_load(state: &mut AppState) {
        for _ in 0..500 {
            if state.poll_load() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("loader did not finish");
    }

    #[test]
    fn background_load_becomes_ready() {
        let rows = vec![RawReading {
            timestamp: at(0, 3),
            co: Some(0.5),
            co2_raw: Some(421_000.0),
            ch4: Some(2.0),
        }];
        let rx = spawn_load(Box::new(FixedSource(rows)), settings());
        let mut state = AppState::new(rx, ChartLayout::default());
        assert!(state.session().is_none());

        wait_for_load(&mut state);
        let session = state.session().expect("ready");
        assert_eq!(session.record_count(), 1);
        assert_eq!(session.chart().timestamps, vec![at(0, 3)]);
        assert!(!state.poll_load());
    }

    #[test]
    fn empty_source_fails_load() {
        let rx = spawn_load(Box::new(FixedSource(Vec::new())), settings());
        let mut state = AppState::new(rx, ChartLayout::default());

        wait_for_load(&mut state);
        match &state.load {
            LoadState::Failed(msg) => assert!(msg.contains("no readings"), "{msg}"),
            _ => panic!("expected failure"),
        }
    }
}

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use covid_terminal::error::TrackerError;
use covid_terminal::history::HistorySeries;
use covid_terminal::model::{Coordinates, CountryRecord, CountrySelector, GlobalSummary};
use covid_terminal::source::StatsSource;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn record(name: &str, iso: &str, cases: Option<u64>) -> CountryRecord {
    CountryRecord {
        name: name.to_string(),
        iso_code: iso.to_string(),
        cases,
        today_cases: Some(0),
        deaths: Some(0),
        today_deaths: Some(0),
        recovered: None,
        today_recovered: None,
        coordinates: Coordinates {
            lat: cases.unwrap_or(0) as f64 / 100.0,
            long: -(cases.unwrap_or(0) as f64) / 100.0,
        },
    }
}

pub fn summary_with_cases(cases: u64) -> GlobalSummary {
    GlobalSummary {
        cases: Some(cases),
        ..GlobalSummary::default()
    }
}

/// Scripted source: returns whatever the test put in, and counts calls.
#[derive(Default)]
pub struct FakeSource {
    pub countries: Mutex<Option<Result<Vec<CountryRecord>, TrackerError>>>,
    pub summary: Mutex<Option<Result<GlobalSummary, TrackerError>>>,
    pub history: Mutex<Option<Result<HistorySeries, TrackerError>>>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_countries(records: Vec<CountryRecord>) -> Self {
        let source = Self::default();
        *source.countries.lock().unwrap() = Some(Ok(records));
        source
    }

    pub fn failing() -> Self {
        let source = Self::default();
        let err = TrackerError::DataUnavailable("connection refused".to_string());
        *source.countries.lock().unwrap() = Some(Err(err.clone()));
        *source.summary.lock().unwrap() = Some(Err(err.clone()));
        *source.history.lock().unwrap() = Some(Err(err));
        source
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn unavailable<T>() -> Result<T, TrackerError> {
        Err(TrackerError::DataUnavailable("not scripted".to_string()))
    }
}

impl StatsSource for FakeSource {
    fn fetch_countries(&self) -> Result<Vec<CountryRecord>, TrackerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.countries
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(Self::unavailable)
    }

    fn fetch_summary(&self, selector: &CountrySelector) -> Result<GlobalSummary, TrackerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.summary.lock().unwrap().clone();
        match scripted {
            Some(result) => result,
            None => Ok(GlobalSummary {
                iso_code: selector.iso_code().map(str::to_string),
                ..GlobalSummary::default()
            }),
        }
    }

    fn fetch_history(&self, _days: u32) -> Result<HistorySeries, TrackerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(Self::unavailable)
    }
}

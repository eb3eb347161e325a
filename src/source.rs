use crate::error::TrackerError;
use crate::history::HistorySeries;
use crate::model::{CountryRecord, CountrySelector, GlobalSummary};

/// Where statistics come from. Implementations block until the fetch completes
/// and report every failure as `TrackerError::DataUnavailable`.
pub trait StatsSource {
    fn fetch_countries(&self) -> Result<Vec<CountryRecord>, TrackerError>;

    fn fetch_summary(&self, selector: &CountrySelector) -> Result<GlobalSummary, TrackerError>;

    fn fetch_history(&self, days: u32) -> Result<HistorySeries, TrackerError>;
}

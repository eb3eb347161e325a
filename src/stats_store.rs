use std::collections::HashSet;

use crate::error::TrackerError;
use crate::history::HistorySeries;
use crate::model::{CountryRecord, CountrySelector, GlobalSummary};
use crate::ranking::rank;
use crate::source::StatsSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Countries,
    Summary,
    History,
}

impl FetchKind {
    fn slot(self) -> usize {
        match self {
            FetchKind::Countries => 0,
            FetchKind::Summary => 1,
            FetchKind::History => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FetchKind::Countries => "countries",
            FetchKind::Summary => "summary",
            FetchKind::History => "history",
        }
    }
}

/// Identifies one issued fetch. Only the latest ticket per kind may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    kind: FetchKind,
    seq: u64,
}

impl RequestTicket {
    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request of the same kind was issued; the result was dropped.
    Stale,
    Failed(TrackerError),
}

impl Outcome {
    pub fn into_result(self) -> Result<(), TrackerError> {
        match self {
            Outcome::Applied | Outcome::Stale => Ok(()),
            Outcome::Failed(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsStore {
    countries: Vec<CountryRecord>,
    ranked: Vec<CountryRecord>,
    summary: Option<GlobalSummary>,
    history: Option<HistorySeries>,
    issued: [u64; 3],
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn countries(&self) -> &[CountryRecord] {
        &self.countries
    }

    pub fn ranked(&self) -> &[CountryRecord] {
        &self.ranked
    }

    pub fn country(&self, iso_code: &str) -> Option<&CountryRecord> {
        self.countries.iter().find(|c| c.iso_code == iso_code)
    }

    pub fn summary(&self) -> Option<&GlobalSummary> {
        self.summary.as_ref()
    }

    pub fn history(&self) -> Option<&HistorySeries> {
        self.history.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        !self.countries.is_empty()
    }

    pub fn begin(&mut self, kind: FetchKind) -> RequestTicket {
        let slot = &mut self.issued[kind.slot()];
        *slot += 1;
        RequestTicket { kind, seq: *slot }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.issued[ticket.kind.slot()] == ticket.seq
    }

    pub fn load_all_countries(&mut self, source: &dyn StatsSource) -> Result<(), TrackerError> {
        let ticket = self.begin(FetchKind::Countries);
        let result = source.fetch_countries();
        self.complete_countries(ticket, result).into_result()
    }

    pub fn load_summary(
        &mut self,
        selector: &CountrySelector,
        source: &dyn StatsSource,
    ) -> Result<(), TrackerError> {
        let ticket = self.begin(FetchKind::Summary);
        let result = source.fetch_summary(selector);
        self.complete_summary(ticket, result).into_result()
    }

    pub fn load_history(&mut self, days: u32, source: &dyn StatsSource) -> Result<(), TrackerError> {
        let ticket = self.begin(FetchKind::History);
        let result = source.fetch_history(days);
        self.complete_history(ticket, result).into_result()
    }

    pub fn complete_countries(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<CountryRecord>, TrackerError>,
    ) -> Outcome {
        if ticket.kind != FetchKind::Countries || !self.is_current(ticket) {
            return Outcome::Stale;
        }
        match result {
            Ok(records) => {
                let records = dedup_iso_codes(records);
                self.ranked = rank(&records);
                self.countries = records;
                Outcome::Applied
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    pub fn complete_summary(
        &mut self,
        ticket: RequestTicket,
        result: Result<GlobalSummary, TrackerError>,
    ) -> Outcome {
        if ticket.kind != FetchKind::Summary || !self.is_current(ticket) {
            return Outcome::Stale;
        }
        match result {
            Ok(summary) => {
                self.summary = Some(summary);
                Outcome::Applied
            }
            Err(err) => Outcome::Failed(err),
        }
    }

    pub fn complete_history(
        &mut self,
        ticket: RequestTicket,
        result: Result<HistorySeries, TrackerError>,
    ) -> Outcome {
        if ticket.kind != FetchKind::History || !self.is_current(ticket) {
            return Outcome::Stale;
        }
        match result {
            Ok(history) => {
                self.history = Some(history);
                Outcome::Applied
            }
            Err(err) => Outcome::Failed(err),
        }
    }
}

// First occurrence of an isoCode wins.
fn dedup_iso_codes(records: Vec<CountryRecord>) -> Vec<CountryRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.iso_code.clone()))
        .collect()
}

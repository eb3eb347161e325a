use std::borrow::Cow;
use std::collections::VecDeque;

use crate::error::TrackerError;
use crate::history::HistorySeries;
use crate::model::{CountryRecord, CountrySelector, GlobalSummary, Metric};
use crate::ranking::rank_by;
use crate::selection::SelectionController;
use crate::stats_store::{FetchKind, Outcome, RequestTicket, StatsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSort {
    Cases,
    ActiveMetric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEntry {
    Worldwide,
    Country { iso_code: String, name: String },
}

impl PickerEntry {
    pub fn selector(&self) -> CountrySelector {
        match self {
            PickerEntry::Worldwide => CountrySelector::Worldwide,
            PickerEntry::Country { iso_code, .. } => CountrySelector::Country(iso_code.clone()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PickerEntry::Worldwide => "Worldwide",
            PickerEntry::Country { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    CountriesLoaded {
        ticket: RequestTicket,
        result: Result<Vec<CountryRecord>, TrackerError>,
    },
    SummaryLoaded {
        ticket: RequestTicket,
        result: Result<GlobalSummary, TrackerError>,
    },
    HistoryLoaded {
        ticket: RequestTicket,
        result: Result<HistorySeries, TrackerError>,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchCountries {
        ticket: RequestTicket,
    },
    FetchSummary {
        ticket: RequestTicket,
        selector: CountrySelector,
    },
    FetchHistory {
        ticket: RequestTicket,
        days: u32,
    },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StatsStore,
    pub selection: SelectionController,
    pub history_days: u32,
    pub table_selected: usize,
    pub table_sort: TableSort,
    pub picker: Option<usize>,
    pub inflight: [bool; 3],
    pub last_error: Option<TrackerError>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(120)
    }
}

impl AppState {
    pub fn new(history_days: u32) -> Self {
        Self {
            store: StatsStore::new(),
            selection: SelectionController::new(),
            history_days,
            table_selected: 0,
            table_sort: TableSort::Cases,
            picker: None,
            inflight: [false; 3],
            last_error: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    /// Commands for a full refresh: country list, the current summary, history.
    pub fn reload_commands(&mut self) -> Vec<ProviderCommand> {
        let countries = self.store.begin(FetchKind::Countries);
        let summary = self.selection.refresh(&mut self.store);
        let history = self.store.begin(FetchKind::History);
        let selector = self
            .selection
            .pending_target()
            .cloned()
            .unwrap_or(CountrySelector::Worldwide);
        self.mark_inflight(FetchKind::Countries, true);
        self.mark_inflight(FetchKind::Summary, true);
        self.mark_inflight(FetchKind::History, true);
        vec![
            ProviderCommand::FetchCountries { ticket: countries },
            ProviderCommand::FetchSummary {
                ticket: summary,
                selector,
            },
            ProviderCommand::FetchHistory {
                ticket: history,
                days: self.history_days,
            },
        ]
    }

    /// Starts a country change. Unknown isoCodes are logged and leave everything as is.
    pub fn select_country(&mut self, target: CountrySelector) -> Option<ProviderCommand> {
        match self.selection.select_country(target.clone(), &mut self.store) {
            Ok(ticket) => {
                self.mark_inflight(FetchKind::Summary, true);
                let label = self.selector_label(&target);
                self.push_log(format!("[INFO] Loading {label}"));
                Some(ProviderCommand::FetchSummary {
                    ticket,
                    selector: target,
                })
            }
            Err(err) => {
                self.push_log(format!("[WARN] {err}"));
                self.last_error = Some(err);
                None
            }
        }
    }

    pub fn select_table_country(&mut self) -> Option<ProviderCommand> {
        let iso = self
            .table_rows()
            .get(self.table_selected)
            .map(|record| record.iso_code.clone())?;
        self.select_country(CountrySelector::Country(iso))
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.selection.set_active_metric(metric);
    }

    pub fn cycle_metric(&mut self) {
        self.selection.cycle_metric();
    }

    pub fn active_metric(&self) -> Metric {
        self.selection.selection().active_metric
    }

    pub fn toggle_table_sort(&mut self) {
        self.table_sort = match self.table_sort {
            TableSort::Cases => TableSort::ActiveMetric,
            TableSort::ActiveMetric => TableSort::Cases,
        };
        self.table_selected = 0;
    }

    pub fn table_sort_metric(&self) -> Metric {
        match self.table_sort {
            TableSort::Cases => Metric::Cases,
            TableSort::ActiveMetric => self.active_metric(),
        }
    }

    pub fn table_rows(&self) -> Cow<'_, [CountryRecord]> {
        match self.table_sort_metric() {
            Metric::Cases => Cow::Borrowed(self.store.ranked()),
            metric => Cow::Owned(rank_by(self.store.countries(), metric)),
        }
    }

    pub fn select_next(&mut self) {
        let total = self.store.countries().len();
        if total == 0 {
            self.table_selected = 0;
            return;
        }
        self.table_selected = (self.table_selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.store.countries().len();
        if total == 0 {
            self.table_selected = 0;
            return;
        }
        if self.table_selected == 0 {
            self.table_selected = total - 1;
        } else {
            self.table_selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.store.countries().len();
        if total == 0 {
            self.table_selected = 0;
        } else if self.table_selected >= total {
            self.table_selected = total - 1;
        }
    }

    /// "Worldwide" first, then countries by display name.
    pub fn picker_entries(&self) -> Vec<PickerEntry> {
        let mut countries: Vec<&CountryRecord> = self.store.countries().iter().collect();
        countries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.iso_code.cmp(&b.iso_code)));
        let mut entries = Vec::with_capacity(countries.len() + 1);
        entries.push(PickerEntry::Worldwide);
        entries.extend(countries.into_iter().map(|c| PickerEntry::Country {
            iso_code: c.iso_code.clone(),
            name: c.name.clone(),
        }));
        entries
    }

    pub fn open_picker(&mut self) {
        let current = &self.selection.selection().selected_country;
        let idx = self
            .picker_entries()
            .iter()
            .position(|entry| &entry.selector() == current)
            .unwrap_or(0);
        self.picker = Some(idx);
    }

    pub fn picker_move(&mut self, forward: bool) {
        let total = self.picker_entries().len();
        let Some(idx) = self.picker.as_mut() else {
            return;
        };
        *idx = if forward {
            (*idx + 1) % total
        } else if *idx == 0 {
            total - 1
        } else {
            *idx - 1
        };
    }

    pub fn picker_choose(&mut self) -> Option<ProviderCommand> {
        let idx = self.picker.take()?;
        let entry = self.picker_entries().into_iter().nth(idx)?;
        self.select_country(entry.selector())
    }

    pub fn selector_label(&self, selector: &CountrySelector) -> String {
        match selector {
            CountrySelector::Worldwide => "Worldwide".to_string(),
            CountrySelector::Country(iso) => self
                .store
                .country(iso)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| iso.clone()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inflight.iter().any(|v| *v) || self.selection.is_resolving()
    }

    fn mark_inflight(&mut self, kind: FetchKind, value: bool) {
        let slot = match kind {
            FetchKind::Countries => 0,
            FetchKind::Summary => 1,
            FetchKind::History => 2,
        };
        self.inflight[slot] = value;
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn report(&mut self, ticket: RequestTicket, outcome: Outcome, applied: String) {
        if self.store.is_current(ticket) {
            self.mark_inflight(ticket.kind(), false);
        }
        match outcome {
            Outcome::Applied => {
                self.last_error = None;
                self.push_log(format!("[INFO] {applied}"));
            }
            Outcome::Stale => self.push_log(format!(
                "[INFO] Dropped stale {} response #{}",
                ticket.kind().label(),
                ticket.seq()
            )),
            Outcome::Failed(err) => {
                self.push_log(format!("[WARN] {} fetch failed: {err}", ticket.kind().label()));
                self.last_error = Some(err);
            }
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::CountriesLoaded { ticket, result } => {
            let outcome = state.store.complete_countries(ticket, result);
            if outcome == Outcome::Applied {
                state.clamp_selection();
                state.selection.sync_viewport(&state.store);
            }
            let msg = format!("Loaded {} countries", state.store.countries().len());
            state.report(ticket, outcome, msg);
        }
        Delta::SummaryLoaded { ticket, result } => {
            let target = state.selection.pending_target().cloned();
            let outcome = state.selection.resolve(ticket, result, &mut state.store);
            let label = target
                .map(|t| state.selector_label(&t))
                .unwrap_or_else(|| "summary".to_string());
            state.report(ticket, outcome, format!("Showing {label}"));
        }
        Delta::HistoryLoaded { ticket, result } => {
            let outcome = state.store.complete_history(ticket, result);
            let msg = format!("Loaded {} days of history", state.history_days);
            state.report(ticket, outcome, msg);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

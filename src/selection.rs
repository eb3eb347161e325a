use crate::error::TrackerError;
use crate::model::{CountrySelector, GlobalSummary, Metric, Selection, Viewport};
use crate::stats_store::{FetchKind, Outcome, RequestTicket, StatsStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Resolving {
        target: CountrySelector,
        ticket: RequestTicket,
    },
}

/// Owns the view selection. Country changes go through a summary fetch and only
/// land once the newest one resolves; metric changes apply immediately.
#[derive(Debug, Clone)]
pub struct SelectionController {
    selection: Selection,
    state: ControllerState,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            selection: Selection::default(),
            state: ControllerState::Idle,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self.state, ControllerState::Resolving { .. })
    }

    pub fn pending_target(&self) -> Option<&CountrySelector> {
        match &self.state {
            ControllerState::Resolving { target, .. } => Some(target),
            ControllerState::Idle => None,
        }
    }

    /// Validates `target` against the current snapshot and issues the summary
    /// ticket the caller must fetch for. Supersedes any pending selection.
    pub fn select_country(
        &mut self,
        target: CountrySelector,
        store: &mut StatsStore,
    ) -> Result<RequestTicket, TrackerError> {
        if let CountrySelector::Country(iso) = &target
            && store.country(iso).is_none()
        {
            return Err(TrackerError::UnknownCountry(iso.clone()));
        }
        Ok(self.issue(target, store))
    }

    /// Re-requests the summary for whatever is selected or pending, without
    /// validating it against the snapshot (used at startup and on reload).
    pub fn refresh(&mut self, store: &mut StatsStore) -> RequestTicket {
        let target = self
            .pending_target()
            .cloned()
            .unwrap_or_else(|| self.selection.selected_country.clone());
        self.issue(target, store)
    }

    fn issue(&mut self, target: CountrySelector, store: &mut StatsStore) -> RequestTicket {
        let ticket = store.begin(FetchKind::Summary);
        self.state = ControllerState::Resolving { target, ticket };
        ticket
    }

    /// Completes a summary fetch. Results for anything but the pending ticket
    /// are discarded; on failure the previous selection stays in place.
    pub fn resolve(
        &mut self,
        ticket: RequestTicket,
        result: Result<GlobalSummary, TrackerError>,
        store: &mut StatsStore,
    ) -> Outcome {
        let target = match &self.state {
            ControllerState::Resolving {
                target,
                ticket: pending,
            } if *pending == ticket => target.clone(),
            _ => return Outcome::Stale,
        };

        let result = result.and_then(|summary| {
            let viewport = viewport_for(&target, &summary, store)?;
            Ok((summary, viewport))
        });
        let (result, viewport) = match result {
            Ok((summary, viewport)) => (Ok(summary), Some(viewport)),
            Err(err) => (Err(err), None),
        };

        let outcome = store.complete_summary(ticket, result);
        match (&outcome, viewport) {
            (Outcome::Applied, Some(viewport)) => {
                self.selection.selected_country = target;
                self.selection.viewport = viewport;
                self.state = ControllerState::Idle;
            }
            // Failed, or superseded by a summary fetch issued directly on the store.
            _ => self.state = ControllerState::Idle,
        }
        outcome
    }

    /// Re-derives the viewport of the applied selection from the current
    /// snapshot. A country that vanished from the snapshot stays selected and
    /// keeps the coordinates its own summary reported, or the old viewport.
    pub fn sync_viewport(&mut self, store: &StatsStore) {
        let CountrySelector::Country(iso) = &self.selection.selected_country else {
            self.selection.viewport = Viewport::DEFAULT;
            return;
        };
        let coordinates = store.country(iso).map(|record| record.coordinates).or_else(|| {
            store
                .summary()
                .filter(|summary| summary.iso_code.as_deref() == Some(iso.as_str()))
                .and_then(|summary| summary.coordinates)
        });
        if let Some(coordinates) = coordinates {
            self.selection.viewport = Viewport::for_country(coordinates);
        }
    }

    pub fn set_active_metric(&mut self, metric: Metric) {
        self.selection.active_metric = metric;
    }

    pub fn cycle_metric(&mut self) {
        self.selection.active_metric = self.selection.active_metric.next();
    }
}

fn viewport_for(
    target: &CountrySelector,
    summary: &GlobalSummary,
    store: &StatsStore,
) -> Result<Viewport, TrackerError> {
    let CountrySelector::Country(iso) = target else {
        return Ok(Viewport::DEFAULT);
    };
    store
        .country(iso)
        .map(|record| record.coordinates)
        .or(summary.coordinates)
        .map(Viewport::for_country)
        .ok_or_else(|| TrackerError::DataUnavailable(format!("no coordinates for {iso}")))
}

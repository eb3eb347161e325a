mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use common::{FakeSource, read_fixture, record, summary_with_cases};
use covid_terminal::disease_sh::{
    parse_countries_json, parse_country_summary_json, parse_history_json,
};
use covid_terminal::error::TrackerError;
use covid_terminal::model::{Coordinates, CountrySelector, Metric, Viewport};
use covid_terminal::provider::{SharedSource, spawn_provider};
use covid_terminal::state::{AppState, Delta, PickerEntry, ProviderCommand, TableSort, apply_delta};

fn ticket_of(cmd: &ProviderCommand) -> covid_terminal::stats_store::RequestTicket {
    match cmd {
        ProviderCommand::FetchCountries { ticket }
        | ProviderCommand::FetchSummary { ticket, .. }
        | ProviderCommand::FetchHistory { ticket, .. } => *ticket,
    }
}

fn loaded_state() -> AppState {
    let mut state = AppState::new(120);
    let cmds = state.reload_commands();
    let records = parse_countries_json(&read_fixture("countries.json")).expect("fixture");
    apply_delta(
        &mut state,
        Delta::CountriesLoaded {
            ticket: ticket_of(&cmds[0]),
            result: Ok(records),
        },
    );
    apply_delta(
        &mut state,
        Delta::SummaryLoaded {
            ticket: ticket_of(&cmds[1]),
            result: Ok(summary_with_cases(704_753_890)),
        },
    );
    state
}

#[test]
fn reload_issues_one_command_per_kind() {
    let mut state = AppState::new(30);
    let cmds = state.reload_commands();
    assert_eq!(cmds.len(), 3);
    assert!(matches!(cmds[0], ProviderCommand::FetchCountries { .. }));
    assert!(matches!(
        &cmds[1],
        ProviderCommand::FetchSummary {
            selector: CountrySelector::Worldwide,
            ..
        }
    ));
    assert!(matches!(cmds[2], ProviderCommand::FetchHistory { days: 30, .. }));
    assert!(state.is_loading());
}

#[test]
fn startup_load_populates_table_and_summary() {
    let state = loaded_state();
    assert_eq!(state.store.countries().len(), 3);
    let table: Vec<String> = state.table_rows().iter().map(|r| r.iso_code.clone()).collect();
    assert_eq!(table, ["FR", "BR", "JP"]);
    assert_eq!(state.store.summary().and_then(|s| s.cases), Some(704_753_890));
    assert!(state.last_error.is_none());
}

#[test]
fn failed_initial_load_is_logged_and_keeps_store_empty() {
    let mut state = AppState::new(120);
    let cmds = state.reload_commands();
    apply_delta(
        &mut state,
        Delta::CountriesLoaded {
            ticket: ticket_of(&cmds[0]),
            result: Err(TrackerError::DataUnavailable("dns".to_string())),
        },
    );
    assert!(state.store.countries().is_empty());
    assert!(matches!(
        state.last_error,
        Some(TrackerError::DataUnavailable(_))
    ));
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN]")));
}

#[test]
fn table_enter_selects_highlighted_country() {
    let mut state = loaded_state();
    state.select_next();
    let cmd = state.select_table_country().expect("command issued");
    let ProviderCommand::FetchSummary { ticket, selector } = cmd else {
        panic!("expected summary fetch");
    };
    assert_eq!(selector, CountrySelector::Country("BR".to_string()));

    apply_delta(
        &mut state,
        Delta::SummaryLoaded {
            ticket,
            result: Ok(summary_with_cases(38_743_918)),
        },
    );
    let selection = state.selection.selection();
    assert_eq!(selection.selected_country, CountrySelector::Country("BR".to_string()));
    assert_eq!(selection.viewport.center.lat, -10.0);
    assert_eq!(selection.viewport.zoom, Viewport::COUNTRY_ZOOM);
}

#[test]
fn unknown_country_selection_issues_nothing() {
    let mut state = loaded_state();
    let cmd = state.select_country(CountrySelector::Country("XX".to_string()));
    assert!(cmd.is_none());
    assert_eq!(
        state.last_error,
        Some(TrackerError::UnknownCountry("XX".to_string()))
    );
    assert!(!state.selection.is_resolving());
}

#[test]
fn metric_change_issues_no_command() {
    let mut state = AppState::new(120);
    state.set_metric(Metric::Deaths);
    assert_eq!(state.active_metric(), Metric::Deaths);
    assert!(!state.selection.is_resolving());
    assert!(!state.is_loading());
}

#[test]
fn table_sort_follows_active_metric() {
    let mut state = loaded_state();
    state.set_metric(Metric::Deaths);
    state.toggle_table_sort();
    assert_eq!(state.table_sort, TableSort::ActiveMetric);
    let table: Vec<String> = state.table_rows().iter().map(|r| r.iso_code.clone()).collect();
    assert_eq!(table, ["BR", "FR", "JP"]);
}

#[test]
fn picker_lists_worldwide_then_names() {
    let mut state = loaded_state();
    let entries = state.picker_entries();
    assert_eq!(entries[0], PickerEntry::Worldwide);
    let labels: Vec<&str> = entries.iter().map(|e| e.label()).collect();
    assert_eq!(labels, ["Worldwide", "Brazil", "France", "Japan"]);

    state.open_picker();
    assert_eq!(state.picker, Some(0));
    state.picker_move(true);
    state.picker_move(true);
    let cmd = state.picker_choose().expect("command issued");
    assert!(matches!(
        cmd,
        ProviderCommand::FetchSummary { selector: CountrySelector::Country(ref iso), .. } if iso == "FR"
    ));
    assert!(state.picker.is_none());
}

#[test]
fn history_delta_is_stored() {
    let mut state = AppState::new(120);
    let cmds = state.reload_commands();
    let history = parse_history_json(&read_fixture("historical_all.json")).expect("fixture");
    apply_delta(
        &mut state,
        Delta::HistoryLoaded {
            ticket: ticket_of(&cmds[2]),
            result: Ok(history),
        },
    );
    assert_eq!(
        state.store.history().map(|h| h.daily_new(Metric::Deaths).len()),
        Some(3)
    );
}

#[test]
fn provider_answers_every_command() {
    let source = FakeSource::with_countries(vec![
        record("A", "A1", Some(500)),
        record("C", "C1", Some(900)),
    ]);
    let source = Arc::new(source);
    let shared: SharedSource = source.clone();

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(shared, 2, tx, cmd_rx);

    let mut state = AppState::new(120);
    for cmd in state.reload_commands() {
        cmd_tx.send(cmd).expect("provider alive");
    }

    for _ in 0..3 {
        let delta = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("provider should reply");
        apply_delta(&mut state, delta);
    }

    assert_eq!(source.call_count(), 3);
    let ranked: Vec<&str> = state.store.ranked().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(ranked, ["C", "A"]);
    assert!(state.store.summary().is_some());
    // History was not scripted, so that one failed and was reported.
    assert!(state.store.history().is_none());
    assert!(
        state
            .logs
            .iter()
            .any(|line| line.starts_with("[WARN] history fetch failed"))
    );
    assert!(!state.selection.is_resolving());
}

fn select_france(state: &mut AppState) {
    let cmd = state
        .select_country(CountrySelector::Country("FR".to_string()))
        .expect("FR is in the snapshot");
    let summary = parse_country_summary_json(&read_fixture("country_fr.json")).expect("fixture");
    apply_delta(
        state,
        Delta::SummaryLoaded {
            ticket: ticket_of(&cmd),
            result: Ok(summary),
        },
    );
    assert_eq!(
        state.selection.selection().viewport,
        Viewport::for_country(Coordinates { lat: 46.0, long: 2.0 })
    );
}

fn reload_with_countries(state: &mut AppState, records: Vec<covid_terminal::model::CountryRecord>) {
    let cmds = state.reload_commands();
    let summary = parse_country_summary_json(&read_fixture("country_fr.json")).expect("fixture");
    // Summary lands before the new snapshot.
    apply_delta(
        state,
        Delta::SummaryLoaded {
            ticket: ticket_of(&cmds[1]),
            result: Ok(summary),
        },
    );
    apply_delta(
        state,
        Delta::CountriesLoaded {
            ticket: ticket_of(&cmds[0]),
            result: Ok(records),
        },
    );
}

#[test]
fn reloaded_snapshot_moves_viewport_to_new_coordinates() {
    let mut state = loaded_state();
    select_france(&mut state);

    let mut france = record("France", "FR", Some(40_138_560));
    france.coordinates = Coordinates { lat: 10.0, long: 10.0 };
    reload_with_countries(&mut state, vec![france.clone(), record("Brazil", "BR", Some(1))]);

    let selection = state.selection.selection();
    assert_eq!(selection.selected_country, CountrySelector::Country("FR".to_string()));
    assert_eq!(selection.viewport, Viewport::for_country(france.coordinates));
}

#[test]
fn country_missing_from_new_snapshot_keeps_summary_coordinates() {
    let mut state = loaded_state();
    select_france(&mut state);

    reload_with_countries(&mut state, vec![record("Brazil", "BR", Some(1))]);

    let selection = state.selection.selection();
    assert!(state.store.country("FR").is_none());
    assert_eq!(selection.selected_country, CountrySelector::Country("FR".to_string()));
    assert_eq!(
        selection.viewport,
        Viewport::for_country(Coordinates { lat: 46.0, long: 2.0 })
    );
}

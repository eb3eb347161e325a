use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::source::StatsSource;
use crate::state::{Delta, ProviderCommand};

pub type SharedSource = Arc<dyn StatsSource + Send + Sync>;

/// Runs fetch commands on a small rayon pool so independent fetches overlap.
/// Results go back tagged with the ticket they were issued under; ordering is
/// left to the receiver.
pub fn spawn_provider(
    source: SharedSource,
    parallelism: usize,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let pool = build_fetch_pool(parallelism);
        if pool.is_none() {
            let _ = tx.send(Delta::Log(
                "[WARN] Fetch pool unavailable, using one thread per request".to_string(),
            ));
        }

        while let Ok(cmd) = cmd_rx.recv() {
            let source = Arc::clone(&source);
            let tx = tx.clone();
            let job = move || run_command(source.as_ref(), cmd, &tx);
            if let Some(pool) = pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
    })
}

pub fn run_command(source: &(dyn StatsSource + Send + Sync), cmd: ProviderCommand, tx: &Sender<Delta>) {
    let delta = match cmd {
        ProviderCommand::FetchCountries { ticket } => Delta::CountriesLoaded {
            ticket,
            result: source.fetch_countries(),
        },
        ProviderCommand::FetchSummary { ticket, selector } => Delta::SummaryLoaded {
            ticket,
            result: source.fetch_summary(&selector),
        },
        ProviderCommand::FetchHistory { ticket, days } => Delta::HistoryLoaded {
            ticket,
            result: source.fetch_history(days),
        },
    };
    let _ = tx.send(delta);
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|idx| format!("covid-fetch-{idx}"))
        .build()
        .ok()
}

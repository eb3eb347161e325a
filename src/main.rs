use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::canvas::{Canvas, Circle, Map, MapResolution};
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph};

use covid_terminal::config::TrackerConfig;
use covid_terminal::disease_sh::DiseaseShSource;
use covid_terminal::format::{format_compact, format_count, format_updated};
use covid_terminal::history::chart_points;
use covid_terminal::map_view::{bounds, markers};
use covid_terminal::model::{CountrySelector, Metric};
use covid_terminal::provider::{SharedSource, spawn_provider};
use covid_terminal::state::{self, AppState, ProviderCommand, TableSort, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(history_days: u32, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(history_days),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.picker.is_some() {
            self.on_picker_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => {
                if let Some(cmd) = self.state.select_table_country() {
                    self.dispatch(cmd);
                }
            }
            KeyCode::Char('w') => {
                if let Some(cmd) = self.state.select_country(CountrySelector::Worldwide) {
                    self.dispatch(cmd);
                }
            }
            KeyCode::Char('/') | KeyCode::Char('p') => self.state.open_picker(),
            KeyCode::Char('1') => self.state.set_metric(Metric::Cases),
            KeyCode::Char('2') => self.state.set_metric(Metric::Recovered),
            KeyCode::Char('3') => self.state.set_metric(Metric::Deaths),
            KeyCode::Char('m') => self.state.cycle_metric(),
            KeyCode::Char('s') => self.state.toggle_table_sort(),
            KeyCode::Char('R') => self.reload(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.picker_move(true),
            KeyCode::Char('k') | KeyCode::Up => self.state.picker_move(false),
            KeyCode::Enter => {
                if let Some(cmd) = self.state.picker_choose() {
                    self.dispatch(cmd);
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => self.state.picker = None,
            _ => {}
        }
    }

    fn reload(&mut self) {
        self.state.push_log("[INFO] Reloading");
        for cmd in self.state.reload_commands() {
            self.dispatch(cmd);
        }
    }

    fn dispatch(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Fetching unavailable");
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Fetch request failed");
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = TrackerConfig::from_env();
    let source: SharedSource = Arc::new(DiseaseShSource::new(&config));

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(source, config.fetch_parallelism, tx, cmd_rx);

    let mut app = App::new(config.history_days, Some(cmd_tx));
    app.state
        .push_log(format!("[INFO] Source: {}", config.api_base));
    app.reload();

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_info_boxes(frame, chunks[1], &app.state);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);
    render_map(frame, body[0], &app.state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body[1]);
    render_table(frame, right[0], &app.state);
    render_history_chart(frame, right[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text());
    frame.render_widget(footer, chunks[4]);

    if app.state.picker.is_some() {
        render_picker(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let selection = state.selection.selection();
    let mut title = format!(
        "COVID-19 TRACKER | {} | Metric: {} | Updated: {}",
        state.selector_label(&selection.selected_country),
        selection.active_metric.as_str().to_uppercase(),
        format_updated(state.store.summary().and_then(|s| s.updated)),
    );
    if let Some(target) = state.selection.pending_target() {
        title.push_str(&format!(" | -> {}", state.selector_label(target)));
    }
    if state.is_loading() {
        title.push_str(" | loading...");
    }
    title
}

fn footer_text() -> &'static str {
    "j/k Move | Enter Select | / Pick | w World | 1/2/3 Metric | m Cycle | s Sort | R Reload | ? Help | q Quit"
}

fn metric_color(metric: Metric) -> Color {
    match metric {
        Metric::Cases => Color::Rgb(204, 16, 52),
        Metric::Recovered => Color::Rgb(125, 215, 29),
        Metric::Deaths => Color::Rgb(251, 68, 67),
    }
}

fn render_info_boxes(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);
    let summary = state.store.summary();
    let active = state.active_metric();

    for (idx, metric) in Metric::ALL.into_iter().enumerate() {
        let today = summary.and_then(|s| s.today(metric));
        let total = summary.and_then(|s| s.count(metric));
        let text = format!(
            "{} today\n{} total",
            format_compact(today),
            format_compact(total)
        );
        let mut border = Style::default().fg(Color::DarkGray);
        let mut title_style = Style::default();
        if metric == active {
            border = Style::default().fg(metric_color(metric));
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        let block = Block::default()
            .title(Span::styled(format!("{} [{}]", metric.title(), idx + 1), title_style))
            .borders(Borders::ALL)
            .border_style(border);
        let para = Paragraph::new(text)
            .style(Style::default().fg(metric_color(metric)))
            .block(block);
        frame.render_widget(para, cols[idx]);
    }
}

fn render_map(frame: &mut Frame, area: Rect, state: &AppState) {
    let selection = state.selection.selection();
    let metric = selection.active_metric;
    let window = bounds(&selection.viewport);
    let circles = markers(state.store.countries(), metric);
    let color = metric_color(metric);
    let highlight = selection
        .selected_country
        .iso_code()
        .and_then(|iso| state.store.country(iso))
        .map(|c| (c.coordinates, c.name.clone()));

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(format!("World map: {}", metric.as_str()))
                .borders(Borders::ALL),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds(window.x)
        .y_bounds(window.y)
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::Low,
            });
            ctx.layer();
            for m in &circles {
                ctx.draw(&Circle {
                    x: m.long,
                    y: m.lat,
                    radius: m.radius_deg,
                    color,
                });
            }
            if let Some((coords, name)) = &highlight {
                ctx.print(
                    coords.long,
                    coords.lat,
                    Span::styled(
                        format!("+ {name}"),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let sort_label = match state.table_sort {
        TableSort::Cases => "cases".to_string(),
        TableSort::ActiveMetric => state.active_metric().as_str().to_string(),
    };
    let block = Block::default()
        .title(format!("Live {sort_label} by country"))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let rows = state.table_rows();
    if rows.is_empty() {
        let empty = Paragraph::new("No data").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    let widths = [Constraint::Min(12), Constraint::Length(14)];
    let metric = state.table_sort_metric();
    render_row(
        frame,
        sections[0],
        &widths,
        ["Country", metric.as_str()],
        Style::default().add_modifier(Modifier::BOLD),
    );

    let list_area = sections[1];
    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.table_selected, rows.len(), visible);
    let selected_iso = state.selection.selection().selected_country.iso_code();
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let record = &rows[idx];
        let mut style = Style::default();
        if selected_iso == Some(record.iso_code.as_str()) {
            style = style.fg(metric_color(metric));
        }
        if idx == state.table_selected {
            style = style.bg(Color::DarkGray).fg(Color::White);
        }
        let value = format_count(record.count(metric));
        render_row(frame, row_area, &widths, [record.name.as_str(), value.as_str()], style);
    }
}

fn render_row(frame: &mut Frame, area: Rect, widths: &[Constraint], cells: [&str; 2], style: Style) {
    frame.render_widget(Block::default().style(style), area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    frame.render_widget(Paragraph::new(cells[0]).style(style), cols[0]);
    frame.render_widget(
        Paragraph::new(cells[1])
            .style(style)
            .alignment(Alignment::Right),
        cols[1],
    );
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_history_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let metric = state.active_metric();
    let title = format!("Worldwide new {}", metric.as_str());
    let Some(history) = state.store.history().filter(|h| !h.is_empty()) else {
        let empty = Paragraph::new("No history yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let series = history.daily_new(metric);
    let (points, y_range) = chart_points(&series);
    let x_max = (points.len().max(2) - 1) as f64;
    let x_labels = match (series.first(), series.last()) {
        (Some((first, _)), Some((last, _))) => vec![
            Span::raw(first.format("%m/%d").to_string()),
            Span::raw(last.format("%m/%d").to_string()),
        ],
        _ => Vec::new(),
    };
    let y_labels = vec![Span::raw(axis_label(y_range[0])), Span::raw(axis_label(y_range[1]))];

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(metric_color(metric)))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(y_range)
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

fn axis_label(value: f64) -> String {
    if value < 0.0 {
        format!("-{}", format_count(Some(-value as u64)))
    } else {
        format_count(Some(value as u64))
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_picker(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(40, 70, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .title("Select country (Enter / Esc)")
        .borders(Borders::ALL);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let entries = state.picker_entries();
    let selected = state.picker.unwrap_or(0);
    let (start, end) = visible_range(selected, entries.len(), inner.height as usize);
    let lines: Vec<Line> = entries[start..end]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let style = if start + offset == selected {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            Line::styled(entry.label().to_string(), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "COVID-19 Tracker - Help",
        "",
        "  j/k or ↑/↓   Move in table",
        "  Enter        Show the highlighted country",
        "  / or p       Country picker",
        "  w            Worldwide",
        "  1 / 2 / 3    Cases / Recovered / Deaths",
        "  m            Cycle metric",
        "  s            Sort table by cases / active metric",
        "  R            Reload everything",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

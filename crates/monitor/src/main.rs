use std::collections::VecDeque;
use std::{io, time::Duration};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
};
use reqwest::Client;
use reqwest::header::COOKIE;
use tokio::time::interval;

use placehub_common::{AUTH_COOKIE, DEFAULT_HOST, DEFAULT_PORT};
use placehub_protocol::{PendingScriptDto, PlacesResponse, paths};

#[derive(Parser, Debug)]
#[command(name = "placehub-monitor", about = "Monitor TUI for PlaceHub")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Necessário para listar os places
    #[arg(long, env = "PLACEHUB_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

/// Janela deslizante de amostras (x, y).
struct Series {
    data: VecDeque<(f64, f64)>,
    window_size: usize,
}

impl Series {
    fn new(window_size: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    fn push(&mut self, x: f64, y: f64) {
        if self.data.len() >= self.window_size {
            self.data.pop_front();
        }
        self.data.push_back((x, y));
    }

    fn points(&self) -> Vec<(f64, f64)> {
        self.data.iter().cloned().collect()
    }

    fn max_y(&self) -> f64 {
        self.data.iter().map(|(_, y)| *y).fold(0.0, f64::max)
    }
}

struct App {
    places_series: Series,
    scripts_series: Series,
    x_offset: f64,
    places: PlacesResponse,
    pending: Vec<PendingScriptDto>,
    last_error: Option<String>,
}

impl App {
    fn new() -> Self {
        Self {
            places_series: Series::new(100),
            scripts_series: Series::new(100),
            x_offset: 0.0,
            places: PlacesResponse::new(),
            pending: Vec::new(),
            last_error: None,
        }
    }

    fn record(&mut self, places: Option<PlacesResponse>, pending: Vec<PendingScriptDto>) {
        self.x_offset += 1.0;
        if let Some(places) = places {
            self.places_series.push(self.x_offset, places.len() as f64);
            self.places = places;
        }
        self.scripts_series
            .push(self.x_offset, pending.len() as f64);
        self.pending = pending;
        self.last_error = None;
    }

    fn window_start(&self) -> f64 {
        self.x_offset - self.places_series.window_size as f64
    }
}

struct Poller {
    http: Client,
    base: String,
    token: Option<String>,
}

impl Poller {
    async fn pending(&self) -> Result<Vec<PendingScriptDto>> {
        let url = format!("{}{}", self.base, paths::PENDING_SCRIPTS);
        Ok(self.http.get(url).send().await?.error_for_status()?.json().await?)
    }

    /// `None` sem token: a rota é protegida.
    async fn places(&self) -> Result<Option<PlacesResponse>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };
        let url = format!("{}{}", self.base, paths::OPTIONS);
        let places = self
            .http
            .get(url)
            .header(COOKIE, format!("{AUTH_COOKIE}={token}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Some(places))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let poller = Poller {
        http: Client::builder().timeout(Duration::from_secs(2)).build()?,
        base: format!("http://{}:{}", args.host, args.port),
        token: args.token,
    };

    // Setup Terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut ticker = interval(Duration::from_secs(1));

    loop {
        terminal.draw(|f| ui(f, &app, &poller.base))?;

        if event::poll(Duration::from_millis(0))?
            && let Event::Key(key) = event::read()?
            && key.code == KeyCode::Char('q')
        {
            break;
        }

        ticker.tick().await;
        match tokio::try_join!(poller.places(), poller.pending()) {
            Ok((places, pending)) => app.record(places, pending),
            Err(e) => app.last_error = Some(e.to_string()),
        }
    }

    // Restore Terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(f: &mut Frame, app: &App, base: &str) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(45),
            Constraint::Min(5),
        ])
        .split(size);

    // Header
    let (status, color) = match &app.last_error {
        Some(e) => (format!("{base} - erro: {e}"), Color::Red),
        None => (format!("{base} - q para sair"), Color::Cyan),
    };
    let header = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("PlaceHub Monitor"))
        .style(Style::default().fg(color));
    f.render_widget(header, chunks[0]);

    // Chart
    let places_points = app.places_series.points();
    let scripts_points = app.scripts_series.points();
    let datasets = vec![
        Dataset::default()
            .name("Places")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Green))
            .graph_type(GraphType::Line)
            .data(&places_points),
        Dataset::default()
            .name("Pending")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Yellow))
            .graph_type(GraphType::Line)
            .data(&scripts_points),
    ];

    let max_y = app.places_series.max_y().max(app.scripts_series.max_y()) + 5.0;
    let chart = Chart::new(datasets)
        .block(Block::default().title("Over Time").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("Time (s)")
                .style(Style::default().fg(Color::Gray))
                .bounds([app.window_start(), app.x_offset])
                .labels(vec![
                    Span::raw(format!("{:.0}", app.window_start())),
                    Span::raw(format!("{:.0}", app.x_offset)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Count")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_y])
                .labels(vec![
                    Span::raw("0"),
                    Span::styled(
                        format!("{:.0}", max_y),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
        );
    f.render_widget(chart, chunks[1]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[2]);

    // Places vivos
    let place_rows = app
        .places
        .iter()
        .map(|(id, name)| Row::new(vec![Cell::from(id.clone()), Cell::from(name.clone())]));
    let places = Table::new(place_rows, [Constraint::Percentage(40), Constraint::Percentage(60)])
        .header(Row::new(vec!["Place", "Name"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().title("Places").borders(Borders::ALL));
    f.render_widget(places, lower[0]);

    // Scripts pendentes
    let script_rows = app.pending.iter().map(|p| {
        Row::new(vec![
            Cell::from(p.unique_id.clone()),
            Cell::from(format!("{:.1}s", p.expires_in_ms as f64 / 1000.0)),
            Cell::from(p.script.replace('\n', " ")),
        ])
    });
    let scripts = Table::new(
        script_rows,
        [
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Unique ID", "Expires", "Script"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title("Pending Scripts").borders(Borders::ALL));
    f.render_widget(scripts, lower[1]);
}

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use posture_pulse::data::{chronological, hourly_averages, HistorySummary};
use posture_pulse::history::{HistoryStore, HistoryView, RestHistoryStore};
use posture_pulse::{
    events, ui, App, LiveSession, MqttSource, Settings, StreamSource, TelemetrySource, Threshold,
};

#[derive(Parser, Debug)]
#[command(name = "posture-pulse")]
#[command(about = "Terminal dashboard for live posture-sensor telemetry and cloud history")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host (overrides broker.host)
    #[arg(long)]
    host: Option<String>,

    /// MQTT broker port (overrides broker.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Initial alert threshold in degrees, 5 to 60 (overrides alert.threshold)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Replay newline-delimited payloads from a file instead of connecting
    #[arg(short, long, conflicts_with_all = ["host", "port"])]
    replay: Option<PathBuf>,

    /// File that receives the log output
    #[arg(long, default_value = "posture-pulse.log")]
    log_file: PathBuf,

    /// Fetch history once, write it to this JSON file and exit
    #[arg(long, conflicts_with = "replay")]
    export_history: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_file)?;

    let settings = load_settings(&args)?;
    let runtime = Runtime::new()?;

    if let Some(export_path) = args.export_history {
        return export_history(&runtime, &settings, &export_path);
    }

    let recording = match args.replay {
        Some(ref path) => {
            let file = runtime
                .block_on(tokio::fs::File::open(path))
                .with_context(|| format!("Failed to open recording {}", path.display()))?;
            Some((file, path.display().to_string()))
        }
        None => None,
    };

    let result = {
        // Sources spawn their tasks onto this runtime.
        let _guard = runtime.enter();

        let source: Box<dyn TelemetrySource> = match recording {
            Some((file, description)) => {
                let interval =
                    Duration::from_secs_f64(1.0 / f64::from(settings.ui.replay_rate_hz));
                Box::new(StreamSource::spawn(file, &description, Some(interval)))
            }
            None => Box::new(MqttSource::spawn(&settings.broker)),
        };
        info!("Live source: {}", source.description());

        let live = LiveSession::new(
            source,
            settings.retention,
            settings.initial_threshold(),
            settings.alert.audio,
        );

        let store = history_store(&settings)?;
        let history = HistoryView::new(store, runtime.handle().clone(), settings.history.limit);

        run_tui(live, history, Duration::from_millis(settings.ui.tick_ms))
    };

    info!("Shutting down");
    runtime.shutdown_timeout(Duration::from_secs(1));

    result
}

/// Send tracing output to a file; the terminal belongs to the TUI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("posture_pulse=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Load layered settings and apply command-line overrides.
fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(ref host) = args.host {
        settings.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.broker.port = port;
    }
    if let Some(threshold) = args.threshold {
        settings.alert.threshold = Threshold::new(threshold)?.value();
    }

    settings.validate()?;
    Ok(settings)
}

fn history_store(settings: &Settings) -> Result<Option<Arc<dyn HistoryStore>>> {
    if !settings.history_enabled() {
        info!("No history store configured");
        return Ok(None);
    }
    let store = RestHistoryStore::from_settings(&settings.history)?;
    info!("History store: {}", store.description());
    Ok(Some(Arc::new(store)))
}

/// Run the TUI until the user quits
fn run_tui(live: LiveSession, history: HistoryView, tick: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(live, history);
    app.refresh_history();

    let result = run_app(&mut terminal, &mut app, tick);

    app.quit();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick: Duration,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    let mut tabs_area = Rect::default();

    while app.running {
        let outcome = app.tick();
        if outcome.ring_bell {
            let backend = terminal.backend_mut();
            backend.write_all(b"\x07")?;
            backend.flush()?;
        }
        if outcome.history_loaded {
            app.set_status_message(format!("Loaded {} history records", app.history.points().len()));
        }

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = Rect::new(0, top, area.width, 5.min(area.height));
                frame.render_widget(paragraph, centered);
                tabs_area = Rect::default();
                return;
            }

            tabs_area = ui::layout(area).tabs;
            ui::draw(frame, app);
        })?;

        if let Some(event) = events::poll_event(tick)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, tabs_area),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Fetch history once and write it, with its summary, to a JSON file
fn export_history(runtime: &Runtime, settings: &Settings, export_path: &Path) -> Result<()> {
    let Some(store) = history_store(settings)? else {
        anyhow::bail!("No history store configured (set history.url and history.api_key)");
    };

    let records = runtime
        .block_on(store.fetch_recent(settings.history.limit))
        .with_context(|| format!("Failed to fetch history from {}", store.description()))?;

    let points = chronological(records);
    if points.is_empty() {
        warn!("History store returned no records");
    }

    let export = serde_json::json!({
        "source": store.description(),
        "summary": HistorySummary::from_points(&points),
        "hourly": hourly_averages(&points),
        "records": points,
    });

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = File::create(export_path)?;
    file.write_all(json.as_bytes())?;

    println!(
        "Exported {} history records to: {}",
        points.len(),
        export_path.display()
    );
    Ok(())
}

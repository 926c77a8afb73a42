//! Crypto Chart
//!
//! Live BTC-USD / ETH-USD chart fed by the crypto WebSocket feed, with
//! drag-to-zoom, series toggles, point windowing and trend overlays.
use std::{
    error::Error,
    fs::File,
    io,
    path::Path,
    sync::Mutex,
    time::Duration,
};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crypto_chart_tui::{
    render_ui, ChartConfig, ChartState, ConnectionStatus, PlotArea, Symbol, Tick, WebSocketClient,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rustls::crypto::ring::default_provider;
use tokio::sync::mpsc;
use tracing::info;

/// Initialize logging into a file; stdout belongs to the terminal UI
fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ChartConfig::from_env()?;
    init_logging(&config.log_file)?;

    // WSS needs a process-wide rustls crypto provider
    let _ = default_provider().install_default();

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    restore_on_err(
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture),
        restore_terminal,
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = restore_on_err(Terminal::new(backend), restore_terminal)?;

    let client = WebSocketClient::with_config(config.websocket());
    let (session, tick_rx, status_rx) = client.start();

    let mut state = ChartState::new(config.max_points);
    let res = run_app(&mut terminal, &mut state, tick_rx, status_rx);

    // Receivers are gone, so a feed blocked on a full channel still observes shutdown
    session.close().await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("Crypto chart exited");
    res.map_err(Into::into)
}

/// Leave raw mode and the alternate screen, ignoring failures
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run `restore` before handing back a setup error
fn restore_on_err<T>(result: io::Result<T>, restore: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        restore();
    }
    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    state: &mut ChartState,
    mut tick_rx: mpsc::Receiver<Tick>,
    mut status_rx: mpsc::Receiver<ConnectionStatus>,
) -> io::Result<()> {
    let poll_timeout = Duration::from_millis(50);
    let mut plot = PlotArea::default();

    loop {
        while let Ok(status) = status_rx.try_recv() {
            state.set_status(status);
        }
        while let Ok(tick) = tick_rx.try_recv() {
            state.apply_tick(&tick);
        }

        terminal.draw(|f| plot = render_ui(f, state))?;

        if !event::poll(poll_timeout)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('m') => state.cycle_max_points(),
                KeyCode::Char('b') => state.toggle_series(Symbol::BtcUsd),
                KeyCode::Char('e') => state.toggle_series(Symbol::EthUsd),
                KeyCode::Char('p') => state.toggle_pause(),
                KeyCode::Char('r') => state.reset_zoom(),
                KeyCode::Char('c') => state.clear(),
                _ => {}
            },
            Event::Mouse(mouse) => handle_mouse(state, plot, mouse),
            _ => {}
        }
    }
}

fn handle_mouse(state: &mut ChartState, plot: PlotArea, mouse: MouseEvent) {
    let index = plot.index_at(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = index {
                state.pointer_down(index);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            // Keep tracking past the plot edges while a drag is active
            match index.or_else(|| plot.index_at_column(mouse.column)) {
                Some(index) => state.pointer_move(index),
                None => state.set_hover(None),
            }
        }
        MouseEventKind::Moved => match index {
            Some(index) => state.pointer_move(index),
            None => state.set_hover(None),
        },
        MouseEventKind::Up(MouseButton::Left) => state.pointer_up(),
        _ => {}
    }
}

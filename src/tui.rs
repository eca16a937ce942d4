//! Terminal setup and the main event loop.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture, Event,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{interval, Duration};

use crate::events::{AppEvent, TuiEvent};
use crate::ui::conversation::ConversationManager;

const TICK_RATE: Duration = Duration::from_millis(250);
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

type Term = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Read terminal input on a plain thread and forward it to the loop.
fn spawn_input_reader(events: UnboundedSender<AppEvent>, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(POLL_TIMEOUT) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Terminal poll failed");
                    break;
                }
            }
            let tui_event = match event::read() {
                Ok(Event::Key(key)) => TuiEvent::Key(key),
                Ok(Event::Mouse(mouse)) => TuiEvent::Mouse(mouse),
                Ok(Event::Paste(text)) => TuiEvent::Paste(text),
                Ok(Event::Resize(width, height)) => TuiEvent::Resize(width, height),
                Ok(Event::FocusGained) => TuiEvent::FocusGained,
                Ok(Event::FocusLost) => TuiEvent::FocusLost,
                Err(e) => {
                    tracing::error!(error = %e, "Terminal read failed");
                    break;
                }
            };
            if events.send(AppEvent::Tui(tui_event)).is_err() {
                break;
            }
        }
    })
}

/// Run the interactive wizard until the user quits.
pub async fn run(
    manager_factory: impl FnOnce(UnboundedSender<AppEvent>) -> ConversationManager,
) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut manager = manager_factory(tx.clone());

    let mut terminal = setup_terminal()?;
    let stop = Arc::new(AtomicBool::new(false));
    let reader = spawn_input_reader(tx, Arc::clone(&stop));

    manager.load_state();
    let result = run_loop(&mut terminal, &mut manager, rx).await;

    stop.store(true, Ordering::Relaxed);
    restore_terminal(&mut terminal)?;
    if reader.join().is_err() {
        tracing::warn!("Input reader thread panicked");
    }

    result
}

async fn run_loop(
    terminal: &mut Term,
    manager: &mut ConversationManager,
    mut events: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut ticker = interval(TICK_RATE);

    loop {
        terminal.draw(|frame| manager.render(frame))?;

        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    manager.handle_event(event);
                    // Drain whatever else is queued before redrawing
                    while let Ok(event) = events.try_recv() {
                        manager.handle_event(event);
                    }
                }
                None => break,
            },
            _ = ticker.tick() => manager.on_tick(),
        }

        if manager.should_quit() {
            tracing::info!("Quit requested");
            break;
        }
    }

    Ok(())
}

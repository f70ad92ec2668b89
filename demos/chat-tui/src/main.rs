//! Demo chat front-end for the session context and dispatch pipeline.
//!
//! Run with: cargo run -p chat-tui-demo 2> chat.log
//!
//! Messages go to a local echo agent. `/sessions` lists stored sessions and
//! `/switch <id>` makes one of them current.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use coder_chat_core::{
    AgentEvent, AgentEventStream, AgentRunner, Attachment, Message, RunError, SessionRepository,
};
use coder_chat_dispatch::{ActionDriver, InfoMsg, InfoType, UiEvent, on_send_message};
use coder_chat_session::{SessionContext, storage::MemorySessionRepository};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const ECHO_DELAY: Duration = Duration::from_millis(400);

type Context = SessionContext<MemorySessionRepository>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; the terminal is owned by the UI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Agent that echoes each message back after a short delay.
///
/// Rejects a run while the previous one is still in flight.
#[derive(Default)]
struct EchoAgent {
    busy: Arc<AtomicBool>,
}

#[async_trait]
impl AgentRunner for EchoAgent {
    async fn run(
        &self,
        session_id: &str,
        content: &str,
        _attachments: Vec<Attachment>,
    ) -> Result<AgentEventStream, RunError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(RunError::SessionBusy(session_id.to_string()));
        }

        let busy = Arc::clone(&self.busy);
        let session_id = session_id.to_string();
        let text = format!("echo: {content}");

        Ok(futures::stream::once(async move {
            tokio::time::sleep(ECHO_DELAY).await;
            busy.store(false, Ordering::SeqCst);
            AgentEvent::Response { session_id, text }
        })
        .boxed())
    }
}

struct App {
    output_lines: Vec<String>,
    input: String,
    scroll: u16,
    session_label: String,
    status: InfoMsg,
}

impl App {
    fn new() -> Self {
        Self {
            output_lines: vec![
                "Coder Chat - TUI Demo".to_string(),
                "=====================".to_string(),
                String::new(),
            ],
            input: String::new(),
            scroll: 0,
            session_label: "no session".to_string(),
            status: InfoMsg::info("Type a message and press Enter"),
        }
    }

    fn add_output(&mut self, text: &str) {
        for line in text.lines() {
            self.output_lines.push(line.to_string());
        }
        // Auto-scroll to bottom
        let visible_lines = 20u16;
        let total = u16::try_from(self.output_lines.len()).unwrap_or(u16::MAX);
        self.scroll = total.saturating_sub(visible_lines);
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionSelected { session } => {
                self.session_label = format!("{} ({})", session.title, session.id);
            }
            UiEvent::Info(info) => self.status = info,
        }
    }

    fn apply_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Response { text, .. } => self.add_output(&text),
            AgentEvent::Summarize { progress, .. } => self.status = InfoMsg::info(progress),
            AgentEvent::Error { message, .. } => self.status = InfoMsg::error(message),
        }
    }
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    let mut app = App::new();

    let repository = Arc::new(MemorySessionRepository::new());
    let mut ctx = SessionContext::new(Arc::clone(&repository))
        .with_coder_agent(Arc::new(EchoAgent::default()));

    let (driver, mut ui_rx) = ActionDriver::new();
    let (agent_tx, mut agent_rx) = mpsc::unbounded_channel::<AgentEvent>();

    loop {
        while let Ok(event) = ui_rx.try_recv() {
            app.apply(event);
        }
        while let Ok(event) = agent_rx.try_recv() {
            app.apply_agent_event(event);
        }

        terminal.draw(|f| ui(f, &app))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match key {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => return Ok(()),
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::NONE | KeyModifiers::SHIFT,
                ..
            } => app.input.push(c),
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => {
                app.input.pop();
            }
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => {
                let input = std::mem::take(&mut app.input);
                if !input.trim().is_empty() {
                    submit(&mut app, &mut ctx, &repository, &driver, &agent_tx, input.trim()).await?;
                }
            }
            KeyEvent {
                code: KeyCode::Up, ..
            } => app.scroll = app.scroll.saturating_sub(1),
            KeyEvent {
                code: KeyCode::Down,
                ..
            } => app.scroll = app.scroll.saturating_add(1),
            _ => {}
        }
    }
}

async fn submit(
    app: &mut App,
    ctx: &mut Context,
    repository: &MemorySessionRepository,
    driver: &ActionDriver,
    agent_tx: &mpsc::UnboundedSender<AgentEvent>,
    input: &str,
) -> anyhow::Result<()> {
    if input == "/sessions" {
        for session in repository.list().await? {
            app.add_output(&format!("  {}  {}", session.id, session.title));
        }
        return Ok(());
    }

    if let Some(id) = input.strip_prefix("/switch ") {
        match ctx.make_session_current(id.trim()).await {
            Ok(()) => {
                let session = ctx.resolve_current_session().await?;
                driver.send(UiEvent::SessionSelected { session })?;
            }
            Err(e) => app.status = InfoMsg::error(e.to_string()),
        }
        return Ok(());
    }

    app.add_output(&format!("> {input}"));
    match on_send_message(ctx, Message::new(input)).await {
        Ok(dispatched) => {
            driver.run(dispatched.actions)?;
            if let Some(mut events) = dispatched.events {
                let tx = agent_tx.clone();
                tokio::spawn(async move {
                    while let Some(event) = events.next().await {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                });
            }
        }
        Err(e) => app.status = InfoMsg::error(e.to_string()),
    }

    Ok(())
}

/// Cursor offset for `input`, in characters.
fn cursor_column(input: &str) -> u16 {
    u16::try_from(input.chars().count()).unwrap_or(u16::MAX)
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Conversation
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    let output_text: Vec<Line> = app
        .output_lines
        .iter()
        .map(|s| Line::from(s.as_str()))
        .collect();

    let output = Paragraph::new(output_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(app.session_label.as_str()),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));
    f.render_widget(output, chunks[0]);

    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Message"));
    f.render_widget(input, chunks[1]);

    let cursor_x = cursor_column(&app.input);
    f.set_cursor_position((
        chunks[1].x.saturating_add(cursor_x).saturating_add(1),
        chunks[1].y + 1,
    ));

    let status_style = match app.status.kind {
        InfoType::Info => Style::default().fg(Color::Green),
        InfoType::Warn => Style::default().fg(Color::Yellow),
        InfoType::Error => Style::default().fg(Color::Red),
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.status.msg.as_str(), status_style),
        Span::raw(" | "),
        Span::styled("Ctrl+C", Style::default().fg(Color::Yellow)),
        Span::raw(" quit | "),
        Span::styled("/sessions /switch <id>", Style::default().fg(Color::Yellow)),
    ]));
    f.render_widget(status, chunks[2]);
}

mod session;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use marginalia_config::Config;
use marginalia_engine::anchoring::{AnchorOptions, AnchorState, Highlight, Resolver};
use marginalia_engine::content::{NodeId, render_html};
use marginalia_engine::io;
use marginalia_engine::models::NoteId;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use session::{Session, state_labels};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Interactive,
    Report,
    Html,
}

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    mode: Mode,
    document: PathBuf,
    notes: Option<PathBuf>,
}

impl CliArgs {
    fn parse(args: &[String]) -> Option<Self> {
        let mut mode = Mode::Interactive;
        let mut positional = Vec::new();

        for arg in args {
            match arg.as_str() {
                "--report" if mode == Mode::Interactive => mode = Mode::Report,
                "--html" if mode == Mode::Interactive => mode = Mode::Html,
                flag if flag.starts_with("--") => return None,
                path => positional.push(PathBuf::from(path)),
            }
        }

        let mut positional = positional.into_iter();
        let document = positional.next()?;
        let notes = positional.next();
        if positional.next().is_some() {
            return None;
        }
        Some(Self {
            mode,
            document,
            notes,
        })
    }
}

struct App {
    session: Session,
    note_list_state: ListState,
    scroll: u16,
    status: String,
}

impl App {
    fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            note_list_state: ListState::default(),
            scroll: 0,
            status: String::new(),
        };

        // Select first note if available
        if !app.session.notes().is_empty() {
            app.note_list_state.select(Some(0));
            app.focus_selected();
        }
        app.status = app.summary();
        app
    }

    fn selected_note(&self) -> Option<NoteId> {
        let index = self.note_list_state.selected()?;
        self.session.notes().get(index).map(|note| note.id)
    }

    fn next_note(&mut self) {
        let count = self.session.notes().len();
        if count == 0 {
            return;
        }
        let i = match self.note_list_state.selected() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.note_list_state.select(Some(i));
        self.focus_selected();
    }

    fn previous_note(&mut self) {
        let count = self.session.notes().len();
        if count == 0 {
            return;
        }
        let i = match self.note_list_state.selected() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.note_list_state.select(Some(i));
        self.focus_selected();
    }

    fn focus_selected(&mut self) {
        let Some(note_id) = self.selected_note() else {
            return;
        };
        if !self.session.focus(note_id) {
            let (state, _) = state_labels(self.session.state(note_id));
            self.status = format!("Note is {state}; nothing to show in the document");
            return;
        }
        if let Some(highlight) = self.session.highlight(note_id) {
            let lines = self.session.index().line_range(highlight.range.clone());
            let top = lines.start.saturating_sub(3);
            self.scroll = u16::try_from(top).unwrap_or(u16::MAX);
            self.status = format!("Focused {lines}");
        }
    }

    fn delete_selected(&mut self) -> Result<()> {
        let Some(note_id) = self.selected_note() else {
            return Ok(());
        };
        if self.session.delete(note_id)? {
            self.status = format!("Deleted note, saved {}", self.session.notes_path().display());
        }

        let count = self.session.notes().len();
        match self.note_list_state.selected() {
            _ if count == 0 => self.note_list_state.select(None),
            Some(i) if i >= count => self.note_list_state.select(Some(count - 1)),
            _ => {}
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.session.reload()?;
        let count = self.session.notes().len();
        if count == 0 {
            self.note_list_state.select(None);
        } else if self.note_list_state.selected().is_none_or(|i| i >= count) {
            self.note_list_state.select(Some(0));
        }
        self.focus_selected();
        self.status = self.summary();
        Ok(())
    }

    fn summary(&self) -> String {
        let notes = self.session.notes();
        let failed = notes
            .iter()
            .filter(|note| self.session.state(note.id) == AnchorState::Failed)
            .count();
        format!("{} notes, {failed} could not be anchored", notes.len())
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("marginalia-cli");

    let Some(cli) = CliArgs::parse(args.get(1..).unwrap_or_default()) else {
        eprintln!("Usage: {program} [--report | --html] <document.md> [notes.json]");
        process::exit(1);
    };

    if cli.mode != Mode::Interactive {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let notes_path = match cli.notes {
        Some(path) => path,
        None => io::notes_path_for(&cli.document, config.notes_path.as_deref())?,
    };
    let resolver = Resolver::new(AnchorOptions {
        context_chars: config.anchoring.context_chars,
        fuzzy_threshold: config.anchoring.fuzzy_threshold,
        fuzzy_slack: config.anchoring.fuzzy_slack,
        max_unseeded_scan: config.anchoring.max_unseeded_scan,
        ..AnchorOptions::default()
    });

    let session = match Session::open(cli.document.clone(), notes_path, resolver) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: Could not open '{}': {e:#}", cli.document.display());
            process::exit(1);
        }
    };

    match cli.mode {
        Mode::Report => {
            for note in session.notes() {
                println!("{}", session.report_line(note));
            }
            Ok(())
        }
        Mode::Html => {
            println!(
                "{}",
                render_html(session.tree(), &session.highlights(), session.focused())
            );
            Ok(())
        }
        Mode::Interactive => run_interactive(session),
    }
}

fn run_interactive(session: Session) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_note(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_note(),
                KeyCode::Char('d') => {
                    if let Err(e) = app.delete_selected() {
                        app.status = format!("Delete failed: {e:#}");
                    }
                }
                KeyCode::Char('r') => {
                    if let Err(e) = app.reload() {
                        app.status = format!("Reload failed: {e:#}");
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(rows[0]);

    // Notes panel
    let note_items: Vec<ListItem> = app
        .session
        .notes()
        .iter()
        .map(|note| {
            let marker = match app.session.state(note.id) {
                AnchorState::Anchored(_) => "● ",
                AnchorState::Failed => "✗ ",
                AnchorState::DocumentLevel => "¶ ",
                AnchorState::Unpainted => "  ",
            };
            let (_, confidence) = state_labels(app.session.state(note.id));
            let comment = note.comment.lines().next().unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(comment.to_string()),
                Span::styled(
                    format!("  [{confidence}]"),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let notes_list = List::new(note_items)
        .block(Block::default().borders(Borders::ALL).title("Notes"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(notes_list, columns[0], &mut app.note_list_state);

    // Document panel
    let lines = document_lines(
        app.session.index().flat_text(),
        &app.session.highlights(),
        app.session.focused(),
    );
    let content = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Document"))
        .scroll((app.scroll, 0));

    f.render_widget(content, columns[1]);

    // Instructions
    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k ↓/j: Focus note | "),
        Span::raw("d: Delete | "),
        Span::raw("r: Reload"),
    ]);
    let status = Line::from(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::Cyan),
    ));

    f.render_widget(Paragraph::new(vec![help_text, status]), rows[1]);
}

/// Split the rendered text into lines, styling highlighted runs.
fn document_lines(
    text: &str,
    highlights: &[Highlight<NodeId>],
    focused: Option<NoteId>,
) -> Vec<Line<'static>> {
    let plain = Style::default();
    let marked = Style::default().bg(Color::Yellow).fg(Color::Black);
    let emphasised = Style::default()
        .bg(Color::Magenta)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let style_at = |offset: usize| {
        let mut style = plain;
        for highlight in highlights.iter().filter(|h| h.range.contains(&offset)) {
            if Some(highlight.note_id) == focused {
                return emphasised;
            }
            style = marked;
        }
        style
    };

    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = plain;

    for (offset, c) in text.chars().enumerate() {
        if c == '\n' {
            if !run.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut run), run_style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }
        let style = style_at(offset);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    if !spans.is_empty() {
        lines.push(Line::from(spans));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_engine::anchoring::{ConcreteRange, Confidence, Location};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_document_only() {
        let cli = CliArgs::parse(&args(&["doc.md"])).unwrap();
        assert_eq!(cli.mode, Mode::Interactive);
        assert_eq!(cli.document, PathBuf::from("doc.md"));
        assert_eq!(cli.notes, None);
    }

    #[test]
    fn test_parse_report_with_notes() {
        let cli = CliArgs::parse(&args(&["--report", "doc.md", "n.json"])).unwrap();
        assert_eq!(cli.mode, Mode::Report);
        assert_eq!(cli.notes, Some(PathBuf::from("n.json")));
    }

    #[test]
    fn test_parse_rejects_bad_usage() {
        assert_eq!(CliArgs::parse(&args(&[])), None);
        assert_eq!(CliArgs::parse(&args(&["--report", "--html", "doc.md"])), None);
        assert_eq!(CliArgs::parse(&args(&["--verbose", "doc.md"])), None);
        assert_eq!(CliArgs::parse(&args(&["a.md", "b.json", "c"])), None);
    }

    #[test]
    fn test_document_lines_style_highlights() {
        let note_id = NoteId::new();
        let highlight = Highlight {
            note_id,
            range: 4..7,
            concrete: ConcreteRange {
                start: Location::new(NodeId(1), 4),
                end: Location::new(NodeId(1), 7),
            },
            confidence: Confidence::Exact,
        };

        let lines = document_lines("one two\nthree\n", &[highlight], Some(note_id));

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[0].spans[0].content, "one ");
        assert_eq!(lines[0].spans[1].content, "two");
        assert_eq!(lines[0].spans[1].style.bg, Some(Color::Magenta));
        assert_eq!(lines[1].spans[0].content, "three");
    }
}

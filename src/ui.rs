use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use data_access_agent::{
    forms::{BusinessDateControl, FormView},
    render, AccessGroup, AgentConfig, ArtifactCreator, FormSubmission, HistoryProvider,
    PageView, PanelView, RequestRouter, Screen, SessionState, SimulatedArtifactCreator,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Panel,
}

// ============================================================================
// FORM DRAFT - editable copy of the rendered form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    BusinessDate,
    Field { group: usize, index: usize },
    AccessGroup,
    TextField,
    Submit,
}

#[derive(Debug, Clone)]
pub struct FormDraft {
    pub view: FormView,
    pub business_date: NaiveDate,
    pub access_group: usize,
    pub name: String,
    pub cursor: usize,
    controls: Vec<Control>,
}

impl FormDraft {
    pub fn new(view: FormView) -> Self {
        let business_date = match &view.business_date {
            BusinessDateControl::Picker { default } => *default,
            BusinessDateControl::Mandatory { value, .. } => *value,
        };

        let mut controls = vec![Control::BusinessDate];
        for (group, g) in view.groups.iter().enumerate() {
            for index in 0..g.boxes.len() {
                controls.push(Control::Field { group, index });
            }
        }
        controls.push(Control::AccessGroup);
        controls.push(Control::TextField);
        controls.push(Control::Submit);

        let access_group = view
            .access_groups
            .iter()
            .position(|g| *g == view.default_access_group)
            .unwrap_or(0);
        let name = view.text_field.value.clone();

        Self {
            view,
            business_date,
            access_group,
            name,
            cursor: 0,
            controls,
        }
    }

    pub fn current(&self) -> Control {
        self.controls[self.cursor]
    }

    pub fn next(&mut self) {
        self.cursor = (self.cursor + 1) % self.controls.len();
    }

    pub fn previous(&mut self) {
        if self.cursor == 0 {
            self.cursor = self.controls.len() - 1;
        } else {
            self.cursor -= 1;
        }
    }

    /// Space: toggle a checkbox or cycle the access group
    pub fn toggle(&mut self) {
        match self.current() {
            Control::Field { group, index } => {
                let b = &mut self.view.groups[group].boxes[index];
                b.checked = !b.checked;
            }
            Control::AccessGroup => {
                self.access_group = (self.access_group + 1) % self.view.access_groups.len();
            }
            _ => {}
        }
    }

    /// Left/Right on the date picker moves it by one day
    pub fn shift_date(&mut self, days: i64) {
        if self.current() == Control::BusinessDate && self.view.kind.has_date_picker() {
            self.business_date += Duration::days(days);
        }
    }

    pub fn type_char(&mut self, c: char) {
        if self.current() == Control::TextField && !self.view.text_field.disabled {
            self.name.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.current() == Control::TextField && !self.view.text_field.disabled {
            self.name.pop();
        }
    }

    pub fn access_group(&self) -> AccessGroup {
        self.view.access_groups[self.access_group]
    }

    pub fn to_submission(&self) -> FormSubmission {
        FormSubmission::new(
            self.view.kind,
            self.business_date,
            self.view.checked_fields(),
            self.access_group(),
            Some(self.name.clone()),
        )
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub session: SessionState,
    pub page: PageView,
    pub focus: Focus,
    pub form: Option<FormDraft>,
    pub history_state: TableState,
    pub status: Option<String>,
    router: RequestRouter,
    history: Box<dyn HistoryProvider>,
    creator: Box<dyn ArtifactCreator>,
    export_dir: PathBuf,
    today: NaiveDate,
}

impl App {
    pub fn new(config: &AgentConfig, history: Box<dyn HistoryProvider>, today: NaiveDate) -> Self {
        let session = SessionState::new();
        let page = render(&session, history.as_ref(), today);

        Self {
            session,
            page,
            focus: Focus::Input,
            form: None,
            history_state: TableState::default(),
            status: None,
            router: config.router(),
            history,
            creator: Box::new(SimulatedArtifactCreator),
            export_dir: config.export_dir.clone(),
            today,
        }
    }

    /// Re-render after every action
    fn refresh(&mut self) {
        self.page = render(&self.session, self.history.as_ref(), self.today);

        self.form = self.page.form().cloned().map(FormDraft::new);
        self.history_state = TableState::default();
        if self.page.history().is_some() {
            self.history_state.select(Some(0));
        }
        self.focus = if self.page.panel.is_some() {
            Focus::Panel
        } else {
            Focus::Input
        };
    }

    pub fn submit(&mut self) {
        if self.session.submit(&self.router).is_some() {
            self.status = None;
            self.refresh();
        }
    }

    pub fn start_over(&mut self) {
        self.session.start_over();
        self.status = None;
        self.refresh();
    }

    pub fn submit_form(&mut self) {
        if let Some(draft) = &self.form {
            let confirmation = self.creator.create(&draft.to_submission());
            self.status = Some(confirmation.message);
        }
    }

    pub fn export_selected(&mut self) -> Result<PathBuf> {
        let history = self.page.history().context("no history panel is open")?;
        let index = self.history_state.selected().context("no row selected")?;
        let row = history.rows.get(index).context("selected row out of range")?;

        let export = self.history.export(history.kind, &row.record.name)?;
        fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("Failed to create export dir: {:?}", self.export_dir))?;
        let path = self.export_dir.join(&export.file_name);
        fs::write(&path, &export.body)
            .with_context(|| format!("Failed to write export: {:?}", path))?;

        Ok(path)
    }

    fn history_len(&self) -> usize {
        self.page.history().map(|h| h.rows.len()).unwrap_or(0)
    }

    pub fn next_row(&mut self) {
        let len = self.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.history_state.select(Some(i));
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Windows terminals also report releases
        if key.kind != KeyEventKind::Press {
            return false;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => return true,
                KeyCode::Char('r') => self.start_over(),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Input if self.page.panel.is_some() => Focus::Panel,
                    _ => Focus::Input,
                };
                return false;
            }
            _ => {}
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::Panel => self.handle_panel_key(key),
        }
        false
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                let mut text = self.session.input_text().to_string();
                text.pop();
                self.session.set_input(text);
            }
            KeyCode::Char(c) => {
                let mut text = self.session.input_text().to_string();
                text.push(c);
                self.session.set_input(text);
            }
            _ => {}
        }
        self.page.input_text = self.session.input_text().to_string();
    }

    fn handle_panel_key(&mut self, key: KeyEvent) {
        if self.page.history().is_some() {
            match key.code {
                KeyCode::Down | KeyCode::Char('j') => self.next_row(),
                KeyCode::Up | KeyCode::Char('k') => self.previous_row(),
                KeyCode::Enter | KeyCode::Char('d') => {
                    self.status = Some(match self.export_selected() {
                        Ok(path) => format!("Exported {}", path.display()),
                        Err(e) => format!("Export failed: {:#}", e),
                    });
                }
                _ => {}
            }
            return;
        }

        let Some(draft) = self.form.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Down => draft.next(),
            KeyCode::Up => draft.previous(),
            KeyCode::Left => draft.shift_date(-1),
            KeyCode::Right => draft.shift_date(1),
            KeyCode::Backspace => draft.backspace(),
            KeyCode::Enter if draft.current() == Control::Submit => self.submit_form(),
            KeyCode::Enter => draft.next(),
            KeyCode::Char(' ') if draft.current() != Control::TextField => draft.toggle(),
            KeyCode::Char(c) => draft.type_char(c),
            _ => {}
        }
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Prompt input
            Constraint::Length(4), // Last exchange
            Constraint::Min(0),    // Panel
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_input(f, chunks[0], app);
    render_exchange(f, chunks[1], app);

    match app.page.panel.clone() {
        Some(PanelView::History(_)) => render_history(f, chunks[2], app),
        Some(PanelView::Form(_)) => render_form(f, chunks[2], app),
        None => render_idle(f, chunks[2]),
    }

    render_status_bar(f, chunks[3], app);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let mut spans = vec![Span::raw(app.page.input_text.clone())];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(focused))
            .title(format!(" {} - {} ", app.page.title, app.page.input_label)),
    );

    f.render_widget(input, area);
}

fn render_exchange(f: &mut Frame, area: Rect, app: &App) {
    let lines = match &app.page.last_exchange {
        Some(exchange) => vec![
            Line::from(vec![
                Span::styled("You: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(exchange.request.clone()),
            ]),
            Line::from(vec![
                Span::styled("Agent: ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(exchange.response.clone()),
            ]),
        ],
        None => vec![],
    };

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP));

    f.render_widget(paragraph, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let hint = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Try: \"create a view\", \"s3 file\", \"rest api\", \"history\" or \"rest api history\"",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(hint), area);
}

fn render_history(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(history) = app.page.history() else {
        return;
    };

    let header_cells = history.columns.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = history.rows.iter().map(|row| {
        let cells = vec![
            Cell::from(row.record.name.clone()),
            Cell::from(row.record.access_timestamp.clone()),
            Cell::from(row.record.accessed_by.clone()),
            Cell::from(row.record.business_date.clone()),
            Cell::from("📄").style(Style::default().fg(Color::Green)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app.focus == Focus::Panel))
            .title(format!(" {} ", history.heading)),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

fn control_line(label: String, selected: bool) -> Line<'static> {
    if selected {
        Line::from(Span::styled(
            format!("→ {}", label),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(format!("  {}", label))
    }
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let Some(draft) = &app.form else {
        return;
    };
    let focused = app.focus == Focus::Panel;
    let current = draft.current();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused))
        .title(format!(" {} ", draft.view.heading));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Info + business date
            Constraint::Min(0),    // Checkbox columns
            Constraint::Length(3), // Access group, name, submit
        ])
        .split(inner);

    // Info + business date
    let date_label = match &draft.view.business_date {
        BusinessDateControl::Picker { .. } => {
            format!("Select Business Date: ◀ {} ▶", draft.business_date.format("%Y-%m-%d"))
        }
        BusinessDateControl::Mandatory { label, .. } => format!("[x] {} (mandatory)", label),
    };
    let top = vec![
        Line::from(Span::styled(
            draft.view.info,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        )),
        control_line(date_label, focused && current == Control::BusinessDate),
    ];
    f.render_widget(Paragraph::new(top), sections[0]);

    // Two columns of checkbox groups
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sections[1]);

    for (column, groups) in [(0usize, [0usize, 1]), (1, [2, 3])] {
        let mut lines = Vec::new();
        for group in groups {
            let g = &draft.view.groups[group];
            lines.push(Line::from(Span::styled(
                g.title,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            for (index, b) in g.boxes.iter().enumerate() {
                let mark = if b.checked { "[x]" } else { "[ ]" };
                let selected = focused && current == Control::Field { group, index };
                lines.push(control_line(format!("{} {}", mark, b.field), selected));
            }
        }
        f.render_widget(Paragraph::new(lines), columns[column]);
    }

    // Access group, name, submit
    let text_label = if draft.view.text_field.disabled {
        format!("{}: {} (disabled)", draft.view.text_field.label, draft.name)
    } else {
        format!("{}: {}", draft.view.text_field.label, draft.name)
    };
    let bottom = vec![
        control_line(
            format!("Select Access Group: ◀ {} ▶", draft.access_group()),
            focused && current == Control::AccessGroup,
        ),
        control_line(text_label, focused && current == Control::TextField),
        control_line(
            format!("[ {} ]", draft.view.submit_label),
            focused && current == Control::Submit,
        ),
    ];
    f.render_widget(Paragraph::new(bottom), sections[2]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(status) = &app.status {
        let color = if status.starts_with("Success") || status.starts_with("Exported") {
            Color::Green
        } else {
            Color::Red
        };
        status_spans.push(Span::styled(format!(" {} ", status), Style::default().fg(color)));
        status_spans.push(Span::raw(" | "));
    }

    let hints: &[(&str, &str)] = match (app.focus, app.session.screen()) {
        (Focus::Input, _) => &[("Enter", " Submit | ")],
        (Focus::Panel, Screen::ViewHistory | Screen::ApiHistory) => {
            &[("↑/↓", " Row | "), ("Enter", " Download | ")]
        }
        (Focus::Panel, _) => &[
            ("↑/↓", " Field | "),
            ("Space", " Toggle | "),
            ("←/→", " Date | "),
            ("Enter", " Submit | "),
        ],
    };
    for (key, text) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*text));
    }

    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Focus | "));
    status_spans.push(Span::styled("Ctrl+R", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(format!(" {} | ", app.page.start_over_label)));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use data_access_agent::{FormKind, StaticHistoryProvider};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app_with_export_dir(dir: PathBuf) -> App {
        let config = AgentConfig {
            export_dir: dir,
            ..AgentConfig::default()
        };
        let provider = StaticHistoryProvider::load().unwrap();
        App::new(&config, Box::new(provider), NaiveDate::from_ymd_opt(2025, 6, 16).unwrap())
    }

    fn app() -> App {
        app_with_export_dir(std::env::temp_dir())
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_submit_opens_form() {
        let mut app = app();
        type_text(&mut app, "create a view");
        assert_eq!(app.session.input_text(), "create a view");

        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.session.screen(), Screen::ViewForm);
        assert_eq!(app.focus, Focus::Panel);
        assert_eq!(app.form.as_ref().unwrap().view.kind, FormKind::View);
    }

    #[test]
    fn test_form_toggle_and_submit() {
        let mut app = app();
        type_text(&mut app, "s3 file");
        app.handle_key(key(KeyCode::Enter));

        // business date one day back, first checkbox on
        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));

        let draft = app.form.as_mut().unwrap();
        assert_eq!(draft.view.checked_fields(), vec!["loans_secured_by_real_estate"]);
        draft.cursor = draft.controls.len() - 1;

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.status.as_deref(),
            Some("Success! The file 'custom_bank_data.csv' for business date 2025-06-15 is being generated for the 'Operations' group.")
        );
    }

    #[test]
    fn test_api_form_date_is_fixed() {
        let mut app = app();
        type_text(&mut app, "rest api");
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(key(KeyCode::Left));
        let draft = app.form.as_ref().unwrap();
        assert_eq!(draft.business_date, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
        assert_eq!(draft.to_submission().name, None);
    }

    #[test]
    fn test_history_export_writes_file() {
        let dir = std::env::temp_dir().join(format!("data-agent-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let mut app = app_with_export_dir(dir.clone());
        type_text(&mut app, "rest api history");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.screen(), Screen::ApiHistory);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));

        let path = dir.join("GetRESTLoanPortfolioMetrics.csv");
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("Accessed By,JamesWilson"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_creates_missing_dir() {
        let root = std::env::temp_dir().join(format!("data-agent-{}", uuid::Uuid::new_v4()));
        let dir = root.join("exports");

        let mut app = app_with_export_dir(dir.clone());
        type_text(&mut app, "history");
        app.handle_key(key(KeyCode::Enter));

        let path = app.export_selected().unwrap();
        assert_eq!(path, dir.join("GetAllInterestIncomeData.csv"));
        assert!(path.exists());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('a')));
        let quit = app.handle_key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });

        assert!(!quit);
        assert_eq!(app.page.input_text, "a");
    }

    #[test]
    fn test_ctrl_r_starts_over() {
        let mut app = app();
        type_text(&mut app, "history");
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(KeyEvent {
            code: KeyCode::Char('r'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });

        assert_eq!(app.session, SessionState::new());
        assert!(app.page.panel.is_none());
        assert_eq!(app.focus, Focus::Input);
    }
}

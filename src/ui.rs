use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use daybook::calendar::{CalendarCell, Month};
use daybook::model::{format_created, Task};
use daybook::session::{Mode as SessionMode, SessionError, Submitted, Tracker};
use daybook::storage::FileStore;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(tracker: Tracker<FileStore>, tags: Vec<String>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(tracker, tags);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    tracker: Tracker<FileStore>,
    tags: Vec<String>,
    selected: usize,
    list_offset: usize,
    cursor: NaiveDate,
    last_refresh: Instant,
    status: String,
    mode: Mode,
    view: ViewMode,
}

enum Mode {
    Normal,
    Composing,
    ConfirmDelete { task_id: String },
    Alert(String),
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    List,
    Calendar,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::List => "List",
            ViewMode::Calendar => "Calendar",
        }
    }
}

impl App {
    fn new(tracker: Tracker<FileStore>, tags: Vec<String>) -> Self {
        let status = format!(
            "Loaded {} tasks from {}",
            tracker.tasks().len(),
            tracker.store().location().path.display()
        );
        let cursor = Local::now().date_naive();
        App {
            tracker,
            tags,
            selected: 0,
            list_offset: 0,
            cursor,
            last_refresh: Instant::now(),
            status,
            mode: Mode::Normal,
            view: ViewMode::List,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Composing => self.handle_compose_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
            Mode::Alert(_) => self.mode = Mode::Normal,
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('1') => self.set_view(ViewMode::List),
            KeyCode::Char('2') => self.set_view(ViewMode::Calendar),
            KeyCode::Char('i') | KeyCode::Char('n') => {
                self.mode = Mode::Composing;
                self.status = "Composing (Enter save, Tab tag, ↑/↓ priority, Esc leave)".into();
            }
            KeyCode::Char('r') => self.refresh("Refreshed"),
            KeyCode::Esc => {
                if let Some(id) = self.tracker.session().editing() {
                    self.status = format!("Canceled edit of {}", id);
                    self.tracker.cancel_edit();
                }
            }
            _ => match self.view {
                ViewMode::List => self.handle_list_key(key),
                ViewMode::Calendar => self.handle_calendar_key(key),
            },
        }
        false
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.selected += 1,
            KeyCode::Char('e') => self.start_edit(),
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                    self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", id);
                    self.mode = Mode::ConfirmDelete { task_id: id };
                } else {
                    self.status = "No task selected to delete".into();
                }
            }
            _ => {}
        }
        self.ensure_list_bounds();
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.shift_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.shift_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.shift_cursor(7),
            KeyCode::Char('[') | KeyCode::Char('<') => {
                self.tracker.calendar_mut().prev_month();
                self.cursor = self.tracker.calendar().month.first_day();
            }
            KeyCode::Char(']') | KeyCode::Char('>') => {
                self.tracker.calendar_mut().next_month();
                self.cursor = self.tracker.calendar().month.first_day();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.tracker.calendar_mut().select(self.cursor);
                let count = self.tracker.selected_tasks().len();
                self.status = format!(
                    "{} task(s) on {}",
                    count,
                    self.cursor.format("%d %B %Y")
                );
            }
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if let Some(id) = self.tracker.session().editing() {
                    self.status = format!("Canceled edit of {}", id);
                    self.tracker.cancel_edit();
                } else {
                    self.status = "Draft kept".into();
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Tab => self.tracker.session_mut().cycle_tag(&self.tags),
            KeyCode::Up => self.tracker.session_mut().raise_rank(),
            KeyCode::Down => self.tracker.session_mut().lower_rank(),
            KeyCode::Backspace => self.tracker.session_mut().pop_char(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.tracker.session_mut().push_char(c);
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let task_id = match &self.mode {
            Mode::ConfirmDelete { task_id } => task_id.clone(),
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => match self.tracker.delete(&task_id) {
                Ok(()) => {
                    self.mark_refreshed(format!("Deleted {}", task_id));
                    self.mode = Mode::Normal;
                }
                Err(err) => self.mode = Mode::Alert(format!("Delete failed: {}", err)),
            },
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
        self.ensure_list_bounds();
    }

    fn start_edit(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            self.status = "No task selected to edit".into();
            return;
        };
        match self.tracker.begin_edit(&id) {
            Ok(()) => {
                self.mode = Mode::Composing;
                self.status = format!("Editing {} (Enter update, Esc cancel)", id);
            }
            Err(err) => self.status = format!("Could not edit: {}", err),
        }
    }

    fn submit(&mut self) {
        match self.tracker.submit() {
            Ok(Submitted::Created) => {
                self.mark_refreshed("Created task");
                self.mode = Mode::Normal;
            }
            Ok(Submitted::Updated) => {
                self.mark_refreshed("Updated task");
                self.mode = Mode::Normal;
            }
            Err(SessionError::Validation) => {}
            Err(err) => self.mode = Mode::Alert(format!("Could not save: {}", err)),
        }
        self.ensure_list_bounds();
    }

    fn refresh(&mut self, message: &str) {
        match self.tracker.refresh() {
            Ok(()) => self.mark_refreshed(message),
            Err(err) => self.mode = Mode::Alert(format!("Refresh failed: {}", err)),
        }
        self.ensure_list_bounds();
    }

    fn mark_refreshed(&mut self, message: impl Into<String>) {
        self.last_refresh = Instant::now();
        self.status = message.into();
    }

    fn shift_cursor(&mut self, days: i64) {
        if let Some(next) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.cursor = next;
            let month = Month::containing(next);
            if month != self.tracker.calendar().month {
                self.tracker.calendar_mut().month = month;
            }
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        self.tracker.sorted().get(self.selected).copied()
    }

    fn ensure_list_bounds(&mut self) {
        let len = self.tracker.tasks().len();
        self.selected = self.selected.min(len.saturating_sub(1));
        self.list_offset = self.list_offset.min(len.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(20)])
            .split(layout[1]);
        self.draw_sidebar(f, body[0]);
        match self.view {
            ViewMode::List => self.draw_list(f, body[1]),
            ViewMode::Calendar => self.draw_calendar(f, body[1]),
        }
        self.draw_draft(f, layout[2]);
        self.draw_footer(f, layout[3]);

        match &self.mode {
            Mode::ConfirmDelete { task_id } => self.draw_confirm(f, task_id),
            Mode::Alert(message) => draw_alert(f, message),
            Mode::Normal | Mode::Composing => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let location = self.tracker.store().location();
        let title = Line::from(vec![
            Span::styled(
                "daybook ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(location.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", location.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("synced {}", format_elapsed(self.last_refresh)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_sidebar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let summary = self.tracker.summary(Local::now().naive_local());
        let count_style = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(vec![
                Span::raw(format!("{:<18}", "Past")),
                Span::styled(format!("{:>4}", summary.past), count_style),
            ]),
            Line::from(vec![
                Span::raw(format!("{:<18}", "Today")),
                Span::styled(format!("{:>4}", summary.today), count_style),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "My Projects",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        for (tag, count) in &summary.by_tag {
            lines.push(Line::from(vec![
                Span::styled("# ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<16}", truncate_text(tag, 16)),
                    Style::default().fg(Color::LightMagenta),
                ),
                Span::styled(format!("{:>4}", count), count_style),
            ]));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_list(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sorted = self.tracker.sorted();
        let editing = self.tracker.session().editing();
        let viewport = area.height.saturating_sub(2) as usize;
        let selected = self.selected.min(sorted.len().saturating_sub(1));
        let offset = adjust_offset(selected, self.list_offset, viewport, 1, sorted.len());
        let mut state = ListState::default();
        *state.offset_mut() = offset;
        if !sorted.is_empty() {
            state.select(Some(selected));
        }

        let items = if sorted.is_empty() {
            vec![ListItem::new("No tasks yet (press i to add one)")]
        } else {
            sorted
                .iter()
                .enumerate()
                .map(|(idx, task)| task_item(idx + 1, task, editing == Some(task.id.as_str())))
                .collect()
        };
        let block = Block::default()
            .title(Span::styled(
                format!("Tasks ({})", sorted.len()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
        self.list_offset = offset;
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(3)])
            .split(area);

        let grid = self.tracker.grid();
        let selected = self.tracker.calendar().selected;
        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            grid.month.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let headings = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        lines.push(Line::from(
            headings
                .iter()
                .map(|h| Span::styled(format!("{:^6}", h), Style::default().fg(Color::Gray)))
                .collect::<Vec<_>>(),
        ));
        for week in grid.weeks(self.tracker.tasks()) {
            let spans = week
                .iter()
                .map(|cell| cell_span(cell, cell.date == self.cursor, Some(cell.date) == selected))
                .collect::<Vec<_>>();
            lines.push(Line::from(spans));
        }
        let block = Block::default()
            .title(Span::styled(
                "Calendar",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(block),
            sections[0],
        );

        let (title, items) = match selected {
            Some(date) => {
                let tasks = self.tracker.selected_tasks();
                let items = if tasks.is_empty() {
                    vec![ListItem::new("No tasks for this date.")]
                } else {
                    tasks
                        .iter()
                        .map(|task| {
                            ListItem::new(Line::from(vec![
                                Span::styled(
                                    task.text.clone(),
                                    Style::default()
                                        .fg(Color::White)
                                        .add_modifier(Modifier::BOLD),
                                ),
                                Span::raw("  "),
                                Span::styled(
                                    format!("#{}", task.tag),
                                    Style::default().fg(Color::LightMagenta),
                                ),
                                Span::raw("  "),
                                Span::styled(
                                    format!("rank {}", task.rank),
                                    Style::default().fg(Color::LightYellow),
                                ),
                            ]))
                        })
                        .collect()
                };
                (format!("Tasks for {}", date.format("%d %B %Y")), items)
            }
            None => (
                "Tasks".to_string(),
                vec![ListItem::new("Press Enter on a day to list its tasks")],
            ),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(List::new(items).block(block), sections[1]);
    }

    fn draw_draft(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let session = self.tracker.session();
        let draft = session.draft();
        let composing = matches!(self.mode, Mode::Composing);
        let (title, accent) = match session.mode() {
            SessionMode::Create => ("New task".to_string(), Color::LightRed),
            SessionMode::Edit { task_id } => (format!("Editing {}", task_id), Color::LightYellow),
        };
        let text = if composing {
            format!("{}▏", draft.text)
        } else if draft.text.is_empty() {
            "Task name".to_string()
        } else {
            draft.text.clone()
        };
        let mut tag_spans = vec![Span::styled("tag ", Style::default().fg(Color::Gray))];
        for tag in &self.tags {
            let style = if *tag == draft.tag {
                Style::default()
                    .bg(Color::Rgb(63, 63, 63))
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            tag_spans.push(Span::styled(format!(" {} ", capitalize(tag)), style));
            tag_spans.push(Span::raw(" "));
        }
        if !self.tags.contains(&draft.tag) {
            tag_spans.push(Span::styled(
                format!(" #{} ", draft.tag),
                Style::default().fg(Color::LightMagenta),
            ));
        }
        tag_spans.push(Span::raw("   "));
        tag_spans.push(Span::styled(
            format!("Priority: {} ⚑", draft.rank),
            Style::default().fg(Color::LightYellow),
        ));

        let lines = vec![
            Line::from(Span::styled(
                text,
                Style::default().fg(if composing { Color::Cyan } else { Color::Gray }),
            )),
            Line::from(tag_spans),
        ];
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if composing { accent } else { Color::DarkGray }));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = Style::default().fg(Color::LightCyan);
        let mut spans = vec![
            Span::styled("1", key),
            Span::raw(" list  "),
            Span::styled("2", key),
            Span::raw(" calendar  "),
            Span::styled("i", key),
            Span::raw(" compose  "),
        ];
        match self.view {
            ViewMode::List => spans.extend([
                Span::styled("↑↓ / j k", key),
                Span::raw(" move  "),
                Span::styled("e", key),
                Span::raw(" edit  "),
                Span::styled("d", key),
                Span::raw(" delete  "),
            ]),
            ViewMode::Calendar => spans.extend([
                Span::styled("←↑↓→ / h j k l", key),
                Span::raw(" day  "),
                Span::styled("[ ]", key),
                Span::raw(" month  "),
                Span::styled("Enter", key),
                Span::raw(" select  "),
            ]),
        }
        spans.extend([
            Span::styled("r", key),
            Span::raw(" refresh  "),
            Span::styled("q", key),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, task_id: &str) {
        let area = centered_rect(50, 30, f.size());
        let text = self
            .tracker
            .task(task_id)
            .map(|t| t.text.clone())
            .unwrap_or_else(|| task_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", text),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn draw_alert(f: &mut ratatui::Frame<'_>, message: &str) {
    let area = centered_rect(60, 30, f.size());
    let body = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press any key to continue"),
    ];
    let dialog = Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Error")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn task_item(position: usize, task: &Task, editing: bool) -> ListItem<'static> {
    let (date, time) = format_created(&task.created_at);
    let mut spans = vec![
        Span::styled(format!("{:>3} ", position), Style::default().fg(Color::DarkGray)),
        Span::styled(
            truncate_text(&task.text, 40),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("#{}", task.tag),
            Style::default().fg(Color::LightMagenta),
        ),
        Span::raw("  "),
        Span::styled(
            format!("P{}", task.rank),
            Style::default().fg(rank_color(task.rank.value())),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} {}", date, time),
            Style::default().fg(Color::LightYellow),
        ),
    ];
    if editing {
        spans.push(Span::styled(
            "  ✍ editing",
            Style::default().fg(Color::LightYellow),
        ));
    }
    ListItem::new(Line::from(spans)).style(Style::default().fg(Color::Gray))
}

fn cell_span(cell: &CalendarCell, cursor: bool, selected: bool) -> Span<'static> {
    let text = format!("{:^6}", cell.date.day());
    let mut style = if !cell.in_current_month {
        Style::default().fg(Color::DarkGray)
    } else if cell.has_task {
        Style::default().bg(Color::Rgb(252, 165, 165)).fg(Color::Black)
    } else {
        Style::default().fg(Color::LightBlue)
    };
    if selected {
        style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
    }
    if cursor {
        style = style.bg(Color::Cyan).fg(Color::Black);
    }
    Span::styled(text, style)
}

fn rank_color(rank: u8) -> Color {
    match rank {
        0 => Color::Gray,
        1 => Color::LightYellow,
        _ => Color::LightRed,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = text.chars().take(max.saturating_sub(3)).collect::<String>();
    out.push_str("...");
    out.chars().take(max).collect()
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_selection() {
        assert_eq!(adjust_offset(0, 0, 5, 1, 20), 0);
        assert_eq!(adjust_offset(10, 0, 5, 1, 20), 7);
        assert_eq!(adjust_offset(19, 7, 5, 1, 20), 15);
        assert_eq!(adjust_offset(3, 0, 0, 1, 20), 0);
    }

    #[test]
    fn truncates_long_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a long task name", 8), "a lon...");
        assert_eq!(truncate_text("anything", 0), "");
    }

    #[test]
    fn capitalizes_tag_labels() {
        assert_eq!(capitalize("routine"), "Routine");
        assert_eq!(capitalize(""), "");
    }
}

use std::io;
use std::time::Duration;
use std::time::Instant;

use chrono::Local;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};
use ratatui::{Frame, Terminal};

use farmware_client::DashboardBackend;
use farmware_client::DashboardController;
use farmware_core::advisory_dropdown;
use farmware_core::advisory_table;
use farmware_core::farmer_dropdown;
use farmware_core::farmer_table;
use farmware_core::project_result;
use farmware_core::CollectionKind;
use farmware_core::Config;
use farmware_core::DashboardState;
use farmware_core::Dropdown;
use farmware_core::LoadStatus;
use farmware_core::NoticeLevel;
use farmware_core::SelectionSource;
use farmware_core::TableBody;
use farmware_core::PROVIDER_DETAILS_HEADING;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub async fn run<B: DashboardBackend>(
    mut controller: DashboardController<B>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if config.ui.refresh_on_start {
        controller.refresh_all();
    }
    controller.tick(Utc::now());

    run_app(&mut terminal, &mut controller, config).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Farmers,
    Advisories,
    AdvisoryPicker,
    FarmerPicker,
}

impl Focus {
    const ORDER: [Focus; 4] = [
        Focus::Farmers,
        Focus::Advisories,
        Focus::AdvisoryPicker,
        Focus::FarmerPicker,
    ];

    fn cycle(self, step: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let index = Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0) as isize;
        Self::ORDER[(index + step).rem_euclid(len) as usize]
    }

    fn collection(self) -> CollectionKind {
        match self {
            Self::Farmers | Self::FarmerPicker => CollectionKind::Farmers,
            Self::Advisories | Self::AdvisoryPicker => CollectionKind::Advisories,
        }
    }
}

/// Terminal-only state: focus and table cursors. Everything the dashboard
/// itself knows lives in `DashboardState`.
#[derive(Debug, Clone)]
struct ViewState {
    focus: Focus,
    farmer_cursor: usize,
    advisory_cursor: usize,
    base_url: String,
}

impl ViewState {
    fn new(base_url: &str) -> Self {
        Self {
            focus: Focus::Farmers,
            farmer_cursor: 0,
            advisory_cursor: 0,
            base_url: base_url.to_string(),
        }
    }

    fn clamp_cursors(&mut self, state: &DashboardState) {
        self.farmer_cursor = clamp_cursor(self.farmer_cursor, state.store.farmers().len());
        self.advisory_cursor = clamp_cursor(self.advisory_cursor, state.store.advisories().len());
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        cursor.min(len - 1)
    }
}

fn move_cursor(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as isize + delta).clamp(0, len as isize - 1) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    FocusNext,
    FocusPrev,
    MoveCursor(isize),
    CycleOption(isize),
    ChooseRow,
    Submit,
    RefreshFocused,
    RefreshAll,
    Reset,
    DismissNotice,
}

enum KeyHandlerResult {
    Continue,
    Exit,
}

fn command_for_key(key: event::KeyEvent, focus: Focus) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    let on_picker = matches!(focus, Focus::AdvisoryPicker | Focus::FarmerPicker);
    match key.code {
        KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Tab => Some(Command::FocusNext),
        KeyCode::BackTab => Some(Command::FocusPrev),
        KeyCode::Up | KeyCode::Char('k') if on_picker => Some(Command::CycleOption(-1)),
        KeyCode::Down | KeyCode::Char('j') if on_picker => Some(Command::CycleOption(1)),
        KeyCode::Left | KeyCode::Char('h') if on_picker => Some(Command::CycleOption(-1)),
        KeyCode::Right | KeyCode::Char('l') if on_picker => Some(Command::CycleOption(1)),
        KeyCode::Up | KeyCode::Char('k') => Some(Command::MoveCursor(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(Command::MoveCursor(1)),
        KeyCode::Enter if on_picker => Some(Command::Submit),
        KeyCode::Enter => Some(Command::ChooseRow),
        KeyCode::Char('s') => Some(Command::Submit),
        KeyCode::Char('r') => Some(Command::RefreshFocused),
        KeyCode::Char('R') => Some(Command::RefreshAll),
        KeyCode::Char('x') => Some(Command::Reset),
        KeyCode::Esc => Some(Command::DismissNotice),
        _ => None,
    }
}

fn handle_key_event<B: DashboardBackend>(
    key: event::KeyEvent,
    controller: &mut DashboardController<B>,
    view: &mut ViewState,
) -> KeyHandlerResult {
    let Some(command) = command_for_key(key, view.focus) else {
        return KeyHandlerResult::Continue;
    };

    match command {
        Command::Quit => return KeyHandlerResult::Exit,
        Command::FocusNext => view.focus = view.focus.cycle(1),
        Command::FocusPrev => view.focus = view.focus.cycle(-1),
        Command::MoveCursor(delta) => match view.focus {
            Focus::Farmers => {
                let len = controller.state().store.farmers().len();
                view.farmer_cursor = move_cursor(view.farmer_cursor, delta, len);
            }
            Focus::Advisories => {
                let len = controller.state().store.advisories().len();
                view.advisory_cursor = move_cursor(view.advisory_cursor, delta, len);
            }
            Focus::AdvisoryPicker | Focus::FarmerPicker => {}
        },
        Command::CycleOption(step) => match view.focus {
            Focus::AdvisoryPicker => {
                let value = controller.advisory_options().value_at_offset(step);
                controller.select_advisory(value, SelectionSource::Dropdown);
            }
            Focus::FarmerPicker => {
                let value = controller.farmer_options().value_at_offset(step);
                controller.select_farmer(value, SelectionSource::Dropdown);
            }
            Focus::Farmers | Focus::Advisories => {}
        },
        Command::ChooseRow => match view.focus {
            Focus::Farmers => {
                let phone = controller
                    .state()
                    .store
                    .farmers()
                    .items()
                    .get(view.farmer_cursor)
                    .map(|farmer| farmer.phone.clone());
                if phone.is_some() {
                    controller.select_farmer(phone, SelectionSource::TableRow);
                }
            }
            Focus::Advisories => {
                let id = controller
                    .state()
                    .store
                    .advisories()
                    .items()
                    .get(view.advisory_cursor)
                    .map(|advisory| advisory.id.clone());
                if id.is_some() {
                    controller.select_advisory(id, SelectionSource::TableRow);
                }
            }
            Focus::AdvisoryPicker | Focus::FarmerPicker => {}
        },
        Command::Submit => {
            // Validation failures surface as a notice.
            let _ = controller.submit();
        }
        Command::RefreshFocused => controller.refresh(view.focus.collection()),
        Command::RefreshAll => controller.refresh_all(),
        Command::Reset => controller.reset(),
        Command::DismissNotice => controller.dismiss_notice(),
    }
    KeyHandlerResult::Continue
}

async fn run_app<T: Backend, B: DashboardBackend>(
    terminal: &mut Terminal<T>,
    controller: &mut DashboardController<B>,
    config: &Config,
) -> io::Result<()> {
    let mut view = ViewState::new(&config.backend.base_url);
    let clock_interval = config.ui.clock_interval();
    let mut last_tick = Instant::now();
    let mut force_draw = true;

    loop {
        controller.drain_completions();

        if last_tick.elapsed() >= clock_interval {
            controller.tick(Utc::now());
            last_tick = Instant::now();
        }

        let busy = controller.pending_tasks() > 0;
        if controller.take_redraw() || force_draw || busy {
            view.clamp_cursors(controller.state());
            terminal.draw(|f| ui(f, controller.state(), &view))?;
            force_draw = false;
        }

        if event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match handle_key_event(key, controller, &mut view) {
                        KeyHandlerResult::Continue => force_draw = true,
                        KeyHandlerResult::Exit => return Ok(()),
                    }
                }
                Event::Resize(_, _) => force_draw = true,
                _ => {}
            }
        } else if busy {
            let _ = tokio::time::timeout(FRAME_INTERVAL, controller.next_completion()).await;
        } else {
            tokio::time::sleep(FRAME_INTERVAL).await;
        }
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    focus_border: Color,
    selected_bg: Color,
}

const PALETTE: UiPalette = UiPalette {
    accent: Color::Cyan,
    success: Color::Green,
    warning: Color::Yellow,
    danger: Color::Red,
    muted: Color::DarkGray,
    border: Color::Gray,
    focus_border: Color::Cyan,
    selected_bg: Color::DarkGray,
};

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let idx = (Utc::now().timestamp_millis() / 100).rem_euclid(frames.len() as i64) as usize;
    frames[idx]
}

fn panel(title: String, focused: bool, palette: UiPalette) -> Block<'static> {
    let border = if focused {
        palette.focus_border
    } else {
        palette.border
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn ui(f: &mut Frame, state: &DashboardState, view: &ViewState) {
    let palette = PALETTE;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], state, view, palette);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(chunks[1]);
    let tables = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);
    render_farmers(f, tables[0], state, view, palette);
    render_advisories(f, tables[1], state, view, palette);

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Advisory picker
            Constraint::Length(3), // Farmer picker
            Constraint::Length(3), // Submit
            Constraint::Percentage(40),
            Constraint::Min(0),
        ])
        .split(columns[1]);
    render_picker(
        f,
        form[0],
        "Advisory",
        &advisory_dropdown(state),
        view.focus == Focus::AdvisoryPicker,
        palette,
    );
    render_picker(
        f,
        form[1],
        "Farmer",
        &farmer_dropdown(state),
        view.focus == Focus::FarmerPicker,
        palette,
    );
    render_submit(f, form[2], state, palette);
    render_preview(f, form[3], state, palette);
    render_result(f, form[4], state, palette);

    render_notice(f, chunks[2], state, palette);
    render_footer(f, chunks[3], palette);
}

fn render_header(
    f: &mut Frame,
    area: Rect,
    state: &DashboardState,
    view: &ViewState,
    palette: UiPalette,
) {
    let updated = state
        .last_updated
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let activity = if state.is_dispatching() {
        format!("{} sending", get_spinner())
    } else if CollectionKind::ALL
        .iter()
        .any(|kind| state.store.status(*kind) == LoadStatus::Loading)
    {
        format!("{} loading", get_spinner())
    } else {
        "idle".to_string()
    };
    let text = format!(
        "Farmware | {} | Farmers:{} Advisories:{} | Last updated: {} | {}",
        view.base_url,
        state.store.len(CollectionKind::Farmers),
        state.store.len(CollectionKind::Advisories),
        updated,
        activity
    );
    let header = Paragraph::new(text)
        .style(Style::default().fg(palette.accent))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(header, area);
}

fn render_table_body(
    f: &mut Frame,
    area: Rect,
    block: Block<'static>,
    message: &str,
    palette: UiPalette,
) {
    let p = Paragraph::new(Span::styled(message.to_string(), Style::default().fg(palette.muted)))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(p, area);
}

fn split_notice(area: Rect, has_notice: bool) -> (Rect, Option<Rect>) {
    if !has_notice || area.height < 4 {
        return (area, None);
    }
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    (parts[1], Some(parts[0]))
}

fn render_load_notice(f: &mut Frame, area: Option<Rect>, notice: Option<&str>, palette: UiPalette) {
    if let (Some(area), Some(notice)) = (area, notice) {
        let p = Paragraph::new(Span::styled(
            notice.to_string(),
            Style::default().fg(palette.danger),
        ));
        f.render_widget(p, area);
    }
}

fn render_farmers(
    f: &mut Frame,
    area: Rect,
    state: &DashboardState,
    view: &ViewState,
    palette: UiPalette,
) {
    let table = farmer_table(state);
    let focused = view.focus == Focus::Farmers;
    let (area, notice_area) = split_notice(area, table.notice.is_some());
    render_load_notice(f, notice_area, table.notice.as_deref(), palette);
    let block = panel(
        format!("{} ({})", CollectionKind::Farmers.title(), table.count),
        focused,
        palette,
    );

    let rows = match table.body {
        TableBody::Loading => return render_table_body(f, area, block, "Loading...", palette),
        TableBody::Empty(label) => return render_table_body(f, area, block, label, palette),
        TableBody::Rows(rows) => rows,
    };
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|row| {
            let style = if row.selected {
                Style::default()
                    .fg(palette.success)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(row.id.to_string()),
                Cell::from(row.phone),
                Cell::from(row.secret_key_preview),
                Cell::from(row.created),
            ])
            .style(style)
        })
        .collect();
    let widget = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["ID", "Phone", "Secret Key", "Created"])
            .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().bg(palette.selected_bg))
    .block(block);
    let mut table_state = TableState::default();
    if focused {
        table_state.select(Some(view.farmer_cursor));
    }
    f.render_stateful_widget(widget, area, &mut table_state);
}

fn render_advisories(
    f: &mut Frame,
    area: Rect,
    state: &DashboardState,
    view: &ViewState,
    palette: UiPalette,
) {
    let table = advisory_table(state);
    let focused = view.focus == Focus::Advisories;
    let (area, notice_area) = split_notice(area, table.notice.is_some());
    render_load_notice(f, notice_area, table.notice.as_deref(), palette);
    let block = panel(
        format!("{} ({})", CollectionKind::Advisories.title(), table.count),
        focused,
        palette,
    );

    let rows = match table.body {
        TableBody::Loading => return render_table_body(f, area, block, "Loading...", palette),
        TableBody::Empty(label) => return render_table_body(f, area, block, label, palette),
        TableBody::Rows(rows) => rows,
    };
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|row| {
            let style = if row.selected {
                Style::default()
                    .fg(palette.success)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(row.id.to_string()),
                Cell::from(row.title),
                Cell::from(row.message_preview),
                Cell::from(row.created),
            ])
            .style(style)
        })
        .collect();
    let widget = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(20),
            Constraint::Min(20),
            Constraint::Length(19),
        ],
    )
    .header(
        Row::new(vec!["ID", "Title", "Message", "Created"])
            .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().bg(palette.selected_bg))
    .block(block);
    let mut table_state = TableState::default();
    if focused {
        table_state.select(Some(view.advisory_cursor));
    }
    f.render_stateful_widget(widget, area, &mut table_state);
}

fn render_picker<V: Clone>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    dropdown: &Dropdown<V>,
    focused: bool,
    palette: UiPalette,
) {
    let (label, style) = match dropdown.current() {
        Some(option) if option.value.is_some() => (option.label.clone(), Style::default()),
        Some(option) => (option.label.clone(), Style::default().fg(palette.muted)),
        None => (String::new(), Style::default()),
    };
    let line = Line::from(vec![
        Span::styled("◀ ", Style::default().fg(palette.muted)),
        Span::styled(label, style),
        Span::styled(" ▶", Style::default().fg(palette.muted)),
    ]);
    let p = Paragraph::new(line).block(panel(title.to_string(), focused, palette));
    f.render_widget(p, area);
}

fn render_submit(f: &mut Frame, area: Rect, state: &DashboardState, palette: UiPalette) {
    let (label, style) = if state.submit_enabled() {
        (
            "[ Send SMS ]".to_string(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            format!("[ {} Sending... ]", get_spinner()),
            Style::default().fg(palette.muted),
        )
    };
    let p = Paragraph::new(Span::styled(label, style))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(p, area);
}

fn render_preview(f: &mut Frame, area: Rect, state: &DashboardState, palette: UiPalette) {
    let lines = match state.preview.model() {
        Some(model) => vec![
            Line::from(vec![
                Span::styled("Advisory: ", Style::default().fg(palette.accent)),
                Span::raw(model.advisory_title.clone()),
            ]),
            Line::from(vec![
                Span::styled("Farmer: ", Style::default().fg(palette.accent)),
                Span::raw(model.farmer_phone.clone()),
            ]),
            Line::from(""),
            Line::from(model.truncated_message.clone()),
        ],
        None => vec![Line::from(Span::styled(
            "Select an advisory and a farmer to preview the SMS.",
            Style::default().fg(palette.muted),
        ))],
    };
    let block = Block::default()
        .title("Preview")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn render_result(f: &mut Frame, area: Rect, state: &DashboardState, palette: UiPalette) {
    let Some(result) = project_result(&state.outcome) else {
        return;
    };
    let status_color = match result.status {
        farmware_core::ResultStatus::Success => palette.success,
        farmware_core::ResultStatus::Failed => palette.danger,
    };
    let mut lines = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(palette.accent)),
        Span::styled(
            result.status.label(),
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        ),
    ])];
    for line in &result.lines {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", line.field.label()),
                Style::default().fg(palette.accent),
            ),
            Span::raw(line.value.clone()),
        ]));
    }
    if let Some(details) = &result.provider_details {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            PROVIDER_DETAILS_HEADING,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(details.lines().map(|line| Line::from(line.to_string())));
    }
    let block = Block::default()
        .title(result.heading)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(status_color));
    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_notice(f: &mut Frame, area: Rect, state: &DashboardState, palette: UiPalette) {
    let Some(notice) = &state.notice else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Info => palette.accent,
        NoticeLevel::Success => palette.success,
        NoticeLevel::Danger => palette.danger,
    };
    let p = Paragraph::new(Span::styled(
        notice.message.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(p, area);
}

fn render_footer(f: &mut Frame, area: Rect, palette: UiPalette) {
    let keys = [
        ("Tab", "focus"),
        ("↑↓", "move"),
        ("Enter", "select"),
        ("←→", "choose"),
        ("s", "send"),
        ("r/R", "refresh"),
        ("x", "reset"),
        ("Esc", "dismiss"),
    ];
    let mut spans = Vec::new();
    for (key, action) in keys {
        spans.push(Span::styled(key, Style::default().fg(palette.accent)));
        spans.push(Span::styled(
            format!(" {action}  "),
            Style::default().fg(palette.muted),
        ));
    }
    spans.push(Span::styled("q", Style::default().fg(palette.warning)));
    spans.push(Span::styled(" quit", Style::default().fg(palette.muted)));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

use crate::blur::{mask, BlurPolicy, Interaction, Visibility};
use crate::config::Settings;
use crate::grouping::{group_by_day, relative_age, DayGroup, TODAY_LABEL};
use crate::model::Note;
use crate::onboarding::Onboarding;
use crate::speech::{SpeechCapability, SpeechNotices, UnavailableSpeech};
use crate::state::AppState;
use crate::storage::{FileKv, ThoughtStore};
use crate::timer::{format_clock, Ticker};
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, error};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListState;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const ACCENT: Color = Color::Rgb(251, 146, 60);
const DEFAULT_TIMER_MINUTES: u64 = 15;
const MINUTE_STEP: i64 = 5;
/// (hours, minutes), bound to F1..F6 in the timer drawer.
const TIMER_PRESETS: [(u64, u64); 6] = [(0, 5), (0, 10), (0, 15), (0, 25), (0, 30), (1, 0)];

pub fn run(
    store: ThoughtStore<FileKv>,
    state: AppState<FileKv>,
    settings: &Settings,
) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store, state, settings);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    store: ThoughtStore<FileKv>,
    state: AppState<FileKv>,
    notes: Vec<Note>,
    blur_delay: ChronoDuration,
    input: FieldValue,
    focus: Focus,
    selected: usize,
    list_offset: usize,
    mode: Mode,
    timer_form: TimerForm,
    ticker: Ticker,
    last_tick: Instant,
    last_save: Instant,
    status: String,
    onboarding: Option<Onboarding>,
    speech: Box<dyn SpeechCapability>,
    speech_notices: SpeechNotices,
}

enum Mode {
    Normal,
    Editing { note_id: String, field: FieldValue },
    ConfirmDelete { note_id: String },
    ConfirmClear,
    Menu { index: usize },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Focus {
    Input,
    List,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum MenuItem {
    ToggleBlur,
    FocusMode,
    Timer,
    ClearAll,
}

const MENU_ITEMS: [MenuItem; 4] = [
    MenuItem::ToggleBlur,
    MenuItem::FocusMode,
    MenuItem::Timer,
    MenuItem::ClearAll,
];

impl MenuItem {
    fn label(&self) -> &'static str {
        match self {
            MenuItem::ToggleBlur => "Toggle blur",
            MenuItem::FocusMode => "Focus mode",
            MenuItem::Timer => "Timer",
            MenuItem::ClearAll => "Clear all thoughts",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum TimerField {
    Hours,
    Minutes,
}

struct TimerForm {
    hours: FieldValue,
    minutes: FieldValue,
    field: TimerField,
}

impl TimerForm {
    fn new() -> Self {
        TimerForm {
            hours: FieldValue::new("0"),
            minutes: FieldValue::new(&DEFAULT_TIMER_MINUTES.to_string()),
            field: TimerField::Minutes,
        }
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            TimerField::Hours => &mut self.hours,
            TimerField::Minutes => &mut self.minutes,
        }
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            TimerField::Hours => TimerField::Minutes,
            TimerField::Minutes => TimerField::Hours,
        };
    }

    /// Hours move by one and stop at 0 and 23; minutes move by five and wrap.
    fn nudge(&mut self, up: bool) {
        let is_hours = self.field == TimerField::Hours;
        let field = self.active_field_mut();
        let current = field.value.trim().parse::<i64>().unwrap_or(0);
        let next = if is_hours {
            (current + if up { 1 } else { -1 }).clamp(0, 23)
        } else {
            (current + if up { MINUTE_STEP } else { -MINUTE_STEP }).rem_euclid(60)
        };
        *field = FieldValue::new(&next.to_string());
    }

    fn apply_preset(&mut self, index: usize) -> bool {
        let Some(&(hours, minutes)) = TIMER_PRESETS.get(index) else {
            return false;
        };
        self.hours = FieldValue::new(&hours.to_string());
        self.minutes = FieldValue::new(&minutes.to_string());
        true
    }

    fn parsed(&self) -> (u64, u64) {
        let parse = |f: &FieldValue| f.value.trim().parse::<u64>().unwrap_or(0);
        (parse(&self.hours), parse(&self.minutes))
    }
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn insert_str(&mut self, text: &str) {
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }

    /// Shared editing keys. Returns false for keys it does not consume.
    fn handle_edit_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Enter if wants_newline(key) => self.insert_char('\n'),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(c)
            }
            _ => return false,
        }
        true
    }
}

impl App {
    fn new(store: ThoughtStore<FileKv>, state: AppState<FileKv>, settings: &Settings) -> Self {
        let notes = store.list();
        let onboarding = if state.prefs().onboarding_completed {
            None
        } else {
            Some(Onboarding::new(Utc::now()))
        };
        let status = format!(
            "Loaded {} thought(s) from {}",
            notes.len(),
            settings.data_dir.display()
        );
        App {
            store,
            state,
            notes,
            blur_delay: ChronoDuration::seconds(settings.blur_delay_secs),
            input: FieldValue::new(""),
            focus: Focus::Input,
            selected: 0,
            list_offset: 0,
            mode: Mode::Normal,
            timer_form: TimerForm::new(),
            ticker: Ticker::default(),
            last_tick: Instant::now(),
            last_save: Instant::now(),
            status,
            onboarding,
            speech: Box::new(UnavailableSpeech),
            speech_notices: SpeechNotices::default(),
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.advance_clock();
            self.pump_speech();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(self.poll_timeout())? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        if self.speech.is_listening() {
            self.speech.stop();
        }
        Ok(())
    }

    fn blur_policy(&self) -> BlurPolicy {
        BlurPolicy::new(self.state.prefs().blur_enabled, self.blur_delay)
    }

    /// Wake up early when a row is about to blur.
    fn poll_timeout(&self) -> Duration {
        let now = Utc::now();
        self.blur_policy()
            .next_flip(&self.notes, now)
            .and_then(|at| (at - now).to_std().ok())
            .map(|until| until.min(POLL_INTERVAL))
            .unwrap_or(POLL_INTERVAL)
    }

    fn advance_clock(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;
        if !self.state.timer().active {
            self.ticker.reset();
            return;
        }
        for _ in 0..self.ticker.advance(elapsed) {
            if self.state.decrement_time() {
                self.status = "Timer finished".into();
            }
        }
    }

    fn pump_speech(&mut self) {
        if !self.speech.is_listening() {
            return;
        }
        match self.speech.poll_transcript() {
            Ok(Some(text)) => self.input.insert_str(&text),
            Ok(None) => {}
            Err(err) => {
                self.speech.stop();
                self.notify_speech_error(&err);
            }
        }
    }

    fn toggle_voice(&mut self) {
        if self.speech.is_listening() {
            self.speech.stop();
            self.status = "Voice input stopped".into();
            return;
        }
        match self.speech.start() {
            Ok(()) => self.status = "Listening...".into(),
            Err(err) => self.notify_speech_error(&err),
        }
    }

    fn notify_speech_error(&mut self, err: &crate::speech::SpeechError) {
        if let Some(message) = self.speech_notices.report(err) {
            self.status = message;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        if self.onboarding.is_some() {
            return Ok(self.handle_onboarding_key(key));
        }
        if self.state.timer_drawer_open() {
            self.handle_drawer_key(key);
            return Ok(false);
        }
        match self.mode {
            Mode::Normal => match self.focus {
                Focus::Input => self.handle_input_key(key),
                Focus::List => self.handle_list_key(key),
            },
            Mode::Editing { .. } => {
                self.handle_edit_key(key);
                Ok(false)
            }
            Mode::ConfirmDelete { .. } | Mode::ConfirmClear => {
                self.handle_confirm_key(key);
                Ok(false)
            }
            Mode::Menu { .. } => {
                self.handle_menu_key(key);
                Ok(false)
            }
        }
    }

    fn handle_onboarding_key(&mut self, key: KeyEvent) -> bool {
        let ready = self
            .onboarding
            .as_ref()
            .map(|o| o.can_continue(Utc::now()))
            .unwrap_or(true);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter if ready => {
                match self.state.set_onboarding_completed(true) {
                    Ok(()) => self.mark_saved("Welcome. What's on your mind?"),
                    Err(err) => self.report_error("Could not save settings", &err),
                }
                self.onboarding = None;
            }
            _ => {}
        }
        false
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Tab => self.focus_list(),
            KeyCode::F(2) => self.toggle_voice(),
            KeyCode::Enter if !wants_newline(key) => self.submit_input(),
            _ => {
                self.input.handle_edit_key(key);
            }
        }
        Ok(false)
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.notes.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Tab | KeyCode::Esc | KeyCode::Char('i') => self.focus = Focus::Input,
            KeyCode::Char('e') | KeyCode::Enter => {
                let picked = self
                    .selected_note()
                    .map(|n| (n.id.clone(), FieldValue::new(&n.content)));
                if let Some((note_id, field)) = picked {
                    self.mode = Mode::Editing { note_id, field };
                    self.status = "Editing (Enter save, Alt+Enter newline, Esc cancel)".into();
                }
            }
            KeyCode::Char('d') => {
                if let Some(note_id) = self.selected_note().map(|n| n.id.clone()) {
                    self.mode = Mode::ConfirmDelete { note_id };
                    self.status = "Delete this thought? (y to confirm, n/Esc to cancel)".into();
                }
            }
            KeyCode::Char('C') => self.mode = Mode::ConfirmClear,
            KeyCode::Char('m') => self.mode = Mode::Menu { index: 0 },
            KeyCode::Char('t') => self.open_drawer(),
            KeyCode::Char('b') => self.toggle_blur(),
            KeyCode::Char('f') => self.toggle_focus_mode(),
            KeyCode::Char(' ') => self.play_pause(),
            KeyCode::Char('x') => {
                if self.state.timer().is_visible() {
                    self.state.stop_timer();
                    self.status = "Timer stopped".into();
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let (note_id, mut field) = match mode {
            Mode::Editing { note_id, field } => (note_id, field),
            other => {
                self.mode = other;
                return;
            }
        };
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return;
            }
            KeyCode::Enter if !wants_newline(key) => {
                let content = field.value.trim().to_string();
                if content.is_empty() {
                    self.status = "A thought can't be empty (d deletes it)".into();
                } else {
                    self.save_edit(&note_id, content);
                    return;
                }
            }
            _ => {
                field.handle_edit_key(key);
            }
        }
        self.mode = Mode::Editing { note_id, field };
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match std::mem::replace(&mut self.mode, Mode::Normal) {
                    Mode::ConfirmDelete { note_id } => self.delete_note(&note_id),
                    Mode::ConfirmClear => self.clear_notes(),
                    other => self.mode = other,
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        let index = match self.mode {
            Mode::Menu { index } => index,
            _ => return,
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.mode = Mode::Menu {
                    index: index.saturating_sub(1),
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.mode = Mode::Menu {
                    index: (index + 1).min(MENU_ITEMS.len() - 1),
                }
            }
            KeyCode::Esc | KeyCode::Char('m') => self.mode = Mode::Normal,
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                match MENU_ITEMS[index] {
                    MenuItem::ToggleBlur => self.toggle_blur(),
                    MenuItem::FocusMode => self.toggle_focus_mode(),
                    MenuItem::Timer => self.open_drawer(),
                    MenuItem::ClearAll => self.mode = Mode::ConfirmClear,
                }
            }
            _ => {}
        }
    }

    fn handle_drawer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.close_timer_drawer();
                self.status = "Timer canceled".into();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                self.timer_form.switch_field()
            }
            KeyCode::Up => self.timer_form.nudge(true),
            KeyCode::Down => self.timer_form.nudge(false),
            KeyCode::F(n) if n >= 1 => {
                if self.timer_form.apply_preset(usize::from(n - 1)) {
                    let (hours, minutes) = self.timer_form.parsed();
                    self.status = format!("Preset {}", preset_label(hours, minutes));
                }
            }
            KeyCode::Backspace => self.timer_form.active_field_mut().backspace(),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let field = self.timer_form.active_field_mut();
                if field.value.len() < 2 {
                    field.insert_char(c);
                }
            }
            KeyCode::Enter => {
                let (hours, minutes) = self.timer_form.parsed();
                if hours == 0 && minutes == 0 {
                    self.status = "Pick a duration first".into();
                    return;
                }
                self.state.start_timer(hours, minutes);
                self.ticker.reset();
                self.status = format!(
                    "Timer started for {}",
                    format_clock(self.state.timer().duration_seconds)
                );
            }
            _ => {}
        }
    }

    fn focus_list(&mut self) {
        if self.notes.is_empty() {
            self.status = "Nothing to browse yet".into();
            return;
        }
        self.focus = Focus::List;
        self.clamp_selection();
    }

    fn open_drawer(&mut self) {
        self.timer_form = TimerForm::new();
        self.state.open_timer_drawer();
        self.status = "Set a duration (Tab switch, ↑↓ adjust, Enter start, Esc cancel)".into();
    }

    fn play_pause(&mut self) {
        let timer = *self.state.timer();
        if !timer.is_visible() {
            return;
        }
        if timer.active {
            self.state.pause_timer();
            self.status = "Timer paused".into();
        } else {
            self.state.resume_timer();
            self.ticker.reset();
            self.status = "Timer resumed".into();
        }
    }

    fn toggle_blur(&mut self) {
        match self.state.toggle_blur() {
            Ok(()) => {
                let label = if self.state.prefs().blur_enabled {
                    "Blur on"
                } else {
                    "Blur off"
                };
                self.mark_saved(label);
            }
            Err(err) => self.report_error("Could not save settings", &err),
        }
    }

    fn toggle_focus_mode(&mut self) {
        match self.state.toggle_focus_mode() {
            Ok(()) => {
                let label = if self.state.prefs().focus_mode_enabled {
                    "Focus mode on"
                } else {
                    "Focus mode off"
                };
                self.mark_saved(label);
            }
            Err(err) => self.report_error("Could not save settings", &err),
        }
    }

    fn submit_input(&mut self) {
        let content = self.input.value.trim().to_string();
        if content.is_empty() {
            return;
        }
        match self.store.add(content) {
            Ok(note) => {
                self.input.take();
                self.notes.insert(0, note);
                self.selected = 0;
                self.list_offset = 0;
                self.mark_saved("Saved");
            }
            Err(err) => self.report_error("Could not save thought", &err),
        }
    }

    fn save_edit(&mut self, note_id: &str, content: String) {
        match self.store.update(note_id, content) {
            Ok(updated) => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == updated.id) {
                    *note = updated;
                }
                self.mark_saved("Updated");
            }
            Err(err) => self.report_error("Could not update thought", &err),
        }
    }

    fn delete_note(&mut self, note_id: &str) {
        match self.store.delete(note_id) {
            Ok(_) => {
                self.notes.retain(|n| n.id != note_id);
                self.clamp_selection();
                self.mark_saved("Deleted");
            }
            Err(err) => self.report_error("Could not delete thought", &err),
        }
    }

    fn clear_notes(&mut self) {
        match self.store.delete_all() {
            Ok(()) => {
                self.notes.clear();
                self.clamp_selection();
                self.mark_saved("Cleared all thoughts");
            }
            Err(err) => self.report_error("Could not clear thoughts", &err),
        }
    }

    fn clamp_selection(&mut self) {
        if self.notes.is_empty() {
            self.selected = 0;
            self.list_offset = 0;
            self.focus = Focus::Input;
        } else {
            self.selected = self.selected.min(self.notes.len() - 1);
        }
    }

    fn mark_saved(&mut self, message: impl Into<String>) {
        self.last_save = Instant::now();
        self.status = message.into();
    }

    fn report_error(&mut self, context: &str, err: &dyn std::fmt::Display) {
        error!("event=ui_error context=\"{}\" error={}", context, err);
        self.status = format!("{}: {}", context, err);
    }

    /// Notes in on-screen order (grouped by day).
    fn display_order(&self) -> Vec<&Note> {
        group_by_day(&self.notes, &Local::now())
            .into_iter()
            .flat_map(|g| g.notes)
            .collect()
    }

    fn selected_note(&self) -> Option<&Note> {
        if self.focus != Focus::List {
            return None;
        }
        self.display_order().get(self.selected).copied()
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        if let Some(onboarding) = self.onboarding.as_ref() {
            self.draw_onboarding(f, onboarding);
            return;
        }

        let timer_height = if self.state.timer().is_visible() { 3 } else { 0 };
        let input_height = (self.input.value.lines().count().max(1) as u16 + 2).min(8);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(timer_height),
                Constraint::Length(2),
                Constraint::Length(input_height),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(f.size());

        if timer_height > 0 {
            self.draw_timer(f, layout[0]);
        }
        self.draw_header(f, layout[1]);
        self.draw_input(f, layout[2]);
        self.draw_thoughts(f, layout[3]);
        self.draw_footer(f, layout[4]);

        if self.state.timer_drawer_open() {
            self.draw_timer_drawer(f);
        }
        match &self.mode {
            Mode::Editing { field, .. } => self.draw_edit(f, field),
            Mode::ConfirmDelete { note_id } => {
                let preview = self
                    .notes
                    .iter()
                    .find(|n| &n.id == note_id)
                    .map(|n| truncate_text(&n.content, 40))
                    .unwrap_or_else(|| note_id.clone());
                draw_confirm(f, &format!("Delete \"{}\"?", preview));
            }
            Mode::ConfirmClear => draw_confirm(f, "Delete every thought?"),
            Mode::Menu { index } => self.draw_menu(f, *index),
            Mode::Normal => {}
        }
    }

    fn draw_timer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let timer = self.state.timer();
        let (icon, hint) = if timer.active {
            ("⏸", "space pause")
        } else {
            ("▶", "space resume")
        };
        let line = Line::from(vec![
            Span::styled(format!("{} ", icon), Style::default().fg(ACCENT)),
            Span::styled("Timer ", Style::default().fg(ACCENT)),
            Span::styled(
                format_clock(timer.remaining_seconds),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("{} • x stop", hint),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let paragraph = Paragraph::new(line).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let prefs = self.state.prefs();
        let mut spans = Vec::new();
        if !prefs.focus_mode_enabled {
            spans.push(Span::styled(
                Local::now().format("%A").to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(" •", Style::default().fg(Color::Green)));
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            format!("blur {}", if prefs.blur_enabled { "on" } else { "off" }),
            Style::default().fg(Color::Magenta),
        ));
        spans.push(Span::raw("  •  "));
        spans.push(Span::styled(
            format!("saved {}", format_elapsed(self.last_save)),
            Style::default().fg(Color::Gray),
        ));
        if self.speech.is_listening() {
            spans.push(Span::raw("  •  "));
            spans.push(Span::styled("● rec", Style::default().fg(Color::LightRed)));
        }
        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_input(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::Input && matches!(self.mode, Mode::Normal);
        let lines: Vec<Line<'static>> = if self.input.value.is_empty() && !focused {
            vec![Line::from(Span::styled(
                "What's on your mind?",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            let text = if focused {
                self.input.with_caret()
            } else {
                self.input.value.clone()
            };
            text.split('\n').map(|l| Line::raw(l.to_string())).collect()
        };
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused {
                    Color::Cyan
                } else {
                    Color::DarkGray
                })),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_thoughts(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        if self.notes.is_empty() {
            let msg = Paragraph::new("No thoughts yet")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(msg, area);
            return;
        }
        let now = Utc::now();
        let groups = group_by_day(&self.notes, &Local::now());
        let policy = BlurPolicy::new(self.state.prefs().blur_enabled, self.blur_delay);
        let active = RowFocus {
            selected: (self.focus == Focus::List).then_some(self.selected),
            editing: match &self.mode {
                Mode::Editing { note_id, .. } => Some(note_id.as_str()),
                _ => None,
            },
            menu: match &self.mode {
                Mode::ConfirmDelete { note_id } => Some(note_id.as_str()),
                _ => None,
            },
        };
        let width = area.width.saturating_sub(4) as usize;
        let (items, selected_item) = thought_items(&groups, &active, &policy, now, width);

        let mut state = ListState::default();
        let viewport = area.height as usize;
        let anchor = selected_item.unwrap_or(0);
        let offset = adjust_offset(anchor, self.list_offset, viewport, 2, items.len());
        *state.offset_mut() = offset;
        state.select(selected_item);
        let list = List::new(items).highlight_style(Style::default().bg(Color::Rgb(30, 32, 40)));
        f.render_stateful_widget(list, area, &mut state);
        drop(groups);
        self.list_offset = offset;
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
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);
        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);
        let detail = match self.selected_note() {
            Some(note) => format!(
                "{}  [{}]",
                relative_age(note.created_at, Utc::now()),
                note.id
            ),
            None => String::new(),
        };
        let detail = Paragraph::new(detail)
            .style(Style::default().fg(Color::Gray))
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let spans = match self.focus {
            Focus::Input => vec![
                key("Enter", Color::LightGreen),
                Span::raw(" save  "),
                key("Alt+Enter", Color::LightCyan),
                Span::raw(" newline  "),
                key("F2", Color::LightMagenta),
                Span::raw(" voice  "),
                key("Esc/Tab", Color::LightCyan),
                Span::raw(" browse  "),
                key("Ctrl+C", Color::LightRed),
                Span::raw(" quit"),
            ],
            Focus::List => vec![
                key("↑↓ / j k", Color::LightCyan),
                Span::raw(" move  "),
                key("e", Color::LightYellow),
                Span::raw(" edit  "),
                key("d", Color::LightRed),
                Span::raw(" delete  "),
                key("m", Color::LightMagenta),
                Span::raw(" menu  "),
                key("t", Color::LightGreen),
                Span::raw(" timer  "),
                key("b/f", Color::LightCyan),
                Span::raw(" blur/focus  "),
                key("i", Color::LightCyan),
                Span::raw(" write  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ],
        };
        Line::from(spans)
    }

    fn draw_onboarding(&self, f: &mut ratatui::Frame<'_>, onboarding: &Onboarding) {
        let now = Utc::now();
        let area = f.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(area);

        let header = Paragraph::new(Span::styled(
            "Onboarding",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(header, layout[0]);

        let notes = onboarding.visible_notes(now);
        let policy = BlurPolicy::new(true, self.blur_delay);
        let width = layout[1].width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = notes
            .iter()
            .map(|note| {
                let visibility = policy.visibility(note, now, Interaction::default());
                note_item(note, visibility, false, width)
            })
            .collect();
        f.render_widget(List::new(items), layout[1]);

        if onboarding.can_continue(now) {
            let button = Paragraph::new(Line::from(vec![
                Span::styled(
                    "Enter",
                    Style::default()
                        .fg(Color::LightGreen)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" Continue"),
            ]));
            f.render_widget(button, layout[2]);
        }
    }

    fn draw_timer_drawer(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(50, 35, f.size());
        let form = &self.timer_form;
        let field = |label: &str, value: &FieldValue, active: bool| {
            Line::from(vec![
                Span::styled(
                    format!("{:>8}: ", label),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    if active {
                        value.with_caret()
                    } else {
                        value.value.clone()
                    },
                    Style::default().fg(if active { ACCENT } else { Color::White }),
                ),
            ])
        };
        let lines = vec![
            field("Hours", &form.hours, form.field == TimerField::Hours),
            field("Minutes", &form.minutes, form.field == TimerField::Minutes),
            Line::from(""),
            preset_line(),
            Line::from(""),
            Line::from(Span::styled(
                "Enter start • Esc cancel • Tab switch • ↑↓ adjust • F1-F6 preset",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(lines).block(
            Block::default()
                .title(Span::styled(
                    "Timer",
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_edit(&self, f: &mut ratatui::Frame<'_>, field: &FieldValue) {
        let area = centered_rect(70, 40, f.size());
        let mut lines: Vec<Line<'static>> = field
            .with_caret()
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Cyan))))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter to save • Alt+Enter newline • Esc to cancel",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        "Edit Thought",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_menu(&self, f: &mut ratatui::Frame<'_>, index: usize) {
        let area = centered_rect(30, 30, f.size());
        let items: Vec<ListItem> = MENU_ITEMS
            .iter()
            .map(|item| {
                let style = if *item == MenuItem::ClearAll {
                    Style::default().fg(Color::LightRed)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(item.label()).style(style)
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(index));
        let list = List::new(items)
            .block(
                Block::default()
                    .title("Menu")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::LightCyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut state);
    }
}

/// Which rows count as interacted with while drawing.
struct RowFocus<'a> {
    selected: Option<usize>,
    editing: Option<&'a str>,
    menu: Option<&'a str>,
}

/// Builds list rows for the grouped thoughts. Also returns the list index of
/// the selected thought, since day headers occupy rows of their own.
fn thought_items(
    groups: &[DayGroup<'_>],
    active: &RowFocus<'_>,
    policy: &BlurPolicy,
    now: DateTime<Utc>,
    width: usize,
) -> (Vec<ListItem<'static>>, Option<usize>) {
    let mut items = Vec::new();
    let mut selected_item = None;
    let mut note_idx = 0;
    for group in groups {
        if group.label != TODAY_LABEL {
            items.push(ListItem::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    group.label.clone(),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "─".repeat(width.max(1)),
                    Style::default().fg(Color::DarkGray),
                )),
            ]));
        }
        for note in &group.notes {
            let hovered = active.selected == Some(note_idx);
            let interaction = Interaction {
                hovered,
                editing: active.editing == Some(note.id.as_str()),
                menu_open: active.menu == Some(note.id.as_str()),
            };
            if hovered {
                selected_item = Some(items.len());
            }
            let visibility = policy.visibility(note, now, interaction);
            items.push(note_item(note, visibility, hovered, width));
            note_idx += 1;
        }
    }
    (items, selected_item)
}

fn note_item(note: &Note, visibility: Visibility, selected: bool, width: usize) -> ListItem<'static> {
    let (text, style) = match visibility {
        Visibility::Clear => (
            note.content.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Visibility::Blurred => (
            mask(&note.content),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        ),
    };
    let marker = if selected { "▌ " } else { "  " };
    let lines: Vec<Line<'static>> = wrap_text(&text, width.saturating_sub(2).max(10))
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 { marker } else { "  " },
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(line, style),
            ])
        })
        .collect();
    ListItem::new(lines)
}

fn draw_confirm(f: &mut ratatui::Frame<'_>, question: &str) {
    let area = centered_rect(50, 30, f.size());
    let body = vec![
        Line::from(Span::styled(
            question.to_string(),
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press y to confirm, n or Esc to cancel"),
    ];
    let dialog = Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
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

fn wants_newline(key: KeyEvent) -> bool {
    key.code == KeyCode::Enter
        && key
            .modifiers
            .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    debug!("event=tui_start");
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    debug!("event=tui_stop");
    Ok(())
}

fn preset_label(hours: u64, minutes: u64) -> String {
    if hours > 0 {
        format!("{} hr", hours)
    } else {
        format!("{} min", minutes)
    }
}

fn preset_line() -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{:>8}: ", "Presets"),
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
    )];
    for (i, &(hours, minutes)) in TIMER_PRESETS.iter().enumerate() {
        spans.push(Span::styled(
            format!("F{} ", i + 1),
            Style::default().fg(Color::Gray),
        ));
        spans.push(Span::styled(
            format!("{}  ", preset_label(hours, minutes)),
            Style::default().fg(ACCENT),
        ));
    }
    Line::from(spans)
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

/// Keeps `selected` inside the viewport with `scrolloff` rows of margin.
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

fn prev_char(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_char(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let line_idx = starts.iter().rposition(|start| *start <= cursor).unwrap_or(0);
    let col = text[starts[line_idx]..cursor].chars().count();
    (starts, line_idx, col)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    slice[..limit]
        .char_indices()
        .nth(target_col)
        .map(|(idx, _)| start + idx)
        .unwrap_or(start + limit)
}

/// Greedy word wrap on character counts; hard-splits words longer than
/// `width`.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split(' ') {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > width {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            let mut chars = word.chars().peekable();
            while chars.peek().is_some() {
                if line_len == width {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                if let Some(ch) = chars.next() {
                    line.push(ch);
                    line_len += 1;
                }
            }
        }
        out.push(line);
    }
    out
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
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

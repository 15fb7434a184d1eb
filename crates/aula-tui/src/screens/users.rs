//! Users screen: account list with a create/edit form.
//!
//! Saving is an upsert: the form without an id creates. Deactivation goes
//! through the confirmation dialog.

use std::cell::Cell;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell as TableCell, Clear, Paragraph, Row, Table, TableState};
use secrecy::SecretString;
use throbber_widgets_tui::{Throbber, ThrobberState};

use aula_core::{ControlId, ControlMap, Loadable, Role, User, UserDraft};

use crate::action::Action;
use crate::component::Component;
use crate::screens::{loaded_or_placeholder, panel, step};
use crate::theme;
use crate::widgets::text_field::{FIELD_HEIGHT, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    FullName,
    Email,
    Role,
    Active,
}

impl Field {
    const ORDER: [Field; 6] = [
        Self::Username,
        Self::Password,
        Self::FullName,
        Self::Email,
        Self::Role,
        Self::Active,
    ];

    fn shift(self, delta: isize) -> Self {
        let i = Self::ORDER.iter().position(|&f| f == self).unwrap_or(0);
        let len = Self::ORDER.len();
        let next = (i + len).saturating_add_signed(delta) % len;
        Self::ORDER[next]
    }
}

/// Where a submitted save is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveState {
    Idle,
    Submitted,
    InFlight,
}

struct UserForm {
    id: Option<i64>,
    username: TextField,
    password: TextField,
    full_name: TextField,
    email: TextField,
    role: Role,
    active: bool,
    field: Field,
}

impl UserForm {
    fn create() -> Self {
        Self {
            id: None,
            username: TextField::new("Username"),
            password: TextField::new("Password").masked(),
            full_name: TextField::new("Full name"),
            email: TextField::new("Email"),
            role: Role::Operator,
            active: true,
            field: Field::Username,
        }
    }

    fn edit(user: &User) -> Self {
        Self {
            id: Some(user.id),
            username: TextField::new("Username").with_value(user.username.clone()),
            password: TextField::new("Password (blank keeps current)").masked(),
            full_name: TextField::new("Full name")
                .with_value(user.full_name.clone().unwrap_or_default()),
            email: TextField::new("Email").with_value(user.email.clone().unwrap_or_default()),
            role: user.role.clone(),
            active: user.active,
            field: Field::Username,
        }
    }

    fn text_field(&mut self) -> Option<&mut TextField> {
        match self.field {
            Field::Username => Some(&mut self.username),
            Field::Password => Some(&mut self.password),
            Field::FullName => Some(&mut self.full_name),
            Field::Email => Some(&mut self.email),
            Field::Role | Field::Active => None,
        }
    }

    fn toggle(&mut self) {
        match self.field {
            Field::Role => {
                self.role = if self.role == Role::Admin {
                    Role::Operator
                } else {
                    Role::Admin
                };
            }
            Field::Active => self.active = !self.active,
            _ => {}
        }
    }

    fn draft(&self) -> UserDraft {
        UserDraft {
            id: self.id,
            username: self.username.value().trim().to_owned(),
            password: self
                .password
                .optional()
                .map(|_| SecretString::from(self.password.value().to_owned())),
            role: self.role.clone(),
            full_name: self.full_name.optional(),
            email: self.email.optional(),
            active: Some(self.active),
        }
    }
}

pub struct UsersScreen {
    focused: bool,
    users: Arc<Loadable<Vec<User>>>,
    controls: Arc<ControlMap>,
    table_state: TableState,
    form: Option<UserForm>,
    save: SaveState,
    throbber: ThrobberState,
    table_area: Cell<Rect>,
}

impl UsersScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            users: Arc::new(Loadable::NotLoaded),
            controls: Arc::new(ControlMap::new()),
            table_state: TableState::default().with_selected(Some(0)),
            form: None,
            save: SaveState::Idle,
            throbber: ThrobberState::default(),
            table_area: Cell::new(Rect::default()),
        }
    }

    fn rows(&self) -> &[User] {
        self.users.loaded().map_or(&[], Vec::as_slice)
    }

    fn selected_user(&self) -> Option<&User> {
        self.table_state
            .selected()
            .and_then(|i| self.rows().get(i))
    }

    fn saving(&self) -> bool {
        self.controls
            .get(&ControlId::SaveUser)
            .is_some_and(|c| c.busy)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let saving = self.saving();
        let form = self.form.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.save = SaveState::Idle;
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                form.field = form.field.shift(1);
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.field = form.field.shift(-1);
                None
            }
            KeyCode::Enter => {
                if saving {
                    return None;
                }
                self.save = SaveState::Submitted;
                Some(Action::SaveUser(Box::new(form.draft())))
            }
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right
                if matches!(form.field, Field::Role | Field::Active) =>
            {
                form.toggle();
                None
            }
            _ => {
                if let Some(field) = form.text_field() {
                    field.handle_key(&key);
                }
                None
            }
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let block = panel("Users", self.focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.table_area.set(inner);

        let Some(users) = loaded_or_placeholder(frame, inner, &self.users) else {
            return;
        };
        if users.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No user accounts", theme::muted())),
                inner,
            );
            return;
        }

        let header = Row::new(["ID", "Username", "Name", "Email", "Role", "Status", "Last access"])
            .style(theme::table_header());
        let rows = users.iter().map(|u| {
            let busy = self
                .controls
                .get(&ControlId::DeactivateUser(u.id))
                .filter(|c| c.busy);
            let (status, status_style) = match busy {
                Some(c) => (c.label.clone(), Style::default().fg(theme::ELECTRIC_YELLOW)),
                None if u.active => ("active".to_owned(), Style::default().fg(theme::SUCCESS_GREEN)),
                None => ("inactive".to_owned(), theme::muted()),
            };
            Row::new(vec![
                TableCell::from(u.id.to_string()),
                TableCell::from(u.username.clone()),
                TableCell::from(u.full_name.clone().unwrap_or_default()),
                TableCell::from(u.email.clone().unwrap_or_default()),
                TableCell::from(u.role.to_string()),
                TableCell::from(Span::styled(status, status_style)),
                TableCell::from(u.last_access.clone().unwrap_or_else(|| "-".into())),
            ])
            .style(theme::table_row())
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Length(14),
                Constraint::Length(20),
                Constraint::Min(16),
                Constraint::Length(9),
                Constraint::Length(11),
                Constraint::Length(19),
            ],
        )
        .header(header)
        .row_highlight_style(theme::table_selected());
        frame.render_stateful_widget(table, inner, &mut self.table_state.clone());
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, form: &UserForm) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = (4 * FIELD_HEIGHT + 7).min(area.height);
        let panel_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, panel_area);
        let title = if form.id.is_some() { "Edit user" } else { "New user" };
        let block = panel(title, true).style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(panel_area);
        frame.render_widget(block, panel_area);

        let rows = Layout::vertical([
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        form.username.render(frame, rows[0], form.field == Field::Username);
        form.password.render(frame, rows[1], form.field == Field::Password);
        form.full_name.render(frame, rows[2], form.field == Field::FullName);
        form.email.render(frame, rows[3], form.field == Field::Email);

        let toggle = |label: &str, value: String, active: bool| {
            let style = if active {
                Style::default().fg(theme::NEON_CYAN)
            } else {
                Style::default().fg(theme::DIM_WHITE)
            };
            Line::from(vec![
                Span::styled(format!("{label:<10}"), style),
                Span::styled(format!("◂ {value} ▸"), theme::key_hint_key()),
            ])
        };
        frame.render_widget(
            Paragraph::new(toggle("Role", form.role.to_string(), form.field == Field::Role)),
            rows[4],
        );
        let active = if form.active { "[x] active" } else { "[ ] inactive" };
        frame.render_widget(
            Paragraph::new(toggle("Status", active.to_owned(), form.field == Field::Active)),
            rows[5],
        );

        if self.saving() {
            let throbber = Throbber::default()
                .label(aula_core::control::BUSY_LABEL)
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, rows[6], &mut self.throbber.clone());
        } else {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Tab next  Space toggle  Enter save  Esc cancel",
                    theme::key_hint(),
                )),
                rows[6],
            );
        }
    }
}

impl Component for UsersScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.form.is_some() {
            return Ok(self.handle_form_key(key));
        }

        let len = self.rows().len();
        let selected = self.table_state.selected().unwrap_or(0);
        let action = match (key.modifiers, key.code) {
            (_, KeyCode::Down | KeyCode::Char('j')) => {
                self.table_state.select(Some(step(selected, 1, len)));
                None
            }
            (_, KeyCode::Up | KeyCode::Char('k')) => {
                self.table_state.select(Some(step(selected, -1, len)));
                None
            }
            (KeyModifiers::NONE, KeyCode::Char('n')) => {
                self.form = Some(UserForm::create());
                None
            }
            (KeyModifiers::NONE, KeyCode::Char('e') | KeyCode::Enter) => {
                self.form = self.selected_user().map(UserForm::edit);
                None
            }
            (KeyModifiers::NONE, KeyCode::Char('d')) => self
                .selected_user()
                .filter(|u| u.active)
                .map(|u| Action::DeactivateUser(Box::new(u.clone()))),
            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.form.is_some() {
            return Ok(None);
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let area = self.table_area.get();
            // First row sits below the header
            if area.contains(Position::new(mouse.column, mouse.row)) && mouse.row > area.y {
                let index = usize::from(mouse.row - area.y - 1) + self.table_state.offset();
                if index < self.rows().len() {
                    self.table_state.select(Some(index));
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::UsersUpdated(users) => {
                self.users = Arc::clone(users);
                let len = self.rows().len();
                let selected = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(step(selected, 0, len)));
                // A reload after a save means the save went through
                if self.save != SaveState::Idle && matches!(*self.users, Loadable::Loaded(_)) {
                    self.form = None;
                    self.save = SaveState::Idle;
                }
            }
            Action::ControlsUpdated(controls) => {
                self.controls = Arc::clone(controls);
                let busy = self.saving();
                self.save = match (self.save, busy) {
                    (SaveState::Submitted, true) => SaveState::InFlight,
                    (SaveState::InFlight, false) => SaveState::Idle,
                    (state, _) => state,
                };
            }
            Action::Tick if self.saving() => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.render_table(frame, area);
        if let Some(form) = &self.form {
            self.render_form(frame, area, form);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn captures_input(&self) -> bool {
        self.form.is_some()
    }

    fn hints(&self) -> &'static str {
        if self.form.is_some() {
            "Tab next  Enter save  Esc cancel"
        } else {
            "j/k select  n new  e edit  d deactivate  r reload"
        }
    }
}

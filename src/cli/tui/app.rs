//! TUI application state and logic.

use tokio::sync::mpsc;

use crate::core::dashboard::{Dashboard, DashboardEvent};
use crate::core::form::{FieldKind, FormField};
use crate::core::models::JobId;

/// Current view being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Job cards.
    Dashboard {
        /// Selected index in the job list
        selected: usize,
    },
    /// Single job detail view.
    Detail {
        job_id: JobId,
        /// Scroll offset for long content
        scroll: u16,
    },
}

impl Default for View {
    fn default() -> Self {
        View::Dashboard { selected: 0 }
    }
}

/// Which key map applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Form,
    Notice,
}

/// Actions that can be triggered by user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    Refresh,
    NewJob,
    RunNow,
    CancelJob,
    NextField,
    PrevField,
    Input(char),
    Backspace,
    Submit,
    NextPage,
    PrevPage,
}

/// Main TUI application state.
pub struct TuiApp {
    pub dashboard: Dashboard,
    events: mpsc::UnboundedReceiver<DashboardEvent>,
    pub view: View,
    /// Index of the focused field among the form's visible fields.
    pub focus: usize,
    pub running: bool,
}

impl TuiApp {
    pub fn new(dashboard: Dashboard, events: mpsc::UnboundedReceiver<DashboardEvent>) -> Self {
        Self {
            dashboard,
            events,
            view: View::default(),
            focus: 0,
            running: true,
        }
    }

    /// Start the initial fetch.
    pub fn init(&mut self) {
        self.dashboard.load_jobs();
    }

    pub fn input_mode(&self) -> InputMode {
        if self.dashboard.notice().is_some() {
            InputMode::Notice
        } else if self.dashboard.is_form_open() {
            InputMode::Form
        } else {
            InputMode::Browse
        }
    }

    /// Apply every completion that arrived since the last tick.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: DashboardEvent) {
        self.dashboard.handle_event(event);
        // A detail view whose job could not be fetched closes itself.
        if matches!(self.view, View::Detail { .. }) && !self.dashboard.is_detail_open() {
            self.view = View::default();
        }
        self.clamp_selection();
    }

    /// The field that currently has focus in the creation form.
    pub fn focused_field(&self) -> Option<FormField> {
        let form = self.dashboard.form()?;
        let fields = form.visible_fields();
        fields.get(self.focus.min(fields.len().saturating_sub(1))).copied()
    }

    /// Handle an action and update state accordingly.
    pub fn handle_action(&mut self, action: Action) {
        if action == Action::Quit {
            self.running = false;
            return;
        }

        match self.input_mode() {
            InputMode::Notice => {
                if matches!(action, Action::Back | Action::Select) {
                    self.dashboard.dismiss_notice();
                }
            }
            InputMode::Form => self.handle_form_action(action),
            InputMode::Browse => self.handle_browse_action(action),
        }
    }

    fn handle_browse_action(&mut self, action: Action) {
        match action {
            Action::Refresh => self.dashboard.load_jobs(),
            Action::NewJob => {
                self.dashboard.open_form();
                self.focus = 0;
            }
            Action::Back => {
                if matches!(self.view, View::Detail { .. }) {
                    self.dashboard.clear_detail();
                    self.view = View::default();
                    self.dashboard.load_jobs();
                }
            }
            Action::NextPage | Action::PrevPage if matches!(self.view, View::Dashboard { .. }) => {
                if action == Action::NextPage {
                    self.dashboard.next_page();
                } else {
                    self.dashboard.prev_page();
                }
                self.view = View::default();
            }
            Action::Up => self.navigate(-1),
            Action::Down => self.navigate(1),
            Action::Select => {
                if let Some(id) = self.selected_job_id() {
                    self.dashboard.load_detail(id);
                    self.view = View::Detail {
                        job_id: id,
                        scroll: 0,
                    };
                }
            }
            Action::RunNow => {
                if let Some(id) = self.selected_job_id() {
                    self.dashboard.trigger_run(id);
                }
            }
            Action::CancelJob => {
                if let Some(id) = self.selected_job_id() {
                    self.dashboard.cancel_job(id);
                }
            }
            _ => {}
        }
    }

    fn handle_form_action(&mut self, action: Action) {
        let Some(field) = self.focused_field() else {
            return;
        };
        let field_count = self
            .dashboard
            .form()
            .map(|f| f.visible_fields().len())
            .unwrap_or(0);

        match action {
            Action::Back => self.dashboard.close_form(),
            Action::Submit => self.submit_form(),
            Action::NextField | Action::Down => {
                self.focus = (self.focus + 1) % field_count.max(1);
            }
            Action::PrevField | Action::Up => {
                self.focus = (self.focus + field_count.max(1) - 1) % field_count.max(1);
            }
            Action::Left | Action::Right => {
                if let Some(form) = self.dashboard.form_mut() {
                    form.cycle(field, action == Action::Right);
                }
            }
            Action::Select => {
                let cycled = self
                    .dashboard
                    .form_mut()
                    .is_some_and(|form| form.cycle(field, true));
                if !cycled {
                    self.focus = (self.focus + 1) % field_count.max(1);
                }
            }
            Action::Input(c) => {
                if let Some(form) = self.dashboard.form_mut() {
                    match field.kind() {
                        FieldKind::Text => {
                            if let Some(text) = form.text_mut(field) {
                                text.push(c);
                            }
                        }
                        FieldKind::Number if c.is_ascii_digit() => {
                            if let Some(text) = form.text_mut(field) {
                                text.push(c);
                            }
                        }
                        FieldKind::Choice | FieldKind::Toggle if c == ' ' => {
                            form.cycle(field, true);
                        }
                        _ => {}
                    }
                }
            }
            Action::Backspace => {
                if let Some(text) = self.dashboard.form_mut().and_then(|f| f.text_mut(field)) {
                    text.pop();
                }
            }
            _ => {}
        }

        // The visible field set shrinks when the type or disclosure changes.
        if let Some(form) = self.dashboard.form() {
            let count = form.visible_fields().len();
            if self.focus >= count {
                self.focus = count.saturating_sub(1);
            }
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.dashboard.form() else {
            return;
        };

        let missing = form.missing_fields();
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|f| form.label(*f)).collect();
            self.dashboard
                .raise_notice(format!("Please fill in: {}", labels.join(", ")));
            return;
        }

        self.dashboard.submit_form();
    }

    fn selected_job_id(&self) -> Option<JobId> {
        match &self.view {
            View::Dashboard { selected } => self.dashboard.jobs().get(*selected).map(|j| j.id),
            View::Detail { job_id, .. } => Some(*job_id),
        }
    }

    fn navigate(&mut self, delta: i32) {
        match &self.view {
            View::Dashboard { selected } => {
                let len = self.dashboard.jobs().len();
                let selected = if delta < 0 {
                    selected.saturating_sub(1)
                } else if *selected + 1 < len {
                    *selected + 1
                } else {
                    *selected
                };
                self.view = View::Dashboard { selected };
            }
            View::Detail { job_id, scroll } => {
                self.view = View::Detail {
                    job_id: *job_id,
                    scroll: if delta < 0 {
                        scroll.saturating_sub(1)
                    } else {
                        scroll.saturating_add(1)
                    },
                };
            }
        }
    }

    /// Keep the selection inside the list after a refresh shrank it.
    fn clamp_selection(&mut self) {
        if let View::Dashboard { selected } = &mut self.view {
            let len = self.dashboard.jobs().len();
            if *selected >= len {
                *selected = len.saturating_sub(1);
            }
        }
    }
}

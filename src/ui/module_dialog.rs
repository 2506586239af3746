//! Dialog that walks the user through the module wizard

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use crate::store::{CreateModuleRequest, StoreError};
use crate::ui::form_field::FormField;
use crate::wizard::templates::{CONTAINER_SPEC_FILE, DEPENDENCY_SPEC_FILE};
use crate::wizard::{Created, ModuleWizard, SubmitError, WizardAction, WizardStep};

/// Identity inputs shown on the first step, in focus order
const IDENTITY_FIELDS: &[(&str, &str)] = &[
    ("Module Name", "e.g. kAnonymity"),
    ("Algorithm Type", "e.g. generalization"),
    ("Module Category", "e.g. tabular"),
];

/// Work the dialog hands back to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogRequest {
    /// Create the module through the store, then call
    /// [`ModuleDialog::complete_submission`] with the outcome
    Submit(CreateModuleRequest),
}

/// Message shown at the bottom of the dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Dialog for creating a module with the five-step wizard
pub struct ModuleDialog {
    /// Whether the dialog is visible
    pub visible: bool,
    wizard: ModuleWizard,
    /// Inputs for name, algorithm type and category
    identity: Vec<FormField>,
    /// Index of the focused identity input
    focused: usize,
    /// Editor for the current step's document (steps 2-5)
    editor: FormField,
    notice: Option<Notice>,
}

impl ModuleDialog {
    pub fn new(wizard: ModuleWizard) -> Self {
        let mut dialog = Self {
            visible: false,
            wizard,
            identity: Vec::new(),
            focused: 0,
            editor: FormField::text_area("", ""),
            notice: None,
        };
        dialog.sync_widgets();
        dialog
    }

    /// Show the dialog, keeping whatever was entered before it was closed
    pub fn show(&mut self) {
        self.visible = true;
        self.sync_widgets();
        if !self.wizard.is_in_flight() {
            self.notice = None;
        }
    }

    /// Hide the dialog. Entered values are kept.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn wizard(&self) -> &ModuleWizard {
        &self.wizard
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    /// Handle key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DialogRequest> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => {
                self.hide();
                None
            }
            KeyCode::Char('n') if ctrl => {
                self.next_step();
                None
            }
            KeyCode::Char('p') if ctrl => {
                self.prev_step();
                None
            }
            KeyCode::Char('s') if ctrl => self.submit(),
            _ if self.wizard.step().is_first() => {
                self.handle_identity_key(key);
                None
            }
            _ => {
                if self.editor.handle_key(key) {
                    let value = self.editor.value();
                    if let Some(action) = editor_action(self.wizard.step(), value) {
                        self.dispatch(action);
                    }
                }
                None
            }
        }
    }

    fn handle_identity_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focused = (self.focused + 1) % self.identity.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused = (self.focused + self.identity.len() - 1) % self.identity.len();
            }
            KeyCode::Enter => {
                if self.focused + 1 == self.identity.len() {
                    self.next_step();
                } else {
                    self.focused += 1;
                }
            }
            _ => {
                let Some(field) = self.identity.get_mut(self.focused) else {
                    return;
                };
                if field.handle_key(key) {
                    let value = field.value();
                    let action = match self.focused {
                        0 => WizardAction::SetModuleName(value),
                        1 => WizardAction::SetAlgorithmType(value),
                        _ => WizardAction::SetModuleCategory(value),
                    };
                    self.dispatch(action);
                }
            }
        }
    }

    fn dispatch(&mut self, action: WizardAction) {
        if let Err(e) = self.wizard.dispatch(action) {
            self.notice = Some(Notice::Error(e.to_string()));
        }
    }

    fn next_step(&mut self) {
        match self.wizard.advance_with_validation() {
            Ok(()) => {
                if !self.wizard.is_in_flight() {
                    self.notice = None;
                }
                self.sync_widgets();
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    fn prev_step(&mut self) {
        self.wizard.retreat();
        self.sync_widgets();
    }

    fn submit(&mut self) -> Option<DialogRequest> {
        match self.wizard.begin_submit() {
            Ok(request) => {
                self.notice = Some(Notice::Info(format!(
                    "Creating module \"{}\"...",
                    request.module_name
                )));
                Some(DialogRequest::Submit(request))
            }
            // Ctrl+S before the last step is not an action
            Err(SubmitError::NotAtFinalStep) => None,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                None
            }
        }
    }

    /// Record the outcome of a [`DialogRequest::Submit`].
    ///
    /// On success the wizard is reset, the dialog closes and the created
    /// module is returned.
    pub fn complete_submission(&mut self, result: Result<(), StoreError>) -> Option<Created> {
        match self.wizard.finish_submit(result) {
            Ok(created) => {
                self.notice = None;
                self.focused = 0;
                self.sync_widgets();
                self.hide();
                Some(created)
            }
            Err(e) => {
                let text = match e.hint() {
                    Some(hint) => format!("{e}\n{hint}"),
                    None => e.to_string(),
                };
                self.notice = Some(Notice::Error(text));
                None
            }
        }
    }

    /// Rebuild the input widgets from the wizard state
    fn sync_widgets(&mut self) {
        let state = self.wizard.state();

        let values = [
            &state.module_name,
            &state.algorithm_type,
            &state.module_category,
        ];
        self.identity = IDENTITY_FIELDS
            .iter()
            .zip(values)
            .map(|((label, placeholder), value)| {
                FormField::text_input(*label, *placeholder).with_value(value)
            })
            .collect();
        self.focused = self.focused.min(self.identity.len() - 1);

        let name = if state.module_name.is_empty() {
            "module-name"
        } else {
            state.module_name.as_str()
        };
        self.editor = match state.step {
            WizardStep::Identity => FormField::text_area("", ""),
            WizardStep::SourceCode => {
                FormField::text_area(format!("{name}.py"), "").with_value(&state.source_code)
            }
            WizardStep::Metadata => FormField::text_area(format!("{name}.json"), "")
                .with_value(&state.metadata_document),
            WizardStep::ContainerSpec => {
                FormField::text_area(CONTAINER_SPEC_FILE, "FROM python:3.11-slim")
                    .with_value(&state.container_spec)
            }
            WizardStep::DependencySpec => {
                FormField::text_area(DEPENDENCY_SPEC_FILE, "flask")
                    .with_value(&state.dependency_spec)
            }
        };
    }

    /// Render the dialog
    pub fn render(&mut self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(70, 80, frame.area());
        frame.render_widget(Clear, area);

        let step = self.wizard.step();
        let block = Block::default()
            .title(format!(
                " Add a New Module ({}/{}) ",
                step.number(),
                WizardStep::all().len()
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Step indicator
                Constraint::Length(3), // Instructions
                Constraint::Min(6),    // Step content
                Constraint::Length(3), // Notice
                Constraint::Length(1), // Footer
            ])
            .split(inner);

        frame.render_widget(step_indicator(step), chunks[0]);

        let instructions = Paragraph::new(step.instructions())
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        frame.render_widget(instructions, chunks[1]);

        if step.is_first() {
            render_identity(frame, chunks[2], &mut self.identity, self.focused);
        } else {
            self.editor.render(frame, chunks[2], true);
        }

        if let Some(notice) = &self.notice {
            let (text, color) = match notice {
                Notice::Info(text) => (text.as_str(), Color::Yellow),
                Notice::Error(text) => (text.as_str(), Color::Red),
            };
            let para = Paragraph::new(text)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: false });
            frame.render_widget(para, chunks[3]);
        }

        frame.render_widget(footer(step, self.wizard.is_in_flight()), chunks[4]);
    }
}

/// Setter for the document edited on `step`
fn editor_action(step: WizardStep, value: String) -> Option<WizardAction> {
    match step {
        WizardStep::Identity => None,
        WizardStep::SourceCode => Some(WizardAction::SetSourceCode(value)),
        WizardStep::Metadata => Some(WizardAction::SetMetadataDocument(value)),
        WizardStep::ContainerSpec => Some(WizardAction::SetContainerSpec(value)),
        WizardStep::DependencySpec => Some(WizardAction::SetDependencySpec(value)),
    }
}

fn step_indicator(current: WizardStep) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (i, step) in WizardStep::all().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
        }
        let style = if *step == current {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if *step < current {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(
            format!("{}. {}", step.number(), step.title()),
            style,
        ));
    }
    Paragraph::new(Line::from(spans))
}

/// Render the identity inputs (free function to avoid borrow issues)
fn render_identity(frame: &mut Frame, area: Rect, fields: &mut [FormField], focused: usize) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|f| Constraint::Length(f.render_height() + 2)) // label + spacing
        .collect();

    let field_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (idx, field) in fields.iter_mut().enumerate() {
        let Some(field_area) = field_areas.get(idx).copied() else {
            break;
        };
        let is_focused = idx == focused;

        let label_style = if is_focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let label = Paragraph::new(Span::styled(format!("{}:", field.label()), label_style));
        frame.render_widget(
            label,
            Rect {
                height: 1,
                ..field_area
            },
        );

        let input_area = Rect {
            y: field_area.y + 1,
            height: field.render_height(),
            ..field_area
        };
        field.render(frame, input_area, is_focused);
    }
}

fn footer(step: WizardStep, in_flight: bool) -> Paragraph<'static> {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = Vec::new();
    if step.is_first() {
        spans.extend([key("Tab"), Span::raw(" next field  ")]);
    } else {
        spans.extend([key("Ctrl+P"), Span::raw(" previous  ")]);
    }
    if step.is_final() {
        if in_flight {
            spans.push(Span::styled(
                "creating...  ",
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.extend([key("Ctrl+S"), Span::raw(" create module  ")]);
        }
    } else {
        spans.extend([key("Ctrl+N"), Span::raw(" next  ")]);
    }
    spans.extend([key("Esc"), Span::raw(" close")]);

    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

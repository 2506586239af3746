//! Form field widgets for the wizard: single-line inputs and multi-line
//! editors.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

/// A form field widget
pub enum FormField {
    /// Single-line text input; `cursor_pos` counts chars
    TextInput {
        label: String,
        value: String,
        cursor_pos: usize,
        placeholder: String,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        label: String,
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
}

impl FormField {
    pub fn text_input(label: impl Into<String>, placeholder: impl Into<String>) -> Self {
        FormField::TextInput {
            label: label.into(),
            value: String::new(),
            cursor_pos: 0,
            placeholder: placeholder.into(),
        }
    }

    pub fn text_area(label: impl Into<String>, placeholder: impl Into<String>) -> Self {
        FormField::TextArea {
            label: label.into(),
            textarea: Box::new(TextArea::default()),
            placeholder: placeholder.into(),
        }
    }

    /// Builder-style initial value
    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn label(&self) -> &str {
        match self {
            FormField::TextInput { label, .. } | FormField::TextArea { label, .. } => label,
        }
    }

    /// Get the current value as a string
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. } => value.clone(),
            FormField::TextArea { textarea, .. } => textarea.lines().join("\n"),
        }
    }

    /// Replace the value, moving the cursor to the end
    pub fn set_value(&mut self, new_value: &str) {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => {
                // Single-line inputs drop newlines
                *value = new_value.replace(['\r', '\n'], "");
                *cursor_pos = value.chars().count();
            }
            FormField::TextArea { textarea, .. } => {
                let lines: Vec<String> = new_value.split('\n').map(str::to_string).collect();
                let mut fresh = TextArea::new(lines);
                fresh.move_cursor(tui_textarea::CursorMove::Bottom);
                fresh.move_cursor(tui_textarea::CursorMove::End);
                **textarea = fresh;
            }
        }
    }

    /// Handle a key event, returns true if the value may have changed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return false;
                }
                match key.code {
                    KeyCode::Char(c) => {
                        value.insert(byte_index(value, *cursor_pos), c);
                        *cursor_pos += 1;
                        true
                    }
                    KeyCode::Backspace => {
                        if *cursor_pos > 0 {
                            *cursor_pos -= 1;
                            value.remove(byte_index(value, *cursor_pos));
                            true
                        } else {
                            false
                        }
                    }
                    KeyCode::Delete => {
                        if *cursor_pos < value.chars().count() {
                            value.remove(byte_index(value, *cursor_pos));
                            true
                        } else {
                            false
                        }
                    }
                    KeyCode::Left => {
                        *cursor_pos = cursor_pos.saturating_sub(1);
                        false
                    }
                    KeyCode::Right => {
                        *cursor_pos = (*cursor_pos + 1).min(value.chars().count());
                        false
                    }
                    KeyCode::Home => {
                        *cursor_pos = 0;
                        false
                    }
                    KeyCode::End => {
                        *cursor_pos = value.chars().count();
                        false
                    }
                    _ => false,
                }
            }
            // TextArea handles its own key events
            FormField::TextArea { textarea, .. } => textarea.input(key),
        }
    }

    /// Get the height needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } => 1,
            FormField::TextArea { .. } => 5, // Multi-line gets more space
        }
    }

    /// Render the field
    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let border_color = if focused { Color::Cyan } else { Color::Gray };

        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                ..
            } => {
                let content = if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let mut text = value.clone();
                    if focused {
                        text.insert(byte_index(&text, *cursor_pos), '|');
                    }
                    Line::from(Span::raw(text))
                };

                let para = Paragraph::new(content).style(Style::default().fg(if focused {
                    Color::White
                } else {
                    Color::Gray
                }));
                frame.render_widget(para, area);
            }
            FormField::TextArea {
                label,
                textarea,
                placeholder,
            } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .title(format!(" {label} "))
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color)),
                );
                textarea.set_placeholder_text(placeholder.clone());
                textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));

                frame.render_widget(&**textarea, area);
            }
        }
    }
}

/// Byte offset of the `chars`-th character (or the end of the string)
fn byte_index(value: &str, chars: usize) -> usize {
    value
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(value.len())
}

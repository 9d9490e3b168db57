//! Transport-neutral send options.

/// How outbound text is marked up. Channel posts and direct messages use
/// different pipelines and never share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatMode {
    /// Channel pipeline: the text is already HTML (escaped, `<b>` tags).
    Structural,
    /// Direct-message pipeline: the text is already MarkdownV2-escaped.
    Escaped,
    /// No parse mode; the text goes out exactly as given.
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard with the given button rows.
    Reply(Vec<Vec<String>>),
    /// Inline buttons attached to the message itself.
    Inline(Vec<Vec<InlineButton>>),
    /// Remove whatever reply keyboard the user currently sees.
    Remove,
}

#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    pub keyboard: Option<Keyboard>,
    pub disable_link_preview: bool,
}

impl SendOptions {
    pub fn with_keyboard(keyboard: Keyboard) -> Self {
        Self {
            keyboard: Some(keyboard),
            disable_link_preview: false,
        }
    }

    pub fn without_preview(mut self) -> Self {
        self.disable_link_preview = true;
        self
    }
}

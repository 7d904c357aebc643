//! Render model: what a screen shows, independent of how it is drawn.
//!
//! Sequencers turn their session state into a [`ScreenView`]; the renderer
//! draws it and reports where each [`Target`] landed so clicks can be routed
//! back as input.

use crate::page::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Start,
    Begin,
    Done,
    Continue,
    Refresh,
    Retry,
    SaveClose,
}

/// Anything the participant can click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Button(ButtonId),
    Option(usize),
    Panel(Side),
    ModalOk,
    ModalYes,
    ModalNo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    pub label: String,
    pub target: Target,
    /// Small, low-contrast button (refresh)
    pub subtle: bool,
}

impl ButtonView {
    pub fn new(label: impl Into<String>, id: ButtonId) -> Self {
        Self {
            label: label.into(),
            target: Target::Button(id),
            subtle: false,
        }
    }

    pub fn subtle(mut self) -> Self {
        self.subtle = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionView {
    pub key: String,
    pub text: String,
    pub selected: bool,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Text(String),
    Entry {
        label: String,
        value: String,
        placeholder: String,
        options: Vec<OptionView>,
    },
    Choices {
        prompt: String,
        options: Vec<OptionView>,
    },
    Pair {
        left: PanelView,
        right: PanelView,
    },
    /// Two panels above a free-text field
    Reflection {
        left: PanelView,
        right: PanelView,
        prompt: String,
        value: String,
        placeholder: String,
    },
    /// Indefinite progress; the renderer animates it
    Loading {
        headline: String,
        detail: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Notice,
    Confirm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalView {
    pub title: String,
    pub message: String,
    pub kind: ModalKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenView {
    pub title: String,
    pub subtitle: Option<String>,
    pub body: Body,
    pub buttons: Vec<ButtonView>,
    pub footer: Option<String>,
    pub modal: Option<ModalView>,
    /// Non-blocking warning strip
    pub banner: Option<String>,
}

impl ScreenView {
    pub fn new(title: impl Into<String>, body: Body) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            body,
            buttons: Vec::new(),
            footer: None,
            modal: None,
            banner: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_button(mut self, button: ButtonView) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn with_footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer;
        self
    }

    pub fn with_modal(mut self, modal: Option<ModalView>) -> Self {
        self.modal = modal;
        self
    }

    pub fn targets(&self) -> Vec<Target> {
        if let Some(modal) = &self.modal {
            return match modal.kind {
                ModalKind::Notice => vec![Target::ModalOk],
                ModalKind::Confirm => vec![Target::ModalYes, Target::ModalNo],
            };
        }
        let mut out: Vec<Target> = self.buttons.iter().map(|b| b.target).collect();
        match &self.body {
            Body::Entry { options, .. } | Body::Choices { options, .. } => {
                out.extend(options.iter().map(|o| o.target))
            }
            Body::Pair { .. } | Body::Reflection { .. } => {
                out.extend([Target::Panel(Side::Left), Target::Panel(Side::Right)])
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_hides_screen_targets() {
        let view = ScreenView::new("Question", Body::Empty)
            .with_button(ButtonView::new("Continue", ButtonId::Continue))
            .with_modal(Some(ModalView {
                title: "Response required".into(),
                message: "Please select an option before continuing.".into(),
                kind: ModalKind::Notice,
            }));
        assert_eq!(view.targets(), vec![Target::ModalOk]);
    }

    #[test]
    fn pair_exposes_both_panels() {
        let view = ScreenView::new(
            "Topic",
            Body::Pair {
                left: PanelView {
                    text: "one".into(),
                    selected: false,
                },
                right: PanelView {
                    text: "two".into(),
                    selected: true,
                },
            },
        );
        assert!(view.targets().contains(&Target::Panel(Side::Right)));
    }

    #[test]
    fn reflection_keeps_panels_clickable() {
        let panel = |text: &str| PanelView {
            text: text.into(),
            selected: false,
        };
        let view = ScreenView::new(
            "Profile",
            Body::Reflection {
                left: panel("one"),
                right: panel("two"),
                prompt: "Why?".into(),
                value: String::new(),
                placeholder: "Type here".into(),
            },
        )
        .with_button(ButtonView::new("Continue", ButtonId::Continue));
        assert_eq!(
            view.targets(),
            vec![
                Target::Button(ButtonId::Continue),
                Target::Panel(Side::Left),
                Target::Panel(Side::Right),
            ]
        );
    }
}

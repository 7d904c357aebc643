use crate::view::Target;

/// Participant input, already translated from window events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Char(char),
    Backspace,
    Enter,
    Space,
    Tab,
    Escape,
    Click(Target),
}

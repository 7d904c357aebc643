use crate::error::ProviderError;

/// Two passages shown side by side in one generated round
pub type Passages = [String; 2];

/// A learner profile and its deliberate opposite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiles {
    pub actual: String,
    pub opposite: String,
}

/// What the participant picked on one fixed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    pub title: String,
    pub chosen: String,
    pub rejected: String,
}

/// Remote text generation used mid-session.
///
/// Calls block; they run on the generation worker, never on the UI thread.
pub trait ContentProvider: Send + Sync {
    fn profiles(&self, selections: &[SelectionContext]) -> Result<Profiles, ProviderError>;

    /// Two passages for `round` (zero-based), written for `profile`.
    fn passages(&self, profile: &str, round: usize) -> Result<Passages, ProviderError>;
}

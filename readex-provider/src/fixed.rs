use crate::error::ProviderError;
use crate::provider::{ContentProvider, Passages, Profiles, SelectionContext};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Offline provider with canned content, for dry runs and tests
#[derive(Debug, Default)]
pub struct StaticProvider {
    profiles: Option<Profiles>,
    rounds: Vec<Passages>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(rounds: Vec<Passages>) -> Self {
        Self {
            rounds,
            ..Self::default()
        }
    }

    pub fn with_profiles(mut self, profiles: Profiles) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(msg) => Err(ProviderError::Other(msg.clone())),
            None => Ok(()),
        }
    }
}

impl ContentProvider for StaticProvider {
    fn profiles(&self, selections: &[SelectionContext]) -> Result<Profiles, ProviderError> {
        self.begin()?;
        if let Some(p) = &self.profiles {
            return Ok(p.clone());
        }
        let liked: Vec<&str> = selections.iter().map(|s| s.title.as_str()).collect();
        Ok(Profiles {
            actual: format!(
                "Prefers the paragraphs chosen on: {}.",
                if liked.is_empty() {
                    "no pages".to_string()
                } else {
                    liked.join(", ")
                }
            ),
            opposite: "Prefers the paragraphs that were passed over.".to_string(),
        })
    }

    fn passages(&self, profile: &str, round: usize) -> Result<Passages, ProviderError> {
        self.begin()?;
        if let Some(p) = self.rounds.get(round) {
            return Ok(p.clone());
        }
        if self.rounds.is_empty() {
            return Ok([
                format!("Round {} passage one for: {profile}", round + 1),
                format!("Round {} passage two for: {profile}", round + 1),
            ]);
        }
        Err(ProviderError::UnknownRound(round))
    }
}

/// Screen phases of a session, in presentation order
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn name(&self) -> &'static str;

    fn is_terminal(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadingPhase {
    #[default]
    ParticipantId,
    Instructions,
    Reading,
    Question,
    End,
}

impl Phase for ReadingPhase {
    fn name(&self) -> &'static str {
        match self {
            Self::ParticipantId => "participant_id",
            Self::Instructions => "instructions",
            Self::Reading => "reading",
            Self::Question => "question",
            Self::End => "end",
        }
    }
    fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum PreferencePhase {
    #[default]
    ParticipantId,
    Instructions,
    Pair,
    Generating,
    GenerationFailed,
    Break,
    ProfileChoice,
    End,
}

impl Phase for PreferencePhase {
    fn name(&self) -> &'static str {
        match self {
            Self::ParticipantId => "participant_id",
            Self::Instructions => "instructions",
            Self::Pair => "pair",
            Self::Generating => "generating",
            Self::GenerationFailed => "generation_failed",
            Self::Break => "break",
            Self::ProfileChoice => "profile_choice",
            Self::End => "end",
        }
    }
    fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_start_at_participant_id() {
        assert_eq!(ReadingPhase::default(), ReadingPhase::ParticipantId);
        assert_eq!(PreferencePhase::default(), PreferencePhase::ParticipantId);
    }

    #[test]
    fn only_end_is_terminal() {
        assert!(ReadingPhase::End.is_terminal());
        assert!(!ReadingPhase::Question.is_terminal());
        assert!(PreferencePhase::End.is_terminal());
        assert!(!PreferencePhase::Break.is_terminal());
        assert_eq!(PreferencePhase::GenerationFailed.name(), "generation_failed");
    }
}

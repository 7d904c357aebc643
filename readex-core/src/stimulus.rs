use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer slot on the question screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChoiceLabel {
    A,
    B,
    C,
    D,
}

impl ChoiceLabel {
    pub const ALL: [ChoiceLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Accepts "b", " B ", "B" alike.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: ChoiceLabel,
    pub text: String,
}

/// One row of reading material. Immutable after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    /// Zero-based row index in the source file
    pub id: usize,
    pub text: String,
    pub question: Option<String>,
    pub choices: Vec<Choice>,
    /// Correct marker exactly as written in the source
    pub correct: Option<String>,
    /// Every source column except the paragraph text, in source order
    pub metadata: Vec<(String, String)>,
}

/// What the question screen shows for one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub choices: Vec<Choice>,
    pub placeholder: bool,
}

impl Stimulus {
    pub fn question_for(&self, trial_number: usize) -> Question {
        let prompt = self
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let choices = if self.choices.is_empty() {
            ChoiceLabel::ALL
                .into_iter()
                .map(|label| Choice {
                    label,
                    text: format!("Placeholder option {label}"),
                })
                .collect()
        } else {
            self.choices.clone()
        };

        Question {
            prompt: prompt.map(str::to_owned).unwrap_or_else(|| {
                format!(
                    "Placeholder question for Paragraph {trial_number}.\n\n\
                     Please choose one of the options below."
                )
            }),
            placeholder: prompt.is_none() || self.choices.is_empty(),
            choices,
        }
    }

    /// `None` when the source gives no correct marker for this row.
    pub fn is_correct(&self, selection: ChoiceLabel) -> Option<bool> {
        self.correct
            .as_deref()
            .map(str::trim)
            .filter(|marker| !marker.is_empty())
            .map(|marker| marker.eq_ignore_ascii_case(selection.as_str()))
    }

    pub fn offers(&self, label: ChoiceLabel) -> bool {
        self.choices.is_empty() || self.choices.iter().any(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(correct: Option<&str>) -> Stimulus {
        Stimulus {
            id: 0,
            text: "A paragraph.".into(),
            question: None,
            choices: Vec::new(),
            correct: correct.map(Into::into),
            metadata: Vec::new(),
        }
    }

    #[test]
    fn missing_question_gets_placeholders() {
        let q = bare(None).question_for(3);
        assert!(q.placeholder);
        assert!(q.prompt.contains("Paragraph 3"));
        assert_eq!(q.choices.len(), 4);
        assert!(q.choices.iter().all(|c| !c.text.is_empty()));
        assert_eq!(q.choices[2].text, "Placeholder option C");
    }

    #[test]
    fn blank_question_is_treated_as_missing() {
        let mut s = bare(None);
        s.question = Some("   ".into());
        assert!(s.question_for(1).prompt.starts_with("Placeholder question"));
    }

    #[test]
    fn supplied_question_is_kept() {
        let mut s = bare(None);
        s.question = Some("What is the main idea?".into());
        s.choices = vec![
            Choice {
                label: ChoiceLabel::A,
                text: "Rivers".into(),
            },
            Choice {
                label: ChoiceLabel::C,
                text: "Mountains".into(),
            },
        ];
        let q = s.question_for(1);
        assert!(!q.placeholder);
        assert_eq!(q.prompt, "What is the main idea?");
        assert_eq!(q.choices.len(), 2);
        assert!(s.offers(ChoiceLabel::C));
        assert!(!s.offers(ChoiceLabel::B));
    }

    #[test]
    fn correctness_follows_marker() {
        let s = bare(Some("B"));
        assert_eq!(s.is_correct(ChoiceLabel::B), Some(true));
        assert_eq!(s.is_correct(ChoiceLabel::A), Some(false));
    }

    #[test]
    fn correctness_ignores_case_and_padding() {
        assert_eq!(bare(Some(" b ")).is_correct(ChoiceLabel::B), Some(true));
    }

    #[test]
    fn no_marker_means_unknown() {
        assert_eq!(bare(None).is_correct(ChoiceLabel::A), None);
        assert_eq!(bare(Some("")).is_correct(ChoiceLabel::A), None);
    }

    #[test]
    fn labels_parse_loosely() {
        assert_eq!(ChoiceLabel::parse("d"), Some(ChoiceLabel::D));
        assert_eq!(ChoiceLabel::parse("E"), None);
        assert_eq!(ChoiceLabel::from_index(1), Some(ChoiceLabel::B));
        assert_eq!(ChoiceLabel::from_index(4), None);
    }
}

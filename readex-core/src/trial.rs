use crate::stimulus::ChoiceLabel;

/// A stimulus placed at a position of the presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    pub position: usize,
    pub stimulus: usize,
}

/// Wall-clock span of one screen, unix seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: Option<f64>,
    pub end: f64,
}

impl Interval {
    pub fn new(start: Option<f64>, end: f64) -> Self {
        Self { start, end }
    }

    /// Never negative; a missing or non-finite start counts as zero.
    pub fn duration_secs(&self) -> f64 {
        match self.start {
            Some(start) if start.is_finite() && self.end.is_finite() => {
                (self.end - start).max(0.0)
            }
            _ => 0.0,
        }
    }
}

/// Columns a trial record writes itself; stimulus metadata may not reuse them.
pub const TRIAL_COLUMNS: [&str; 12] = [
    "participant_id",
    "trial_index",
    "stim_index",
    "reading_start_time_unix",
    "reading_end_time_unix",
    "reading_time_sec",
    "question_response",
    "question_start_time_unix",
    "question_end_time_unix",
    "question_time_sec",
    "question_correct_option",
    "question_is_correct",
];

/// A row of the tabular trial log: ordered column name / cell pairs.
pub trait LogRow {
    fn columns(&self) -> Vec<(String, String)>;
}

/// Recorded result per completed trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub participant_id: String,
    pub trial_index: usize,
    pub stim_index: usize,
    pub reading: Interval,
    pub metadata: Vec<(String, String)>,
    pub response: ChoiceLabel,
    pub question: Interval,
    pub correct_option: Option<String>,
    pub is_correct: Option<bool>,
}

pub(crate) fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl LogRow for TrialRecord {
    fn columns(&self) -> Vec<(String, String)> {
        let mut cols = vec![
            ("participant_id".to_string(), self.participant_id.clone()),
            ("trial_index".to_string(), self.trial_index.to_string()),
            ("stim_index".to_string(), self.stim_index.to_string()),
            ("reading_start_time_unix".to_string(), cell(self.reading.start)),
            ("reading_end_time_unix".to_string(), self.reading.end.to_string()),
            (
                "reading_time_sec".to_string(),
                self.reading.duration_secs().to_string(),
            ),
        ];
        cols.extend(self.metadata.iter().cloned());
        cols.push((
            "question_response".to_string(),
            self.response.as_str().to_string(),
        ));
        cols.push((
            "question_start_time_unix".to_string(),
            cell(self.question.start),
        ));
        cols.push((
            "question_end_time_unix".to_string(),
            self.question.end.to_string(),
        ));
        cols.push((
            "question_time_sec".to_string(),
            self.question.duration_secs().to_string(),
        ));
        if let Some(correct) = &self.correct_option {
            cols.push(("question_correct_option".to_string(), correct.clone()));
            cols.push((
                "question_is_correct".to_string(),
                self.is_correct.unwrap_or(false).to_string(),
            ));
        }
        cols
    }
}

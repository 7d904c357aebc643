use crate::trial::{Interval, LogRow, cell};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Study arm of the preference session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    Experimental,
    Control,
}

impl Group {
    pub const ALL: [Group; 2] = [Self::Experimental, Self::Control];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Experimental => "Experimental",
            Self::Control => "Control",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of two side-by-side panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// 1 for left, 2 for right, as recorded in the log
    pub fn number(&self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Fixed,
    Generated { round: usize },
    Profile,
}

impl PageKind {
    pub fn label(&self) -> String {
        match self {
            Self::Fixed => "fixed".to_string(),
            Self::Generated { round } => format!("generated_{round}"),
            Self::Profile => "profile".to_string(),
        }
    }
}

/// Recorded result per completed preference page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub participant_id: String,
    pub group: Group,
    pub page_index: usize,
    pub kind: PageKind,
    pub title: String,
    pub selected: Side,
    pub selected_text: String,
    pub unselected_text: String,
    pub interval: Interval,
    pub refreshes: u32,
    pub chose_actual_profile: Option<bool>,
    /// Typed explanation on the profile page
    pub reasoning: Option<String>,
}

impl LogRow for PageRecord {
    fn columns(&self) -> Vec<(String, String)> {
        vec![
            ("participant_id".into(), self.participant_id.clone()),
            ("group".into(), self.group.to_string()),
            ("page_index".into(), self.page_index.to_string()),
            ("page_kind".into(), self.kind.label()),
            ("title".into(), self.title.clone()),
            ("selected_option".into(), self.selected.number().to_string()),
            ("selected_text".into(), self.selected_text.clone()),
            ("unselected_text".into(), self.unselected_text.clone()),
            ("page_start_time_unix".into(), cell(self.interval.start)),
            ("page_end_time_unix".into(), self.interval.end.to_string()),
            (
                "page_time_sec".into(),
                self.interval.duration_secs().to_string(),
            ),
            ("refresh_count".into(), self.refreshes.to_string()),
            (
                "chose_actual_profile".into(),
                self.chose_actual_profile
                    .map(|b| b.to_string())
                    .unwrap_or_default(),
            ),
            ("reasoning".into(), self.reasoning.clone().unwrap_or_default()),
        ]
    }
}

pub mod input;
pub mod page;
pub mod phase;
pub mod stimulus;
pub mod trial;
pub mod view;

pub use input::Input;
pub use page::{Group, PageKind, PageRecord, Side};
pub use phase::{Phase, PreferencePhase, ReadingPhase};
pub use stimulus::{Choice, ChoiceLabel, Question, Stimulus};
pub use trial::{Interval, LogRow, TRIAL_COLUMNS, Trial, TrialRecord};
pub use view::{
    Body, ButtonId, ButtonView, ModalKind, ModalView, OptionView, PanelView, ScreenView, Target,
};

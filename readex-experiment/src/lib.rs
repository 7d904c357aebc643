pub mod config;
pub mod driver;
pub mod error;
pub mod log;
pub mod order;
pub mod pages;
pub mod preference;
pub mod reading;
pub mod stimuli;

pub use config::StudyConfig;
pub use driver::{Driver, Effect, Sequencer, Status};
pub use error::{ConfigError, ExperimentError, LogError, Notice, StimulusError};
pub use log::{CsvLogWriter, LogWriter, TrialLog};
pub use order::presentation_order;
pub use pages::{FixedPage, load_pages};
pub use preference::{
    PreferenceAction, PreferenceScreen, PreferenceSequencer, PreferenceSession, VERBAL_RESPONSE,
};
pub use reading::{ReadingAction, ReadingScreen, ReadingSequencer, ReadingSession};
pub use stimuli::load_stimuli;

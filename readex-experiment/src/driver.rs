//! Runs a [`Sequencer`] against participant input.
//!
//! The sequencer owns the rules; the driver owns the session value, the
//! blocking notice and the save-warning banner, and threads the session
//! through `apply` one action at a time.

use crate::error::{LogError, Notice};
use readex_core::{Input, ModalKind, ModalView, Phase, ScreenView, Target};
use readex_provider::GenerationOutcome;
use std::fmt::Debug;
use tracing::{debug, info, warn};

/// What an applied action asks of the outside world
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Rejected gate; the session is unchanged
    Notice(Notice),
    Saved { rows: usize },
    SaveFailed(String),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Exit,
}

pub trait Sequencer {
    type Phase: Phase;
    type Session: Default;
    type Action: Debug;

    fn phase(&self, session: &Self::Session) -> Self::Phase;

    /// Maps raw input to an action valid on the current screen.
    fn action_for(&self, session: &Self::Session, input: Input) -> Option<Self::Action>;

    fn apply(&mut self, session: Self::Session, action: Self::Action) -> (Self::Session, Effect);

    fn view(&self, session: &Self::Session) -> ScreenView;

    fn on_generated(
        &mut self,
        session: Self::Session,
        _outcome: GenerationOutcome,
    ) -> (Self::Session, Effect) {
        (session, Effect::None)
    }

    /// Rows held in the session log.
    fn recorded(&self, session: &Self::Session) -> usize;

    /// Writes whatever has been recorded so far.
    fn flush(&mut self, session: &Self::Session) -> Result<(), LogError>;
}

pub struct Driver<S: Sequencer> {
    sequencer: S,
    session: S::Session,
    notice: Option<Notice>,
    warning: Option<String>,
}

impl<S: Sequencer> Driver<S> {
    pub fn new(sequencer: S) -> Self {
        Self {
            sequencer,
            session: S::Session::default(),
            notice: None,
            warning: None,
        }
    }

    pub fn input(&mut self, input: Input) -> Status {
        if self.notice.is_some() {
            // a notice blocks everything until acknowledged
            if matches!(
                input,
                Input::Enter | Input::Space | Input::Click(Target::ModalOk)
            ) {
                self.notice = None;
            }
            return Status::Running;
        }
        match self.sequencer.action_for(&self.session, input) {
            Some(action) => self.dispatch(action),
            None => Status::Running,
        }
    }

    pub fn dispatch(&mut self, action: S::Action) -> Status {
        let before = self.sequencer.phase(&self.session);
        debug!(phase = before.name(), ?action, "action");
        let session = std::mem::take(&mut self.session);
        let (session, effect) = self.sequencer.apply(session, action);
        self.session = session;
        self.settle(before, effect)
    }

    pub fn generated(&mut self, outcome: GenerationOutcome) -> Status {
        let before = self.sequencer.phase(&self.session);
        let session = std::mem::take(&mut self.session);
        let (session, effect) = self.sequencer.on_generated(session, outcome);
        self.session = session;
        self.settle(before, effect)
    }

    fn settle(&mut self, before: S::Phase, effect: Effect) -> Status {
        let after = self.sequencer.phase(&self.session);
        if after != before {
            debug!(from = before.name(), to = after.name(), "transition");
            if after.is_terminal() {
                info!(rows = self.sequencer.recorded(&self.session), "last screen reached");
            }
        }
        match effect {
            Effect::None => {}
            Effect::Notice(notice) => self.notice = Some(notice),
            Effect::Saved { .. } => self.warning = None,
            Effect::SaveFailed(msg) => {
                self.warning = Some(format!("Log could not be saved: {msg}"));
            }
            Effect::Exit => return Status::Exit,
        }
        Status::Running
    }

    pub fn view(&self) -> ScreenView {
        let mut view = self.sequencer.view(&self.session);
        if let Some(notice) = &self.notice {
            view.modal = Some(ModalView {
                title: notice.title().to_string(),
                message: notice.message(),
                kind: ModalKind::Notice,
            });
        }
        view.banner = self.warning.clone();
        view
    }

    pub fn phase(&self) -> S::Phase {
        self.sequencer.phase(&self.session)
    }

    /// True once the session sits on its closing screen.
    pub fn finished(&self) -> bool {
        self.phase().is_terminal()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn session(&self) -> &S::Session {
        &self.session
    }

    pub fn sequencer(&self) -> &S {
        &self.sequencer
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Last-chance save when the window is closed from outside.
    pub fn flush(&mut self) -> Result<(), LogError> {
        let result = self.sequencer.flush(&self.session);
        if let Err(e) = &result {
            warn!(error = %e, "flush on close failed");
        }
        result
    }
}

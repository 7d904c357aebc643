use crate::driver::{Effect, Sequencer};
use crate::error::{LogError, Notice};
use crate::log::{LogWriter, TrialLog};
use readex_core::{
    Body, ButtonId, ButtonView, ChoiceLabel, Input, Interval, ModalKind, ModalView, OptionView,
    ReadingPhase, ScreenView, Stimulus, Target, Trial, TrialRecord,
};
use readex_timing::Timer;
use tracing::{info, warn};

const APP_TITLE: &str = "EEG Reading Experiment";

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingScreen {
    ParticipantId { draft: String, confirming: bool },
    Instructions,
    Reading { trial: Trial, entered_at: f64 },
    Question {
        trial: Trial,
        entered_at: f64,
        selection: Option<ChoiceLabel>,
    },
    End,
}

impl ReadingScreen {
    pub fn phase(&self) -> ReadingPhase {
        match self {
            Self::ParticipantId { .. } => ReadingPhase::ParticipantId,
            Self::Instructions => ReadingPhase::Instructions,
            Self::Reading { .. } => ReadingPhase::Reading,
            Self::Question { .. } => ReadingPhase::Question,
            Self::End => ReadingPhase::End,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadingSession {
    /// Set once on confirmation, never changed afterwards
    pub participant: Option<String>,
    pub screen: ReadingScreen,
    /// Position in the presentation order of the current trial
    pub pointer: usize,
    pub log: TrialLog<TrialRecord>,
    /// Reading span of the trial whose question is open
    pending: Option<Interval>,
}

impl Default for ReadingSession {
    fn default() -> Self {
        Self {
            participant: None,
            screen: ReadingScreen::ParticipantId {
                draft: String::new(),
                confirming: false,
            },
            pointer: 0,
            log: TrialLog::default(),
            pending: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingAction {
    Type(char),
    Erase,
    Submit,
    Confirm(bool),
    Begin,
    FinishReading,
    Select(ChoiceLabel),
    Continue,
    Close,
}

pub struct ReadingSequencer<T: Timer, W: LogWriter> {
    stimuli: Vec<Stimulus>,
    order: Vec<Trial>,
    instructions: String,
    clock: T,
    writer: W,
}

impl<T: Timer, W: LogWriter> ReadingSequencer<T, W> {
    /// `order` must reference stimuli by index into `stimuli`; entries that
    /// do not are dropped.
    pub fn new(
        stimuli: Vec<Stimulus>,
        order: Vec<Trial>,
        instructions: impl Into<String>,
        clock: T,
        writer: W,
    ) -> Self {
        let mut order: Vec<Trial> = order
            .into_iter()
            .filter(|t| t.stimulus < stimuli.len())
            .collect();
        for (position, trial) in order.iter_mut().enumerate() {
            trial.position = position;
        }
        Self {
            stimuli,
            order,
            instructions: instructions.into(),
            clock,
            writer,
        }
    }

    pub fn order(&self) -> &[Trial] {
        &self.order
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn stimulus(&self, trial: Trial) -> &Stimulus {
        &self.stimuli[trial.stimulus]
    }

    fn trial_screen(&self, pointer: usize) -> ReadingScreen {
        match self.order.get(pointer) {
            Some(&trial) => ReadingScreen::Reading {
                trial,
                entered_at: self.clock.now(),
            },
            None => ReadingScreen::End,
        }
    }

    fn save(&mut self, session: &ReadingSession) -> Effect {
        let participant = session.participant.as_deref().unwrap_or_default();
        match self.writer.save(participant, session.log.rows()) {
            Ok(()) => Effect::Saved {
                rows: session.log.len(),
            },
            Err(e) => {
                warn!(error = %e, rows = session.log.len(), "trial log not saved");
                Effect::SaveFailed(e.to_string())
            }
        }
    }

    fn participant_footer(session: &ReadingSession) -> Option<String> {
        session.participant.as_ref().map(|p| format!("ID: {p}"))
    }
}

impl<T: Timer, W: LogWriter> Sequencer for ReadingSequencer<T, W> {
    type Phase = ReadingPhase;
    type Session = ReadingSession;
    type Action = ReadingAction;

    fn phase(&self, session: &ReadingSession) -> ReadingPhase {
        session.screen.phase()
    }

    fn action_for(&self, session: &ReadingSession, input: Input) -> Option<ReadingAction> {
        use ReadingAction as A;
        match (&session.screen, input) {
            (ReadingScreen::ParticipantId { confirming: true, .. }, input) => match input {
                Input::Char('y' | 'Y') | Input::Enter | Input::Click(Target::ModalYes) => {
                    Some(A::Confirm(true))
                }
                Input::Char('n' | 'N') | Input::Click(Target::ModalNo) => Some(A::Confirm(false)),
                _ => None,
            },
            (ReadingScreen::ParticipantId { .. }, input) => match input {
                Input::Char(c) if !c.is_control() => Some(A::Type(c)),
                Input::Space => Some(A::Type(' ')),
                Input::Backspace => Some(A::Erase),
                Input::Enter | Input::Click(Target::Button(ButtonId::Start)) => Some(A::Submit),
                _ => None,
            },
            (
                ReadingScreen::Instructions,
                Input::Enter | Input::Space | Input::Click(Target::Button(ButtonId::Begin)),
            ) => Some(A::Begin),
            (
                ReadingScreen::Reading { .. },
                Input::Space | Input::Enter | Input::Click(Target::Button(ButtonId::Done)),
            ) => Some(A::FinishReading),
            (ReadingScreen::Question { .. }, input) => match input {
                Input::Char(c) => choice_key(c).map(A::Select),
                Input::Click(Target::Option(i)) => ChoiceLabel::from_index(i).map(A::Select),
                Input::Enter | Input::Click(Target::Button(ButtonId::Continue)) => {
                    Some(A::Continue)
                }
                _ => None,
            },
            (
                ReadingScreen::End,
                Input::Enter | Input::Click(Target::Button(ButtonId::SaveClose)),
            ) => Some(A::Close),
            _ => None,
        }
    }

    fn apply(
        &mut self,
        mut session: ReadingSession,
        action: ReadingAction,
    ) -> (ReadingSession, Effect) {
        use ReadingAction as A;
        let screen = std::mem::replace(&mut session.screen, ReadingScreen::End);
        let (screen, effect) = match (screen, action) {
            (
                ReadingScreen::ParticipantId {
                    mut draft,
                    confirming: false,
                },
                A::Type(c),
            ) => {
                draft.push(c);
                (
                    ReadingScreen::ParticipantId {
                        draft,
                        confirming: false,
                    },
                    Effect::None,
                )
            }
            (
                ReadingScreen::ParticipantId {
                    mut draft,
                    confirming: false,
                },
                A::Erase,
            ) => {
                draft.pop();
                (
                    ReadingScreen::ParticipantId {
                        draft,
                        confirming: false,
                    },
                    Effect::None,
                )
            }
            (
                ReadingScreen::ParticipantId {
                    draft,
                    confirming: false,
                },
                A::Submit,
            ) => {
                let ok = !draft.trim().is_empty();
                (
                    ReadingScreen::ParticipantId {
                        draft,
                        confirming: ok,
                    },
                    if ok {
                        Effect::None
                    } else {
                        Effect::Notice(Notice::MissingParticipant)
                    },
                )
            }
            (
                ReadingScreen::ParticipantId {
                    draft,
                    confirming: true,
                },
                A::Confirm(false),
            ) => (
                ReadingScreen::ParticipantId {
                    draft,
                    confirming: false,
                },
                Effect::None,
            ),
            (
                ReadingScreen::ParticipantId {
                    draft,
                    confirming: true,
                },
                A::Confirm(true),
            ) => match self.writer.prepare() {
                Ok(()) => {
                    let id = draft.trim().to_string();
                    info!(participant = %id, trials = self.order.len(), "participant confirmed");
                    session.participant = Some(id);
                    (ReadingScreen::Instructions, Effect::None)
                }
                Err(e) => (
                    ReadingScreen::ParticipantId {
                        draft,
                        confirming: false,
                    },
                    Effect::Notice(Notice::LogDirectory(e.to_string())),
                ),
            },
            (ReadingScreen::Instructions, A::Begin) => {
                session.pointer = 0;
                (self.trial_screen(0), Effect::None)
            }
            (ReadingScreen::Reading { trial, entered_at }, A::FinishReading) => {
                let now = self.clock.now();
                session.pending = Some(Interval::new(Some(entered_at), now));
                (
                    ReadingScreen::Question {
                        trial,
                        entered_at: now,
                        selection: None,
                    },
                    Effect::None,
                )
            }
            (
                ReadingScreen::Question {
                    trial,
                    entered_at,
                    selection,
                },
                A::Select(label),
            ) => {
                let selection = if self.stimulus(trial).offers(label) {
                    Some(label)
                } else {
                    selection
                };
                (
                    ReadingScreen::Question {
                        trial,
                        entered_at,
                        selection,
                    },
                    Effect::None,
                )
            }
            (
                ReadingScreen::Question {
                    trial,
                    entered_at,
                    selection: None,
                },
                A::Continue,
            ) => (
                ReadingScreen::Question {
                    trial,
                    entered_at,
                    selection: None,
                },
                Effect::Notice(Notice::ResponseRequired),
            ),
            (
                ReadingScreen::Question {
                    trial,
                    entered_at,
                    selection: Some(response),
                },
                A::Continue,
            ) => {
                let now = self.clock.now();
                let stimulus = self.stimulus(trial);
                let reading = session
                    .pending
                    .take()
                    .unwrap_or_else(|| Interval::new(None, entered_at));
                let record = TrialRecord {
                    participant_id: session.participant.clone().unwrap_or_default(),
                    trial_index: trial.position,
                    stim_index: stimulus.id,
                    reading,
                    metadata: stimulus.metadata.clone(),
                    response,
                    question: Interval::new(Some(entered_at), now),
                    correct_option: stimulus.correct.as_deref().map(|c| c.trim().to_string()),
                    is_correct: stimulus.is_correct(response),
                };
                info!(
                    trial = record.trial_index,
                    stimulus = record.stim_index,
                    response = %response,
                    reading_secs = record.reading.duration_secs(),
                    "trial complete"
                );
                session.log.push(record);
                let effect = self.save(&session);
                session.pointer += 1;
                (self.trial_screen(session.pointer), effect)
            }
            (ReadingScreen::End, A::Close) => {
                let effect = match self.save(&session) {
                    Effect::Saved { .. } => {
                        info!(rows = session.log.len(), "session closed");
                        Effect::Exit
                    }
                    other => other,
                };
                (ReadingScreen::End, effect)
            }
            (screen, _) => (screen, Effect::None),
        };
        session.screen = screen;
        (session, effect)
    }

    fn view(&self, session: &ReadingSession) -> ScreenView {
        let footer = Self::participant_footer(session);
        match &session.screen {
            ReadingScreen::ParticipantId { draft, confirming } => {
                let modal = confirming.then(|| ModalView {
                    title: "Confirm ID".into(),
                    message: format!("Is this Participant ID correct?\n\n{}", draft.trim()),
                    kind: ModalKind::Confirm,
                });
                ScreenView::new(
                    APP_TITLE,
                    Body::Entry {
                        label: "Enter Participant ID:".into(),
                        value: draft.clone(),
                        placeholder: "Participant ID".into(),
                        options: Vec::new(),
                    },
                )
                .with_button(ButtonView::new("Start", ButtonId::Start))
                .with_modal(modal)
            }
            ReadingScreen::Instructions => {
                ScreenView::new("Welcome!", Body::Text(self.instructions.clone()))
                    .with_button(ButtonView::new("Begin", ButtonId::Begin))
                    .with_footer(footer)
            }
            ReadingScreen::Reading { trial, .. } => ScreenView::new(
                format!("Paragraph {} of {}", trial.position + 1, self.order.len()),
                Body::Text(self.stimulus(*trial).text.clone()),
            )
            .with_subtitle("Read silently. Press SPACE or click 'Done' when you are finished.")
            .with_button(ButtonView::new("Done", ButtonId::Done))
            .with_footer(footer),
            ReadingScreen::Question {
                trial, selection, ..
            } => {
                let question = self.stimulus(*trial).question_for(trial.position + 1);
                let options = question
                    .choices
                    .iter()
                    .map(|c| OptionView {
                        key: c.label.to_string(),
                        text: format!("{}. {}", c.label, c.text),
                        selected: *selection == Some(c.label),
                        target: Target::Option(c.label.index()),
                    })
                    .collect();
                ScreenView::new(
                    format!("Question for Paragraph {}", trial.position + 1),
                    Body::Choices {
                        prompt: question.prompt,
                        options,
                    },
                )
                .with_button(ButtonView::new("Continue", ButtonId::Continue))
                .with_footer(footer)
            }
            ReadingScreen::End => ScreenView::new(
                "Thank you!",
                Body::Text(
                    "You have completed the reading portion of the study.\n\n\
                     Please let the researcher know you are finished."
                        .into(),
                ),
            )
            .with_button(ButtonView::new("Save & Close", ButtonId::SaveClose))
            .with_footer(footer),
        }
    }

    fn recorded(&self, session: &ReadingSession) -> usize {
        session.log.len()
    }

    fn flush(&mut self, session: &ReadingSession) -> Result<(), LogError> {
        match &session.participant {
            Some(participant) => self.writer.save(participant, session.log.rows()),
            None => Ok(()),
        }
    }
}

/// `1`-`4` or `a`-`d`, either case
fn choice_key(c: char) -> Option<ChoiceLabel> {
    match c {
        '1'..='4' => ChoiceLabel::from_index(c as usize - '1' as usize),
        _ => ChoiceLabel::parse(&c.to_string()),
    }
}

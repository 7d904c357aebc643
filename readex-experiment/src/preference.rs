//! Preference study: fixed paragraph pairs, then provider-written pairs
//! tailored to a learner profile, then a choice between the profile and its
//! opposite.
//!
//! Generation runs off the UI thread. The sequencer submits a request
//! through [`Dispatch`], remembers the id of the latest request, and only
//! accepts an outcome carrying that id.

use crate::driver::{Effect, Sequencer};
use crate::error::{LogError, Notice};
use crate::log::{LogWriter, TrialLog};
use crate::pages::FixedPage;
use readex_core::{
    Body, ButtonId, ButtonView, Group, Input, Interval, ModalKind, ModalView, OptionView, PageKind,
    PageRecord, PanelView, PreferencePhase, ScreenView, Side, Target,
};
use readex_provider::{
    Dispatch, GenerationOutcome, GenerationRequest, JobId, Passages, ProfileSource, Profiles,
    SelectionContext,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use readex_timing::Timer;
use tracing::{error, info, warn};

const PROFILE_TITLE: &str =
    "Which of the following two paragraphs best describes your learning preferences?";
const REASONING_PROMPT: &str = "Please explain your reasoning for your selection above in the \
     textbox below. You may either type your response or state your reasoning verbally.";
/// Logged when the reasoning box is left empty
pub const VERBAL_RESPONSE: &str = "Verbal response.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub group: Group,
}

/// A side-by-side page before the break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPage {
    Fixed(usize),
    Round(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceScreen {
    ParticipantId {
        draft: String,
        group: Option<Group>,
        confirming: bool,
    },
    Instructions,
    Pair {
        page: PairPage,
        entered_at: f64,
        selection: Option<Side>,
        confirming_refresh: bool,
    },
    Generating {
        round: usize,
    },
    GenerationFailed {
        round: usize,
        message: String,
    },
    Break,
    ProfileChoice {
        entered_at: f64,
        /// Panel holding the derived profile; the opposite takes the other
        actual_side: Side,
        selection: Option<Side>,
        reasoning: String,
    },
    End,
}

impl PreferenceScreen {
    pub fn phase(&self) -> PreferencePhase {
        match self {
            Self::ParticipantId { .. } => PreferencePhase::ParticipantId,
            Self::Instructions => PreferencePhase::Instructions,
            Self::Pair { .. } => PreferencePhase::Pair,
            Self::Generating { .. } => PreferencePhase::Generating,
            Self::GenerationFailed { .. } => PreferencePhase::GenerationFailed,
            Self::Break => PreferencePhase::Break,
            Self::ProfileChoice { .. } => PreferencePhase::ProfileChoice,
            Self::End => PreferencePhase::End,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceSession {
    pub participant: Option<Participant>,
    pub screen: PreferenceScreen,
    /// Index of the current pair page, fixed pages first
    pub cursor: usize,
    pub profiles: Option<Profiles>,
    pub log: TrialLog<PageRecord>,
    selections: Vec<SelectionContext>,
    generated: Vec<Option<Passages>>,
    refreshes: Vec<u32>,
    awaiting: Option<JobId>,
}

impl Default for PreferenceSession {
    fn default() -> Self {
        Self {
            participant: None,
            screen: PreferenceScreen::ParticipantId {
                draft: String::new(),
                group: None,
                confirming: false,
            },
            cursor: 0,
            profiles: None,
            log: TrialLog::default(),
            selections: Vec::new(),
            generated: Vec::new(),
            refreshes: Vec::new(),
            awaiting: None,
        }
    }
}

impl PreferenceSession {
    pub fn passages(&self, round: usize) -> Option<&Passages> {
        self.generated.get(round).and_then(Option::as_ref)
    }

    pub fn refreshes(&self, round: usize) -> u32 {
        self.refreshes.get(round).copied().unwrap_or(0)
    }

    pub fn awaiting(&self) -> Option<JobId> {
        self.awaiting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceAction {
    Type(char),
    Erase,
    CycleGroup,
    SetGroup(Group),
    Submit,
    Confirm(bool),
    Begin,
    Select(Side),
    Continue,
    Refresh,
    ConfirmRefresh(bool),
    Retry,
    Close,
}

pub struct PreferenceSequencer<T: Timer, W: LogWriter, D: Dispatch> {
    pages: Vec<FixedPage>,
    rounds: Vec<String>,
    instructions: String,
    clock: T,
    writer: W,
    dispatcher: D,
    rng: StdRng,
}

impl<T: Timer, W: LogWriter, D: Dispatch> PreferenceSequencer<T, W, D> {
    /// `rounds` holds the title of each generated round.
    pub fn new(
        pages: Vec<FixedPage>,
        rounds: Vec<String>,
        instructions: impl Into<String>,
        clock: T,
        writer: W,
        dispatcher: D,
    ) -> Self {
        Self {
            pages,
            rounds,
            instructions: instructions.into(),
            clock,
            writer,
            dispatcher,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replaces the generator that places the profile panels.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn pair_count(&self) -> usize {
        self.pages.len() + self.rounds.len()
    }

    /// Screen for the pair page at `cursor`, or whatever follows the last one.
    fn enter(&mut self, session: &mut PreferenceSession) -> PreferenceScreen {
        let cursor = session.cursor;
        if cursor < self.pages.len() {
            return self.pair(PairPage::Fixed(cursor));
        }
        if cursor < self.pair_count() {
            let round = cursor - self.pages.len();
            if session.passages(round).is_some() {
                return self.pair(PairPage::Round(round));
            }
            if session.awaiting.is_some() {
                return PreferenceScreen::Generating { round };
            }
            return self.request(session, round);
        }
        if session.profiles.is_some() {
            PreferenceScreen::Break
        } else {
            PreferenceScreen::End
        }
    }

    fn pair(&self, page: PairPage) -> PreferenceScreen {
        PreferenceScreen::Pair {
            page,
            entered_at: self.clock.now(),
            selection: None,
            confirming_refresh: false,
        }
    }

    /// Asks for `round` and every later round still missing.
    fn request(&mut self, session: &mut PreferenceSession, round: usize) -> PreferenceScreen {
        let Some(participant) = &session.participant else {
            return PreferenceScreen::GenerationFailed {
                round,
                message: "no participant confirmed".into(),
            };
        };
        let rounds: Vec<usize> = (round..self.rounds.len())
            .filter(|r| session.passages(*r).is_none())
            .collect();
        let profile = match &session.profiles {
            Some(p) => ProfileSource::Existing(p.clone()),
            None => ProfileSource::Derive(session.selections.clone()),
        };
        let request = GenerationRequest {
            profile,
            group: participant.group,
            rounds,
        };
        match self.dispatcher.dispatch(request) {
            Ok(id) => {
                if let Some(old) = session.awaiting.replace(id) {
                    info!(superseded = old.0, job = id.0, "generation superseded");
                }
                PreferenceScreen::Generating { round }
            }
            Err(e) => {
                error!(round, error = %e, "generation could not be queued");
                PreferenceScreen::GenerationFailed {
                    round,
                    message: e.to_string(),
                }
            }
        }
    }

    fn texts(&self, session: &PreferenceSession, page: PairPage) -> (String, [String; 2]) {
        match page {
            PairPage::Fixed(i) => match self.pages.get(i) {
                Some(p) => (p.title.clone(), [p.left.clone(), p.right.clone()]),
                None => (String::new(), Default::default()),
            },
            PairPage::Round(r) => (
                self.rounds.get(r).cloned().unwrap_or_default(),
                session.passages(r).cloned().unwrap_or_default(),
            ),
        }
    }

    fn profile_texts(session: &PreferenceSession, actual_side: Side) -> [String; 2] {
        match (&session.profiles, actual_side) {
            (Some(p), Side::Left) => [p.actual.clone(), p.opposite.clone()],
            (Some(p), Side::Right) => [p.opposite.clone(), p.actual.clone()],
            (None, _) => Default::default(),
        }
    }

    fn profile_choice(&mut self) -> PreferenceScreen {
        let actual_side = if self.rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        info!(actual_side = actual_side.number(), "profile panels placed");
        PreferenceScreen::ProfileChoice {
            entered_at: self.clock.now(),
            actual_side,
            selection: None,
            reasoning: String::new(),
        }
    }

    fn record(
        &self,
        session: &PreferenceSession,
        kind: PageKind,
        title: String,
        texts: &[String; 2],
        selected: Side,
        entered_at: f64,
        profile: Option<(Side, &str)>,
    ) -> Option<PageRecord> {
        let participant = session.participant.as_ref()?;
        let pick = |side: Side| match side {
            Side::Left => texts[0].clone(),
            Side::Right => texts[1].clone(),
        };
        Some(PageRecord {
            participant_id: participant.id.clone(),
            group: participant.group,
            page_index: session.log.len(),
            kind,
            title,
            selected,
            selected_text: pick(selected),
            unselected_text: pick(selected.other()),
            interval: Interval::new(Some(entered_at), self.clock.now()),
            refreshes: match kind {
                PageKind::Generated { round } => session.refreshes(round),
                _ => 0,
            },
            chose_actual_profile: profile.map(|(actual, _)| selected == actual),
            reasoning: profile.map(|(_, text)| match text.trim() {
                "" => VERBAL_RESPONSE.to_string(),
                typed => typed.to_string(),
            }),
        })
    }

    fn save(&mut self, session: &PreferenceSession) -> Effect {
        let Some(participant) = &session.participant else {
            return Effect::None;
        };
        match self.writer.save(&participant.id, session.log.rows()) {
            Ok(()) => Effect::Saved {
                rows: session.log.len(),
            },
            Err(e) => {
                warn!(error = %e, rows = session.log.len(), "preference log not saved");
                Effect::SaveFailed(e.to_string())
            }
        }
    }

    fn complete_pair(
        &mut self,
        session: &mut PreferenceSession,
        page: PairPage,
        selected: Side,
        entered_at: f64,
    ) -> (PreferenceScreen, Effect) {
        let (title, texts) = self.texts(session, page);
        let kind = match page {
            PairPage::Fixed(_) => PageKind::Fixed,
            PairPage::Round(round) => PageKind::Generated { round },
        };
        if let PairPage::Fixed(_) = page {
            let (chosen, rejected) = match selected {
                Side::Left => (texts[0].clone(), texts[1].clone()),
                Side::Right => (texts[1].clone(), texts[0].clone()),
            };
            session.selections.push(SelectionContext {
                title: title.clone(),
                chosen,
                rejected,
            });
        }
        let effect = match self.record(session, kind, title, &texts, selected, entered_at, None) {
            Some(record) => {
                info!(page = record.page_index, kind = %kind.label(), side = selected.number(), "page complete");
                session.log.push(record);
                self.save(session)
            }
            None => Effect::None,
        };
        session.cursor += 1;
        (self.enter(session), effect)
    }

    fn footer(session: &PreferenceSession) -> Option<String> {
        session.participant.as_ref().map(|p| format!("ID: {}", p.id))
    }

    fn panels(texts: &[String; 2], selection: Option<Side>) -> (PanelView, PanelView) {
        let panel = |i: usize, side: Side| PanelView {
            text: texts[i].clone(),
            selected: selection == Some(side),
        };
        (panel(0, Side::Left), panel(1, Side::Right))
    }
}

impl<T: Timer, W: LogWriter, D: Dispatch> Sequencer for PreferenceSequencer<T, W, D> {
    type Phase = PreferencePhase;
    type Session = PreferenceSession;
    type Action = PreferenceAction;

    fn phase(&self, session: &PreferenceSession) -> PreferencePhase {
        session.screen.phase()
    }

    fn action_for(&self, session: &PreferenceSession, input: Input) -> Option<PreferenceAction> {
        use PreferenceAction as A;
        use PreferenceScreen as S;
        let yes = |input: Input| {
            matches!(
                input,
                Input::Char('y' | 'Y') | Input::Enter | Input::Click(Target::ModalYes)
            )
        };
        let no = |input: Input| {
            matches!(
                input,
                Input::Char('n' | 'N') | Input::Click(Target::ModalNo)
            )
        };
        let side = |input: Input| match input {
            Input::Char('1') | Input::Click(Target::Panel(Side::Left)) => Some(Side::Left),
            Input::Char('2') | Input::Click(Target::Panel(Side::Right)) => Some(Side::Right),
            _ => None,
        };
        let proceed = |input: Input| {
            matches!(
                input,
                Input::Enter | Input::Click(Target::Button(ButtonId::Continue))
            )
        };

        match &session.screen {
            S::ParticipantId {
                confirming: true, ..
            } => {
                if yes(input) {
                    Some(A::Confirm(true))
                } else if no(input) {
                    Some(A::Confirm(false))
                } else {
                    None
                }
            }
            S::ParticipantId { .. } => match input {
                Input::Char(c) if !c.is_control() => Some(A::Type(c)),
                Input::Space => Some(A::Type(' ')),
                Input::Backspace => Some(A::Erase),
                Input::Tab => Some(A::CycleGroup),
                Input::Click(Target::Option(i)) => Group::ALL.get(i).copied().map(A::SetGroup),
                Input::Enter | Input::Click(Target::Button(ButtonId::Start)) => Some(A::Submit),
                _ => None,
            },
            S::Instructions => matches!(
                input,
                Input::Enter | Input::Click(Target::Button(ButtonId::Begin))
            )
            .then_some(A::Begin),
            S::Pair {
                confirming_refresh: true,
                ..
            } => {
                if yes(input) {
                    Some(A::ConfirmRefresh(true))
                } else if no(input) {
                    Some(A::ConfirmRefresh(false))
                } else {
                    None
                }
            }
            S::Pair { page, .. } => {
                if let Some(side) = side(input) {
                    Some(A::Select(side))
                } else if proceed(input) {
                    Some(A::Continue)
                } else if matches!(page, PairPage::Round(_))
                    && input == Input::Click(Target::Button(ButtonId::Refresh))
                {
                    Some(A::Refresh)
                } else {
                    None
                }
            }
            S::Generating { .. } => None,
            S::GenerationFailed { .. } => matches!(
                input,
                Input::Enter | Input::Click(Target::Button(ButtonId::Retry))
            )
            .then_some(A::Retry),
            S::Break => proceed(input).then_some(A::Continue),
            // the keyboard belongs to the reasoning box here
            S::ProfileChoice { selection, .. } => match input {
                Input::Char(c) if !c.is_control() => Some(A::Type(c)),
                Input::Space => Some(A::Type(' ')),
                Input::Backspace => Some(A::Erase),
                Input::Tab => Some(A::Select(selection.map_or(Side::Left, |s| s.other()))),
                Input::Click(Target::Panel(side)) => Some(A::Select(side)),
                _ => proceed(input).then_some(A::Continue),
            },
            S::End => matches!(
                input,
                Input::Enter | Input::Click(Target::Button(ButtonId::SaveClose))
            )
            .then_some(A::Close),
        }
    }

    fn apply(
        &mut self,
        mut session: PreferenceSession,
        action: PreferenceAction,
    ) -> (PreferenceSession, Effect) {
        use PreferenceAction as A;
        use PreferenceScreen as S;
        let screen = std::mem::replace(&mut session.screen, S::End);
        let (screen, effect) = match (screen, action) {
            (
                S::ParticipantId {
                    mut draft,
                    group,
                    confirming: false,
                },
                action @ (A::Type(_) | A::Erase | A::CycleGroup | A::SetGroup(_)),
            ) => {
                let mut group = group;
                match action {
                    A::Type(c) => draft.push(c),
                    A::Erase => {
                        draft.pop();
                    }
                    A::CycleGroup => {
                        group = Some(match group {
                            Some(Group::Experimental) => Group::Control,
                            _ => Group::Experimental,
                        })
                    }
                    A::SetGroup(g) => group = Some(g),
                    _ => {}
                }
                (
                    S::ParticipantId {
                        draft,
                        group,
                        confirming: false,
                    },
                    Effect::None,
                )
            }
            (
                S::ParticipantId {
                    draft,
                    group,
                    confirming: false,
                },
                A::Submit,
            ) => {
                let ok = !draft.trim().is_empty() && group.is_some();
                (
                    S::ParticipantId {
                        draft,
                        group,
                        confirming: ok,
                    },
                    if ok {
                        Effect::None
                    } else {
                        Effect::Notice(Notice::MissingParticipantOrGroup)
                    },
                )
            }
            (
                S::ParticipantId {
                    group,
                    confirming: true,
                    ..
                },
                A::Confirm(false),
            ) => (
                S::ParticipantId {
                    draft: String::new(),
                    group,
                    confirming: false,
                },
                Effect::None,
            ),
            (
                S::ParticipantId {
                    draft,
                    group: Some(group),
                    confirming: true,
                },
                A::Confirm(true),
            ) => match self.writer.prepare() {
                Ok(()) => {
                    let id = draft.trim().to_string();
                    info!(participant = %id, %group, "participant confirmed");
                    session.participant = Some(Participant { id, group });
                    session.generated = vec![None; self.rounds.len()];
                    session.refreshes = vec![0; self.rounds.len()];
                    (S::Instructions, Effect::None)
                }
                Err(e) => (
                    S::ParticipantId {
                        draft,
                        group: Some(group),
                        confirming: false,
                    },
                    Effect::Notice(Notice::LogDirectory(e.to_string())),
                ),
            },
            (S::Instructions, A::Begin) => {
                session.cursor = 0;
                (self.enter(&mut session), Effect::None)
            }
            (
                S::Pair {
                    page,
                    entered_at,
                    confirming_refresh: false,
                    ..
                },
                A::Select(side),
            ) => (
                S::Pair {
                    page,
                    entered_at,
                    selection: Some(side),
                    confirming_refresh: false,
                },
                Effect::None,
            ),
            (
                S::Pair {
                    page,
                    entered_at,
                    selection: None,
                    confirming_refresh: false,
                },
                A::Continue,
            ) => (
                S::Pair {
                    page,
                    entered_at,
                    selection: None,
                    confirming_refresh: false,
                },
                Effect::Notice(Notice::ResponseRequired),
            ),
            (
                S::Pair {
                    page,
                    entered_at,
                    selection: Some(side),
                    confirming_refresh: false,
                },
                A::Continue,
            ) => self.complete_pair(&mut session, page, side, entered_at),
            (
                S::Pair {
                    page: page @ PairPage::Round(_),
                    entered_at,
                    selection,
                    confirming_refresh: false,
                },
                A::Refresh,
            ) => (
                S::Pair {
                    page,
                    entered_at,
                    selection,
                    confirming_refresh: true,
                },
                Effect::None,
            ),
            (
                S::Pair {
                    page,
                    entered_at,
                    selection,
                    confirming_refresh: true,
                },
                A::ConfirmRefresh(false),
            ) => (
                S::Pair {
                    page,
                    entered_at,
                    selection,
                    confirming_refresh: false,
                },
                Effect::None,
            ),
            (
                S::Pair {
                    page: PairPage::Round(round),
                    confirming_refresh: true,
                    ..
                },
                A::ConfirmRefresh(true),
            ) => {
                if let Some(count) = session.refreshes.get_mut(round) {
                    *count += 1;
                }
                if let Some(slot) = session.generated.get_mut(round) {
                    *slot = None;
                }
                info!(round, refreshes = session.refreshes(round), "round refreshed");
                (self.request(&mut session, round), Effect::None)
            }
            (S::GenerationFailed { round, .. }, A::Retry) => {
                (self.request(&mut session, round), Effect::None)
            }
            (S::Break, A::Continue) => (self.profile_choice(), Effect::None),
            (
                S::ProfileChoice {
                    entered_at,
                    actual_side,
                    mut reasoning,
                    selection,
                },
                action @ (A::Select(_) | A::Type(_) | A::Erase),
            ) => {
                let mut selection = selection;
                match action {
                    A::Select(side) => selection = Some(side),
                    A::Type(c) => reasoning.push(c),
                    A::Erase => {
                        reasoning.pop();
                    }
                    _ => {}
                }
                (
                    S::ProfileChoice {
                        entered_at,
                        actual_side,
                        selection,
                        reasoning,
                    },
                    Effect::None,
                )
            }
            (
                screen @ S::ProfileChoice {
                    selection: None, ..
                },
                A::Continue,
            ) => (screen, Effect::Notice(Notice::ResponseRequired)),
            (
                S::ProfileChoice {
                    entered_at,
                    actual_side,
                    selection: Some(side),
                    reasoning,
                },
                A::Continue,
            ) => {
                let texts = Self::profile_texts(&session, actual_side);
                let record = self.record(
                    &session,
                    PageKind::Profile,
                    PROFILE_TITLE.to_string(),
                    &texts,
                    side,
                    entered_at,
                    Some((actual_side, reasoning.as_str())),
                );
                let effect = match record {
                    Some(record) => {
                        info!(chose_actual = side == actual_side, "profile chosen");
                        session.log.push(record);
                        self.save(&session)
                    }
                    None => Effect::None,
                };
                (S::End, effect)
            }
            (S::End, A::Close) => {
                let effect = match self.save(&session) {
                    Effect::Saved { .. } | Effect::None => {
                        info!(rows = session.log.len(), "session closed");
                        Effect::Exit
                    }
                    other => other,
                };
                (S::End, effect)
            }
            (screen, _) => (screen, Effect::None),
        };
        session.screen = screen;
        (session, effect)
    }

    fn on_generated(
        &mut self,
        mut session: PreferenceSession,
        outcome: GenerationOutcome,
    ) -> (PreferenceSession, Effect) {
        if session.awaiting != Some(outcome.id) {
            warn!(job = outcome.id.0, awaiting = ?session.awaiting.map(|j| j.0), "stale generation result discarded");
            return (session, Effect::None);
        }
        session.awaiting = None;

        let waiting_on = match session.screen {
            PreferenceScreen::Generating { round } => Some(round),
            _ => None,
        };
        match outcome.result {
            Ok(generated) => {
                if session.profiles.is_none() {
                    info!("learner profile derived");
                    session.profiles = Some(generated.profiles);
                }
                for (round, passages) in generated.rounds {
                    if let Some(slot) = session.generated.get_mut(round) {
                        *slot = Some(passages);
                    }
                }
                if let Some(round) = waiting_on {
                    session.screen = if session.passages(round).is_some() {
                        self.pair(PairPage::Round(round))
                    } else {
                        PreferenceScreen::GenerationFailed {
                            round,
                            message: format!("No passages were returned for round {}.", round + 1),
                        }
                    };
                }
            }
            Err(e) => {
                error!(error = %e, "generation failed");
                if let Some(round) = waiting_on {
                    session.screen = PreferenceScreen::GenerationFailed {
                        round,
                        message: e.to_string(),
                    };
                }
            }
        }
        (session, Effect::None)
    }

    fn view(&self, session: &PreferenceSession) -> ScreenView {
        use PreferenceScreen as S;
        let footer = Self::footer(session);
        match &session.screen {
            S::ParticipantId {
                draft,
                group,
                confirming,
            } => {
                let options = Group::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, g)| OptionView {
                        key: (i + 1).to_string(),
                        text: g.to_string(),
                        selected: *group == Some(*g),
                        target: Target::Option(i),
                    })
                    .collect();
                let modal = match (confirming, group) {
                    (true, Some(g)) => Some(ModalView {
                        title: "Confirm Details".into(),
                        message: format!(
                            "Are the Participant ID '{}' and Group '{g}' correct?",
                            draft.trim()
                        ),
                        kind: ModalKind::Confirm,
                    }),
                    _ => None,
                };
                ScreenView::new(
                    "Welcome!",
                    Body::Entry {
                        label: "Enter Participant ID and select Group:".into(),
                        value: draft.clone(),
                        placeholder: "Enter Participant ID Here".into(),
                        options,
                    },
                )
                .with_subtitle("Press Tab to switch group.")
                .with_button(ButtonView::new("Submit", ButtonId::Start))
                .with_modal(modal)
            }
            S::Instructions => ScreenView::new("Directions", Body::Text(self.instructions.clone()))
                .with_button(ButtonView::new("Accept & Continue", ButtonId::Begin))
                .with_footer(footer),
            S::Pair {
                page,
                selection,
                confirming_refresh,
                ..
            } => {
                let (title, texts) = self.texts(session, *page);
                let (left, right) = Self::panels(&texts, *selection);
                let mut view = ScreenView::new(title, Body::Pair { left, right })
                    .with_subtitle("Click the paragraph you prefer, then press Continue.")
                    .with_button(ButtonView::new("Continue", ButtonId::Continue));
                if let PairPage::Round(_) = page {
                    view = view.with_button(ButtonView::new("Refresh", ButtonId::Refresh).subtle());
                }
                let modal = confirming_refresh.then(|| ModalView {
                    title: "Confirm Refresh".into(),
                    message: "Refreshing generated response. OK?".into(),
                    kind: ModalKind::Confirm,
                });
                view.with_modal(modal).with_footer(footer)
            }
            S::Generating { round } => {
                let remaining = self.rounds.len().saturating_sub(*round);
                ScreenView::new(
                    "",
                    Body::Loading {
                        headline: format!("Great job! Just {} more to go!", count_word(remaining)),
                        detail: "Please wait while we load the next page.".into(),
                    },
                )
                .with_footer(footer)
            }
            S::GenerationFailed { message, .. } => ScreenView::new(
                "Something went wrong",
                Body::Text(format!(
                    "The next page could not be prepared.\n\n{message}\n\n\
                     Please let the researcher know, then press 'Retry'."
                )),
            )
            .with_button(ButtonView::new("Retry", ButtonId::Retry))
            .with_footer(footer),
            S::Break => ScreenView::new(
                "Keep up the Great Work!",
                Body::Text(
                    "On the next page, you will see two brief descriptions of your learning \
                     preferences based on the choices you have made so far. You will be asked \
                     to select the paragraph which you identify with most."
                        .into(),
                ),
            )
            .with_button(ButtonView::new("Continue", ButtonId::Continue))
            .with_footer(footer),
            S::ProfileChoice {
                actual_side,
                selection,
                reasoning,
                ..
            } => {
                let texts = Self::profile_texts(session, *actual_side);
                let (left, right) = Self::panels(&texts, *selection);
                let body = Body::Reflection {
                    left,
                    right,
                    prompt: REASONING_PROMPT.into(),
                    value: reasoning.clone(),
                    placeholder: "Type your reasoning here".into(),
                };
                ScreenView::new(PROFILE_TITLE, body)
                    .with_subtitle(
                        "Click the paragraph that fits you best, then briefly explain your choice.",
                    )
                    .with_button(ButtonView::new("Submit", ButtonId::Continue))
                    .with_footer(footer)
            }
            S::End => ScreenView::new(
                "Nice Job!",
                Body::Text("You have finished this portion of the activity.".into()),
            )
            .with_button(ButtonView::new("Save & Exit", ButtonId::SaveClose))
            .with_footer(footer),
        }
    }

    fn recorded(&self, session: &PreferenceSession) -> usize {
        session.log.len()
    }

    fn flush(&mut self, session: &PreferenceSession) -> Result<(), LogError> {
        match &session.participant {
            Some(p) => self.writer.save(&p.id, session.log.rows()),
            None => Ok(()),
        }
    }
}

fn count_word(n: usize) -> String {
    const WORDS: [&str; 6] = ["zero", "one", "two", "three", "four", "five"];
    WORDS
        .get(n)
        .map(|w| w.to_string())
        .unwrap_or_else(|| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_words() {
        assert_eq!(count_word(2), "two");
        assert_eq!(count_word(12), "12");
    }

    #[test]
    fn fresh_session_starts_on_participant_screen() {
        let session = PreferenceSession::default();
        assert_eq!(session.screen.phase(), PreferencePhase::ParticipantId);
        assert_eq!(session.passages(0), None);
        assert_eq!(session.refreshes(3), 0);
    }
}

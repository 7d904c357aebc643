use rand::SeedableRng;
use rand::rngs::StdRng;
use readex_core::{Body, ButtonId, Input, LogRow, PreferencePhase, Side, Target};
use readex_experiment::{
    CsvLogWriter, Driver, FixedPage, LogError, LogWriter, Notice, PreferenceSequencer, Status,
    VERBAL_RESPONSE,
};
use readex_provider::{
    Dispatch, GenerationOutcome, GenerationRequest, JobId, ProfileSource, ProviderError,
    StaticProvider, run_request,
};
use readex_timing::ManualClock;
use std::path::{Path, PathBuf};

/// Records requests instead of running them; tests deliver outcomes by hand.
#[derive(Default)]
struct Recorder {
    requests: Vec<(JobId, GenerationRequest)>,
}

impl Dispatch for Recorder {
    fn dispatch(&mut self, request: GenerationRequest) -> Result<JobId, ProviderError> {
        let id = JobId(self.requests.len() as u64 + 1);
        self.requests.push((id, request));
        Ok(id)
    }
}

/// Accepts the participant but refuses every write.
struct ReadOnlyVolume;

impl LogWriter for ReadOnlyVolume {
    fn prepare(&mut self) -> Result<(), LogError> {
        Ok(())
    }

    fn save<R: LogRow>(&mut self, participant: &str, _rows: &[R]) -> Result<(), LogError> {
        Err(LogError::Replace {
            path: PathBuf::from(format!("logs/preference_log_{participant}.csv")),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

type Preference<W = CsvLogWriter> = PreferenceSequencer<ManualClock, W, Recorder>;

struct Rig {
    driver: Driver<Preference>,
    log_path: PathBuf,
    _dir: tempfile::TempDir,
}

fn rig() -> Rig {
    rig_seeded(7)
}

fn rig_seeded(seed: u64) -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let writer = CsvLogWriter::new(dir.path().join("logs"), "preference_log");
    let log_path = writer.path_for("S01");
    Rig {
        driver: Driver::new(sequencer(writer, seed)),
        log_path,
        _dir: dir,
    }
}

fn sequencer<W: LogWriter>(writer: W, seed: u64) -> Preference<W> {
    let pages = vec![
        FixedPage {
            title: "Water Cycle".into(),
            left: "A story about a raindrop.".into(),
            right: "Evaporation, condensation, precipitation.".into(),
        },
        FixedPage {
            title: "Climate".into(),
            left: "A chart of temperatures.".into(),
            right: "A poem about seasons.".into(),
        },
    ];
    PreferenceSequencer::new(
        pages,
        vec!["Plate Tectonics".into(), "Electricity".into()],
        "Pick the paragraph you like.",
        ManualClock::starting_at(1_000.0),
        writer,
        Recorder::default(),
    )
    .with_rng(StdRng::seed_from_u64(seed))
}

fn confirm<W: LogWriter>(driver: &mut Driver<Preference<W>>, group_tabs: usize) {
    for c in "S01".chars() {
        driver.input(Input::Char(c));
    }
    for _ in 0..group_tabs {
        driver.input(Input::Tab);
    }
    driver.input(Input::Enter);
    driver.input(Input::Char('y'));
}

fn choose<W: LogWriter>(driver: &mut Driver<Preference<W>>, key: char) {
    driver.input(Input::Char(key));
    driver.input(Input::Enter);
}

fn last_request<W: LogWriter>(driver: &Driver<Preference<W>>) -> (JobId, GenerationRequest) {
    driver
        .sequencer()
        .dispatcher()
        .requests
        .last()
        .cloned()
        .unwrap()
}

fn deliver<W: LogWriter>(
    driver: &mut Driver<Preference<W>>,
    id: JobId,
    request: &GenerationRequest,
) {
    let result = run_request(&StaticProvider::default(), request);
    driver.generated(GenerationOutcome { id, result });
}

fn left_text(driver: &Driver<Preference>) -> String {
    match driver.view().body {
        Body::Pair { left, .. } => left.text,
        other => panic!("not a pair page: {other:?}"),
    }
}

/// Experimental participant through every pair page up to the profile choice.
fn reach_profile<W: LogWriter>(driver: &mut Driver<Preference<W>>) {
    confirm(driver, 1);
    driver.input(Input::Enter);
    choose(driver, '1');
    choose(driver, '2');
    let (id, request) = last_request(driver);
    deliver(driver, id, &request);
    choose(driver, '1');
    choose(driver, '2');
    driver.input(Input::Enter);
    assert_eq!(driver.phase(), PreferencePhase::ProfileChoice);
}

/// Panel currently showing the derived profile
fn actual_side(driver: &Driver<Preference>) -> Side {
    let actual = driver.session().profiles.clone().unwrap().actual;
    match driver.view().body {
        Body::Reflection { left, .. } if left.text == actual => Side::Left,
        Body::Reflection { right, .. } if right.text == actual => Side::Right,
        other => panic!("actual profile not shown: {other:?}"),
    }
}

fn reasoning_box(driver: &Driver<Preference>) -> (String, Option<Side>) {
    match driver.view().body {
        Body::Reflection {
            left, right, value, ..
        } => {
            let selected = if left.selected {
                Some(Side::Left)
            } else if right.selected {
                Some(Side::Right)
            } else {
                None
            };
            (value, selected)
        }
        other => panic!("not the profile page: {other:?}"),
    }
}

fn column(path: &Path, name: &str) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let idx = rdr.headers().unwrap().iter().position(|h| h == name).unwrap();
    rdr.records()
        .map(|r| r.unwrap().get(idx).unwrap().to_string())
        .collect()
}

#[test]
fn experimental_session_end_to_end() {
    let mut rig = rig();
    confirm(&mut rig.driver, 1);
    assert_eq!(rig.driver.phase(), PreferencePhase::Instructions);
    rig.driver.input(Input::Enter);

    choose(&mut rig.driver, '1');
    choose(&mut rig.driver, '2');
    assert_eq!(rig.driver.phase(), PreferencePhase::Generating);

    let (id, request) = last_request(&rig.driver);
    assert_eq!(request.rounds, vec![0, 1]);
    match &request.profile {
        ProfileSource::Derive(selections) => {
            assert_eq!(selections.len(), 2);
            assert_eq!(selections[0].chosen, "A story about a raindrop.");
            assert_eq!(selections[1].chosen, "A poem about seasons.");
        }
        other => panic!("profile should be derived, got {other:?}"),
    }
    deliver(&mut rig.driver, id, &request);
    assert_eq!(rig.driver.phase(), PreferencePhase::Pair);
    assert!(left_text(&rig.driver).contains("chosen on: Water Cycle, Climate"));

    // second round was prefetched
    choose(&mut rig.driver, '1');
    assert_eq!(rig.driver.phase(), PreferencePhase::Pair);
    assert_eq!(rig.driver.sequencer().dispatcher().requests.len(), 1);
    choose(&mut rig.driver, '2');
    assert_eq!(rig.driver.phase(), PreferencePhase::Break);

    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.phase(), PreferencePhase::ProfileChoice);
    let actual = actual_side(&rig.driver);
    rig.driver.input(Input::Click(Target::Panel(Side::Left)));
    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.phase(), PreferencePhase::End);

    assert_eq!(
        column(&rig.log_path, "page_kind"),
        vec!["fixed", "fixed", "generated_0", "generated_1", "profile"]
    );
    assert_eq!(
        column(&rig.log_path, "selected_option"),
        vec!["1", "2", "1", "2", "1"]
    );
    let credited = (actual == Side::Left).to_string();
    assert_eq!(
        column(&rig.log_path, "chose_actual_profile"),
        vec!["", "", "", "", credited.as_str()]
    );
    assert_eq!(
        column(&rig.log_path, "reasoning"),
        vec!["", "", "", "", VERBAL_RESPONSE]
    );
    assert_eq!(column(&rig.log_path, "group")[0], "Experimental");
    assert_eq!(rig.driver.input(Input::Enter), Status::Exit);
}

#[test]
fn control_group_reads_opposite_profile() {
    let mut rig = rig();
    confirm(&mut rig.driver, 2);
    rig.driver.input(Input::Enter);
    choose(&mut rig.driver, '1');
    choose(&mut rig.driver, '1');
    let (id, request) = last_request(&rig.driver);
    deliver(&mut rig.driver, id, &request);
    assert!(left_text(&rig.driver).contains("passed over"));
}

#[test]
fn stale_outcomes_are_discarded() {
    let mut rig = rig();
    confirm(&mut rig.driver, 1);
    rig.driver.input(Input::Enter);
    choose(&mut rig.driver, '1');
    choose(&mut rig.driver, '1');
    let (first, request) = last_request(&rig.driver);

    deliver(&mut rig.driver, JobId(99), &request);
    assert_eq!(rig.driver.phase(), PreferencePhase::Generating);
    deliver(&mut rig.driver, first, &request);
    assert_eq!(rig.driver.phase(), PreferencePhase::Pair);

    // refresh round one, then let the superseded job report again
    rig.driver
        .input(Input::Click(Target::Button(ButtonId::Refresh)));
    assert!(rig.driver.view().modal.is_some());
    rig.driver.input(Input::Char('y'));
    assert_eq!(rig.driver.phase(), PreferencePhase::Generating);
    let (second, refresh) = last_request(&rig.driver);
    assert_eq!(refresh.rounds, vec![0]);
    assert!(matches!(refresh.profile, ProfileSource::Existing(_)));

    deliver(&mut rig.driver, first, &request);
    assert_eq!(rig.driver.phase(), PreferencePhase::Generating);
    deliver(&mut rig.driver, second, &refresh);
    assert_eq!(rig.driver.phase(), PreferencePhase::Pair);

    choose(&mut rig.driver, '2');
    assert_eq!(column(&rig.log_path, "refresh_count")[2], "1");
}

#[test]
fn declined_refresh_keeps_content() {
    let mut rig = rig();
    confirm(&mut rig.driver, 1);
    rig.driver.input(Input::Enter);
    choose(&mut rig.driver, '1');
    choose(&mut rig.driver, '1');
    let (id, request) = last_request(&rig.driver);
    deliver(&mut rig.driver, id, &request);
    let before = left_text(&rig.driver);

    rig.driver
        .input(Input::Click(Target::Button(ButtonId::Refresh)));
    rig.driver.input(Input::Char('n'));
    assert_eq!(rig.driver.phase(), PreferencePhase::Pair);
    assert_eq!(left_text(&rig.driver), before);
    assert_eq!(rig.driver.sequencer().dispatcher().requests.len(), 1);
}

#[test]
fn failure_shows_error_and_retries() {
    let mut rig = rig();
    confirm(&mut rig.driver, 1);
    rig.driver.input(Input::Enter);
    choose(&mut rig.driver, '1');
    choose(&mut rig.driver, '1');
    let (id, request) = last_request(&rig.driver);

    rig.driver.generated(GenerationOutcome {
        id,
        result: Err(ProviderError::Other("rate limited".into())),
    });
    assert_eq!(rig.driver.phase(), PreferencePhase::GenerationFailed);
    match rig.driver.view().body {
        Body::Text(text) => assert!(text.contains("rate limited")),
        other => panic!("unexpected body {other:?}"),
    }

    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.phase(), PreferencePhase::Generating);
    let (retry, again) = last_request(&rig.driver);
    assert_ne!(retry, id);
    assert_eq!(again.rounds, request.rounds);
    deliver(&mut rig.driver, retry, &again);
    assert_eq!(rig.driver.phase(), PreferencePhase::Pair);
}

#[test]
fn group_is_required() {
    let mut rig = rig();
    for c in "S01".chars() {
        rig.driver.input(Input::Char(c));
    }
    rig.driver.input(Input::Enter);
    assert_eq!(
        rig.driver.notice(),
        Some(&Notice::MissingParticipantOrGroup)
    );
    assert_eq!(rig.driver.phase(), PreferencePhase::ParticipantId);
}

#[test]
fn pair_page_needs_a_selection() {
    let mut rig = rig();
    confirm(&mut rig.driver, 1);
    rig.driver.input(Input::Enter);
    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.notice(), Some(&Notice::ResponseRequired));
    assert!(!rig.log_path.exists());
}

#[test]
fn profile_side_varies_and_choice_is_scored_by_side() {
    let mut sides = Vec::new();
    let mut right = None;
    for seed in 0..32 {
        let mut rig = rig_seeded(seed);
        reach_profile(&mut rig.driver);
        let side = actual_side(&rig.driver);
        sides.push(side);
        if side == Side::Right && right.is_none() {
            right = Some(rig);
        }
    }
    assert!(sides.contains(&Side::Left));
    assert!(sides.contains(&Side::Right));

    let mut rig = right.unwrap();
    let actual = rig.driver.session().profiles.clone().unwrap();
    rig.driver.input(Input::Click(Target::Panel(Side::Right)));
    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.phase(), PreferencePhase::End);

    assert_eq!(column(&rig.log_path, "selected_option")[4], "2");
    assert_eq!(column(&rig.log_path, "chose_actual_profile")[4], "true");
    assert_eq!(column(&rig.log_path, "selected_text")[4], actual.actual);
    assert_eq!(column(&rig.log_path, "unselected_text")[4], actual.opposite);
}

#[test]
fn same_seed_places_profile_on_same_side() {
    let mut a = rig_seeded(11);
    let mut b = rig_seeded(11);
    reach_profile(&mut a.driver);
    reach_profile(&mut b.driver);
    assert_eq!(actual_side(&a.driver), actual_side(&b.driver));
}

#[test]
fn profile_page_takes_typed_reasoning() {
    let mut rig = rig();
    reach_profile(&mut rig.driver);

    // digits are text here, not a panel choice
    for c in "1 sto".chars() {
        let input = if c == ' ' { Input::Space } else { Input::Char(c) };
        rig.driver.input(input);
    }
    rig.driver.input(Input::Backspace);
    assert_eq!(reasoning_box(&rig.driver), ("1 st".to_string(), None));

    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.notice(), Some(&Notice::ResponseRequired));
    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.phase(), PreferencePhase::ProfileChoice);

    rig.driver.input(Input::Tab);
    assert_eq!(reasoning_box(&rig.driver).1, Some(Side::Left));
    rig.driver.input(Input::Tab);
    assert_eq!(reasoning_box(&rig.driver).1, Some(Side::Right));
    for c in "ories help ".chars() {
        let input = if c == ' ' { Input::Space } else { Input::Char(c) };
        rig.driver.input(input);
    }
    rig.driver.input(Input::Enter);
    assert_eq!(rig.driver.phase(), PreferencePhase::End);

    assert_eq!(column(&rig.log_path, "selected_option")[4], "2");
    assert_eq!(column(&rig.log_path, "reasoning")[4], "1 stories help");
}

#[test]
fn failed_saves_warn_and_keep_rows() {
    let mut driver = Driver::new(sequencer(ReadOnlyVolume, 7));
    confirm(&mut driver, 1);
    assert_eq!(driver.phase(), PreferencePhase::Instructions);
    driver.input(Input::Enter);

    choose(&mut driver, '1');
    let banner = driver.view().banner.unwrap();
    assert!(banner.starts_with("Log could not be saved"));
    assert!(banner.contains("read-only volume"));
    assert_eq!(driver.session().log.len(), 1);

    choose(&mut driver, '2');
    assert_eq!(driver.phase(), PreferencePhase::Generating);
    assert_eq!(driver.session().log.len(), 2);
    assert!(driver.warning().is_some());
    assert!(driver.flush().is_err());
}

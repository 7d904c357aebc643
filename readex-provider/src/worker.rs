//! Background generation.
//!
//! A single worker thread receives [`GenerationJob`]s over a channel and runs
//! them one at a time against a [`ContentProvider`]. Each finished job is
//! handed back through a [`Deliver`] sink as one [`GenerationOutcome`]; the
//! worker never touches session state.

use crate::error::ProviderError;
use crate::provider::{ContentProvider, Passages, Profiles, SelectionContext};
use readex_core::Group;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Existing(Profiles),
    Derive(Vec<SelectionContext>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub profile: ProfileSource,
    pub group: Group,
    /// Zero-based rounds to generate, in order
    pub rounds: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub id: JobId,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub profiles: Profiles,
    pub rounds: Vec<(usize, Passages)>,
}

#[derive(Debug)]
pub struct GenerationOutcome {
    pub id: JobId,
    pub result: Result<Generated, ProviderError>,
}

/// Receives finished jobs on the worker thread
pub trait Deliver: Send + 'static {
    /// Returns false when nobody is listening anymore.
    fn deliver(&self, outcome: GenerationOutcome) -> bool;
}

impl Deliver for Sender<GenerationOutcome> {
    fn deliver(&self, outcome: GenerationOutcome) -> bool {
        self.send(outcome).is_ok()
    }
}

/// Where sequencers submit generation work
pub trait Dispatch {
    fn dispatch(&mut self, request: GenerationRequest) -> Result<JobId, ProviderError>;
}

/// Runs one request to completion on the calling thread.
///
/// Experimental participants get passages written for their own profile,
/// Control participants for the opposite one.
pub fn run_request(
    provider: &dyn ContentProvider,
    request: &GenerationRequest,
) -> Result<Generated, ProviderError> {
    let profiles = match &request.profile {
        ProfileSource::Existing(p) => p.clone(),
        ProfileSource::Derive(selections) => provider.profiles(selections)?,
    };
    let target = match request.group {
        Group::Experimental => &profiles.actual,
        Group::Control => &profiles.opposite,
    };
    let mut rounds = Vec::with_capacity(request.rounds.len());
    for &round in &request.rounds {
        rounds.push((round, provider.passages(target, round)?));
    }
    Ok(Generated { profiles, rounds })
}

pub struct GenerationWorker {
    jobs: Option<Sender<GenerationJob>>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
}

impl GenerationWorker {
    pub fn spawn<D: Deliver>(
        provider: Arc<dyn ContentProvider>,
        sink: D,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<GenerationJob>();
        let handle = thread::Builder::new()
            .name("readex-generation".into())
            .spawn(move || worker_loop(provider, rx, sink))?;
        Ok(Self {
            jobs: Some(tx),
            handle: Some(handle),
            next_id: 0,
        })
    }

    /// Closes the job channel and waits for the job in flight, if any.
    pub fn shutdown(mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("generation worker panicked");
            }
        }
    }
}

impl Dispatch for GenerationWorker {
    fn dispatch(&mut self, request: GenerationRequest) -> Result<JobId, ProviderError> {
        self.next_id += 1;
        let id = JobId(self.next_id);
        let jobs = self.jobs.as_ref().ok_or(ProviderError::WorkerGone)?;
        jobs.send(GenerationJob { id, request })
            .map_err(|_| ProviderError::WorkerGone)?;
        debug!(job = id.0, "generation job queued");
        Ok(id)
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        // Closing the channel lets the thread exit after its current job.
        // The job may be blocked on the network, so the thread is detached
        // rather than joined here.
        self.jobs.take();
    }
}

fn worker_loop<D: Deliver>(
    provider: Arc<dyn ContentProvider>,
    jobs: Receiver<GenerationJob>,
    sink: D,
) {
    for job in jobs {
        info!(job = job.id.0, rounds = ?job.request.rounds, "generation started");
        let result = run_request(provider.as_ref(), &job.request);
        match &result {
            Ok(g) => info!(job = job.id.0, rounds = g.rounds.len(), "generation finished"),
            Err(e) => error!(job = job.id.0, error = %e, "generation failed"),
        }
        if !sink.deliver(GenerationOutcome { id: job.id, result }) {
            warn!(job = job.id.0, "generation result dropped: receiver closed");
            break;
        }
    }
    debug!("generation worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::StaticProvider;
    use std::time::Duration;

    fn request(group: Group, rounds: Vec<usize>) -> GenerationRequest {
        GenerationRequest {
            profile: ProfileSource::Existing(Profiles {
                actual: "actual".into(),
                opposite: "opposite".into(),
            }),
            group,
            rounds,
        }
    }

    #[test]
    fn control_group_writes_for_opposite_profile() {
        let provider = StaticProvider::default();
        let got = run_request(&provider, &request(Group::Control, vec![0])).unwrap();
        assert!(got.rounds[0].1[0].contains("opposite"));
        let got = run_request(&provider, &request(Group::Experimental, vec![0])).unwrap();
        assert!(got.rounds[0].1[0].ends_with("actual"));
    }

    #[test]
    fn derive_calls_provider_for_profile_first() {
        let provider = StaticProvider::default();
        let req = GenerationRequest {
            profile: ProfileSource::Derive(vec![SelectionContext {
                title: "Water Cycle".into(),
                chosen: "a".into(),
                rejected: "b".into(),
            }]),
            group: Group::Experimental,
            rounds: vec![0, 1],
        };
        let got = run_request(&provider, &req).unwrap();
        assert!(got.profiles.actual.contains("Water Cycle"));
        assert_eq!(got.rounds.len(), 2);
        assert_eq!(provider.calls(), 3);
    }

    #[test]
    fn worker_hands_back_outcomes_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut worker =
            GenerationWorker::spawn(Arc::new(StaticProvider::default()), tx).unwrap();
        let first = worker.dispatch(request(Group::Experimental, vec![0])).unwrap();
        let second = worker.dispatch(request(Group::Experimental, vec![1])).unwrap();
        assert!(second > first);

        let a = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let b = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(a.id, first);
        assert_eq!(b.id, second);
        assert_eq!(b.result.unwrap().rounds[0].0, 1);
        worker.shutdown();
    }

    #[test]
    fn failure_is_delivered_not_swallowed() {
        let (tx, rx) = mpsc::channel();
        let mut worker =
            GenerationWorker::spawn(Arc::new(StaticProvider::failing("offline")), tx).unwrap();
        let id = worker.dispatch(request(Group::Control, vec![0])).unwrap();
        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.id, id);
        assert!(outcome.result.is_err());
        worker.shutdown();
    }
}

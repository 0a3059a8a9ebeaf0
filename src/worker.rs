// Runs team builds off the calling thread. A newer request cancels the one in flight; results of
// cancelled or superseded builds are discarded on arrival.

use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::lobby::BuildRequest;
use crate::partition::Partition;
use crate::search::{BuildError, CancelFlag};


#[derive(Debug)]
struct BuildOutcome {
    generation: u64,
    result: Result<Partition, BuildError>,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    cancel: CancelFlag,
}

#[derive(Debug)]
pub struct BuildWorker {
    generation: u64,
    in_flight: Option<InFlight>,
    outcome_tx: mpsc::Sender<BuildOutcome>,
    outcome_rx: mpsc::Receiver<BuildOutcome>,
}

impl BuildWorker {
    pub fn new() -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        BuildWorker {
            generation: 0,
            in_flight: None,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn is_busy(&self) -> bool { self.in_flight.is_some() }

    // Starts a build and returns its generation. The worker thread gets its own RNG seeded from
    // `rng`, so a seeded caller gets reproducible builds.
    pub fn request(&mut self, request: BuildRequest, rng: &mut impl Rng) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelFlag::new();
        self.in_flight = Some(InFlight { generation, cancel: cancel.clone() });
        let mut thread_rng = StdRng::from_rng(rng);
        let outcome_tx = self.outcome_tx.clone();
        debug!("Starting build #{} for {} players", generation, request.players.len());
        thread::spawn(move || {
            let result = request.run(&mut thread_rng, &cancel);
            // The worker may be gone by now, in which case nobody needs the result.
            let _ = outcome_tx.send(BuildOutcome { generation, result });
        });
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("Cancelling build #{}", in_flight.generation);
            in_flight.cancel.cancel();
        }
    }

    // Returns the result of the current build if it has finished.
    pub fn poll(&mut self) -> Option<Result<Partition, BuildError>> {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(result) = self.accept(outcome) {
                return Some(result);
            }
        }
        None
    }

    // Blocks until the current build finishes. Returns `None` if nothing is in flight.
    pub fn wait(&mut self) -> Option<Result<Partition, BuildError>> {
        while self.in_flight.is_some() {
            // Cannot disconnect: `self` holds a sender.
            let outcome = self.outcome_rx.recv().ok()?;
            if let Some(result) = self.accept(outcome) {
                return Some(result);
            }
        }
        None
    }

    fn accept(&mut self, outcome: BuildOutcome) -> Option<Result<Partition, BuildError>> {
        match &self.in_flight {
            Some(in_flight) if in_flight.generation == outcome.generation => {
                self.in_flight = None;
                Some(outcome.result)
            }
            _ => {
                warn!("Discarding stale result of build #{}", outcome.generation);
                None
            }
        }
    }
}

impl Default for BuildWorker {
    fn default() -> Self { Self::new() }
}

impl Drop for BuildWorker {
    fn drop(&mut self) { self.cancel(); }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryTracker;
    use crate::rules::BalanceConfig;
    use crate::test_util::{deterministic_rng, sample_roster};

    fn request() -> BuildRequest {
        BuildRequest {
            players: sample_roster(),
            config: BalanceConfig::default(),
            history: HistoryTracker::new(),
        }
    }

    #[test]
    fn idle_worker_has_nothing() {
        let mut worker = BuildWorker::new();
        assert!(!worker.is_busy());
        assert!(worker.poll().is_none());
        assert!(worker.wait().is_none());
    }

    #[test]
    fn newer_request_supersedes_older() {
        let mut rng = deterministic_rng();
        let mut worker = BuildWorker::new();
        let first = worker.request(request(), &mut rng);
        let second = worker.request(request(), &mut rng);
        assert!(second > first);
        let partition = worker.wait().unwrap().unwrap();
        assert_eq!(partition.num_players(), 10);
        assert!(!worker.is_busy());
        // Whatever the first build produced is never delivered.
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(worker.poll().is_none());
    }
}

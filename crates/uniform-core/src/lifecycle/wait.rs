// ── Polling wait primitive ──
//
// Polls a refresh function until the observed state reaches a target,
// classifying each answer as pending, terminal, tolerated, or fatal.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::directory::DirectoryError;

/// One answer from a refresh function: the record and its state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation<T> {
    pub record: T,
    pub state: String,
}

/// What to wait for and how patiently.
#[derive(Debug, Clone)]
pub struct WaitSpec {
    /// Name used in logs and errors (`adopt`, `apply`, `forget`).
    pub operation: &'static str,
    /// States that mean "keep polling". `unknown` and the empty state are
    /// always treated as pending, listed or not.
    pub pending: Vec<String>,
    pub target: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Consecutive not-found answers tolerated before giving up.
    pub not_found_tolerance: u32,
}

impl WaitSpec {
    fn is_pending(&self, state: &str) -> bool {
        state.is_empty() || state == "unknown" || self.pending.iter().any(|p| p == state)
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("{operation}: timed out after {elapsed:?} waiting for '{target}'")]
    Timeout {
        operation: &'static str,
        target: String,
        last_state: Option<String>,
        elapsed: Duration,
    },

    #[error("{operation}: unexpected state '{state}' while waiting for '{target}'")]
    UnexpectedState {
        operation: &'static str,
        state: String,
        target: String,
    },

    #[error("{operation}: object not found after {checks} consecutive checks")]
    NotFound { operation: &'static str, checks: u32 },

    #[error("{operation}: cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation}: {source}")]
    Directory {
        operation: &'static str,
        #[source]
        source: DirectoryError,
    },
}

/// Poll `refresh` until it reports `spec.target`.
///
/// The first poll happens immediately. Afterwards the primitive sleeps for
/// `poll_interval` (clamped to the remaining time) between polls and returns
/// no later than `timeout + poll_interval` after the call.
pub async fn wait_for_state<T, F, Fut>(
    spec: &WaitSpec,
    cancel: &CancellationToken,
    mut refresh: F,
) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<T>, DirectoryError>>,
{
    let operation = spec.operation;
    let started = Instant::now();
    let deadline = started + spec.timeout;
    let tolerance = spec.not_found_tolerance.max(1);

    let mut last_state: Option<String> = None;
    let mut not_found: u32 = 0;

    loop {
        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled { operation }),
            polled = tokio::time::timeout_at(deadline, refresh()) => polled,
        };

        match polled {
            Ok(Ok(observation)) => {
                not_found = 0;
                trace!(operation, state = %observation.state, "observed state");

                if observation.state == spec.target {
                    debug!(
                        operation,
                        target = %spec.target,
                        elapsed = ?started.elapsed(),
                        "reached target state"
                    );
                    return Ok(observation.record);
                }
                if !spec.is_pending(&observation.state) {
                    return Err(WaitError::UnexpectedState {
                        operation,
                        state: observation.state,
                        target: spec.target.clone(),
                    });
                }
                last_state = Some(observation.state);
            }
            Ok(Err(DirectoryError::UnknownDevice)) => {
                debug!(operation, "controller reported unknown device, still pending");
            }
            Ok(Err(DirectoryError::NotFound { subject })) => {
                not_found += 1;
                if not_found >= tolerance {
                    return Err(WaitError::NotFound {
                        operation,
                        checks: not_found,
                    });
                }
                warn!(
                    operation,
                    %subject,
                    checks = not_found,
                    tolerance,
                    "object not found, will retry"
                );
            }
            Ok(Err(source)) => return Err(WaitError::Directory { operation, source }),
            // refresh itself overran the deadline
            Err(_) => {
                return Err(WaitError::Timeout {
                    operation,
                    target: spec.target.clone(),
                    last_state,
                    elapsed: started.elapsed(),
                });
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::Timeout {
                operation,
                target: spec.target.clone(),
                last_state,
                elapsed: started.elapsed(),
            });
        }

        let nap = spec.poll_interval.min(deadline - now);
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled { operation }),
            () = tokio::time::sleep(nap) => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn spec(timeout: Duration, interval: Duration) -> WaitSpec {
        WaitSpec {
            operation: "adopt",
            pending: vec!["adopting".into(), "provisioning".into()],
            target: "connected".into(),
            timeout,
            poll_interval: interval,
            not_found_tolerance: 3,
        }
    }

    type Script = Arc<Mutex<VecDeque<Result<Observation<u32>, DirectoryError>>>>;

    /// Refresh function that replays a script, repeating the last answer
    /// once the script runs dry.
    fn scripted(
        answers: Vec<Result<Observation<u32>, DirectoryError>>,
    ) -> (
        Arc<Mutex<u32>>,
        impl FnMut() -> std::future::Ready<Result<Observation<u32>, DirectoryError>>,
    ) {
        let calls = Arc::new(Mutex::new(0));
        let script: Script = Arc::new(Mutex::new(answers.into()));
        let counter = Arc::clone(&calls);
        let refresh = move || {
            *counter.lock().unwrap() += 1;
            let mut script = script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                clone_answer(script.front().unwrap())
            };
            std::future::ready(next)
        };
        (calls, refresh)
    }

    fn clone_answer(
        answer: &Result<Observation<u32>, DirectoryError>,
    ) -> Result<Observation<u32>, DirectoryError> {
        match answer {
            Ok(obs) => Ok(obs.clone()),
            Err(DirectoryError::NotFound { subject }) => Err(DirectoryError::NotFound {
                subject: subject.clone(),
            }),
            Err(DirectoryError::UnknownDevice) => Err(DirectoryError::UnknownDevice),
            Err(DirectoryError::MacInUse { mac }) => {
                Err(DirectoryError::MacInUse { mac: mac.clone() })
            }
            Err(DirectoryError::Remote(_)) => Err(DirectoryError::Remote(
                uniform_api::Error::LegacyApi {
                    message: "api.err.Invalid".into(),
                },
            )),
        }
    }

    fn state(s: &str) -> Result<Observation<u32>, DirectoryError> {
        Ok(Observation {
            record: 7,
            state: s.into(),
        })
    }

    fn not_found() -> Result<Observation<u32>, DirectoryError> {
        Err(DirectoryError::NotFound {
            subject: "aa:bb:cc:dd:ee:ff".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_success_returns_without_sleeping() {
        let (calls, refresh) = scripted(vec![state("connected")]);
        let started = Instant::now();

        let record = wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap();

        assert_eq!(record, 7);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn reaches_target_after_pending_states() {
        let (calls, refresh) = scripted(vec![
            state("adopting"),
            state("unknown"),
            state(""),
            state("provisioning"),
            state("connected"),
        ]);

        wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_bounded_by_timeout_plus_interval() {
        let (_, refresh) = scripted(vec![state("adopting")]);
        let timeout = Duration::from_secs(10);
        let interval = Duration::from_secs(3);
        let started = Instant::now();

        let err = wait_for_state(&spec(timeout, interval), &CancellationToken::new(), refresh)
            .await
            .unwrap_err();

        assert!(started.elapsed() <= timeout + interval);
        match err {
            WaitError::Timeout { last_state, .. } => {
                assert_eq!(last_state.as_deref(), Some("adopting"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_state_fails_fast() {
        let (calls, refresh) = scripted(vec![state("adopting"), state("adopt_failed")]);

        let err = wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, WaitError::UnexpectedState { ref state, .. } if state == "adopt_failed")
        );
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_tolerated_then_fatal() {
        let (calls, refresh) = scripted(vec![not_found()]);

        let err = wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::NotFound { checks: 3, .. }));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_counter_resets_on_observation() {
        let (_, refresh) = scripted(vec![
            not_found(),
            not_found(),
            state("adopting"),
            not_found(),
            not_found(),
            state("connected"),
        ]);

        let record = wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap();
        assert_eq!(record, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_device_answers_stay_pending() {
        let (calls, refresh) = scripted(vec![
            Err(DirectoryError::UnknownDevice),
            Err(DirectoryError::UnknownDevice),
            Err(DirectoryError::UnknownDevice),
            Err(DirectoryError::UnknownDevice),
            state("connected"),
        ]);

        wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap();
        assert_eq!(*calls.lock().unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn other_directory_errors_are_fatal() {
        let (calls, refresh) = scripted(vec![Err(DirectoryError::Remote(
            uniform_api::Error::LegacyApi {
                message: "api.err.Invalid".into(),
            },
        ))]);

        let err = wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &CancellationToken::new(),
            refresh,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Directory { .. }));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_wait() {
        let (_, refresh) = scripted(vec![state("adopting")]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let err = wait_for_state(
            &spec(Duration::from_secs(60), Duration::from_secs(1)),
            &cancel,
            refresh,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Cancelled { operation: "adopt" }));
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}

//! # Waiting on Job Streams
//!
//! Commands that start long-running operations get back an optional
//! [`JobStream`]. This module drains it and tells the command which of three
//! things happened:
//!
//! | Outcome | Meaning | Command shows |
//! |---------|---------|---------------|
//! | `Ok(Completed)` | the job finished (or never needed a stream) | "... complete." / OK |
//! | `Ok(InProgress)` | the platform is still working and we were not asked to wait | "... in progress." / OK |
//! | `Err(e)` | the job failed | the error, no OK |
//!
//! ## Rules
//!
//! - `None` is a synchronous success: nothing is read or printed.
//! - Without `--wait` the first `Polling` event decides `InProgress`.
//!   `Processing` events only contribute warnings.
//! - With `--wait` only `Complete`, `Failed` or the channel closing end the
//!   loop, and a dot is printed per event.
//! - A closed channel counts as completion.
//! - Each event's warnings are printed to stderr as soon as the event is read,
//!   so they are already on screen if an error follows.
//! - Nothing waits past the configured polling timeout.
//!
//! [`resolve`] is the same decision procedure over a finite list of events
//! with no I/O, used where the events are already in hand.

use crate::actor::job::{JobState, JobStream, PollJobEvent, RecvError};
use crate::actor::{ActorError, Warnings};
use crate::ui::Ui;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    InProgress,
}

enum Step {
    Continue,
    Done(Result<JobOutcome, ActorError>),
}

fn step(state: JobState, wait: bool) -> Step {
    match state {
        JobState::Complete => Step::Done(Ok(JobOutcome::Completed)),
        JobState::Failed(err) => Step::Done(Err(err)),
        JobState::Polling if !wait => Step::Done(Ok(JobOutcome::InProgress)),
        JobState::Polling | JobState::Processing => Step::Continue,
    }
}

/// Classifies a finite event sequence, collecting warnings up to and
/// including the deciding event.
pub fn resolve<I>(events: I, wait: bool) -> (Result<JobOutcome, ActorError>, Warnings)
where
    I: IntoIterator<Item = PollJobEvent>,
{
    let mut warnings = Vec::new();
    for event in events {
        warnings.extend(event.warnings);
        if let Step::Done(outcome) = step(event.state, wait) {
            return (outcome, warnings);
        }
    }
    (Ok(JobOutcome::Completed), warnings)
}

/// Drains `stream`, printing warnings (and progress when `wait` is set).
pub fn wait_for_result(
    ui: &dyn Ui,
    stream: Option<JobStream>,
    wait: bool,
    timeout: Duration,
) -> Result<JobOutcome, ActorError> {
    let Some(stream) = stream else {
        return Ok(JobOutcome::Completed);
    };

    if wait {
        ui.display_text_no_newline("Waiting for the operation to complete".into());
    }

    // A timeout too large for `Instant` means no deadline at all.
    let deadline = Instant::now().checked_add(timeout);
    let outcome = loop {
        match stream.recv_until(deadline) {
            Ok(event) => {
                tracing::trace!(state = ?event.state, "received job event");
                if wait {
                    ui.display_text_no_newline(".".into());
                }
                ui.display_warnings(&event.warnings);
                if let Step::Done(outcome) = step(event.state, wait) {
                    break outcome;
                }
            }
            Err(RecvError::Closed) => break Ok(JobOutcome::Completed),
            Err(RecvError::TimedOut) => {
                tracing::debug!(?timeout, "gave up waiting for job");
                break Err(ActorError::JobTimeout);
            }
        }
    };

    if wait {
        ui.display_newline();
    }
    outcome
}

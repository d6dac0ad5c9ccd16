//! # Job Event Streams
//!
//! Long-running platform operations (creating a managed service instance,
//! deleting a binding, upgrading a plan) don't finish inside the request that
//! starts them. The actor hands the command a [`JobStream`]: the receiving end
//! of a channel on which a producer thread reports what it observes.
//!
//! ## Event Model
//!
//! Each [`PollJobEvent`] pairs a [`JobState`] with the warnings collected
//! while observing it. The states form a simple progression:
//!
//! ```text
//! Processing ──► Polling ──► Complete
//!      │            │
//!      └────────────┴──────► Failed(err)
//! ```
//!
//! `Complete` and `Failed` are terminal. A failure always carries its error,
//! so there is no way to build a "failed" event without a reason.
//!
//! ## Ownership
//!
//! One producer, one consumer, one stream per actor call. The stream is moved
//! into the consumer and dropped when the consumer is done with it. Dropping
//! it disconnects the channel, which the producer observes as a `false` from
//! [`JobSender::send`] and uses as its signal to stop.

use super::{ActorError, Warnings};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// The observed state of a job at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// The platform accepted the request and is working on it.
    Processing,
    /// The producer is polling an asynchronous platform job.
    Polling,
    /// The job finished successfully.
    Complete,
    /// The job finished with an error.
    Failed(ActorError),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed(_))
    }
}

/// One observation of a long-running job.
#[derive(Debug, Clone, PartialEq)]
pub struct PollJobEvent {
    pub state: JobState,
    pub warnings: Warnings,
}

impl PollJobEvent {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            warnings: Vec::new(),
        }
    }

    pub fn processing() -> Self {
        Self::new(JobState::Processing)
    }

    pub fn polling() -> Self {
        Self::new(JobState::Polling)
    }

    pub fn complete() -> Self {
        Self::new(JobState::Complete)
    }

    pub fn failed(err: ActorError) -> Self {
        Self::new(JobState::Failed(err))
    }

    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.extend(warnings.into_iter().map(Into::into));
        self
    }
}

/// Why a receive on a [`JobStream`] returned without an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The producer closed the channel.
    Closed,
    /// Nothing arrived before the deadline.
    TimedOut,
}

/// Receiving end of a job's event channel.
#[derive(Debug)]
pub struct JobStream {
    rx: Receiver<PollJobEvent>,
}

/// Sending end of a job's event channel, held by the producer.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: Sender<PollJobEvent>,
}

impl JobSender {
    /// Send an event. Returns `false` once the consumer has gone away, at
    /// which point the producer should stop.
    pub fn send(&self, event: PollJobEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

impl JobStream {
    /// Creates a connected producer/consumer pair.
    pub fn channel() -> (JobSender, JobStream) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (JobSender { tx }, JobStream { rx })
    }

    /// A stream that yields `events` and is then closed.
    pub fn from_events<I>(events: I) -> JobStream
    where
        I: IntoIterator<Item = PollJobEvent>,
    {
        let (tx, stream) = Self::channel();
        for event in events {
            tx.send(event);
        }
        stream
    }

    /// Blocks until the next event, the channel closing, or `deadline`.
    /// Without a deadline it waits for as long as the channel stays open.
    pub fn recv_until(&self, deadline: Option<Instant>) -> Result<PollJobEvent, RecvError> {
        match deadline {
            Some(deadline) => self.rx.recv_deadline(deadline).map_err(|err| match err {
                RecvTimeoutError::Timeout => RecvError::TimedOut,
                RecvTimeoutError::Disconnected => RecvError::Closed,
            }),
            None => self.rx.recv().map_err(|_| RecvError::Closed),
        }
    }
}

impl Iterator for JobStream {
    type Item = PollJobEvent;

    fn next(&mut self) -> Option<PollJobEvent> {
        self.rx.recv().ok()
    }
}

/// Runs the standard producer on a background thread: `Processing`,
/// `Polling`, then `Complete`, pausing `interval` between events.
///
/// `warnings` are attached to the first event. The thread exits as soon as
/// a send fails.
pub fn spawn_job(interval: Duration, warnings: Warnings) -> JobStream {
    spawn_job_with_outcome(interval, warnings, Ok(()))
}

/// Like [`spawn_job`] but the terminal event reflects `outcome`.
pub fn spawn_job_with_outcome(
    interval: Duration,
    warnings: Warnings,
    outcome: Result<(), ActorError>,
) -> JobStream {
    let (tx, stream) = JobStream::channel();
    let terminal = match outcome {
        Ok(()) => PollJobEvent::complete(),
        Err(err) => PollJobEvent::failed(err),
    };
    let events = [
        PollJobEvent::processing().with_warnings(warnings),
        PollJobEvent::polling(),
        terminal,
    ];

    thread::spawn(move || {
        for (i, event) in events.into_iter().enumerate() {
            if i > 0 && !interval.is_zero() {
                thread::sleep(interval);
            }
            tracing::trace!(state = ?event.state, "job event");
            if !tx.send(event) {
                tracing::debug!("job consumer went away, stopping producer");
                return;
            }
        }
    });

    stream
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(stream: JobStream) -> Vec<JobState> {
        stream.map(|e| e.state).collect()
    }

    #[test]
    fn test_from_events_yields_then_closes() {
        let stream = JobStream::from_events(vec![
            PollJobEvent::processing(),
            PollJobEvent::complete(),
        ]);
        assert_eq!(states(stream), vec![JobState::Processing, JobState::Complete]);
    }

    #[test]
    fn test_spawn_job_emits_standard_sequence() {
        let stream = spawn_job(Duration::ZERO, vec!["careful".to_string()]);
        let events: Vec<_> = stream.collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].warnings, vec!["careful"]);
        assert_eq!(events[1].state, JobState::Polling);
        assert_eq!(events[2].state, JobState::Complete);
    }

    #[test]
    fn test_spawn_job_with_failure_ends_failed() {
        let stream = spawn_job_with_outcome(
            Duration::ZERO,
            Vec::new(),
            Err(ActorError::JobFailed("boom".to_string())),
        );
        let last = stream.last().unwrap();
        assert_eq!(
            last.state,
            JobState::Failed(ActorError::JobFailed("boom".to_string()))
        );
    }

    #[test]
    fn test_send_reports_disconnected_consumer() {
        let (tx, stream) = JobStream::channel();
        assert!(tx.send(PollJobEvent::processing()));
        drop(stream);
        assert!(!tx.send(PollJobEvent::polling()));
    }

    #[test]
    fn test_recv_until_times_out_on_open_channel() {
        let (_tx, stream) = JobStream::channel();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(stream.recv_until(Some(deadline)), Err(RecvError::TimedOut));
    }

    #[test]
    fn test_recv_until_reports_close() {
        let (tx, stream) = JobStream::channel();
        drop(tx);
        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(stream.recv_until(Some(deadline)), Err(RecvError::Closed));
    }

    #[test]
    fn test_recv_without_deadline() {
        let (tx, stream) = JobStream::channel();
        assert!(tx.send(PollJobEvent::complete()));
        drop(tx);
        assert_eq!(stream.recv_until(None).map(|e| e.state), Ok(JobState::Complete));
        assert_eq!(stream.recv_until(None), Err(RecvError::Closed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Complete.is_terminal());
        assert!(JobState::Failed(ActorError::JobTimeout).is_terminal());
        assert!(!JobState::Polling.is_terminal());
        assert!(!JobState::Processing.is_terminal());
    }
}

//! Background polling of a [`ParticipantSource`].
//!
//! The loop is single-flight: a tick that fires while the previous
//! fetch is still outstanding is skipped, so at most one request is
//! in flight at a time. The latest [`FeedState`] is published through
//! a watch channel.

use crate::client::{FetchError, FetchResult, ParticipantSource};
use crate::participant::{project, Participant, ParticipantView};
use log::{debug, info, warn};
use std::future::poll_fn;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tokio::{select, spawn};

/// What the dashboard knows after the most recent fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    /// Views of the last successfully fetched list
    pub participants: Vec<ParticipantView>,
    /// Whether the most recent fetch succeeded
    pub connected: bool,
    pub error: Option<String>,
}

impl FeedState {
    /// Replaces the list and clears any error
    pub fn apply_success(&mut self, participants: &[Participant]) {
        self.participants = project(participants);
        self.connected = true;
        self.error = None;
    }

    /// Marks the feed disconnected. The previous list is kept
    pub fn apply_failure(&mut self, error: &FetchError) {
        self.connected = false;
        self.error = Some(error.message());
    }

    pub fn apply(&mut self, result: &FetchResult<Vec<Participant>>) {
        match result {
            Ok(participants) => self.apply_success(participants),
            Err(err) => self.apply_failure(err),
        }
    }
}

/// Handle to a running poll loop. Dropping it stops the loop and
/// cancels any in-flight fetch
pub struct PollHandle {
    state: watch::Receiver<FeedState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Receiver which is notified after every completed fetch
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Snapshot of the current feed
    pub fn current(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Stops the timer, cancels an outstanding fetch and waits for
    /// the loop to exit
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(err) = (&mut self.task).await {
            if err.is_panic() {
                warn!("poll loop panicked: {err}");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts polling `source` immediately and then every `period`
pub fn start<S>(source: S, period: Duration) -> PollHandle
where
    S: ParticipantSource,
{
    let (state_tx, state_rx) = watch::channel(FeedState::default());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = spawn(poll_loop(Arc::new(source), period, state_tx, shutdown_rx));
    PollHandle {
        state: state_rx,
        shutdown: Some(shutdown_tx),
        task,
    }
}

type FetchTask = JoinHandle<FetchResult<Vec<Participant>>>;

async fn poll_loop<S>(
    source: Arc<S>,
    period: Duration,
    state: watch::Sender<FeedState>,
    mut shutdown: oneshot::Receiver<()>,
) where
    S: ParticipantSource,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<FetchTask> = None;
    let mut feed = FeedState::default();

    loop {
        select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if in_flight.is_some() {
                    debug!("previous fetch still outstanding, skipping tick");
                    continue;
                }
                let source = source.clone();
                in_flight = Some(spawn(async move { source.fetch().await }));
            }
            joined = join_in_flight(&mut in_flight) => {
                in_flight = None;
                let result = flatten(joined);
                match &result {
                    Ok(participants) => debug!("fetched {} participants", participants.len()),
                    Err(err) if err.is_transport() => warn!("progress service unreachable: {err}"),
                    Err(err) => warn!("fetch failed: {err}"),
                }
                let was_connected = feed.connected;
                feed.apply(&result);
                if feed.connected && !was_connected {
                    info!("connected to progress service");
                }
                // Nobody listening any more means the view is gone
                if state.send(feed.clone()).is_err() {
                    break;
                }
            }
        }
    }

    if let Some(task) = in_flight {
        task.abort();
    }
    debug!("poll loop stopped");
}

/// Waits for the in-flight fetch, never resolving when there is none
async fn join_in_flight(
    task: &mut Option<FetchTask>,
) -> Result<FetchResult<Vec<Participant>>, JoinError> {
    match task {
        Some(task) => task.await,
        None => poll_fn(|_| Poll::Pending).await,
    }
}

fn flatten(joined: Result<FetchResult<Vec<Participant>>, JoinError>) -> FetchResult<Vec<Participant>> {
    match joined {
        Ok(result) => result,
        Err(err) => Err(FetchError::Other(format!("fetch task failed: {err}"))),
    }
}

#[cfg(test)]
mod test {
    use crate::client::{FetchError, FetchResult, ParticipantSource};
    use crate::participant::{Badge, Participant};
    use crate::poll::{start, FeedState};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::sleep;

    fn participant(name: &str, badges: usize, is_online: bool) -> Participant {
        Participant {
            id: name.to_lowercase(),
            name: name.to_string(),
            badges: (0..badges)
                .map(|index| Badge {
                    id: format!("badge-{index}"),
                    name: format!("Badge {index}"),
                    earned_at: "2024-03-01T09:00:00Z".to_string(),
                })
                .collect(),
            last_seen: "2024-03-01T10:00:00Z".to_string(),
            is_online,
        }
    }

    /// Replays scripted responses, repeating the last one forever
    struct ScriptedSource {
        responses: Mutex<VecDeque<FetchResult<Vec<Participant>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<FetchResult<Vec<Participant>>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                responses: Mutex::new(responses.into()),
                calls: calls.clone(),
            };
            (source, calls)
        }
    }

    #[async_trait]
    impl ParticipantSource for ScriptedSource {
        async fn fetch(&self) -> FetchResult<Vec<Participant>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.pop_front()
            } else {
                None
            };
            match next {
                Some(response) => response,
                None => match responses.front() {
                    Some(Ok(list)) => Ok(list.clone()),
                    _ => Err(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)),
                },
            }
        }
    }

    /// Never answers, counting how often it was asked
    struct HangingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ParticipantSource for HangingSource {
        async fn fetch(&self) -> FetchResult<Vec<Participant>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[test]
    fn failure_keeps_previous_list() {
        let mut feed = FeedState::default();
        feed.apply_success(&[participant("Ana", 5, true)]);
        assert!(feed.connected);

        feed.apply_failure(&FetchError::Status(StatusCode::BAD_GATEWAY));
        assert!(!feed.connected);
        assert!(feed.error.is_some());
        assert_eq!(feed.participants.len(), 1);
        assert_eq!(feed.participants[0].progress, 25);

        feed.apply_success(&[]);
        assert!(feed.connected);
        assert_eq!(feed.error, None);
        assert!(feed.participants.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_failure() {
        let (source, calls) = ScriptedSource::new(vec![
            Err(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
            Ok(vec![participant("Ana", 4, true), participant("Bob", 0, false)]),
        ]);
        let handle = start(source, Duration::from_millis(5000));
        let mut updates = handle.subscribe();

        updates.changed().await.unwrap();
        let failed = updates.borrow().clone();
        assert!(!failed.connected);
        assert_eq!(
            failed.error.as_deref(),
            Some("Progress service responded with status 500 Internal Server Error")
        );

        updates.changed().await.unwrap();
        let recovered = updates.borrow().clone();
        assert!(recovered.connected);
        assert_eq!(recovered.error, None);
        assert_eq!(recovered.participants.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_polling_on_interval() {
        let (source, calls) = ScriptedSource::new(vec![Ok(vec![participant("Ana", 1, true)])]);
        let handle = start(source, Duration::from_millis(5000));

        // Ticks at 0, 5000, 10000 and 15000
        sleep(Duration::from_millis(15_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(handle.current().connected);

        handle.shutdown().await;
        sleep(Duration::from_millis(20_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn single_fetch_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = start(
            HangingSource {
                calls: calls.clone(),
            },
            Duration::from_millis(100),
        );

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.current(), FeedState::default());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let (source, calls) = ScriptedSource::new(vec![Ok(Vec::new())]);
        let handle = start(source, Duration::from_millis(100));
        sleep(Duration::from_millis(250)).await;
        drop(handle);

        let seen = calls.load(Ordering::SeqCst);
        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}

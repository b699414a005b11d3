use crate::api::ApiResult;
use crate::types::*;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Which session a poll was issued for; checked again before applying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub generation: u64,
    pub party_id: PartyId,
    pub player_id: PlayerId,
}

pub type PollFuture = BoxFuture<'static, ApiResult<PartySnapshot>>;

#[derive(Debug)]
pub enum PollEvent {
    /// Time to issue the next fetch
    Due,
    /// The outstanding fetch finished
    Completed(PollTicket, ApiResult<PartySnapshot>),
}

struct InFlight {
    ticket: PollTicket,
    fut: PollFuture,
}

/// Timer side of party-state polling.
///
/// Holds at most one outstanding fetch. While it is pending no tick is
/// reported, so snapshots are applied in the order they were requested.
pub struct PollingLoop {
    period: Duration,
    interval: Option<Interval>,
    repoll_at: Option<Instant>,
    in_flight: Option<InFlight>,
}

impl PollingLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
            repoll_at: None,
            in_flight: None,
        }
    }

    /// Start ticking. Returns `false` if the loop was already running.
    pub fn start(&mut self) -> bool {
        if self.interval.is_some() {
            return false;
        }
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        tracing::info!("Polling started every {:?}", self.period);
        true
    }

    /// Cancel future ticks. An outstanding fetch is still reported.
    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            tracing::info!("Polling stopped");
        }
        self.repoll_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ask for one extra fetch after `delay`, on top of the steady ticks
    pub fn schedule_repoll(&mut self, delay: Duration) {
        if !self.is_running() {
            return;
        }
        let at = Instant::now() + delay;
        self.repoll_at = Some(match self.repoll_at {
            Some(existing) if existing <= at => existing,
            _ => at,
        });
    }

    /// Hand over the fetch for a `Due` event. Refused while another is pending.
    pub fn launch(&mut self, ticket: PollTicket, fut: PollFuture) -> bool {
        if self.in_flight.is_some() {
            tracing::debug!("Poll already in flight, skipping");
            return false;
        }
        self.in_flight = Some(InFlight { ticket, fut });
        true
    }

    /// Wait for the next thing to do. Cancel safe.
    pub async fn next_event(&mut self) -> PollEvent {
        if let Some(in_flight) = self.in_flight.as_mut() {
            let result = (&mut in_flight.fut).await;
            let ticket = in_flight.ticket.clone();
            self.in_flight = None;
            return PollEvent::Completed(ticket, result);
        }

        let repoll_at = self.repoll_at;
        let interval = match self.interval.as_mut() {
            Some(interval) => interval,
            None => return std::future::pending().await,
        };

        tokio::select! {
            _ = interval.tick() => {}
            _ = sleep_until(repoll_at) => {
                self.repoll_at = None;
            }
        }
        PollEvent::Due
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use futures::FutureExt;

    fn ticket(generation: u64) -> PollTicket {
        PollTicket {
            generation,
            party_id: "0421".to_string(),
            player_id: "p1".to_string(),
        }
    }

    fn snapshot() -> PartySnapshot {
        serde_json::from_str(r#"{"state": "idle"}"#).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        assert!(poller.start());
        assert!(!poller.start());
        assert!(poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_period() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.start();
        let started = Instant::now();

        assert!(matches!(poller.next_event().await, PollEvent::Due));
        assert_eq!(started.elapsed(), Duration::from_secs(1));

        assert!(matches!(poller.next_event().await, PollEvent::Due));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repoll_comes_early_without_shifting_interval() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.start();
        let started = Instant::now();

        poller.schedule_repoll(Duration::from_millis(200));
        assert!(matches!(poller.next_event().await, PollEvent::Due));
        assert_eq!(started.elapsed(), Duration::from_millis(200));

        assert!(matches!(poller.next_event().await, PollEvent::Due));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repoll_ignored_when_stopped() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.schedule_repoll(Duration::ZERO);

        let waited = time::timeout(Duration::from_secs(5), poller.next_event()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_outstanding_fetch() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.start();

        assert!(poller.launch(ticket(1), async { Ok(snapshot()) }.boxed()));
        assert!(!poller.launch(ticket(1), async { Ok(snapshot()) }.boxed()));

        match poller.next_event().await {
            PollEvent::Completed(t, Ok(_)) => assert_eq!(t, ticket(1)),
            other => panic!("Expected completed poll, got {:?}", other),
        }
        assert!(!poller.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_while_fetch_pending() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.start();
        let started = Instant::now();

        let slow = async {
            time::sleep(Duration::from_millis(3500)).await;
            Ok(snapshot())
        };
        poller.launch(ticket(1), slow.boxed());

        assert!(matches!(poller.next_event().await, PollEvent::Completed(..)));
        assert_eq!(started.elapsed(), Duration::from_millis(3500));

        // The missed ticks collapse into one
        assert!(matches!(poller.next_event().await, PollEvent::Due));
        assert_eq!(started.elapsed(), Duration::from_millis(3500));
        assert!(matches!(poller.next_event().await, PollEvent::Due));
        assert_eq!(started.elapsed(), Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_survives_cancelled_wait() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.start();

        let slow = async {
            time::sleep(Duration::from_secs(2)).await;
            Err(ApiError::Network("timeout".to_string()))
        };
        poller.launch(ticket(7), slow.boxed());

        let early = time::timeout(Duration::from_millis(500), poller.next_event()).await;
        assert!(early.is_err());
        assert!(poller.is_in_flight());

        match poller.next_event().await {
            PollEvent::Completed(t, Err(ApiError::Network(_))) => assert_eq!(t.generation, 7),
            other => panic!("Expected failed poll, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_still_reports_in_flight() {
        let mut poller = PollingLoop::new(Duration::from_secs(1));
        poller.start();
        poller.launch(ticket(3), async { Ok(snapshot()) }.boxed());
        poller.stop();

        assert!(!poller.is_running());
        assert!(matches!(poller.next_event().await, PollEvent::Completed(..)));

        let waited = time::timeout(Duration::from_secs(5), poller.next_event()).await;
        assert!(waited.is_err());
    }
}

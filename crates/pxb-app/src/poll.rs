use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::dispatch::Dispatcher;
use crate::transport::Transport;

/// Délai exponentiel entre deux échecs de getUpdates.
#[derive(Debug)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

impl Backoff {
    /// Start at one second, double up to `max`.
    #[must_use]
    pub fn new(max: Duration) -> Self {
        Self {
            next: INITIAL_BACKOFF.min(max),
            max,
        }
    }

    /// Delay to wait now; the following one is doubled.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    /// Back to one second after a successful poll.
    pub fn reset(&mut self) {
        self.next = INITIAL_BACKOFF.min(self.max);
    }
}

/// Long-polling cursor: remembers the next update id to ask for.
#[derive(Debug, Default)]
pub struct Poller {
    offset: i64,
}

impl Poller {
    /// Next `offset` sent to getUpdates.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Fetch one batch and dispatch it in order.
    ///
    /// # Errors
    /// Returns the transport error when the poll itself fails.
    pub fn poll_once<T: Transport>(&mut self, dispatcher: &mut Dispatcher<T>) -> Result<usize> {
        let timeout = dispatcher.config().poll_timeout_secs;
        let updates = dispatcher.transport_mut().get_updates(self.offset, timeout)?;
        let count = updates.len();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            dispatcher.handle(update);
        }
        Ok(count)
    }
}

/// Boucle principale : poll → dispatch jusqu'à l'arrêt demandé.
///
/// The stop flag is checked between polls, so shutdown waits at most one
/// long-poll timeout.
pub fn run<T: Transport>(dispatcher: &mut Dispatcher<T>, running: &Arc<AtomicBool>) {
    let mut poller = Poller::default();
    let mut backoff = Backoff::new(Duration::from_secs(dispatcher.config().max_backoff_secs));

    log::info!("Bot démarré, en attente de messages...");
    while running.load(Ordering::Relaxed) {
        match poller.poll_once(dispatcher) {
            Ok(count) => {
                if count > 0 {
                    log::debug!("{count} updates traitées (offset {})", poller.offset());
                }
                backoff.reset();
            }
            Err(e) => {
                let delay = backoff.next_delay();
                log::warn!("getUpdates a échoué : {e:#}. Nouvel essai dans {delay:?}");
                std::thread::sleep(delay);
            }
        }
    }
    log::info!("Arrêt demandé, bot stoppé.");
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use pxb_core::BotConfig;

    use super::*;
    use crate::transport::fake::FakeTransport;
    use crate::transport::{Update, UpdateKind};

    fn text_update(id: i64, body: &str) -> Update {
        Update {
            update_id: id,
            kind: UpdateKind::Text {
                chat: 5,
                message_id: id,
                text: body.into(),
            },
        }
    }

    #[test]
    fn backoff_doubles_then_caps_and_resets() {
        let mut b = Backoff::new(Duration::from_secs(5));
        let delays: Vec<u64> = (0..5).map(|_| b.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn offset_advances_past_highest_update() {
        let mut transport = FakeTransport::default();
        transport
            .polls
            .push_back(Ok(vec![text_update(7, "hello"), text_update(9, "again")]));
        transport.polls.push_back(Err(anyhow!("timeout")));
        transport.polls.push_back(Ok(Vec::new()));
        let mut dispatcher = Dispatcher::new(transport, BotConfig::default());
        let mut poller = Poller::default();

        assert_eq!(poller.poll_once(&mut dispatcher).unwrap(), 2);
        assert_eq!(poller.offset(), 10);
        assert!(poller.poll_once(&mut dispatcher).is_err());
        assert_eq!(poller.offset(), 10);
        assert_eq!(poller.poll_once(&mut dispatcher).unwrap(), 0);

        assert_eq!(dispatcher.transport_mut().offsets, vec![0, 10, 10]);
        assert_eq!(dispatcher.transport_mut().texts().len(), 2);
    }

    #[test]
    fn stopped_loop_never_polls() {
        let mut dispatcher = Dispatcher::new(FakeTransport::default(), BotConfig::default());
        run(&mut dispatcher, &Arc::new(AtomicBool::new(false)));
        assert!(dispatcher.transport_mut().offsets.is_empty());
    }
}

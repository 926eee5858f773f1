use crate::models::Envelope;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

pub type Delivery = Result<Envelope, MailboxError>;

/// Per-rank envelope queues for a single job.
///
/// The first subscriber fixes the job size; posts are refused until then and
/// for ranks outside it afterwards. Envelopes posted before their destination
/// subscribes are held until it does. Once the job is aborted every
/// subscriber receives the abort and further posts are refused.
pub struct Mailbox {
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    slots: HashMap<u32, Slot>,
    size: Option<u32>,
    aborted: Option<String>,
}

#[derive(Default)]
struct Slot {
    pending: VecDeque<Envelope>,
    subscriber: Option<mpsc::UnboundedSender<Delivery>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn post(&self, envelope: Envelope) -> Result<(), MailboxError> {
        let mut state = self.lock();
        if let Some(reason) = state.aborted.clone() {
            return Err(MailboxError::Aborted(reason));
        }
        let size = state.size.ok_or(MailboxError::NotStarted)?;
        for rank in [envelope.source, envelope.dest] {
            if rank >= size {
                return Err(MailboxError::UnknownRank { rank, size });
            }
        }

        let slot = state.slots.entry(envelope.dest).or_default();
        match slot.subscriber.as_ref() {
            Some(tx) => {
                // A dropped receiver means the subscriber went away; keep the
                // envelope for its next subscription.
                if let Err(mpsc::error::SendError(Ok(envelope))) = tx.send(Ok(envelope)) {
                    slot.subscriber = None;
                    slot.pending.push_back(envelope);
                }
            }
            None => slot.pending.push_back(envelope),
        }

        Ok(())
    }

    /// Registers `rank` of a job of `size` ranks as the receiver of its
    /// queue, replacing any previous subscription, and flushes everything
    /// buffered so far.
    pub fn subscribe(
        &self,
        rank: u32,
        size: u32,
    ) -> Result<mpsc::UnboundedReceiver<Delivery>, MailboxError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();

        if let Some(reason) = state.aborted.clone() {
            let _ = tx.send(Err(MailboxError::Aborted(reason)));
            return Ok(rx);
        }

        match state.size {
            Some(expected) if expected != size => {
                return Err(MailboxError::SizeMismatch {
                    expected,
                    actual: size,
                });
            }
            _ if rank >= size => return Err(MailboxError::UnknownRank { rank, size }),
            _ => state.size = Some(size),
        }

        let slot = state.slots.entry(rank).or_default();
        for envelope in slot.pending.drain(..) {
            let _ = tx.send(Ok(envelope));
        }
        slot.subscriber = Some(tx);

        Ok(rx)
    }

    /// Marks the job aborted. Returns `false` if it already was.
    pub fn abort(&self, reason: String) -> bool {
        let mut state = self.lock();
        if state.aborted.is_some() {
            return false;
        }

        for slot in state.slots.values_mut() {
            slot.pending.clear();
            if let Some(tx) = slot.subscriber.take() {
                let _ = tx.send(Err(MailboxError::Aborted(reason.clone())));
            }
        }
        state.aborted = Some(reason);

        true
    }

    pub fn pending(&self, rank: u32) -> usize {
        self.lock().slots.get(&rank).map_or(0, |slot| slot.pending.len())
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted.is_some()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MailboxError {
    Aborted(String),
    NotStarted,
    UnknownRank { rank: u32, size: u32 },
    SizeMismatch { expected: u32, actual: u32 },
}

impl std::fmt::Display for MailboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailboxError::Aborted(reason) => write!(f, "job aborted: {}", reason),
            MailboxError::NotStarted => write!(f, "no rank has joined the job yet"),
            MailboxError::UnknownRank { rank, size } => {
                write!(f, "rank {} is outside a job of {} ranks", rank, size)
            }
            MailboxError::SizeMismatch { expected, actual } => write!(
                f,
                "job has {} ranks, subscriber expected {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for MailboxError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(source: u32, dest: u32, sequence: u64) -> Envelope {
        Envelope::new(source, dest, 0, sequence, vec![sequence as i64])
    }

    #[test]
    fn buffers_until_subscribed() {
        let mailbox = Mailbox::new();
        let _first = mailbox.subscribe(0, 4).unwrap();
        mailbox.post(envelope(0, 1, 1)).unwrap();
        mailbox.post(envelope(0, 1, 2)).unwrap();
        assert_eq!(mailbox.pending(1), 2);

        let mut rx = mailbox.subscribe(1, 4).unwrap();
        assert_eq!(mailbox.pending(1), 0);
        assert_eq!(rx.try_recv().unwrap().unwrap().sequence, 1);
        assert_eq!(rx.try_recv().unwrap().unwrap().sequence, 2);
    }

    #[test]
    fn delivers_directly_to_subscriber() {
        let mailbox = Mailbox::new();
        let mut rx = mailbox.subscribe(3, 4).unwrap();
        mailbox.post(envelope(2, 3, 7)).unwrap();

        let delivered = rx.try_recv().unwrap().unwrap();
        assert_eq!(delivered.source, 2);
        assert_eq!(delivered.values, vec![7]);
    }

    #[test]
    fn requeues_when_subscriber_is_gone() {
        let mailbox = Mailbox::new();
        drop(mailbox.subscribe(0, 2).unwrap());
        mailbox.post(envelope(1, 0, 4)).unwrap();
        assert_eq!(mailbox.pending(0), 1);
    }

    #[test]
    fn refuses_posts_outside_the_job() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.post(envelope(0, 1, 1)), Err(MailboxError::NotStarted));

        let _rx = mailbox.subscribe(0, 2).unwrap();
        assert_eq!(
            mailbox.post(envelope(0, 9, 1)),
            Err(MailboxError::UnknownRank { rank: 9, size: 2 })
        );
        assert_eq!(
            mailbox.post(envelope(5, 1, 1)),
            Err(MailboxError::UnknownRank { rank: 5, size: 2 })
        );
        assert_eq!(mailbox.pending(9), 0);
    }

    #[test]
    fn subscribers_must_agree_on_job_size() {
        let mailbox = Mailbox::new();
        assert!(matches!(
            mailbox.subscribe(4, 4),
            Err(MailboxError::UnknownRank { rank: 4, size: 4 })
        ));

        let _rx = mailbox.subscribe(0, 4).unwrap();
        assert!(matches!(
            mailbox.subscribe(1, 9),
            Err(MailboxError::SizeMismatch {
                expected: 4,
                actual: 9
            })
        ));
    }

    #[test]
    fn abort_reaches_subscribers_and_rejects_posts() {
        let mailbox = Mailbox::new();
        let mut rx = mailbox.subscribe(0, 4).unwrap();

        assert!(mailbox.abort("bad input".to_string()));
        assert!(!mailbox.abort("again".to_string()));
        assert!(mailbox.is_aborted());

        assert_eq!(
            rx.try_recv().unwrap().unwrap_err(),
            MailboxError::Aborted("bad input".to_string())
        );
        assert!(mailbox.post(envelope(1, 0, 1)).is_err());

        let mut late = mailbox.subscribe(2, 4).unwrap();
        assert!(late.try_recv().unwrap().is_err());
    }
}

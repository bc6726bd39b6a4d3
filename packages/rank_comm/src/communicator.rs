use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZero;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::{Channel, Envelope, Error, Result};

/// How often a blocked receive wakes up to check whether another rank has failed.
const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The rank that coordinates a distributed task by convention.
pub const ROOT: usize = 0;

/// One rank's view of a [`World`](crate::World): its identity and its message channels.
///
/// A distributed task receives the communicator of the rank it runs on explicitly instead of
/// consulting ambient process state, which keeps the dependency visible and lets tests run many
/// ranks inside one process.
///
/// Every operation blocks the calling rank until it completes. See the
/// [package documentation](crate) for the delivery guarantees.
pub struct Communicator {
    rank: usize,
    size: NonZero<usize>,

    /// Outgoing channel to each rank, indexed by destination. `None` at our own index.
    outboxes: Vec<Option<mpsc::Sender<Envelope>>>,
    inbox: mpsc::Receiver<Envelope>,

    /// Messages that arrived before anyone asked for them, in arrival order.
    pending: RefCell<VecDeque<Envelope>>,

    recv_timeout: Option<Duration>,
    aborted: Arc<AtomicBool>,

    /// Set for a rank once its thread has exited, indexed by rank.
    finished: Arc<[AtomicBool]>,
}

impl Communicator {
    pub(crate) fn new(
        rank: usize,
        size: NonZero<usize>,
        outboxes: Vec<Option<mpsc::Sender<Envelope>>>,
        inbox: mpsc::Receiver<Envelope>,
        recv_timeout: Option<Duration>,
        aborted: Arc<AtomicBool>,
        finished: Arc<[AtomicBool]>,
    ) -> Self {
        Self {
            rank,
            size,
            outboxes,
            inbox,
            pending: RefCell::new(VecDeque::new()),
            recv_timeout,
            aborted,
            finished,
        }
    }

    /// The index of this rank, starting from 0.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The number of ranks in the world.
    #[must_use]
    pub fn size(&self) -> NonZero<usize> {
        self.size
    }

    /// Whether this is the coordinating rank ([`ROOT`]).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.rank == ROOT
    }

    /// Sends `value` to rank `dest` with the given tag.
    ///
    /// Sending does not wait for the receiver to ask for the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RankOutOfRange`] if `dest` is not a valid rank and
    /// [`Error::Disconnected`] if `dest` has already finished.
    pub fn send<T: Send + 'static>(&self, dest: usize, tag: u32, value: T) -> Result<()> {
        self.deliver(dest, Channel::User(tag), value)
    }

    /// Receives the next message sent by rank `source` with the given tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RankOutOfRange`] if `source` is not a valid rank,
    /// [`Error::PayloadTypeMismatch`] if the message is not a `T`, and [`Error::Disconnected`],
    /// [`Error::PeerFailed`] or [`Error::Timeout`] if the message can no longer be expected.
    pub fn recv<T: Send + 'static>(&self, source: usize, tag: u32) -> Result<T> {
        self.take(source, Channel::User(tag))
    }

    /// Blocks until every rank has entered the barrier.
    ///
    /// # Errors
    ///
    /// Returns an error if a rank can no longer be reached.
    pub fn barrier(&self) -> Result<()> {
        self.arrive(ROOT)?;

        if self.rank == ROOT {
            for peer in self.peers() {
                self.deliver(peer, Channel::Collective, ())?;
            }
            Ok(())
        } else {
            self.take(ROOT, Channel::Collective)
        }
    }

    /// Distributes the value supplied by `root` to every rank.
    ///
    /// The root passes `Some(value)`; other ranks pass `None` and receive a copy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRootValue`] on the root if it passed `None`, or an error if a rank
    /// can no longer be reached.
    pub fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>, root: usize) -> Result<T> {
        self.check_rank(root)?;
        self.arrive(root)?;

        if self.rank == root {
            let value = value.ok_or(Error::MissingRootValue { root })?;
            for peer in self.peers() {
                self.deliver(peer, Channel::Collective, value.clone())?;
            }
            Ok(value)
        } else {
            self.take(root, Channel::Collective)
        }
    }

    /// Hands chunk `i` of the chunks supplied by `root` to rank `i`.
    ///
    /// The root passes exactly one chunk per rank; other ranks pass `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRootValue`] or [`Error::CountMismatch`] on the root if the chunks
    /// are missing or not one per rank, or an error if a rank can no longer be reached.
    pub fn scatter<T: Send + 'static>(&self, chunks: Option<Vec<T>>, root: usize) -> Result<T> {
        self.check_rank(root)?;
        self.arrive(root)?;

        if self.rank != root {
            return self.take(root, Channel::Collective);
        }

        let chunks = chunks.ok_or(Error::MissingRootValue { root })?;
        if chunks.len() != self.size.get() {
            return Err(Error::CountMismatch {
                expected: self.size.get(),
                actual: chunks.len(),
            });
        }

        let mut own = None;
        for (dest, chunk) in chunks.into_iter().enumerate() {
            if dest == self.rank {
                own = Some(chunk);
            } else {
                self.deliver(dest, Channel::Collective, chunk)?;
            }
        }

        own.ok_or(Error::MissingRootValue { root })
    }

    /// Splits the data supplied by `root` into consecutive chunks of `counts[i]` elements and
    /// hands chunk `i` to rank `i`.
    ///
    /// Every rank passes the same `counts`, one entry per rank. The root passes the data; other
    /// ranks pass `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CountMismatch`] if `counts` does not have one entry per rank or, on the
    /// root, does not sum to the length of the data. Returns an error if a rank can no longer be
    /// reached.
    pub fn scatterv<T: Clone + Send + 'static>(
        &self,
        data: Option<&[T]>,
        counts: &[usize],
        root: usize,
    ) -> Result<Vec<T>> {
        if counts.len() != self.size.get() {
            return Err(Error::CountMismatch {
                expected: self.size.get(),
                actual: counts.len(),
            });
        }

        let chunks = match data {
            Some(data) if self.rank == root => {
                let total = counts.iter().fold(0_usize, |acc, c| acc.saturating_add(*c));
                if total != data.len() {
                    return Err(Error::CountMismatch {
                        expected: total,
                        actual: data.len(),
                    });
                }

                let mut rest = data;
                let chunks = counts
                    .iter()
                    .map(|count| {
                        let (head, tail) = rest.split_at(*count);
                        rest = tail;
                        head.to_vec()
                    })
                    .collect();
                Some(chunks)
            }
            _ => None,
        };

        self.scatter(chunks, root)
    }

    /// Collects one value from every rank on `root`, in rank order.
    ///
    /// Returns `Some` with the values on the root and `None` on every other rank.
    ///
    /// # Errors
    ///
    /// Returns an error if a rank can no longer be reached.
    pub fn gather<T: Send + 'static>(&self, value: T, root: usize) -> Result<Option<Vec<T>>> {
        self.check_rank(root)?;

        if self.rank != root {
            self.deliver(root, Channel::Collective, value)?;
            return Ok(None);
        }

        let mut values = Vec::with_capacity(self.size.get());
        for peer in self.peers() {
            values.push(self.take(peer, Channel::Collective)?);
        }
        values.insert(root, value);

        Ok(Some(values))
    }

    /// Collects a variable number of elements from every rank on `root`, concatenated in rank
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if a rank can no longer be reached.
    pub fn gatherv<T: Send + 'static>(&self, local: Vec<T>, root: usize) -> Result<Option<Vec<T>>> {
        Ok(self
            .gather(local, root)?
            .map(|chunks| chunks.into_iter().flatten().collect()))
    }

    /// Combines one value from every rank on `root` using `op`.
    ///
    /// Values are combined in rank order, `op(op(v0, v1), v2)` and so on, so the result is
    /// deterministic even for operations that are not associative in floating point.
    /// Returns `Some` with the combined value on the root and `None` on every other rank.
    ///
    /// # Errors
    ///
    /// Returns an error if a rank can no longer be reached.
    pub fn reduce<T, F>(&self, value: T, op: F, root: usize) -> Result<Option<T>>
    where
        T: Send + 'static,
        F: Fn(T, T) -> T,
    {
        Ok(self
            .gather(value, root)?
            .and_then(|values| values.into_iter().reduce(op)))
    }

    /// Combines one value from every rank using `op` and hands the result to every rank.
    ///
    /// # Errors
    ///
    /// Returns an error if a rank can no longer be reached.
    pub fn all_reduce<T, F>(&self, value: T, op: F) -> Result<T>
    where
        T: Clone + Send + 'static,
        F: Fn(T, T) -> T,
    {
        let combined = self.reduce(value, op, ROOT)?;
        self.broadcast(combined, ROOT)
    }

    fn peers(&self) -> impl Iterator<Item = usize> {
        (0..self.size.get()).filter(move |rank| *rank != self.rank)
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank < self.size.get() {
            Ok(())
        } else {
            Err(Error::RankOutOfRange {
                rank,
                size: self.size.get(),
            })
        }
    }

    /// Announces to `root` that this rank entered a collective, or on the root, waits until
    /// every other rank has announced itself.
    fn arrive(&self, root: usize) -> Result<()> {
        if self.rank == root {
            for peer in self.peers() {
                self.take::<()>(peer, Channel::Arrival)?;
            }
            Ok(())
        } else {
            self.deliver(root, Channel::Arrival, ())
        }
    }

    fn deliver<T: Send + 'static>(&self, dest: usize, channel: Channel, value: T) -> Result<()> {
        self.check_rank(dest)?;
        trace!(source = self.rank, dest, ?channel, "sending message");

        let envelope = Envelope {
            source: self.rank,
            channel,
            payload: Box::new(value),
        };

        if dest == self.rank {
            self.pending.borrow_mut().push_back(envelope);
            return Ok(());
        }

        let Some(outbox) = self.outboxes.get(dest).and_then(Option::as_ref) else {
            return Err(Error::Disconnected { peer: dest });
        };

        if outbox.send(envelope).is_err() {
            return Err(Error::Disconnected { peer: dest });
        }

        Ok(())
    }

    fn take<T: Send + 'static>(&self, source: usize, channel: Channel) -> Result<T> {
        self.check_rank(source)?;

        let payload = self.receive(source, channel)?;
        trace!(source, dest = self.rank, ?channel, "received message");

        payload
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_payload| Error::PayloadTypeMismatch {
                peer: source,
                expected: type_name::<T>(),
            })
    }

    fn receive(&self, source: usize, channel: Channel) -> Result<Box<dyn Any + Send>> {
        if let Some(payload) = self.take_pending(source, channel) {
            return Ok(payload);
        }

        let deadline = self
            .recv_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));

        loop {
            let envelope = match self.inbox.recv_timeout(ABORT_POLL_INTERVAL) {
                Ok(envelope) => envelope,
                Err(RecvTimeoutError::Timeout) => {
                    if self.aborted.load(Ordering::Acquire) {
                        return Err(Error::PeerFailed { peer: source });
                    }

                    if self.has_finished(source) {
                        // Everything the peer sent is in the inbox by now.
                        self.pending.borrow_mut().extend(self.inbox.try_iter());
                        return self
                            .take_pending(source, channel)
                            .ok_or(Error::Disconnected { peer: source });
                    }

                    if let (Some(deadline), Some(after)) = (deadline, self.recv_timeout) {
                        if Instant::now() >= deadline {
                            return Err(Error::Timeout {
                                peer: source,
                                after,
                            });
                        }
                    }

                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Disconnected { peer: source });
                }
            };

            if envelope.matches(source, channel) {
                return Ok(envelope.payload);
            }

            self.pending.borrow_mut().push_back(envelope);
        }
    }

    fn take_pending(&self, source: usize, channel: Channel) -> Option<Box<dyn Any + Send>> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|e| e.matches(source, channel))?;
        pending.remove(index).map(|envelope| envelope.payload)
    }

    fn has_finished(&self, rank: usize) -> bool {
        rank != self.rank
            && self
                .finished
                .get(rank)
                .is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

impl fmt::Debug for Communicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("pending", &self.pending.borrow().len())
            .field("recv_timeout", &self.recv_timeout)
            .finish_non_exhaustive()
    }
}

use std::num::NonZero;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use std::{iter, panic, thread};

use new_zealand::nz;
use tracing::debug;

use crate::Communicator;

/// A fixed set of ranks that communicate with each other.
///
/// [`run()`](Self::run) executes the same callback once per rank, each on its own thread and
/// with its own [`Communicator`], and returns the results in rank order. This is the in-process
/// equivalent of launching one process per rank.
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use rank_comm::World;
///
/// let world = World::builder().participants(nz!(3)).build();
///
/// let received = world.run(|comm| {
///     let value = if comm.is_root() { Some(vec![1, 2, 3]) } else { None };
///     comm.broadcast(value, 0).unwrap()
/// });
///
/// assert!(received.iter().all(|v| v == &[1, 2, 3]));
/// ```
#[derive(Clone, Debug)]
pub struct World {
    participants: NonZero<usize>,
    recv_timeout: Option<Duration>,
}

impl World {
    /// Creates a world of `participants` ranks with default settings.
    #[must_use]
    pub fn new(participants: NonZero<usize>) -> Self {
        Self::builder().participants(participants).build()
    }

    /// Starts configuring a world. Defaults to a single rank without a receive timeout.
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    /// The number of ranks in the world.
    #[must_use]
    pub fn participants(&self) -> NonZero<usize> {
        self.participants
    }

    /// Executes `f` once per rank, each on its own thread, and returns the results in rank order.
    ///
    /// The callback may borrow from the caller's stack; all rank threads have finished by the
    /// time this returns.
    ///
    /// # Panics
    ///
    /// If a rank panics, the panic is propagated to the caller once all ranks have finished.
    /// Ranks that were waiting for a message from the failed rank observe
    /// [`Error::PeerFailed`](crate::Error::PeerFailed). Ranks waiting for a message from a rank
    /// that returned without sending it observe [`Error::Disconnected`](crate::Error::Disconnected).
    pub fn run<F, R>(&self, f: F) -> Vec<R>
    where
        F: Fn(&Communicator) -> R + Sync,
        R: Send,
    {
        let size = self.participants.get();
        debug!(size, "starting ranks");

        let (senders, receivers): (Vec<_>, Vec<_>) =
            iter::repeat_with(mpsc::channel).take(size).unzip();
        let aborted = Arc::new(AtomicBool::new(false));
        let finished: Arc<[AtomicBool]> = iter::repeat_with(|| AtomicBool::new(false))
            .take(size)
            .collect();

        let results = thread::scope(|scope| {
            let handles: Vec<_> = receivers
                .into_iter()
                .enumerate()
                .map(|(rank, inbox)| {
                    let outboxes = senders
                        .iter()
                        .enumerate()
                        .map(|(dest, tx)| (dest != rank).then(|| tx.clone()))
                        .collect();

                    let comm = Communicator::new(
                        rank,
                        self.participants,
                        outboxes,
                        inbox,
                        self.recv_timeout,
                        Arc::clone(&aborted),
                        Arc::clone(&finished),
                    );

                    let f = &f;
                    let sentinel = ExitSentinel {
                        rank,
                        aborted: Arc::clone(&aborted),
                        finished: Arc::clone(&finished),
                    };

                    thread::Builder::new()
                        .name(format!("rank-{rank}"))
                        .spawn_scoped(scope, move || {
                            let _sentinel = sentinel;
                            f(&comm)
                        })
                        .expect("failed to spawn rank thread: thread spawning failure is not supported")
                })
                .collect();

            // Only the rank threads may hold senders, so that a rank whose peers all
            // exited observes a disconnect rather than waiting forever.
            drop(senders);

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect()
        });

        debug!(size, "all ranks finished");
        results
    }
}

/// Configures a [`World`].
#[derive(Debug)]
#[must_use]
pub struct WorldBuilder {
    participants: NonZero<usize>,
    recv_timeout: Option<Duration>,
}

impl WorldBuilder {
    fn new() -> Self {
        Self {
            participants: nz!(1),
            recv_timeout: None,
        }
    }

    /// Sets the number of ranks.
    #[cfg_attr(test, mutants::skip)] // All mutations are unviable - skip them to save time.
    pub fn participants(self, n: NonZero<usize>) -> Self {
        Self {
            participants: n,
            ..self
        }
    }

    /// Sets how long a rank waits for a matching message before failing with
    /// [`Error::Timeout`](crate::Error::Timeout). By default a rank waits forever.
    pub fn recv_timeout(self, timeout: Duration) -> Self {
        Self {
            recv_timeout: Some(timeout),
            ..self
        }
    }

    /// Finishes configuring the world.
    #[must_use]
    pub fn build(self) -> World {
        World {
            participants: self.participants,
            recv_timeout: self.recv_timeout,
        }
    }
}

/// Marks its rank as finished when the rank thread exits, and the world as aborted if it unwinds.
struct ExitSentinel {
    rank: usize,
    aborted: Arc<AtomicBool>,
    finished: Arc<[AtomicBool]>,
}

impl Drop for ExitSentinel {
    fn drop(&mut self) {
        if thread::panicking() {
            self.aborted.store(true, Ordering::Release);
        }

        if let Some(flag) = self.finished.get(self.rank) {
            flag.store(true, Ordering::Release);
        }
    }
}

// src/crawl/frontier.rs
// =============================================================================
// The frontier: domains waiting to be probed.
//
// How it works:
// - A VecDeque gives us FIFO order and grows as far as it needs to
// - Probes push from many tasks at once, so the queue sits behind a Mutex
// - The scheduler is the only consumer; when the queue is empty it parks
//   on a Notify until somebody pushes
// - Optionally, a HashSet remembers every domain ever enqueued so a cycle
//   (A links to B, B links to A) can't keep the scan alive forever
//
// The lock is only ever held for a push or a pop, never across an .await.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    // Every domain that was ever enqueued (only filled when dedup is on)
    seen: HashSet<String>,
}

/// Unbounded FIFO of pending domains, shared by the scheduler and probes
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    pushed: Notify,
    dedup: bool,
}

impl Frontier {
    /// `dedup` turns on the seen-set: a domain is only ever enqueued once
    pub fn new(dedup: bool) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            pushed: Notify::new(),
            dedup,
        }
    }

    /// Adds a domain to the back of the queue
    ///
    /// Never blocks. Returns false only when dedup is on and the domain
    /// was already enqueued earlier in the run.
    pub fn push(&self, domain: impl Into<String>) -> bool {
        let domain = domain.into();

        {
            let mut state = self.lock();
            if self.dedup && !state.seen.insert(domain.clone()) {
                return false;
            }
            state.queue.push_back(domain);
        }

        self.pushed.notify_one();
        true
    }

    /// Takes the next domain, waiting for a push if the queue is empty
    pub async fn pop(&self) -> String {
        loop {
            if let Some(domain) = self.try_pop() {
                return domain;
            }
            self.pushed.notified().await;
        }
    }

    /// Takes the next domain if there is one
    pub fn try_pop(&self) -> Option<String> {
        self.lock().queue.pop_front()
    }

    /// Resolves after the next push (or right away if one is unobserved)
    ///
    /// Wake-ups can be spurious; callers re-check the queue afterwards.
    pub async fn wait_for_push(&self) {
        self.pushed.notified().await;
    }

    /// Point-in-time look at the queue. Racy by nature: another task can
    /// push right after this returns, so it's only a hint for the loop.
    pub fn is_empty_snapshot(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    // A panic elsewhere can't leave the queue half-updated (every critical
    // section is a single push/pop), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why std::sync::Mutex and not tokio's?
//    - We never hold the lock across an .await, so the cheaper blocking
//      mutex is fine (and is what the tokio docs recommend for this)
//
// 2. What is Notify?
//    - A wake-up signal between tasks
//    - notify_one() with nobody waiting stores the wake-up, so the next
//      notified().await returns immediately: a push can't be "missed"
//
// 3. What is PoisonError::into_inner?
//    - A Mutex is "poisoned" if a thread panicked while holding it
//    - into_inner gives us the data anyway instead of panicking too
// -----------------------------------------------------------------------------

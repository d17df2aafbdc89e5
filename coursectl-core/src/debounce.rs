//! Trailing-edge debouncer for text input
//!
//! The view pushes every raw edit into a [`Debouncer`]; [`Debounced::next`]
//! yields only the latest value once the input has been quiet for the
//! configured delay.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

/// Default quiet period before a search term is forwarded
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Create a connected debouncer pair
pub fn debounce<T>(delay: Duration) -> (Debouncer<T>, Debounced<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Debouncer { tx },
        Debounced {
            rx,
            delay,
            pending: None,
            deadline: Instant::now(),
        },
    )
}

/// Input side. Cheap to clone.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Debouncer<T> {
    /// Record a new value and restart the quiet period.
    /// Returns `false` once the receiving side is gone.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Output side
pub struct Debounced<T> {
    rx: mpsc::UnboundedReceiver<T>,
    delay: Duration,
    pending: Option<T>,
    deadline: Instant,
}

impl<T> Debounced<T> {
    /// Wait for the input to settle and return the last value pushed.
    ///
    /// Returns `None` when every [`Debouncer`] is dropped and nothing is
    /// pending; a value still pending at that point is returned immediately.
    /// Cancel safe: a pending value survives the future being dropped, so this
    /// can sit in a `tokio::select!` loop.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            if self.pending.is_none() {
                let value = self.rx.recv().await?;
                self.pending = Some(value);
                self.deadline = Instant::now() + self.delay;
            }

            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(value) => {
                        self.pending = Some(value);
                        self.deadline = Instant::now() + self.delay;
                    }
                    None => return self.pending.take(),
                },
                _ = tokio::time::sleep_until(self.deadline) => return self.pending.take(),
            }
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn burst_yields_only_last_value() {
        let (tx, mut rx) = debounce(DELAY);
        let start = Instant::now();
        tx.push("p");
        tx.push("py");
        tx.push("python");

        assert_eq!(rx.next().await, Some("python"));
        assert!(start.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn push_during_quiet_period_restarts_timer() {
        let (tx, mut rx) = debounce(DELAY);
        let start = Instant::now();
        tx.push("ru");

        let late = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            late.push("rust");
        });

        assert_eq!(rx.next().await, Some("rust"));
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn separated_values_are_all_emitted() {
        let (tx, mut rx) = debounce(DELAY);
        tx.push(1);
        assert_eq!(rx.next().await, Some(1));
        tx.push(2);
        assert_eq!(rx.next().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_value_survives_cancellation() {
        let (tx, mut rx) = debounce(DELAY);
        tx.push("kept");

        let early = tokio::time::timeout(Duration::from_millis(100), rx.next()).await;
        assert!(early.is_err());

        assert_eq!(rx.next().await, Some("kept"));
    }

    #[tokio::test(start_paused = true)]
    async fn closes_when_senders_drop() {
        let (tx, mut rx) = debounce(DELAY);
        let start = Instant::now();
        tx.push("first");
        tx.push("last");
        drop(tx);

        // Flushed without waiting out the quiet period
        assert_eq!(rx.next().await, Some("last"));
        assert!(start.elapsed() < DELAY);
        assert_eq!(rx.next().await, None);
    }
}

use crate::channel::Tx;
use derive_more::Constructor;
use futures::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::{convert, fmt::Debug, future, future::Future};
use tracing::{error, info, warn};

/// A source-adapter event: either an ingested item, or a marker that the
/// underlying connection is being re-established (§4.A, §7.Source Adapters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<Origin, T> {
    Item(T),
    Reconnecting(Origin),
}

/// Extension trait adding resilience combinators to any [`Stream`] of
/// fallible stream-initialisation attempts, used by every streaming source
/// adapter to survive transient disconnects without operator intervention.
pub trait ReconnectingStream
where
    Self: Stream + Sized,
{
    fn with_reconnect_backoff<St, InitError>(
        self,
        policy: ReconnectionBackoffPolicy,
        origin: impl Debug + Clone,
    ) -> impl Stream<Item = St>
    where
        Self: Stream<Item = Result<St, InitError>>,
        St: Stream,
        InitError: Debug,
    {
        self.enumerate()
            .scan(
                ReconnectionState::from(policy),
                move |state, (attempt, result)| match result {
                    Ok(stream) => {
                        info!(attempt, ?origin, "successfully initialised stream");
                        state.reset_backoff();
                        futures::future::Either::Left(future::ready(Some(Ok(stream))))
                    }
                    Err(error) => {
                        warn!(attempt, ?origin, ?error, "failed to re-initialise stream");
                        let sleep_duration = state.generate_sleep_duration();
                        let sleep_fut = tokio::time::sleep(sleep_duration);
                        state.multiply_backoff();
                        futures::future::Either::Right(Box::pin(async move {
                            info!(?sleep_duration, "waiting before reconnect attempt");
                            sleep_fut.await;
                            Some(Err(error))
                        }))
                    }
                },
            )
            .filter_map(|result| future::ready(result.ok()))
    }

    /// Terminates the inner stream when an error is deemed unrecoverable,
    /// causing the outer [`ReconnectingStream`] to re-initialise it.
    fn with_termination_on_error<St, T, E, FnIsTerminal>(
        self,
        is_terminal: FnIsTerminal,
    ) -> impl Stream<Item = impl Stream<Item = Result<T, E>>>
    where
        Self: Stream<Item = St>,
        St: Stream<Item = Result<T, E>>,
        FnIsTerminal: Fn(&E) -> bool + Copy,
    {
        self.map(move |stream| {
            tokio_stream::StreamExt::map_while(stream, move |result| match result {
                Ok(item) => Some(Ok(item)),
                Err(error) if is_terminal(&error) => {
                    error!("stream encountered terminal error, reconnecting");
                    None
                }
                Err(error) => Some(Err(error)),
            })
        })
    }

    fn with_reconnection_events<St, Origin>(
        self,
        origin: Origin,
    ) -> impl Stream<Item = Event<Origin, St::Item>>
    where
        Self: Stream<Item = St>,
        St: Stream,
        Origin: Clone + 'static,
    {
        self.map(move |stream| {
            stream
                .map(Event::Item)
                .chain(futures::stream::once(future::ready(Event::Reconnecting(
                    origin.clone(),
                ))))
        })
        .flatten()
    }

    fn with_error_handler<FnOnErr, Origin, T, E>(
        self,
        op: FnOnErr,
    ) -> impl Stream<Item = Event<Origin, T>>
    where
        Self: Stream<Item = Event<Origin, Result<T, E>>>,
        FnOnErr: Fn(E) + 'static,
    {
        self.filter_map(move |event| {
            std::future::ready(match event {
                Event::Reconnecting(origin) => Some(Event::Reconnecting(origin)),
                Event::Item(Ok(item)) => Some(Event::Item(item)),
                Event::Item(Err(error)) => {
                    op(error);
                    None
                }
            })
        })
    }

    fn forward_to<Transmitter>(self, tx: Transmitter) -> impl Future<Output = ()> + Send
    where
        Self: Stream + Sized + Send,
        Self::Item: Into<Transmitter::Item>,
        Transmitter: Tx + Send + 'static,
    {
        tokio_stream::StreamExt::map_while(self, move |item| tx.send(item.into()).ok()).collect()
    }
}

impl<T> ReconnectingStream for T where T: Stream {}

/// Initialise a [`ReconnectingStream`] from a fallible initialisation
/// closure, chaining an unbounded sequence of re-initialisation attempts
/// after the first one.
pub async fn init_reconnecting_stream<FnInit, St, FnInitError, FnInitFut>(
    init_stream: FnInit,
) -> Result<impl Stream<Item = Result<St, FnInitError>>, FnInitError>
where
    FnInit: Fn() -> FnInitFut,
    FnInitFut: Future<Output = Result<St, FnInitError>>,
{
    let initial = init_stream().await?;
    let reconnections = futures::stream::repeat_with(init_stream).then(convert::identity);

    Ok(futures::stream::once(future::ready(Ok(initial))).chain(reconnections))
}

/// Reconnection backoff policy: exponential with a cap and random jitter
/// (§4.A source-adapter resilience).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Constructor)]
pub struct ReconnectionBackoffPolicy {
    pub backoff_ms_initial: u64,
    pub backoff_multiplier: u8,
    pub backoff_ms_max: u64,
    pub jitter_ms: u64,
}

impl Default for ReconnectionBackoffPolicy {
    fn default() -> Self {
        Self {
            backoff_ms_initial: 500,
            backoff_multiplier: 2,
            backoff_ms_max: 60_000,
            jitter_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
struct ReconnectionState {
    policy: ReconnectionBackoffPolicy,
    backoff_ms_current: u64,
}

impl From<ReconnectionBackoffPolicy> for ReconnectionState {
    fn from(policy: ReconnectionBackoffPolicy) -> Self {
        Self {
            backoff_ms_current: policy.backoff_ms_initial,
            policy,
        }
    }
}

impl ReconnectionState {
    fn reset_backoff(&mut self) {
        self.backoff_ms_current = self.policy.backoff_ms_initial;
    }

    fn multiply_backoff(&mut self) {
        let next = self.backoff_ms_current * self.policy.backoff_multiplier as u64;
        self.backoff_ms_current = std::cmp::min(next, self.policy.backoff_ms_max);
    }

    fn generate_sleep_duration(&self) -> std::time::Duration {
        let jitter = if self.policy.jitter_ms > 0 {
            use rand::Rng;
            rand::rng().random_range(0..=self.policy.jitter_ms)
        } else {
            0
        };

        std::time::Duration::from_millis(self.backoff_ms_current + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    #[tokio::test]
    async fn generate_sleep_duration_respects_jitter_bound() {
        let policy = ReconnectionBackoffPolicy::new(100, 2, 1000, 50);
        let mut state = ReconnectionState::from(policy.clone());

        for _ in 0..3 {
            let dur = state.generate_sleep_duration();
            assert!(dur >= Duration::from_millis(state.backoff_ms_current));
            assert!(dur <= Duration::from_millis(state.backoff_ms_current + policy.jitter_ms));
            state.multiply_backoff();
        }
    }

    #[tokio::test]
    async fn reconnecting_stream_reconnects_after_terminal_error() {
        tokio::time::pause();

        let attempts = Arc::new(AtomicUsize::new(0));
        let init = {
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst);
                    if count == 0 {
                        Ok(tokio_stream::iter(vec![Ok(1), Err(())]))
                    } else {
                        Ok(tokio_stream::iter(vec![Ok(2)]))
                    }
                }
            }
        };

        let policy = ReconnectionBackoffPolicy {
            backoff_ms_initial: 0,
            backoff_multiplier: 1,
            backoff_ms_max: 0,
            jitter_ms: 0,
        };
        let stream = init_reconnecting_stream(init)
            .await
            .unwrap()
            .with_reconnect_backoff(policy, "test")
            .with_termination_on_error(|_| true)
            .with_reconnection_events(());

        let collected: Vec<_> = stream.take(3).collect().await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(collected[0], Event::Item(Ok(1)));
        assert_eq!(collected[1], Event::Reconnecting(()));
        assert_eq!(collected[2], Event::Item(Ok(2)));
    }
}

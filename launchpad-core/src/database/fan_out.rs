//! Background execution of a listing with an error-first handshake.
//!
//! A dispatched call owns one error channel and one result channel. It sends
//! exactly one value on the error channel: `Some(err)` on failure, after
//! which nothing else is sent, or `None` on success, immediately followed by
//! exactly one value on the result channel. Readers must drain the error
//! channel before touching the result channel; [`FanOutReceiver::recv`] does
//! that for you.

use std::future::Future;

use launchpad_model::App;
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{LaunchpadError, Result};

/// Sending half handed to a dispatched listing.
#[derive(Debug)]
pub struct FanOutSender {
    errors: Sender<Option<LaunchpadError>>,
    apps: Sender<Vec<App>>,
}

/// Receiving half kept by the caller.
#[derive(Debug)]
pub struct FanOutReceiver {
    errors: Receiver<Option<LaunchpadError>>,
    apps: Receiver<Vec<App>>,
}

/// Creates the channel pair for one dispatched call.
///
/// tokio channels need room for at least one message, so `capacity` is
/// raised to 1.
pub fn fan_out_channel(capacity: usize) -> (FanOutSender, FanOutReceiver) {
    let capacity = capacity.max(1);
    let (errors_tx, errors_rx) = mpsc::channel(capacity);
    let (apps_tx, apps_rx) = mpsc::channel(capacity);
    (
        FanOutSender {
            errors: errors_tx,
            apps: apps_tx,
        },
        FanOutReceiver {
            errors: errors_rx,
            apps: apps_rx,
        },
    )
}

impl FanOutSender {
    /// Wraps caller-provided channels.
    pub fn from_parts(
        errors: Sender<Option<LaunchpadError>>,
        apps: Sender<Vec<App>>,
    ) -> Self {
        Self { errors, apps }
    }

    async fn deliver(self, label: &'static str, outcome: Result<Vec<App>>) {
        match outcome {
            Err(err) => {
                debug!(error = %err, "errored getting {label}");
                if self.errors.send(Some(err)).await.is_err() {
                    debug!("receiver for {label} dropped before the error");
                }
            }
            Ok(apps) => {
                debug!(rows = apps.len(), "got {label}");
                if self.errors.send(None).await.is_err() {
                    debug!("receiver for {label} dropped before the result");
                    return;
                }
                if self.apps.send(apps).await.is_err() {
                    debug!("receiver for {label} dropped before the rows");
                    return;
                }
                debug!("done getting {label}");
            }
        }
    }
}

impl FanOutReceiver {
    /// Wraps caller-provided channels.
    pub fn from_parts(
        errors: Receiver<Option<LaunchpadError>>,
        apps: Receiver<Vec<App>>,
    ) -> Self {
        Self { errors, apps }
    }

    /// Waits for the outcome of the dispatched call.
    ///
    /// Reads the error channel first and only then the result channel. A
    /// task that goes away without reporting (it panicked) surfaces as
    /// [`LaunchpadError::Dispatch`].
    pub async fn recv(mut self) -> Result<Vec<App>> {
        match self.errors.recv().await {
            Some(Some(err)) => Err(err),
            Some(None) => self.apps.recv().await.ok_or(LaunchpadError::Dispatch),
            None => Err(LaunchpadError::Dispatch),
        }
    }

    /// The raw channels, for callers that multiplex several calls themselves.
    pub fn into_parts(
        self,
    ) -> (Receiver<Option<LaunchpadError>>, Receiver<Vec<App>>) {
        (self.errors, self.apps)
    }
}

/// Runs `query` on its own task and reports through `sender`.
///
/// Cancelling `cancel` before the query finishes abandons it and reports
/// [`LaunchpadError::Cancelled`] on the error channel.
pub fn dispatch<F>(
    label: &'static str,
    cancel: CancellationToken,
    sender: FanOutSender,
    query: F,
) -> JoinHandle<()>
where
    F: Future<Output = Result<Vec<App>>> + Send + 'static,
{
    tokio::spawn(async move {
        debug!("getting {label}");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LaunchpadError::Cancelled),
            result = query => result,
        };
        sender.deliver(label, outcome).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;
    use uuid::Uuid;

    fn app(name: &str) -> App {
        App {
            id: Uuid::new_v4(),
            system_id: launchpad_model::DE_SYSTEM_ID.to_string(),
            name: name.to_string(),
            description: String::new(),
            wiki_url: None,
            integration_date: None,
            edited_date: None,
            username: "ipcdev".into(),
            job_count: None,
            is_favorite: false,
            is_public: true,
            most_recent_start_date: None,
        }
    }

    #[tokio::test]
    async fn failure_sends_one_error_and_no_rows() {
        let (tx, rx) = fan_out_channel(1);
        let handle = dispatch("failing apps", CancellationToken::new(), tx, async {
            Err(LaunchpadError::from(sqlx::Error::PoolTimedOut))
        });
        handle.await.unwrap();

        let (mut errors, mut apps) = rx.into_parts();
        let first = errors.recv().await.expect("error signal");
        assert!(matches!(first, Some(LaunchpadError::Connectivity(_))));
        assert!(matches!(errors.try_recv(), Err(TryRecvError::Disconnected)));
        assert!(matches!(apps.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[tokio::test]
    async fn success_sends_none_then_rows() {
        let (tx, rx) = fan_out_channel(1);
        let rows = vec![app("Word Count"), app("DESeq2")];
        let expected = rows.clone();
        let handle =
            dispatch("working apps", CancellationToken::new(), tx, async move {
                Ok(rows)
            });
        handle.await.unwrap();

        let (mut errors, mut apps) = rx.into_parts();
        assert!(errors.recv().await.expect("error signal").is_none());
        assert!(matches!(errors.try_recv(), Err(TryRecvError::Disconnected)));
        assert_eq!(apps.recv().await.expect("rows"), expected);
        assert!(matches!(apps.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[tokio::test]
    async fn empty_result_is_still_delivered() {
        let (tx, rx) = fan_out_channel(0);
        dispatch("empty apps", CancellationToken::new(), tx, async {
            Ok(Vec::new())
        });
        assert_eq!(rx.recv().await.unwrap(), Vec::<App>::new());
    }

    #[tokio::test]
    async fn recv_surfaces_the_error() {
        let (tx, rx) = fan_out_channel(1);
        dispatch("failing apps", CancellationToken::new(), tx, async {
            Err(LaunchpadError::Cancelled)
        });
        assert!(matches!(rx.recv().await, Err(LaunchpadError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_reports_an_error_without_rows() {
        let token = CancellationToken::new();
        token.cancel();
        let (tx, rx) = fan_out_channel(1);
        let handle = dispatch(
            "stuck apps",
            token,
            tx,
            std::future::pending::<Result<Vec<App>>>(),
        );
        handle.await.unwrap();

        let (mut errors, mut apps) = rx.into_parts();
        assert!(matches!(
            errors.recv().await,
            Some(Some(LaunchpadError::Cancelled))
        ));
        assert!(matches!(apps.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[tokio::test]
    async fn concurrent_calls_complete_in_any_order() {
        let (slow_tx, slow_rx) = fan_out_channel(1);
        let (fast_tx, fast_rx) = fan_out_channel(1);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        dispatch("slow apps", CancellationToken::new(), slow_tx, async move {
            let _ = release_rx.await;
            Ok(vec![app("slow")])
        });
        dispatch("fast apps", CancellationToken::new(), fast_tx, async {
            Ok(vec![app("fast")])
        });

        let fast = fast_rx.recv().await.unwrap();
        assert_eq!(fast[0].name, "fast");
        release_tx.send(()).unwrap();
        let slow = slow_rx.recv().await.unwrap();
        assert_eq!(slow[0].name, "slow");
    }

    #[tokio::test]
    async fn vanished_task_is_a_dispatch_error() {
        let (tx, rx) = fan_out_channel(1);
        drop(tx);
        assert!(matches!(rx.recv().await, Err(LaunchpadError::Dispatch)));
    }

    #[tokio::test]
    async fn caller_provided_channels_follow_the_same_protocol() {
        let (errors_tx, mut errors_rx) = mpsc::channel(4);
        let (apps_tx, mut apps_rx) = mpsc::channel(4);
        let sender = FanOutSender::from_parts(errors_tx, apps_tx);
        dispatch("buffered apps", CancellationToken::new(), sender, async {
            Ok(vec![app("buffered")])
        })
        .await
        .unwrap();

        assert!(errors_rx.recv().await.unwrap().is_none());
        assert_eq!(apps_rx.recv().await.unwrap()[0].name, "buffered");
    }
}

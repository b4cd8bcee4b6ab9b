//! Tokio completion driver.
//!
//! [`TokioTransport`] implements the synchronous [`Transport`] seam by
//! queuing submissions. [`TransportDriver::run`] drains that queue and spawns
//! one task per transfer, so read and write completions land on independent
//! tasks and reach the hub's handlers with no ordering between them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;
use wedo_hid_protocol::REPORT_LEN;

use crate::error::TransportError;
use crate::hub::Hub;
use crate::transport::Transport;

/// Asynchronous access to the hub's HID link.
#[async_trait]
pub trait AsyncHidLink: Send + Sync {
    /// Wait for the next interrupt-in report.
    async fn read_report(&self) -> Result<Vec<u8>, TransportError>;

    /// Send an output report. Returns the number of bytes sent.
    async fn write_report(&self, frame: &[u8]) -> Result<usize, TransportError>;
}

#[derive(Debug)]
enum Submission {
    Read,
    Write([u8; REPORT_LEN]),
    Close,
}

/// Transport half handed to the hub.
#[derive(Debug, Clone)]
pub struct TokioTransport {
    submissions: mpsc::UnboundedSender<Submission>,
}

impl Transport for TokioTransport {
    fn submit_read(&self) -> Result<(), TransportError> {
        self.submissions
            .send(Submission::Read)
            .map_err(|_| TransportError::Closed)
    }

    fn submit_write(&self, frame: [u8; REPORT_LEN]) -> Result<(), TransportError> {
        self.submissions
            .send(Submission::Write(frame))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self) {
        // A driver that already stopped has nothing left to close.
        let _ = self.submissions.send(Submission::Close);
    }
}

/// Driver half; runs the link's transfers.
pub struct TransportDriver<L> {
    link: Arc<L>,
    submissions: mpsc::UnboundedReceiver<Submission>,
}

/// Pair a link with a transport for the hub and a driver to run it.
pub fn channel<L: AsyncHidLink + 'static>(link: Arc<L>) -> (TokioTransport, TransportDriver<L>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        TokioTransport { submissions: tx },
        TransportDriver {
            link,
            submissions: rx,
        },
    )
}

impl<L: AsyncHidLink + 'static> TransportDriver<L> {
    /// Run until the transport is closed or dropped. Transfers still
    /// pending at that point are cancelled.
    pub async fn run(mut self, hub: Arc<Hub>) {
        let mut transfers = JoinSet::new();

        while let Some(submission) = self.submissions.recv().await {
            match submission {
                Submission::Read => {
                    let link = Arc::clone(&self.link);
                    let hub = Arc::clone(&hub);
                    transfers.spawn(async move {
                        let result = link.read_report().await;
                        hub.on_read_complete(result.as_deref().map_err(Clone::clone));
                    });
                }
                Submission::Write(frame) => {
                    let link = Arc::clone(&self.link);
                    let hub = Arc::clone(&hub);
                    transfers.spawn(async move {
                        let result = link.write_report(&frame).await;
                        hub.on_write_complete(result);
                    });
                }
                Submission::Close => break,
            }

            while transfers.try_join_next().is_some() {}
        }

        transfers.abort_all();
        debug!(hub = %hub.name(), "Transport driver stopped");
    }
}

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::records::RecordSource;

use super::{FetchRequest, FetchResponse};

/// Thread-backed transport between a [`RecordFeed`](super::RecordFeed)
/// and a [`RecordSource`]. Fetches run on a single worker so the event
/// loop never blocks on the filesystem; results come back through
/// [`drain`](Self::drain) on the controller thread, which stays the only
/// mutator of feed state.
pub struct FeedRuntime {
    request_tx: Sender<FetchRequest>,
    response_rx: Receiver<FetchResponse>,
}

impl FeedRuntime {
    pub fn spawn(source: Box<dyn RecordSource>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<FetchRequest>();
        let (response_tx, response_rx) = unbounded();
        std::thread::Builder::new()
            .name("record-fetch".to_string())
            .spawn(move || {
                // Runs until the request sender (held by FeedRuntime) drops.
                for request in request_rx.iter() {
                    let result = source.fetch(request.period).map_err(|err| err.payload());
                    let response = FetchResponse {
                        seq: request.seq,
                        result,
                    };
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                tracing::debug!("record fetch worker shutting down");
            })
            .context("spawning record fetch worker")?;
        Ok(Self {
            request_tx,
            response_rx,
        })
    }

    pub fn dispatch(&self, request: FetchRequest) {
        if self.request_tx.send(request).is_err() {
            tracing::error!("record fetch worker is gone; dropping request");
        }
    }

    /// Collects every response that has arrived since the last call.
    pub fn drain(&self) -> Vec<FetchResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Blocking receive for callers that want to wait out an in-flight
    /// fetch. The TUI polls `drain` instead.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<FetchResponse> {
        self.response_rx.recv_timeout(timeout).ok()
    }
}

//! Background thread for running session fetches (native only)
//!
//! Hosts that want the UI thread to stay responsive hand `Effect::Fetch`
//! requests to a `FetchWorker` and poll it for results, which are then fed
//! back to the session as `Event::FetchCompleted`. Results come back in
//! completion order; the session's tag check takes care of stale ones.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::fetch::{FetchRequest, FetchResult};
use crate::service::DataService;

/// Service shared between the host and the worker thread.
pub type SharedService = Arc<dyn DataService + Send + Sync>;

/// Message sent to the worker thread.
enum ThreadMessage {
    Fetch(FetchRequest),
    Shutdown,
}

/// Manages a background thread that executes fetch requests.
pub struct FetchWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<FetchResult>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Ids of requests sent but not yet taken back
    pending: HashSet<u64>,
}

impl FetchWorker {
    /// Spawn a new worker thread.
    ///
    /// Returns `Err` if the thread fails to spawn.
    pub fn spawn(service: SharedService) -> Result<Self, String> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<FetchResult>();

        let thread_handle = thread::Builder::new()
            .name("session-fetch".to_string())
            .spawn(move || {
                log::info!("Fetch worker thread started");
                Self::thread_loop(service, request_rx, result_tx);
                log::info!("Fetch worker thread exiting");
            })
            .map_err(|e| format!("Failed to spawn fetch thread: {}", e))?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: HashSet::new(),
        })
    }

    fn thread_loop(
        service: SharedService,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<FetchResult>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Fetch(request)) => {
                    log::debug!(
                        "Fetching {} for region {}",
                        request.kind.name(),
                        request.tag.region_id
                    );
                    let result = request.execute(service.as_ref());
                    if result_tx.send(result).is_err() {
                        log::warn!("Result channel closed, fetch thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, fetch thread exiting");
                    break;
                }
            }
        }
    }

    /// Queue a request. Non-blocking.
    pub fn request(&mut self, request: FetchRequest) {
        let id = request.id;
        if self.request_tx.send(ThreadMessage::Fetch(request)).is_err() {
            log::error!("Failed to send fetch request {}: channel closed", id);
        } else {
            self.pending.insert(id);
        }
    }

    /// Wait up to `timeout` for the next completed result.
    pub fn wait_result(&mut self, timeout: Duration) -> Option<FetchResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.pending.remove(&result.id);
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Fetch thread disconnected");
                None
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down fetch worker thread");

        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take()
            && let Err(e) = handle.join()
        {
            log::warn!("Fetch thread panicked: {:?}", e);
        }
    }
}

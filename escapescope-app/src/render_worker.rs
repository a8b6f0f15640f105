use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::debug;

use escapescope_render::{render_scene, RenderCancel, RenderError, RenderResult, Scene};

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub(crate) struct RenderRequest {
    pub(crate) id: u64,
    pub(crate) scene: Scene,
}

pub(crate) struct RenderResponse {
    pub(crate) id: u64,
    pub(crate) result: std::result::Result<RenderResult, RenderError>,
}

/// Background thread that renders the most recent requested scene.
///
/// Each new request cancels the pass in flight; requests that queue up while
/// a pass runs are collapsed to the newest one.
pub(crate) struct RenderWorker {
    tx: mpsc::Sender<RenderRequest>,
    rx: mpsc::Receiver<RenderResponse>,
    cancel: Arc<RenderCancel>,
    latest_id: u64,
    handle: JoinHandle<()>,
}

impl RenderWorker {
    pub(crate) fn spawn() -> Result<Self> {
        let (tx_request, rx_request) = mpsc::channel::<RenderRequest>();
        let (tx_response, rx_response) = mpsc::channel::<RenderResponse>();
        let cancel = Arc::new(RenderCancel::new());

        let worker_cancel = Arc::clone(&cancel);
        let handle = std::thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || render_worker(rx_request, tx_response, worker_cancel))
            .map_err(AppError::Spawn)?;

        Ok(Self {
            tx: tx_request,
            rx: rx_response,
            cancel,
            latest_id: 0,
            handle,
        })
    }

    /// Queue `scene`, superseding anything requested before. Returns the
    /// request id.
    pub(crate) fn request(&mut self, scene: Scene) -> Result<u64> {
        self.cancel.cancel();
        self.latest_id += 1;
        debug!(id = self.latest_id, "Requesting render");
        self.tx
            .send(RenderRequest {
                id: self.latest_id,
                scene,
            })
            .map_err(|_| AppError::WorkerStopped)?;
        Ok(self.latest_id)
    }

    /// Block until the newest request has been rendered. Frames of older
    /// requests are dropped.
    pub(crate) fn wait_latest(&self) -> Result<RenderResult> {
        loop {
            let response = self.rx.recv().map_err(|_| AppError::WorkerStopped)?;
            if response.id != self.latest_id {
                debug!(id = response.id, latest = self.latest_id, "Dropping stale frame");
                continue;
            }
            return Ok(response.result?);
        }
    }

    /// Stop the worker thread once it has finished its current pass.
    pub(crate) fn shutdown(self) {
        drop(self.tx);
        if self.handle.join().is_err() {
            tracing::error!("Render worker panicked");
        }
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

fn drain_latest(initial: RenderRequest, rx: &mpsc::Receiver<RenderRequest>) -> RenderRequest {
    let mut req = initial;
    while let Ok(newer) = rx.try_recv() {
        debug!(skipped = req.id, "Collapsing queued render request");
        req = newer;
    }
    req
}

fn render_worker(
    rx: mpsc::Receiver<RenderRequest>,
    tx: mpsc::Sender<RenderResponse>,
    cancel: Arc<RenderCancel>,
) {
    debug!("Render worker started");
    while let Ok(initial) = rx.recv() {
        let req = drain_latest(initial, &rx);
        match render_scene(&req.scene, &cancel) {
            Err(RenderError::Cancelled) => {
                debug!(id = req.id, "Render superseded");
            }
            result => {
                if tx.send(RenderResponse { id: req.id, result }).is_err() {
                    return;
                }
            }
        }
    }
    debug!("Render worker exiting");
}

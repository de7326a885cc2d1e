// src/publisher.rs

//! Best-effort telemetry broadcaster.
//!
//! Every emitted event is framed as a JSON array `["<topic>", <payload>]`
//! followed by `\n` and pushed to every connected TCP subscriber.
//!
//! - **At most once**: no acknowledgment, no retry.
//! - **Lag tolerant**: a slow subscriber skips the frames it fell behind on.
//! - **Independent**: nothing here ever blocks the worker or its channels.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn};

use crate::errors::TelemetryError;
use crate::events::Event;

type Frame = Arc<[u8]>;

pub struct Publisher {
    local_addr: SocketAddr,
    tx: broadcast::Sender<Frame>,
    accept: JoinHandle<()>,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("local_addr", &self.local_addr)
            .field("subscribers", &self.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// Bind to `addr` and start accepting subscribers on `runtime`.
    ///
    /// `capacity` is the number of frames buffered for lagging subscribers
    /// (clamped to at least 1). Callable from blocking code.
    pub fn bind(addr: SocketAddr, capacity: usize, runtime: &Handle) -> std::io::Result<Self> {
        let std_listener = std::net::TcpListener::bind(addr)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(std_listener)?
        };

        let (tx, _rx) = broadcast::channel::<Frame>(capacity.max(1));
        let accept = runtime.spawn(accept_loop(listener, tx.clone()).with_current_subscriber());

        info!(%local_addr, "telemetry publisher bound");
        Ok(Self {
            local_addr,
            tx,
            accept,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Serialize and broadcast one event.
    pub fn publish(&self, event: &Event) -> Result<(), TelemetryError> {
        let mut frame = serde_json::to_vec(&(event.topic, &event.payload))?;
        frame.push(b'\n');
        self.tx
            .send(Frame::from(frame))
            .map_err(|_| TelemetryError::NoSubscribers)?;
        Ok(())
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

async fn accept_loop(listener: TcpListener, tx: broadcast::Sender<Frame>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "telemetry subscriber connected");
                let rx = tx.subscribe();
                tokio::spawn(serve_subscriber(stream, rx, peer).with_current_subscriber());
            }
            Err(e) => {
                warn!(error = %e, "failed to accept telemetry subscriber");
            }
        }
    }
}

async fn serve_subscriber(
    mut stream: TcpStream,
    mut rx: broadcast::Receiver<Frame>,
    peer: SocketAddr,
) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if let Err(e) = stream.write_all(&frame).await {
                    debug!(%peer, error = %e, "telemetry subscriber went away");
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(%peer, skipped, "telemetry subscriber lagging; frames skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

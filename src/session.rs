//! TCP line server for the text command protocol
//!
//! Each accepted connection gets a reader task, which forwards complete lines
//! to the runtime as [`SessionEvent`]s, and a writer task, which writes
//! outbound lines newline-terminated and flushes each one. The runtime decides
//! which connection is the active session.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::messages::Response;

/// How long closing a session waits for queued lines to be written
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Events delivered to the runtime loop
#[derive(Debug)]
pub enum SessionEvent {
    Connected(Session),
    Line { id: u64, line: String },
    Disconnected { id: u64 },
}

/// Writable side of a connected peer
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub peer: SocketAddr,
    outbound: mpsc::UnboundedSender<String>,
    writer: JoinHandle<()>,
}

impl Session {
    /// Queue one response line; false if the peer is gone
    pub fn send(&self, response: &Response) -> bool {
        self.outbound.send(response.to_string()).is_ok()
    }

    /// Stop accepting lines and wait for the queued ones to be written
    pub async fn close(self) {
        drop(self.outbound);
        if tokio::time::timeout(CLOSE_TIMEOUT, self.writer).await.is_err() {
            warn!("Timed out flushing responses to {}", self.peer);
        }
    }
}

/// Accept connections forever, forwarding their events to `events`
pub fn spawn_acceptor(listener: TcpListener, events: mpsc::Sender<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
                    info!("Client {} connected from {}", id, peer);
                    tokio::spawn(serve_connection(id, peer, stream, events.clone()));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
            if events.is_closed() {
                debug!("Runtime gone, acceptor exiting");
                break;
            }
        }
    })
}

async fn serve_connection(
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    events: mpsc::Sender<SessionEvent>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(line) = outbound_rx.recv().await {
            let framed = format!("{}\n", line);
            if let Err(e) = write_half.write_all(framed.as_bytes()).await {
                debug!("Write to client {} failed: {}", id, e);
                break;
            }
            if let Err(e) = write_half.flush().await {
                debug!("Flush to client {} failed: {}", id, e);
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let session = Session {
        id,
        peer,
        outbound,
        writer,
    };
    if events.send(SessionEvent::Connected(session)).await.is_err() {
        return;
    }

    // Lines are decoded lossily so one bad byte costs a line, not the session
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&buf);
                let line = decoded.trim_end_matches(['\n', '\r']);
                if line.trim().is_empty() {
                    continue;
                }
                let line = line.to_string();
                if events.send(SessionEvent::Line { id, line }).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Read from client {} failed: {}", id, e);
                break;
            }
        }
    }

    info!("Client {} disconnected", id);
    let _ = events.send(SessionEvent::Disconnected { id }).await;
}

//! # WebSocket Channel
//!
//! Native transport for one stream. Each connection is served by a dedicated
//! I/O worker thread that owns the socket:
//!
//! 1. The worker connects and reports [`ChannelEvent::Opened`].
//! 2. It alternates between flushing queued outbound text and polling the
//!    socket with a short read timeout, so sends are never stuck behind a
//!    blocking read.
//! 3. Each inbound text frame is split into lines; every non-empty line is
//!    forwarded as [`ChannelEvent::Message`].
//! 4. When the server closes, the socket fails, or the handle is closed, the
//!    worker reports [`ChannelEvent::Closed`] and exits.
//!
//! The handle kept by the sync core only holds the outbound queue and the
//! shared [`ChannelState`]; it never blocks.

use std::{
    io::ErrorKind,
    net::TcpStream,
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
};

use tungstenite::{stream::MaybeTlsStream, Message, WebSocket};
use web_time::Duration;

use super::{Channel, ChannelEvent, ChannelKind, ChannelState};
use crate::core::{
    error::{SyncError, SyncResult},
    MtResource,
};

/// How long a worker blocks on a read before checking its outbound queue.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(20);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// A WebSocket-backed [`Channel`].
pub struct WebSocketChannel {
    kind: ChannelKind,
    url: String,
    events: Sender<ChannelEvent>,
    state: MtResource<ChannelState>,
    outgoing: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Starts connecting to `url` in the background.
    ///
    /// Lifecycle and inbound traffic are reported on `events`.
    pub fn connect(kind: ChannelKind, url: &str, events: Sender<ChannelEvent>) -> Self {
        let mut channel = WebSocketChannel {
            kind,
            url: url.to_string(),
            events,
            state: MtResource::new(ChannelState::Closed),
            outgoing: None,
            worker: None,
        };
        channel.spawn_worker();
        channel
    }

    fn spawn_worker(&mut self) {
        let (outgoing_tx, outgoing_rx) = channel::<String>();
        let worker = Worker {
            kind: self.kind,
            url: self.url.clone(),
            events: self.events.clone(),
            state: self.state.clone(),
            outgoing: outgoing_rx,
        };

        self.state.set(ChannelState::Connecting);
        self.outgoing = Some(outgoing_tx);
        self.worker = Some(thread::spawn(move || worker.run()));
    }

    /// Stops the worker. A worker still inside the connect handshake is
    /// detached instead of joined; it exits on its own once the handshake
    /// resolves and it finds the outbound queue gone.
    fn join_worker(&mut self) {
        self.outgoing.take();
        let Some(worker) = self.worker.take() else {
            return;
        };
        if self.state() == ChannelState::Connecting {
            log::debug!("Detaching {} channel worker while connecting", self.kind);
            return;
        }
        if worker.join().is_err() {
            log::error!("{} channel worker panicked", self.kind);
        }
    }
}

impl Channel for WebSocketChannel {
    fn state(&self) -> ChannelState {
        self.state.load()
    }

    fn send_text(&self, text: String) -> SyncResult<()> {
        let unavailable = || SyncError::ChannelUnavailable { channel: self.kind };
        if !self.is_open() {
            return Err(unavailable());
        }
        self.outgoing
            .as_ref()
            .ok_or_else(unavailable)?
            .send(text)
            .map_err(|_| unavailable())
    }

    fn reconnect(&mut self) {
        if self.state() != ChannelState::Closed {
            return;
        }
        self.join_worker();
        log::info!("Reconnecting {} channel to {}", self.kind, self.url);
        self.spawn_worker();
    }

    fn close(&mut self) {
        self.join_worker();
        self.state.set(ChannelState::Closed);
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.join_worker();
    }
}

/// State moved onto the I/O thread.
struct Worker {
    kind: ChannelKind,
    url: String,
    events: Sender<ChannelEvent>,
    state: MtResource<ChannelState>,
    outgoing: Receiver<String>,
}

impl Worker {
    fn run(self) {
        match self.open_socket() {
            Ok(mut socket) => {
                self.state.set(ChannelState::Open);
                log::info!("{} channel connected to {}", self.kind, self.url);
                self.emit(ChannelEvent::Opened(self.kind));
                if let Err(e) = self.pump(&mut socket) {
                    log::warn!("{e}");
                }
            }
            Err(e) => log::warn!("{e}"),
        }

        self.state.set(ChannelState::Closed);
        self.emit(ChannelEvent::Closed(self.kind));
    }

    fn open_socket(&self) -> SyncResult<Socket> {
        let (socket, _response) =
            tungstenite::connect(self.url.as_str()).map_err(|e| self.transport_error(e))?;
        set_read_timeout(&socket, Some(READ_POLL_INTERVAL))
            .map_err(|e| self.transport_error(e))?;
        Ok(socket)
    }

    /// Runs until the peer closes, the socket fails, or the handle goes away.
    fn pump(&self, socket: &mut Socket) -> SyncResult<()> {
        loop {
            loop {
                match self.outgoing.try_recv() {
                    Ok(text) => socket
                        .send(Message::Text(text))
                        .map_err(|e| self.transport_error(e))?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::info!("Closing {} channel", self.kind);
                        let _ = socket.close(None);
                        let _ = socket.flush();
                        return Ok(());
                    }
                }
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
                        self.emit(ChannelEvent::Message(self.kind, line.to_string()));
                    }
                }
                Ok(Message::Close(frame)) => {
                    log::info!("{} channel closed by server: {frame:?}", self.kind);
                    return Ok(());
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed) => return Ok(()),
                Err(e) => return Err(self.transport_error(e)),
            }
        }
    }

    fn emit(&self, event: ChannelEvent) {
        // The loop only goes away during shutdown; nothing left to notify.
        let _ = self.events.send(event);
    }

    fn transport_error(&self, reason: impl std::fmt::Display) -> SyncError {
        SyncError::Transport {
            channel: self.kind,
            reason: reason.to_string(),
        }
    }
}

fn set_read_timeout(socket: &Socket, timeout: Option<Duration>) -> std::io::Result<()> {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(timeout),
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(timeout),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_endpoint_reports_closed() {
        let (events_tx, events_rx) = channel();
        let mut channel =
            WebSocketChannel::connect(ChannelKind::World, "ws://127.0.0.1:1", events_tx);

        let event = events_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(event, ChannelEvent::Closed(ChannelKind::World));
        assert_eq!(channel.state(), ChannelState::Closed);

        let err = channel.send_text("{}".to_string()).unwrap_err();
        assert!(matches!(err, SyncError::ChannelUnavailable { .. }));
        channel.close();
    }

    #[test]
    fn close_does_not_wait_for_a_pending_connect() {
        let (events_tx, _events_rx) = channel();
        let started = std::time::Instant::now();

        // Non-routable address: the TCP connect hangs until the OS gives up.
        let mut channel =
            WebSocketChannel::connect(ChannelKind::Roster, "ws://10.255.255.1:9", events_tx);
        channel.close();

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(channel.state(), ChannelState::Closed);
        drop(channel);
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }
}

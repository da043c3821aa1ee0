use std::{
    io::{BufRead, BufReader, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::mpsc,
    thread,
};

use crate::errors::{Error, Result};

pub const DEFAULT_GREETING: &str = "Welcome to the GoChat!\n\nWho are you?\n(stranger): ";
pub const DEFAULT_REPLY_PREFIX: &str = "Echo: ";

/// What the server observed on one of its connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    Connected { peer: SocketAddr },
    Line { peer: SocketAddr, line: String },
    Disconnected { peer: SocketAddr },
}

/// Line-oriented stand-in for a chat server: greets every connection, then
/// answers each received line with `prefix + line`.
pub struct GreeterServer {
    listen_addr: String,
    greeting: String,
    reply_prefix: String,
}

pub struct ServerHandle {
    pub local_addr: SocketAddr,
    events: Option<mpsc::Receiver<ServerEvent>>,
}

impl ServerHandle {
    pub fn take_events(&mut self) -> Result<mpsc::Receiver<ServerEvent>> {
        self.events.take().ok_or(Error::ServerEventsNotFound)
    }
}

impl GreeterServer {
    pub fn new(addr: String) -> Result<Self> {
        if !addr.contains(':') {
            return Err(Error::InvalidAddress(addr));
        }

        Ok(GreeterServer {
            listen_addr: addr,
            greeting: DEFAULT_GREETING.to_string(),
            reply_prefix: DEFAULT_REPLY_PREFIX.to_string(),
        })
    }

    /// An empty greeting makes the server wait silently for the first line.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_reply_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reply_prefix = prefix.into();
        self
    }

    /// Binds the listener and serves connections on a background thread.
    pub fn start(self) -> Result<ServerHandle> {
        let listener = TcpListener::bind(&self.listen_addr)?;
        let local_addr = listener.local_addr()?;
        let (tx, rx) = mpsc::channel::<ServerEvent>();

        log::info!("Server has started at: {local_addr}");

        thread::spawn(move || self.accept_loop(listener, tx));

        Ok(ServerHandle {
            local_addr,
            events: Some(rx),
        })
    }

    fn accept_loop(&self, listener: TcpListener, tx: mpsc::Sender<ServerEvent>) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let tx = tx.clone();
                    let greeting = self.greeting.clone();
                    let prefix = self.reply_prefix.clone();
                    thread::spawn(move || {
                        if let Err(e) = serve_connection(stream, &greeting, &prefix, &tx) {
                            log::warn!("Connection ended with error: {e}");
                        }
                    });
                }
                Err(e) => {
                    log::error!("Error at getting stream: {e}");
                }
            }
        }
    }
}

fn serve_connection(
    mut stream: TcpStream,
    greeting: &str,
    prefix: &str,
    tx: &mpsc::Sender<ServerEvent>,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    let _ = tx.send(ServerEvent::Connected { peer });
    log::debug!("Client {peer} connected");

    if !greeting.is_empty() {
        stream.write_all(greeting.as_bytes())?;
        stream.flush()?;
    }

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut buf = String::new();

    loop {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) | Err(_) => {
                log::debug!("Client {peer} has disconnected");
                let _ = tx.send(ServerEvent::Disconnected { peer });
                return Ok(());
            }
            Ok(_) => {
                let line = buf.trim_end_matches(['\r', '\n']).to_string();
                log::debug!("Client {peer} sent: {line:?}");

                stream.write_all(format!("{prefix}{line}\n").as_bytes())?;
                stream.flush()?;

                let _ = tx.send(ServerEvent::Line { peer, line });
            }
        }
    }
}

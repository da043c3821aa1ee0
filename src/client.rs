use std::io::{BufRead, ErrorKind, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;

use crate::errors::{Error, Result};
use crate::utils::{line_handling::*, StreamHandler};
use crate::{ProbeConfig, ReplyFraming};

const PROMPT: &str = "> ";

/// One open connection to the chat server. Dropping it shuts the socket down.
struct Session {
    stream: TcpStream,
    remote: String,
}

impl Session {
    fn open(config: &ProbeConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(Error::InvalidAddress(format!(":{}", config.port)));
        }

        let remote = format!("{}:{}", config.host, config.port);
        log::info!("Connecting to {remote}");

        let stream = TcpStream::connect((config.host.as_str(), config.port))?;
        stream.set_read_timeout(config.read_timeout)?;

        Ok(Session { stream, remote })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            log::warn!("Could not shut down connection to {}: {e}", self.remote);
        }
        log::info!("Connection to {} closed", self.remote);
    }
}

/// Drives one scripted-then-interactive conversation with a chat server.
pub struct ChatProbe {
    config: ProbeConfig,
}

impl ChatProbe {
    pub fn new(config: ProbeConfig) -> Self {
        ChatProbe { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Runs the session and reports any failure as a single output line
    /// instead of returning it.
    pub fn run_reported<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) {
        if let Err(e) = self.run(input, output) {
            log::error!("Session failed: {e}");
            if let Err(write_err) = writeln!(output, "An error occurred: {e}") {
                log::error!("Could not report failure: {write_err}");
            }
        }
    }

    /// Connects, authenticates, plays the scripted commands, then relays
    /// operator lines from `input` until an empty one arrives.
    pub fn run<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<()> {
        let mut session = Session::open(&self.config)?;
        writeln!(output, "Connected to the server.")?;

        self.converse(&mut session.stream, input, output)
            .map_err(|e| self.name_timeout(e))?;

        writeln!(output, "Session finished.")?;
        Ok(())
    }

    /// Names an expired receive by the configured timeout, not the
    /// kernel's rounded value.
    fn name_timeout(&self, err: Error) -> Error {
        match (err, self.config.read_timeout) {
            (Error::IO(e), Some(timeout)) if e.kind() == ErrorKind::TimedOut => {
                Error::ReceiveTimeout(timeout)
            }
            (err, _) => err,
        }
    }

    fn converse<S: StreamHandler, R: BufRead, W: Write>(
        &self,
        stream: &mut S,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        let greeting = receive_reply(stream, &self.config.framing, self.config.recv_buffer)?;
        writeln!(output, "Server: {greeting}")?;

        log::info!("Sending credentials");
        let credential = &self.config.credential;
        self.exchange(stream, &credential.username, output)?;
        self.exchange(stream, &credential.password, output)?;

        log::info!("Running {} scripted commands", self.config.commands.len());
        for command in &self.config.commands {
            self.exchange(stream, command, output)?;
        }

        log::info!("Entering interactive relay");
        while let Some(line) = read_operator_line(input, output)? {
            self.exchange(stream, &line, output)?;
        }

        Ok(())
    }

    /// One send followed by exactly one reply collection.
    fn exchange<S: StreamHandler, W: Write>(
        &self,
        stream: &mut S,
        line: &str,
        output: &mut W,
    ) -> Result<()> {
        send_line(stream, line)?;
        writeln!(output, "Client: {line}")?;

        if let ReplyFraming::FixedDelay(delay) = self.config.framing {
            thread::sleep(delay);
        }

        let reply = receive_reply(stream, &self.config.framing, self.config.recv_buffer)?;
        writeln!(output, "Server: {reply}")?;
        Ok(())
    }
}

/// Prompts for the next operator line. `None` ends the relay: either the
/// line is blank or the input is exhausted.
fn read_operator_line<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<String>> {
    write!(output, "{PROMPT}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    if line.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::control::AttenuatorTransport;
use crate::error::{AttenError, Result};
use crate::topology::ChannelId;

/// Line-oriented TCP transport to the attenuator matrix controller.
///
/// # Wire Protocol
///
/// One request line per connection, one reply line back:
///
/// ```text
/// GET <id>\n        ->  OK <db>\n
/// SET <id> <db>\n   ->  OK\n  (or OK <db>\n)
/// any request       ->  ERR <message>\n
/// ```
///
/// The connection is opened for a single transaction and dropped on every
/// exit path, so no controller session outlives a call.
pub struct TcpTransport {
    addr: String,
    timeout: Duration,
}

// Capture: 1) status word, 2) optional payload
const REPLY_LINE_RE: &str = r"^(OK|ERR)(?:\s+(.*?))?\s*$";

enum Reply {
    Ok(Option<String>),
    Err(String),
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Connect to the controller, trying each resolved address in turn.
    fn connect(&self, channel: ChannelId) -> Result<TcpStream> {
        let socket_addrs = self.addr.to_socket_addrs().map_err(|e| {
            AttenError::hardware(
                channel.get(),
                format!("cannot resolve controller '{}': {}", self.addr, e),
            )
        })?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                        .map_err(|e| {
                            AttenError::hardware(
                                channel.get(),
                                format!("cannot configure socket: {}", e),
                            )
                        })?;
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(addr = %socket_addr, error = %e, "controller connect failed");
                    last_err = Some(e);
                }
            }
        }

        Err(AttenError::hardware(
            channel.get(),
            match last_err {
                Some(e) => format!("controller {} unreachable: {}", self.addr, e),
                None => format!("controller {} resolved to no addresses", self.addr),
            },
        ))
    }

    /// Send one request line and read one reply line.
    fn transact(&self, channel: ChannelId, request: &str) -> Result<Reply> {
        let io_err = |what: &str, e: std::io::Error| {
            AttenError::hardware(channel.get(), format!("{} controller {}: {}", what, self.addr, e))
        };

        let mut stream = self.connect(channel)?;
        debug!(addr = %self.addr, request, "controller request");
        stream
            .write_all(format!("{}\n", request).as_bytes())
            .and_then(|_| stream.flush())
            .map_err(|e| io_err("write to", e))?;

        let mut line = String::new();
        let n = BufReader::new(&stream)
            .read_line(&mut line)
            .map_err(|e| io_err("read from", e))?;
        if n == 0 {
            return Err(AttenError::hardware(
                channel.get(),
                format!("controller {} closed the connection without replying", self.addr),
            ));
        }
        debug!(addr = %self.addr, reply = line.trim_end(), "controller reply");

        let re = Regex::new(REPLY_LINE_RE)
            .map_err(|e| AttenError::hardware(channel.get(), e.to_string()))?;
        let caps = re.captures(line.trim_end()).ok_or_else(|| {
            AttenError::hardware(
                channel.get(),
                format!("malformed controller reply {:?}", line.trim_end()),
            )
        })?;
        let payload = caps.get(2).map(|m| m.as_str().to_string());
        match &caps[1] {
            "OK" => Ok(Reply::Ok(payload.filter(|p| !p.is_empty()))),
            _ => Ok(Reply::Err(payload.unwrap_or_else(|| "unspecified".to_string()))),
        }
    }
}

fn parse_db(channel: ChannelId, value: &str) -> Result<f64> {
    value.parse::<f64>().map_err(|_| {
        AttenError::hardware(
            channel.get(),
            format!("malformed attenuation {:?} in controller reply", value),
        )
    })
}

impl AttenuatorTransport for TcpTransport {
    fn name(&self) -> &str {
        &self.addr
    }

    fn get_attenuation(&mut self, channel: ChannelId) -> Result<f64> {
        match self.transact(channel, &format!("GET {}", channel))? {
            Reply::Ok(Some(value)) => parse_db(channel, &value),
            Reply::Ok(None) => Err(AttenError::hardware(
                channel.get(),
                "controller reply to GET carried no value",
            )),
            Reply::Err(message) => Err(AttenError::hardware(channel.get(), message)),
        }
    }

    fn set_attenuation(&mut self, channel: ChannelId, db: f64) -> Result<Option<f64>> {
        match self.transact(channel, &format!("SET {} {}", channel, db))? {
            Reply::Ok(Some(value)) => parse_db(channel, &value).map(Some),
            Reply::Ok(None) => Ok(None),
            Reply::Err(message) => Err(AttenError::hardware(channel.get(), message)),
        }
    }
}

//! libcurl-backed [`Transport`]: one `Easy2` transfer per GET on its own thread.
//!
//! The handler collects header lines (reset on every `HTTP/` status line, so
//! only the terminal response survives redirects) and pushes body chunks
//! through a bounded channel. `get` returns as soon as the terminal headers
//! are known; the caller then pulls the body lazily.

use super::headers::{parse_http_status, ResponseHeaders};
use super::{Body, Response, Transport, TransportError};
use crate::config::HawserConfig;
use curl::easy::{Easy2, Handler, List, WriteError};
use std::collections::HashMap;
use std::io::{self, Read};
use std::str;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::Duration;

/// Body chunks buffered between the transfer thread and the reader.
const CHANNEL_DEPTH: usize = 16;

enum Event {
    Head { status: u32, headers: ResponseHeaders },
    Chunk(Vec<u8>),
    Done,
    Failed(curl::Error),
}

/// HTTP GET over libcurl with redirect following and configured timeouts.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    timeout: Duration,
    low_speed_limit: u32,
    low_speed_time: Duration,
    max_redirects: u32,
    user_agent: String,
}

impl CurlTransport {
    pub fn from_config(cfg: &HawserConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            max_redirects: cfg.max_redirects,
            user_agent: cfg.user_agent(),
        }
    }

    fn prepare(
        &self,
        url: &str,
        custom_headers: &HashMap<String, String>,
        handler: StreamHandler,
    ) -> Result<Easy2<StreamHandler>, curl::Error> {
        let mut easy = Easy2::new(handler);
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        easy.timeout(self.timeout)?;
        easy.useragent(&self.user_agent)?;

        let mut list = List::new();
        for (k, v) in custom_headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !custom_headers.is_empty() {
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl Transport for CurlTransport {
    fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<Response, TransportError> {
        let (tx, rx) = mpsc::sync_channel(CHANNEL_DEPTH);
        let easy = self.prepare(url, headers, StreamHandler::new(tx))?;

        thread::Builder::new()
            .name("hawser-get".to_string())
            .spawn(move || {
                let mut easy = easy;
                let result = easy.perform();
                easy.get_mut().finish(result);
            })
            .map_err(TransportError::Spawn)?;

        match rx.recv() {
            Ok(Event::Head { status, headers }) => Ok(Response {
                status,
                headers,
                body: Body::new(ChannelBody::new(rx)),
            }),
            Ok(Event::Failed(e)) => Err(TransportError::Curl(e)),
            Ok(Event::Chunk(_)) | Ok(Event::Done) | Err(_) => Err(TransportError::WorkerGone),
        }
    }
}

/// Easy2 handler that forwards the terminal response to a channel.
struct StreamHandler {
    tx: SyncSender<Event>,
    response_headers: Vec<String>,
    head_sent: bool,
    receiver_gone: bool,
}

impl StreamHandler {
    fn new(tx: SyncSender<Event>) -> Self {
        Self {
            tx,
            response_headers: Vec::new(),
            head_sent: false,
            receiver_gone: false,
        }
    }

    fn send(&mut self, event: Event) -> bool {
        if self.receiver_gone {
            return false;
        }
        if self.tx.send(event).is_err() {
            self.receiver_gone = true;
        }
        !self.receiver_gone
    }

    /// Current header block belongs to a redirect libcurl is about to follow.
    fn is_redirect(&self) -> bool {
        let status = parse_http_status(&self.response_headers).unwrap_or(0);
        (300..400).contains(&status)
            && ResponseHeaders::from_lines(&self.response_headers)
                .get("location")
                .is_some()
    }

    fn send_head(&mut self) -> bool {
        if self.head_sent {
            return !self.receiver_gone;
        }
        self.head_sent = true;
        let status = parse_http_status(&self.response_headers).unwrap_or(0);
        let headers = ResponseHeaders::from_lines(&self.response_headers);
        self.send(Event::Head { status, headers })
    }

    fn finish(&mut self, result: Result<(), curl::Error>) {
        match result {
            Ok(()) => {
                if self.send_head() {
                    self.send(Event::Done);
                }
            }
            Err(e) => {
                if self.receiver_gone {
                    tracing::debug!("transfer aborted after reader dropped: {}", e);
                    return;
                }
                self.send(Event::Failed(e));
            }
        }
    }
}

impl Handler for StreamHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if line.starts_with("HTTP/") {
                self.response_headers.clear();
            }
            self.response_headers.push(line.to_string());
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if !self.head_sent && self.is_redirect() {
            return Ok(data.len());
        }
        if !self.send_head() || !self.send(Event::Chunk(data.to_vec())) {
            return Ok(0); // abort transfer
        }
        Ok(data.len())
    }
}

/// Reader side of the channel: yields chunks in order.
struct ChannelBody {
    rx: Receiver<Event>,
    chunk: Vec<u8>,
    pos: usize,
    done: bool,
}

impl ChannelBody {
    fn new(rx: Receiver<Event>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
            done: false,
        }
    }
}

impl Read for ChannelBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.chunk.len() {
                let n = buf.len().min(self.chunk.len() - self.pos);
                buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done || buf.is_empty() {
                return Ok(0);
            }
            match self.rx.recv() {
                Ok(Event::Chunk(c)) => {
                    self.chunk = c;
                    self.pos = 0;
                }
                Ok(Event::Done) => self.done = true,
                Ok(Event::Failed(e)) => {
                    self.done = true;
                    return Err(io::Error::new(io::ErrorKind::Other, e));
                }
                Ok(Event::Head { .. }) => {}
                Err(_) => {
                    self.done = true;
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "transfer ended before body completed",
                    ));
                }
            }
        }
    }
}

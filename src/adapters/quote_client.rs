//! Live price quotes: request/response lookups plus a streaming push channel.
//!
//! The stream client is an explicit state machine owning a single socket
//! handle. On unexpected closure it reconnects once; a second drop is
//! reported as `Disconnected` and left to the caller. Reconciling
//! out-of-order or duplicate pushes is the consumer's concern.

use crate::domain::error::TradesyncError;
use crate::ports::config_port::ConfigPort;
use serde_json::Value;
use std::net::TcpStream;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://api.trademade.com/v1";
const DEFAULT_WS_URL: &str = "wss://ws.trademade.com/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    /// Unix seconds; 0 when the feed omits it.
    pub timestamp: i64,
}

fn field_f64(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_quote(value: &Value) -> Option<Quote> {
    let symbol = value
        .get("currency")
        .or_else(|| value.get("symbol"))?
        .as_str()?
        .to_string();
    Some(Quote {
        symbol,
        bid: field_f64(value, "bid"),
        ask: field_f64(value, "ask"),
        mid: field_f64(value, "mid"),
        timestamp: value.get("timestamp").and_then(Value::as_i64).unwrap_or(0),
    })
}

/// Accepts both response shapes: a bare quote object or `{"quotes": [...]}`.
fn parse_live_body(body: &Value) -> Vec<Quote> {
    match body.get("quotes").and_then(Value::as_array) {
        Some(quotes) => quotes.iter().filter_map(parse_quote).collect(),
        None => parse_quote(body).into_iter().collect(),
    }
}

pub struct QuoteApi {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl QuoteApi {
    pub fn new(base_url: String, api_key: String) -> Result<Self, TradesyncError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TradesyncError::Quote {
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesyncError> {
        let api_key = config
            .get_string("quotes", "api_key")
            .ok_or_else(|| TradesyncError::ConfigMissing {
                section: "quotes".into(),
                key: "api_key".into(),
            })?;
        let base_url = config
            .get_string("quotes", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, api_key)
    }

    fn live_endpoint(&self, symbols: &str) -> String {
        format!(
            "{}/live?currency={}&api_key={}",
            self.base_url, symbols, self.api_key
        )
    }

    fn fetch_live(&self, symbols: &str) -> Result<Vec<Quote>, TradesyncError> {
        let url = self.live_endpoint(symbols);
        let body: Value = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TradesyncError::Quote {
                reason: format!("live lookup failed: {e}"),
            })?
            .json()
            .map_err(|e| TradesyncError::Quote {
                reason: format!("invalid quote body: {e}"),
            })?;
        Ok(parse_live_body(&body))
    }

    pub fn live_price(&self, symbol: &str) -> Result<Quote, TradesyncError> {
        self.fetch_live(symbol)?
            .into_iter()
            .next()
            .ok_or_else(|| TradesyncError::Quote {
                reason: format!("no quote returned for {symbol}"),
            })
    }

    pub fn live_prices(&self, symbols: &[String]) -> Result<Vec<Quote>, TradesyncError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_live(&symbols.join(","))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Debug)]
pub enum QuoteEvent {
    Quote(Quote),
    Disconnected { reason: String },
}

pub struct QuoteStream {
    ws_url: String,
    api_key: String,
    symbols: Vec<String>,
    state: StreamState,
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    reconnect_used: bool,
}

impl QuoteStream {
    pub fn connect(
        ws_url: String,
        api_key: String,
        symbols: Vec<String>,
    ) -> Result<Self, TradesyncError> {
        let mut stream = QuoteStream {
            ws_url,
            api_key,
            symbols,
            state: StreamState::Disconnected,
            socket: None,
            reconnect_used: false,
        };
        stream.dial()?;
        Ok(stream)
    }

    pub fn from_config(
        config: &dyn ConfigPort,
        symbols: Vec<String>,
    ) -> Result<Self, TradesyncError> {
        let api_key = config
            .get_string("quotes", "api_key")
            .ok_or_else(|| TradesyncError::ConfigMissing {
                section: "quotes".into(),
                key: "api_key".into(),
            })?;
        let ws_url = config
            .get_string("quotes", "ws_url")
            .unwrap_or_else(|| DEFAULT_WS_URL.to_string());
        Self::connect(ws_url, api_key, symbols)
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    fn dial(&mut self) -> Result<(), TradesyncError> {
        self.state = StreamState::Connecting;
        let url = Url::parse(&format!("{}?api_key={}", self.ws_url, self.api_key)).map_err(
            |e| TradesyncError::Quote {
                reason: format!("invalid ws url: {e}"),
            },
        )?;

        let (mut socket, _response) =
            tungstenite::connect(url.as_str()).map_err(|e| TradesyncError::Quote {
                reason: format!("ws connect failed: {e}"),
            })?;

        let subscription = serde_json::json!({
            "userKey": self.api_key,
            "symbol": self.symbols.join(","),
        });
        socket
            .send(Message::Text(subscription.to_string()))
            .map_err(|e| TradesyncError::Quote {
                reason: format!("ws subscribe failed: {e}"),
            })?;

        self.socket = Some(socket);
        self.state = StreamState::Connected;
        Ok(())
    }

    /// Blocks until the next quote arrives or the stream gives up.
    /// Non-quote frames (acks, heartbeats) are skipped.
    pub fn next_event(&mut self) -> QuoteEvent {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                self.state = StreamState::Disconnected;
                return QuoteEvent::Disconnected {
                    reason: "not connected".into(),
                };
            };

            match socket.read() {
                Ok(Message::Text(text)) => {
                    if let Some(quote) = parse_push_message(&text) {
                        return QuoteEvent::Quote(quote);
                    }
                }
                Ok(Message::Ping(payload)) => {
                    let _ = socket.send(Message::Pong(payload));
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by server".into());
                    if !self.try_reconnect(&reason) {
                        return QuoteEvent::Disconnected { reason };
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let reason = e.to_string();
                    if !self.try_reconnect(&reason) {
                        return QuoteEvent::Disconnected { reason };
                    }
                }
            }
        }
    }

    /// One reconnect attempt per stream lifetime.
    fn try_reconnect(&mut self, reason: &str) -> bool {
        self.socket = None;
        if self.reconnect_used {
            self.state = StreamState::Disconnected;
            return false;
        }
        self.reconnect_used = true;
        self.state = StreamState::Reconnecting;
        log::warn!("quote stream dropped ({reason}), reconnecting");

        match self.dial() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("reconnect failed: {e}");
                self.state = StreamState::Disconnected;
                false
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
        }
        self.state = StreamState::Disconnected;
    }
}

/// Push frames carry the same shape as the REST response, keyed by symbol.
/// Anything that is not a quote object is ignored.
fn parse_push_message(text: &str) -> Option<Quote> {
    let value: Value = serde_json::from_str(text).ok()?;
    parse_quote(&value)
}

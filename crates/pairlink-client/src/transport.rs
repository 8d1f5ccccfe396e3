//! WebSocket and REST transport for the client.
//!
//! Provides [`PushHandle`] for the push channel and [`BackupSender`] for
//! the REST backup leg. Both are thin I/O layers that move wire events;
//! protocol logic remains in the Sans-IO [`Client`](crate::Client).

use pairlink_proto::{UserId, WireEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::event::ClientEvent;
use crate::rest::{BackupRequest, HttpMethod, ResponseKind, USER_ID_HEADER};
use crate::sharer::{AcquireConfig, LocationProvider};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Server base URL is not usable.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Backup-leg request failed.
    #[error("backup request failed: {0}")]
    Backup(#[from] reqwest::Error),
}

/// Handle to a live push channel.
///
/// Wire events are sent and received via the channels; an internal task
/// handles the WebSocket I/O and JSON framing.
pub struct PushHandle {
    /// Send events to the server.
    pub to_server: mpsc::Sender<WireEvent>,
    /// Receive events from the server.
    pub from_server: mpsc::Receiver<WireEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl PushHandle {
    /// Stop the connection task. Corresponds to the `Close` action.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open the push channel.
///
/// Resolving this future corresponds to the `TransportOpened` event; an
/// error corresponds to `TransportFailed`.
pub async fn connect(url: &str) -> Result<PushHandle, TransportError> {
    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<WireEvent>(32);
    let (from_server_tx, from_server_rx) = mpsc::channel::<WireEvent>(32);

    let handle = tokio::spawn(run_connection(stream, to_server_rx, from_server_tx));

    Ok(PushHandle {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the WebSocket.
async fn run_connection(
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    mut to_server: mpsc::Receiver<WireEvent>,
    from_server: mpsc::Sender<WireEvent>,
) {
    use futures_util::{SinkExt, StreamExt};

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outbound = to_server.recv() => match outbound {
                Some(event) => {
                    let text = match event.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping unencodable outbound event");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(error = %e, "push channel send failed");
                        break;
                    }
                }
                // Handle dropped: close the session cleanly
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },

            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => match WireEvent::from_json(&text) {
                    Ok(event) => {
                        if from_server.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping undecodable inbound frame");
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong handled by the library, binary ignored
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "push channel receive failed");
                    break;
                }
            },
        }
    }
}

/// Execute one `AcquireLocation` action against a position source.
///
/// The outcome is fed back as `LocationAcquired` or `LocationFailed`; the
/// client decides what happens to it, including dropping a fix that
/// resolved after sharing stopped.
pub async fn acquire_and_report<P: LocationProvider>(
    provider: &mut P,
    config: &AcquireConfig,
    events: &mpsc::Sender<ClientEvent>,
) {
    let event = match provider.acquire(config) {
        Ok(position) => ClientEvent::LocationAcquired { position },
        Err(e) => ClientEvent::LocationFailed { reason: e.to_string() },
    };
    let _ = events.send(event).await;
}

/// Fire-and-forget REST backup leg.
///
/// Executes `PostBackup` actions. Failures are logged and reported back as
/// `BackupSettled` events; nothing blocks or retries on this leg.
#[derive(Debug, Clone)]
pub struct BackupSender {
    http: reqwest::Client,
    base_url: Url,
    user_id: UserId,
}

impl BackupSender {
    /// Create a sender targeting `base_url`, identifying as `user_id`.
    pub fn new(base_url: Url, user_id: UserId) -> Self {
        Self { http: reqwest::Client::new(), base_url, user_id }
    }

    /// Execute one backup request, returning the response body when the
    /// route carries one worth decoding.
    pub async fn send(&self, request: &BackupRequest) -> Result<Option<String>, TransportError> {
        let url = self.base_url.join(&request.path)?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        };

        let mut builder =
            self.http.request(method, url).header(USER_ID_HEADER, self.user_id.to_string());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?.error_for_status()?;
        match request.response {
            ResponseKind::Empty => Ok(None),
            ResponseKind::Events | ResponseKind::Count => Ok(Some(response.text().await?)),
        }
    }

    /// Dispatch a backup request without waiting for it.
    ///
    /// A fetched response body is decoded per [`ResponseKind`] and fed back
    /// on the channel: events arrive one by one as `EventReceived` (the
    /// client's ledger drops the already-rendered ones), a count arrives as
    /// `UnreadCount`. The settlement arrives last as a `BackupSettled`
    /// event. The primary path never waits on this.
    pub fn dispatch(&self, request: BackupRequest, settled: mpsc::Sender<ClientEvent>) {
        let sender = self.clone();
        tokio::spawn(async move {
            let id = request.event_id;
            let result = match sender.send(&request).await {
                Ok(body) => deliver_body(&request, body.as_deref(), &settled).await,
                Err(e) => Err(e.to_string()),
            };
            if let Err(reason) = &result {
                tracing::warn!(%reason, path = %request.path, "backup request failed");
            }
            let _ = settled.send(ClientEvent::BackupSettled { id, result }).await;
        });
    }
}

/// Decode a fetched response body and feed it back as client events.
async fn deliver_body(
    request: &BackupRequest,
    body: Option<&str>,
    events: &mpsc::Sender<ClientEvent>,
) -> Result<(), String> {
    let Some(body) = body else {
        return Ok(());
    };

    match request.response {
        ResponseKind::Empty => Ok(()),
        ResponseKind::Events => {
            let decoded = WireEvent::list_from_json(body)
                .map_err(|e| format!("undecodable event list: {e}"))?;
            for event in decoded {
                if events.send(ClientEvent::EventReceived(event)).await.is_err() {
                    break;
                }
            }
            Ok(())
        }
        ResponseKind::Count => {
            let count = body
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("undecodable unread count: {e}"))?;
            let _ = events.send(ClientEvent::UnreadCount { count }).await;
            Ok(())
        }
    }
}

//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::{Transport, TransportEvent, TransportLink};
use crate::error::TransportError;
use crate::events::CLOSE_ABNORMAL;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens plain `ws://` links. TLS (`wss://`) is not built in.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn TransportLink>, TransportError> {
        let (ws, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        debug!(url, status = %response.status(), "websocket handshake complete");
        Ok(Box::new(WsLink { ws, closed: false }))
    }
}

struct WsLink {
    ws: WsStream,
    closed: bool,
}

fn closed_event(frame: Option<CloseFrame>) -> TransportEvent {
    match frame {
        Some(frame) => TransportEvent::Closed {
            code: u16::from(frame.code),
            reason: frame.reason.as_str().to_owned(),
        },
        None => TransportEvent::Closed {
            code: CLOSE_ABNORMAL,
            reason: String::new(),
        },
    }
}

#[async_trait]
impl TransportLink for WsLink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.ws
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> TransportEvent {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return TransportEvent::Text(text.as_str().to_owned());
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return TransportEvent::Text(text),
                    Err(_) => debug!(len = bytes.len(), "skipping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    self.closed = true;
                    return closed_event(frame);
                }
                // ping/pong control frames are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => return TransportEvent::Error(e.to_string()),
                None => {
                    self.closed = true;
                    return closed_event(None);
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "websocket close handshake failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    #[test]
    fn close_frame_maps_code_and_reason() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "server restart".into(),
        };
        assert_eq!(
            closed_event(Some(frame)),
            TransportEvent::Closed {
                code: 1001,
                reason: "server restart".into()
            }
        );
    }

    #[test]
    fn missing_close_frame_is_abnormal() {
        assert_matches!(closed_event(None), TransportEvent::Closed { code: 1006, .. });
    }

    #[tokio::test]
    async fn open_unreachable_endpoint_fails() {
        // port 9 (discard) on loopback is closed on test machines
        let result = WsTransport.open("ws://127.0.0.1:9/ws/s1").await;
        assert_matches!(
            result.err(),
            Some(TransportError::Connect { url, .. }) if url == "ws://127.0.0.1:9/ws/s1"
        );
    }

    #[tokio::test]
    async fn open_invalid_url_fails() {
        let result = WsTransport.open("not a url").await;
        assert_matches!(result.err(), Some(TransportError::Connect { .. }));
    }
}

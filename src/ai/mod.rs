//! # AI Provider Clients
//!
//! The bridge needs exactly four capabilities from a realtime voice provider:
//! connect, send audio, receive an audio/control event stream, and close.
//! `VoiceClient` captures that surface; `gemini` implements it over the
//! Gemini Live WebSocket API. The session never sees provider wire formats,
//! only `ServerEvent`s.

pub mod event;
pub mod gemini;

pub use event::ServerEvent;
pub use gemini::GeminiLiveClient;

use crate::config::AiConfig;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by a realtime voice client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    #[error("client is not connected")]
    NotConnected,

    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("message serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Capability surface of a realtime voice provider.
///
/// One client instance serves exactly one call; there is no pooling or
/// reconnection at this layer. `close` must be idempotent.
#[async_trait]
pub trait VoiceClient: Send {
    /// Open the provider session. Fails with `Auth`/`Connection` on
    /// credential or network problems; no retry loop lives here.
    async fn connect(&mut self) -> Result<(), ClientError>;

    /// Send one frame of little-endian PCM16 audio at the given rate.
    async fn send_audio(&mut self, pcm: &[u8], sample_rate_hz: u32) -> Result<(), ClientError>;

    /// Take the event stream. Yields events until the provider closes, then
    /// a final `ServerEvent::Closed`. Returns `None` if already taken or not
    /// connected.
    fn take_events(&mut self) -> Option<mpsc::Receiver<ServerEvent>>;

    /// Close the provider session. Safe to call more than once; cleanup
    /// failures are logged, never returned.
    async fn close(&mut self);
}

/// Build the configured provider's client.
pub fn create_client(config: &AiConfig) -> Result<Box<dyn VoiceClient>, ClientError> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiLiveClient::new(config.clone()))),
        other => Err(ClientError::UnsupportedProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_gemini_client() {
        let config = AiConfig {
            provider: "gemini".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            voice: "Aoede".to_string(),
            system_prompt: String::new(),
        };
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_factory_rejects_unknown_provider() {
        let config = AiConfig {
            provider: "unknown-provider".to_string(),
            gemini_api_key: String::new(),
            gemini_model: String::new(),
            voice: String::new(),
            system_prompt: String::new(),
        };
        match create_client(&config) {
            Err(ClientError::UnsupportedProvider(name)) => {
                assert_eq!(name, "unknown-provider");
            }
            other => panic!("expected UnsupportedProvider, got {:?}", other.map(|_| ())),
        }
    }
}

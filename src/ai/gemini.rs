//! # Gemini Live Client
//!
//! Implements `VoiceClient` over the Gemini Live bidirectional WebSocket API.
//!
//! ## Session Flow:
//! 1. **Connect**: open the wss endpoint with the API key, send the `setup`
//!    message (model, AUDIO response modality, voice, system instruction),
//!    wait for `setupComplete`
//! 2. **Stream**: a writer task drains a command channel onto the socket; a
//!    reader task decodes every server message into `ServerEvent`s
//! 3. **Close**: dropping the command channel makes the writer send a Close
//!    frame; the reader is then cancelled
//!
//! Audio is exchanged as base64 PCM16 inside JSON envelopes in both
//! directions.

use crate::ai::{ClientError, ServerEvent, VoiceClient};
use crate::config::AiConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

/// How many decoded events may queue before the reader applies backpressure.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Client for one Gemini Live voice session.
pub struct GeminiLiveClient {
    config: AiConfig,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    events: Option<mpsc::Receiver<ServerEvent>>,
    writer_task: Option<JoinHandle<()>>,
    reader_task: Option<JoinHandle<()>>,
}

impl GeminiLiveClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            outbound: None,
            events: None,
            writer_task: None,
            reader_task: None,
        }
    }

    fn setup_message(&self) -> SetupMessage {
        let system_instruction = if self.config.system_prompt.is_empty() {
            None
        } else {
            Some(Content {
                parts: vec![TextPart {
                    text: self.config.system_prompt.clone(),
                }],
            })
        };

        SetupMessage {
            setup: Setup {
                model: format!("models/{}", self.config.gemini_model),
                generation_config: GenerationConfig {
                    response_modalities: vec!["AUDIO".to_string()],
                    speech_config: SpeechConfig {
                        voice_config: VoiceConfig {
                            prebuilt_voice_config: PrebuiltVoiceConfig {
                                voice_name: self.config.voice.clone(),
                            },
                        },
                    },
                },
                system_instruction,
            },
        }
    }
}

#[async_trait]
impl VoiceClient for GeminiLiveClient {
    async fn connect(&mut self) -> Result<(), ClientError> {
        if self.outbound.is_some() {
            return Ok(());
        }
        if self.config.gemini_api_key.is_empty() {
            return Err(ClientError::Auth("GEMINI_API_KEY is not set".to_string()));
        }

        let url = format!("{}?key={}", LIVE_ENDPOINT, self.config.gemini_api_key);
        info!("Connecting to Gemini Live ({})", self.config.gemini_model);

        let (socket, _response) = connect_async(&url).await.map_err(|err| match err {
            tokio_tungstenite::tungstenite::Error::Http(response)
                if response.status().as_u16() == 401 || response.status().as_u16() == 403 =>
            {
                ClientError::Auth(format!("endpoint returned {}", response.status()))
            }
            other => ClientError::Transport(other),
        })?;

        let (mut write, mut read) = socket.split();

        let setup = serde_json::to_string(&self.setup_message())?;
        write.send(Message::Text(setup)).await?;

        // The first server message must acknowledge the setup.
        loop {
            match read.next().await {
                Some(Ok(msg)) => {
                    let Some(text) = message_text(&msg) else {
                        continue;
                    };
                    let parsed: ServerMessage = serde_json::from_str(&text)?;
                    if parsed.setup_complete.is_some() {
                        break;
                    }
                    return Err(ClientError::Protocol(
                        "expected setupComplete as the first server message".to_string(),
                    ));
                }
                Some(Err(err)) => return Err(ClientError::Transport(err)),
                None => {
                    return Err(ClientError::Connection(
                        "stream closed during session setup".to_string(),
                    ))
                }
            }
        }

        info!("Connected to Gemini Live");

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(EVENT_CHANNEL_CAPACITY);

        // Writer: sole owner of the socket's sink. Ends when the command
        // channel is dropped, flushing a Close frame on the way out.
        self.writer_task = Some(tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                if let Err(err) = write.send(message).await {
                    warn!("Gemini send failed: {}", err);
                    return;
                }
            }
            if let Err(err) = write.send(Message::Close(None)).await {
                debug!("close frame not delivered: {}", err);
            }
        }));

        // Reader: decodes every server message into ServerEvents and always
        // terminates the stream with Closed.
        self.reader_task = Some(tokio::spawn(async move {
            while let Some(result) = read.next().await {
                match result {
                    Ok(Message::Close(_)) => break,
                    Ok(msg) => {
                        let Some(text) = message_text(&msg) else {
                            continue;
                        };
                        match decode_server_message(&text) {
                            Ok(events) => {
                                for event in events {
                                    if event_tx.send(event).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(err) => {
                                warn!("Discarding undecodable Gemini message: {}", err);
                            }
                        }
                    }
                    Err(err) => {
                        warn!("Gemini stream error: {}", err);
                        break;
                    }
                }
            }
            let _ = event_tx.send(ServerEvent::Closed).await;
        }));

        self.outbound = Some(out_tx);
        self.events = Some(event_rx);
        Ok(())
    }

    async fn send_audio(&mut self, pcm: &[u8], sample_rate_hz: u32) -> Result<(), ClientError> {
        let sender = self.outbound.as_ref().ok_or(ClientError::NotConnected)?;

        let input = RealtimeInputMessage {
            realtime_input: RealtimeInput {
                media_chunks: vec![MediaChunk {
                    mime_type: format!("audio/pcm;rate={}", sample_rate_hz),
                    data: BASE64.encode(pcm),
                }],
            },
        };

        let json = serde_json::to_string(&input)?;
        sender
            .send(Message::Text(json))
            .map_err(|_| ClientError::NotConnected)
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<ServerEvent>> {
        self.events.take()
    }

    async fn close(&mut self) {
        // Dropping the command channel ends the writer, which sends the
        // Close frame. Idempotent: every handle is taken.
        self.outbound.take();

        if let Some(writer) = self.writer_task.take() {
            if tokio::time::timeout(Duration::from_secs(2), writer)
                .await
                .is_err()
            {
                debug!("Gemini writer did not stop in time");
            }
        }

        if let Some(reader) = self.reader_task.take() {
            reader.abort();
            let _ = reader.await;
        }

        info!("Disconnected from Gemini Live");
    }
}

/// Extract the JSON text from a frame; Gemini delivers JSON as both text and
/// binary frames.
fn message_text(msg: &Message) -> Option<String> {
    match msg {
        Message::Text(text) => Some(text.clone()),
        Message::Binary(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Decode one server envelope into the events it carries, in wire order.
fn decode_server_message(text: &str) -> Result<Vec<ServerEvent>, serde_json::Error> {
    let message: ServerMessage = serde_json::from_str(text)?;
    let mut events = Vec::new();

    if let Some(content) = message.server_content {
        if let Some(turn) = content.model_turn {
            for part in turn.parts {
                if let Some(inline) = part.inline_data {
                    match BASE64.decode(&inline.data) {
                        Ok(bytes) => events.push(ServerEvent::Audio(bytes)),
                        Err(err) => warn!("Discarding audio part with bad base64: {}", err),
                    }
                }
                if let Some(text) = part.text {
                    events.push(ServerEvent::Text(text));
                }
            }
        }
        if content.turn_complete {
            events.push(ServerEvent::TurnComplete);
        }
    }

    if let Some(tool_call) = message.tool_call {
        for call in tool_call.function_calls {
            events.push(ServerEvent::ToolCall(call.name));
        }
    }

    Ok(events)
}

// --- Wire format ---

#[derive(Serialize)]
struct SetupMessage {
    setup: Setup,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Setup {
    model: String,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInputMessage {
    realtime_input: RealtimeInput,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInput {
    media_chunks: Vec<MediaChunk>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaChunk {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    setup_complete: Option<serde_json::Value>,
    server_content: Option<ServerContent>,
    tool_call: Option<ToolCallPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    #[serde(default)]
    turn_complete: bool,
}

#[derive(Deserialize)]
struct ModelTurn {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolCallPayload {
    #[serde(default)]
    function_calls: Vec<FunctionCall>,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
}

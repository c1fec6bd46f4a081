//! # Telephony Media Stream Session
//!
//! Bridges one phone call to one realtime AI voice session. The telephony
//! platform connects a WebSocket to `/media-stream` and exchanges JSON
//! envelopes carrying base64 μ-law audio; the AI leg speaks PCM16 through a
//! `VoiceClient`.
//!
//! ## Session Protocol (telephony side):
//! 1. `{"event":"connected"}` — informational
//! 2. `{"event":"start","start":{...}}` — supplies the stream correlation id
//! 3. `{"event":"media","media":{"payload":...}}` — 20ms μ-law chunks
//! 4. `{"event":"stop"}` — caller hung up
//!
//! ## Concurrency:
//! The actor's mailbox is the single writer to the telephony socket. Two
//! concurrent activities feed it: the inbound pump (this actor's message
//! handler, strictly ordered) and the outbound pump (a spawned task draining
//! the AI event stream). Each direction owns its resample state; the frame
//! buffer belongs to the inbound direction only.
//!
//! ## Lifecycle:
//! `AwaitingStart → Active → Closing → Closed`. The AI connection is opened
//! as soon as the telephony socket connects; the `start` message only
//! supplies the correlation id. AI audio that arrives before the id is known
//! is dropped, not buffered. Teardown aborts and awaits the pumps before the
//! AI connection is closed.

use crate::ai::{self, ServerEvent, VoiceClient};
use crate::audio::buffer::FrameBuffer;
use crate::audio::codec::{decode_ulaw, encode_ulaw};
use crate::audio::resampler::{resample, ResampleState};
use crate::audio::{pcm_bytes_to_samples, samples_to_pcm_bytes};
use crate::config::AppConfig;
use crate::state::AppState;

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How often the actor pings the telephony peer.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// How long without any pong before the connection is considered dead.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLifecycle {
    /// Socket open, stream-start not yet received
    AwaitingStart,
    /// Correlation id known, audio flowing both ways
    Active,
    /// Teardown initiated, pumps being stopped
    Closing,
    /// Pumps stopped and the AI connection closed
    Closed,
}

impl CallLifecycle {
    pub fn as_str(&self) -> &str {
        match self {
            CallLifecycle::AwaitingStart => "awaiting_start",
            CallLifecycle::Active => "active",
            CallLifecycle::Closing => "closing",
            CallLifecycle::Closed => "closed",
        }
    }

    /// Media is only transcoded while the session is active; anything
    /// arriving before `start` or after teardown began is ignored.
    pub fn accepts_media(&self) -> bool {
        matches!(self, CallLifecycle::Active)
    }
}

/// Inbound messages from the telephony peer, tagged by the `event` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioMessage {
    /// Socket-level acknowledgement, no state change
    Connected,

    /// Stream metadata; carries the correlation id and caller parameters
    Start { start: StreamStart },

    /// One chunk of inbound call audio
    Media { media: MediaEnvelope },

    /// The platform ended the stream
    Stop,

    /// Any event kind this bridge does not consume (e.g. `mark`)
    #[serde(other)]
    Unknown,
}

/// Payload of the `start` event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

/// Base64 μ-law audio envelope, shared by both directions.
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaEnvelope {
    pub payload: String,
}

/// Outbound media message addressed to the call's stream.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundMediaMessage<'a> {
    event: &'a str,
    stream_sid: &'a str,
    media: MediaEnvelope,
}

/// WebSocket actor owning one call.
pub struct MediaStreamSession {
    /// Shared service state (metrics)
    state: web::Data<AppState>,

    /// Configuration snapshot taken at connect time
    config: AppConfig,

    /// Internal correlation id for log lines before the stream sid is known
    call_id: Uuid,

    lifecycle: CallLifecycle,

    /// Correlation id assigned by the telephony peer in the start message
    stream_sid: Option<String>,

    /// Caller id from the start message's custom parameters (best effort)
    caller: String,

    /// Interpolation carry-over for the telephony→AI direction
    inbound_resample: ResampleState,

    /// Accumulates converted inbound PCM into provider-sized frames
    frame_buffer: FrameBuffer,

    /// Feeds full frames to the AI sender task
    frame_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,

    /// The AI leg, shared with the sender task
    client: Option<Arc<Mutex<Box<dyn VoiceClient>>>>,

    /// Outbound pump draining the AI event stream
    pump_task: Option<JoinHandle<()>>,

    /// Task forwarding buffered frames to the AI leg
    sender_task: Option<JoinHandle<()>>,

    last_heartbeat: Instant,
}

impl MediaStreamSession {
    pub fn new(state: web::Data<AppState>) -> Self {
        let config = state.get_config();
        let frame_buffer = FrameBuffer::new(config.audio.frame_threshold_bytes);

        Self {
            state,
            config,
            call_id: Uuid::new_v4(),
            lifecycle: CallLifecycle::AwaitingStart,
            stream_sid: None,
            caller: "unknown".to_string(),
            inbound_resample: ResampleState::default(),
            frame_buffer,
            frame_tx: None,
            client: None,
            pump_task: None,
            sender_task: None,
            last_heartbeat: Instant::now(),
        }
    }

    /// Open the AI leg in the background and hand the result back to the
    /// actor as an `AiConnected` message.
    fn spawn_ai_connect(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let addr = ctx.address();
        let ai_config = self.config.ai.clone();
        let call_id = self.call_id;

        tokio::spawn(async move {
            let mut client = match ai::create_client(&ai_config) {
                Ok(client) => client,
                Err(err) => {
                    addr.do_send(AiLegClosed {
                        error: Some(err.to_string()),
                    });
                    return;
                }
            };

            if let Err(err) = client.connect().await {
                addr.do_send(AiLegClosed {
                    error: Some(err.to_string()),
                });
                return;
            }

            let Some(events) = client.take_events() else {
                addr.do_send(AiLegClosed {
                    error: Some("AI event stream unavailable".to_string()),
                });
                return;
            };

            debug!(call_id = %call_id, "AI leg connected");
            addr.do_send(AiConnected {
                client: Arc::new(Mutex::new(client)),
                events,
            });
        });
    }

    fn handle_start(&mut self, start: StreamStart) {
        if self.lifecycle != CallLifecycle::AwaitingStart {
            debug!(
                call_id = %self.call_id,
                lifecycle = self.lifecycle.as_str(),
                "Ignoring duplicate start message"
            );
            return;
        }

        self.caller = start
            .custom_parameters
            .get("caller")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            call_id = %self.call_id,
            stream_sid = %start.stream_sid,
            caller = %self.caller,
            "Stream started"
        );
        self.stream_sid = Some(start.stream_sid);
        self.lifecycle = CallLifecycle::Active;
    }

    /// Inbound pump: decode one telephony media payload, convert it, and
    /// forward any completed frames to the AI leg. A malformed payload is
    /// logged and skipped; the session continues.
    fn handle_media(&mut self, payload: &str) {
        if !self.lifecycle.accepts_media() {
            debug!(
                call_id = %self.call_id,
                lifecycle = self.lifecycle.as_str(),
                "Ignoring media message"
            );
            return;
        }

        let (pcm_bytes, next_state) = match transcode_inbound(
            payload,
            self.config.audio.telephony_rate,
            self.config.audio.input_rate,
            self.inbound_resample,
        ) {
            Ok(converted) => converted,
            Err(err) => {
                warn!(call_id = %self.call_id, "Skipping malformed media payload: {}", err);
                return;
            }
        };

        self.inbound_resample = next_state;
        self.frame_buffer.push(&pcm_bytes);

        // Until the AI leg is up, audio keeps accumulating and is flushed as
        // full frames once the sender channel exists.
        if let Some(tx) = &self.frame_tx {
            while let Some(frame) = self.frame_buffer.drain() {
                if tx.send(frame).is_err() {
                    debug!(call_id = %self.call_id, "AI sender stopped; dropping frame");
                    break;
                }
            }
        }
    }

    fn begin_close(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if self.lifecycle != CallLifecycle::Closed {
            self.lifecycle = CallLifecycle::Closing;
        }
        ctx.stop();
    }
}

/// AI leg established; carries the client handle and its event stream.
#[derive(Message)]
#[rtype(result = "()")]
struct AiConnected {
    client: Arc<Mutex<Box<dyn VoiceClient>>>,
    events: mpsc::Receiver<ServerEvent>,
}

/// One converted outbound audio payload ready to send to the caller.
#[derive(Message)]
#[rtype(result = "()")]
struct OutboundMedia {
    payload: String,
}

/// The AI leg ended — normally (`error: None`) or not.
#[derive(Message)]
#[rtype(result = "()")]
struct AiLegClosed {
    error: Option<String>,
}

impl Actor for MediaStreamSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(call_id = %self.call_id, "Telephony WebSocket connected");
        self.state.increment_active_calls();

        // Keep the socket alive and detect dead peers.
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(call_id = %act.call_id, "Telephony heartbeat timeout, closing session");
                act.begin_close(ctx);
            } else {
                ctx.ping(b"");
            }
        });

        self.spawn_ai_connect(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.lifecycle = CallLifecycle::Closing;
        self.state.decrement_active_calls();

        let pump = self.pump_task.take();
        let sender = self.sender_task.take();
        let client = self.client.take();
        drop(self.frame_tx.take());
        self.frame_buffer.clear();
        let call_id = self.call_id;

        tokio::spawn(async move {
            // The pumps must be fully stopped before the AI connection goes
            // away, or a still-running pump could race the close.
            if let Some(handle) = pump {
                handle.abort();
                let _ = handle.await;
            }
            if let Some(handle) = sender {
                handle.abort();
                let _ = handle.await;
            }
            if let Some(client) = client {
                client.lock().await.close().await;
            }
            info!(call_id = %call_id, "Media stream session closed");
        });

        self.lifecycle = CallLifecycle::Closed;
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for MediaStreamSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<TwilioMessage>(&text) {
                Ok(TwilioMessage::Connected) => {
                    info!(call_id = %self.call_id, "Telephony stream connected");
                }
                Ok(TwilioMessage::Start { start }) => {
                    self.handle_start(start);
                }
                Ok(TwilioMessage::Media { media }) => {
                    self.handle_media(&media.payload);
                }
                Ok(TwilioMessage::Stop) => {
                    info!(call_id = %self.call_id, caller = %self.caller, "Stream stopped");
                    self.begin_close(ctx);
                }
                Ok(TwilioMessage::Unknown) => {
                    debug!(call_id = %self.call_id, "Ignoring unhandled telephony event");
                }
                Err(err) => {
                    warn!(call_id = %self.call_id, "Discarding malformed telephony message: {}", err);
                }
            },
            Ok(ws::Message::Binary(_)) => {
                warn!(call_id = %self.call_id, "Unexpected binary frame from telephony peer");
            }
            Ok(ws::Message::Ping(data)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                // The caller hanging up is the normal end of a session.
                info!(call_id = %self.call_id, ?reason, "Telephony WebSocket closed");
                self.begin_close(ctx);
            }
            Ok(ws::Message::Continuation(_)) => {
                warn!(call_id = %self.call_id, "Unexpected continuation frame");
            }
            Ok(ws::Message::Nop) => {}
            Err(err) => {
                error!(call_id = %self.call_id, "Telephony protocol error: {}", err);
                self.begin_close(ctx);
            }
        }
    }
}

impl Handler<AiConnected> for MediaStreamSession {
    type Result = ();

    fn handle(&mut self, msg: AiConnected, ctx: &mut Self::Context) {
        if matches!(
            self.lifecycle,
            CallLifecycle::Closing | CallLifecycle::Closed
        ) {
            // The caller hung up while the AI leg was still connecting.
            debug!(call_id = %self.call_id, "Discarding AI connection for ended session");
            let client = msg.client;
            tokio::spawn(async move {
                client.lock().await.close().await;
            });
            return;
        }

        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let input_rate = self.config.audio.input_rate;
        let sender_client = Arc::clone(&msg.client);
        let sender_addr = ctx.address();
        let call_id = self.call_id;

        // Sender task: sole caller of send_audio, preserving frame order.
        self.sender_task = Some(tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                let mut guard = sender_client.lock().await;
                if let Err(err) = guard.send_audio(&frame, input_rate).await {
                    warn!(call_id = %call_id, "AI send failed: {}", err);
                    sender_addr.do_send(AiLegClosed {
                        error: Some(err.to_string()),
                    });
                    return;
                }
            }
        }));

        self.pump_task = Some(tokio::spawn(run_outbound_pump(
            msg.events,
            ctx.address(),
            self.config.audio.output_rate,
            self.config.audio.telephony_rate,
            self.call_id,
        )));

        self.client = Some(msg.client);
        self.frame_tx = Some(frame_tx);
        info!(call_id = %self.call_id, "AI leg ready");
    }
}

impl Handler<OutboundMedia> for MediaStreamSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundMedia, ctx: &mut Self::Context) {
        if !self.lifecycle.accepts_media() {
            debug!(
                call_id = %self.call_id,
                lifecycle = self.lifecycle.as_str(),
                "Dropping AI audio chunk"
            );
            return;
        }
        let Some(stream_sid) = self.stream_sid.as_deref() else {
            debug!(call_id = %self.call_id, "Dropping AI audio chunk, stream id unknown");
            return;
        };

        let message = OutboundMediaMessage {
            event: "media",
            stream_sid,
            media: MediaEnvelope {
                payload: msg.payload,
            },
        };

        match serde_json::to_string(&message) {
            Ok(json) => ctx.text(json),
            Err(err) => warn!(call_id = %self.call_id, "Failed to encode media message: {}", err),
        }
    }
}

impl Handler<AiLegClosed> for MediaStreamSession {
    type Result = ();

    fn handle(&mut self, msg: AiLegClosed, ctx: &mut Self::Context) {
        match msg.error {
            Some(err) => error!(call_id = %self.call_id, "AI leg failed: {}", err),
            None => info!(call_id = %self.call_id, "AI leg closed"),
        }
        self.begin_close(ctx);
    }
}

/// Outbound pump: converts every AI audio chunk to a telephony media payload
/// and hands it to the actor, which owns the socket writes. Runs until the
/// event stream ends or the session aborts it at teardown.
async fn run_outbound_pump(
    events: mpsc::Receiver<ServerEvent>,
    addr: Addr<MediaStreamSession>,
    from_rate: u32,
    to_rate: u32,
    call_id: Uuid,
) {
    let mut events = ReceiverStream::new(events);
    let mut state = ResampleState::default();
    let mut chunks_forwarded: u64 = 0;

    while let Some(event) = events.next().await {
        match event {
            ServerEvent::Audio(pcm) => {
                match transcode_outbound(&pcm, from_rate, to_rate, state) {
                    Ok((payload, next_state)) => {
                        state = next_state;
                        addr.do_send(OutboundMedia { payload });
                        chunks_forwarded += 1;
                        if chunks_forwarded % 20 == 1 {
                            debug!(
                                call_id = %call_id,
                                chunks = chunks_forwarded,
                                "Forwarding AI audio to caller"
                            );
                        }
                    }
                    Err(err) => {
                        warn!(call_id = %call_id, "Skipping malformed AI audio chunk: {}", err);
                    }
                }
            }
            ServerEvent::TurnComplete => {
                debug!(call_id = %call_id, "AI turn complete");
            }
            ServerEvent::Text(text) => {
                debug!(call_id = %call_id, text = %text, "AI text part");
            }
            ServerEvent::ToolCall(name) => {
                debug!(call_id = %call_id, tool = %name, "Ignoring AI tool call");
            }
            ServerEvent::Closed => {
                addr.do_send(AiLegClosed { error: None });
                break;
            }
        }
    }
}

/// Telephony payload → provider PCM: base64 → μ-law → PCM16 @8k → PCM16 at
/// the provider input rate, as little-endian bytes.
fn transcode_inbound(
    payload_b64: &str,
    from_rate: u32,
    to_rate: u32,
    state: ResampleState,
) -> Result<(Vec<u8>, ResampleState), String> {
    let ulaw = BASE64
        .decode(payload_b64)
        .map_err(|err| format!("invalid base64: {}", err))?;
    let pcm = decode_ulaw(&ulaw);
    let (converted, next_state) = resample(&pcm, from_rate, to_rate, state);
    Ok((samples_to_pcm_bytes(&converted), next_state))
}

/// Provider PCM → telephony payload: PCM16 at the provider output rate →
/// PCM16 @8k → μ-law → base64.
fn transcode_outbound(
    pcm_bytes: &[u8],
    from_rate: u32,
    to_rate: u32,
    state: ResampleState,
) -> Result<(String, ResampleState), String> {
    let samples = pcm_bytes_to_samples(pcm_bytes)?;
    let (converted, next_state) = resample(&samples, from_rate, to_rate, state);
    let ulaw = encode_ulaw(&converted);
    Ok((BASE64.encode(&ulaw), next_state))
}

/// WebSocket endpoint handler: upgrades the HTTP request and starts one
/// session actor for the call.
pub async fn media_stream(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    info!(
        "New media stream connection from {:?}",
        req.connection_info().peer_addr()
    );
    let session = MediaStreamSession::new(app_state);
    ws::start(session, &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connected_message() {
        let msg: TwilioMessage = serde_json::from_str(r#"{"event":"connected"}"#).unwrap();
        assert!(matches!(msg, TwilioMessage::Connected));
    }

    #[test]
    fn test_parse_start_message() {
        let json = r#"{
            "event": "start",
            "start": {
                "streamSid": "MZ123456789",
                "accountSid": "AC123",
                "callSid": "CA123",
                "customParameters": {"caller": "+1234567890"}
            }
        }"#;
        let msg: TwilioMessage = serde_json::from_str(json).unwrap();
        match msg {
            TwilioMessage::Start { start } => {
                assert_eq!(start.stream_sid, "MZ123456789");
                assert_eq!(
                    start.custom_parameters.get("caller").map(String::as_str),
                    Some("+1234567890")
                );
            }
            other => panic!("expected start, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_start_without_custom_parameters() {
        let json = r#"{"event":"start","start":{"streamSid":"MZ1"}}"#;
        let msg: TwilioMessage = serde_json::from_str(json).unwrap();
        match msg {
            TwilioMessage::Start { start } => {
                assert!(start.custom_parameters.is_empty());
            }
            other => panic!("expected start, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_media_message() {
        let json = r#"{
            "event": "media",
            "media": {"payload": "//8=", "timestamp": "12345", "chunk": "1"},
            "streamSid": "MZ123456789"
        }"#;
        let msg: TwilioMessage = serde_json::from_str(json).unwrap();
        match msg {
            TwilioMessage::Media { media } => assert_eq!(media.payload, "//8="),
            other => panic!("expected media, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_stop_and_unknown_messages() {
        let msg: TwilioMessage =
            serde_json::from_str(r#"{"event":"stop","streamSid":"MZ1"}"#).unwrap();
        assert!(matches!(msg, TwilioMessage::Stop));

        let msg: TwilioMessage =
            serde_json::from_str(r#"{"event":"mark","mark":{"name":"x"}}"#).unwrap();
        assert!(matches!(msg, TwilioMessage::Unknown));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(serde_json::from_str::<TwilioMessage>("{not json").is_err());
    }

    #[test]
    fn test_outbound_message_shape() {
        let message = OutboundMediaMessage {
            event: "media",
            stream_sid: "MZ123456789",
            media: MediaEnvelope {
                payload: "AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["event"], "media");
        assert_eq!(json["streamSid"], "MZ123456789");
        assert_eq!(json["media"]["payload"], "AAAA");
    }

    #[test]
    fn test_lifecycle_media_gating() {
        assert!(!CallLifecycle::AwaitingStart.accepts_media());
        assert!(CallLifecycle::Active.accepts_media());
        assert!(!CallLifecycle::Closing.accepts_media());
        assert!(!CallLifecycle::Closed.accepts_media());
    }

    #[test]
    fn test_transcode_inbound_silence() {
        // 160 μ-law silence bytes = 20ms at 8kHz; upsampling to 16kHz doubles
        // the sample count, two bytes each.
        let payload = BASE64.encode(vec![0xFFu8; 160]);
        let (pcm, _) =
            transcode_inbound(&payload, 8000, 16000, ResampleState::default()).unwrap();
        assert_eq!(pcm.len(), 640);

        let samples = pcm_bytes_to_samples(&pcm).unwrap();
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak < 100, "silence came out loud: {}", peak);
    }

    #[test]
    fn test_transcode_inbound_rejects_bad_base64() {
        let err = transcode_inbound("not base64!!!", 8000, 16000, ResampleState::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_transcode_outbound_downsamples_three_to_one() {
        // 240 samples at 24kHz → 80 μ-law bytes at 8kHz.
        let pcm_bytes = vec![0u8; 480];
        let (payload, _) =
            transcode_outbound(&pcm_bytes, 24000, 8000, ResampleState::default()).unwrap();
        let ulaw = BASE64.decode(payload).unwrap();
        assert_eq!(ulaw.len(), 80);
    }

    #[test]
    fn test_transcode_outbound_rejects_odd_length() {
        let err = transcode_outbound(&[0u8; 481], 24000, 8000, ResampleState::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_transcode_state_threads_between_calls() {
        let tone: Vec<i16> = (0..480)
            .map(|i| ((i as f32 * 0.2).sin() * 8000.0) as i16)
            .collect();
        let bytes = samples_to_pcm_bytes(&tone);
        let (first, second) = bytes.split_at(480);

        let (_, carried) =
            transcode_outbound(first, 24000, 8000, ResampleState::default()).unwrap();
        let (threaded, _) = transcode_outbound(second, 24000, 8000, carried).unwrap();
        let (cold, _) =
            transcode_outbound(second, 24000, 8000, ResampleState::default()).unwrap();

        assert_ne!(threaded, cold);
    }
}

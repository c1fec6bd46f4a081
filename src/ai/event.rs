//! # AI Server Events
//!
//! The provider's wire messages carry several optional payloads in one
//! envelope. They are decoded exactly once, at the client boundary, into this
//! tagged variant so the session only ever consumes a clean event stream.

/// One event received from the AI peer's streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A chunk of synthesized speech, raw little-endian PCM16 at the
    /// provider's output rate.
    Audio(Vec<u8>),

    /// A text part of the model turn (not forwarded to the caller; logged).
    Text(String),

    /// The model requested a tool invocation; carries the function name.
    ToolCall(String),

    /// The model finished its current turn.
    TurnComplete,

    /// The provider closed the stream; no further events will arrive.
    Closed,
}

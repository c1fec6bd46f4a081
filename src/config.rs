//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Deployment-platform variables (HOST, PORT, GEMINI_API_KEY, VOICE_BRIDGE_URL)
//! 2. Environment variables (APP_SERVER_HOST, APP_AI_VOICE, ...)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub audio: AudioConfig,
}

/// Server-specific configuration settings.
///
/// `public_url` is the externally reachable base URL of this process; the
/// call-setup handler derives the media-stream WebSocket URL from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_url: String,
}

/// AI provider configuration.
///
/// ## Fields:
/// - `provider`: which realtime voice backend to use (currently "gemini")
/// - `gemini_api_key`: credential for the Gemini Live API
/// - `gemini_model`: model id (must support live audio sessions)
/// - `voice`: prebuilt voice name for synthesized speech
/// - `system_prompt`: instructions injected at session setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub voice: String,
    pub system_prompt: String,
}

/// Audio pipeline configuration.
///
/// ## Fields:
/// - `telephony_rate`: sample rate of the μ-law telephony leg (8000)
/// - `input_rate`: PCM16 rate the provider expects on its input (16000)
/// - `output_rate`: PCM16 rate the provider produces (24000)
/// - `frame_threshold_bytes`: minimum bytes buffered before one send to the
///   provider (~300ms of audio at the input rate)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub telephony_rate: u32,
    pub input_rate: u32,
    pub output_rate: u32,
    pub frame_threshold_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8082,
                public_url: String::new(),
            },
            ai: AiConfig {
                provider: "gemini".to_string(),
                gemini_api_key: String::new(),
                gemini_model: "gemini-2.0-flash-exp".to_string(),
                voice: "Aoede".to_string(),
                system_prompt: "You are a helpful AI assistant on a phone call. \
                    Be conversational, concise, and natural. \
                    Speak clearly and at a moderate pace."
                    .to_string(),
            },
            audio: AudioConfig {
                telephony_rate: 8000,
                input_rate: 16000,
                output_rate: 24000,
                frame_threshold_bytes: crate::audio::buffer::DEFAULT_FRAME_THRESHOLD,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and the environment.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER_PORT=9000`: override the listen port
    /// - `APP_AI_VOICE=Puck`: override the synthesized voice
    /// - `GEMINI_API_KEY=...`: credential (deployment-platform convention)
    /// - `VOICE_BRIDGE_URL=https://bridge.example.com`: public base URL
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Deployment platforms and the provider SDKs use these names without
        // the APP_ prefix.
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }
        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }
        if let Ok(url) = env::var("VOICE_BRIDGE_URL") {
            settings = settings.set_override("server.public_url", url)?;
        }
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            settings = settings.set_override("ai.gemini_api_key", key)?;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            settings = settings.set_override("ai.gemini_model", model)?;
        }
        if let Ok(prompt) = env::var("SYSTEM_PROMPT") {
            settings = settings.set_override("ai.system_prompt", prompt)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.ai.provider.is_empty() {
            return Err(anyhow::anyhow!("AI provider cannot be empty"));
        }

        if self.audio.telephony_rate == 0
            || self.audio.input_rate == 0
            || self.audio.output_rate == 0
        {
            return Err(anyhow::anyhow!("Sample rates must be greater than 0"));
        }

        if self.audio.frame_threshold_bytes == 0 {
            return Err(anyhow::anyhow!("Frame threshold must be greater than 0"));
        }

        // PCM16 frames are 2 bytes per sample; an odd threshold would split a
        // sample across two sends.
        if self.audio.frame_threshold_bytes % 2 != 0 {
            return Err(anyhow::anyhow!("Frame threshold must be an even byte count"));
        }

        Ok(())
    }

    /// Update configuration from a JSON string (used for runtime config updates).
    ///
    /// Allows partial updates: `{"ai": {"voice": "Puck"}}` changes only the
    /// voice. The result is validated before it is accepted.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial: serde_json::Value = serde_json::from_str(json_str)?;

        if let Some(server) = partial.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                self.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                self.server.port = port as u16;
            }
            if let Some(url) = server.get("public_url").and_then(|v| v.as_str()) {
                self.server.public_url = url.to_string();
            }
        }

        if let Some(ai) = partial.get("ai") {
            if let Some(model) = ai.get("gemini_model").and_then(|v| v.as_str()) {
                self.ai.gemini_model = model.to_string();
            }
            if let Some(voice) = ai.get("voice").and_then(|v| v.as_str()) {
                self.ai.voice = voice.to_string();
            }
            if let Some(prompt) = ai.get("system_prompt").and_then(|v| v.as_str()) {
                self.ai.system_prompt = prompt.to_string();
            }
        }

        if let Some(audio) = partial.get("audio") {
            if let Some(threshold) = audio
                .get("frame_threshold_bytes")
                .and_then(|v| v.as_u64())
            {
                self.audio.frame_threshold_bytes = threshold as usize;
            }
        }

        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8082);
        assert_eq!(config.audio.telephony_rate, 8000);
        assert_eq!(config.audio.input_rate, 16000);
        assert_eq!(config.audio.output_rate, 24000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.frame_threshold_bytes = 9601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_update() {
        let mut config = AppConfig::default();
        let json = r#"{"ai": {"voice": "Puck"}, "server": {"port": 9090}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert_eq!(config.ai.voice, "Puck");
        assert_eq!(config.server.port, 9090);
        // Untouched fields keep their values.
        assert_eq!(config.ai.gemini_model, "gemini-2.0-flash-exp");
    }

    #[test]
    fn test_config_update_rejects_invalid_result() {
        let mut config = AppConfig::default();
        let json = r#"{"audio": {"frame_threshold_bytes": 0}}"#;
        assert!(config.update_from_json(json).is_err());
    }
}

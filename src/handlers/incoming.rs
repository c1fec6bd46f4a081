//! # Incoming Call Handler
//!
//! Answers the telephony platform's call notification with a TwiML document
//! that opens the media-stream WebSocket back to this process, carrying the
//! caller id as a custom stream parameter so the session can correlate it.

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};

/// Form fields posted by the telephony platform on an inbound call.
#[derive(Debug, Deserialize)]
pub struct IncomingCallForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

pub async fn incoming_call(
    state: web::Data<AppState>,
    form: web::Form<IncomingCallForm>,
) -> HttpResponse {
    let config = state.get_config();
    let caller = form.from.as_deref().unwrap_or("unknown");
    let call_sid = form.call_sid.as_deref().unwrap_or("unknown");

    info!(caller = %caller, call_sid = %call_sid, "Incoming call");

    if config.server.public_url.is_empty() {
        warn!("public_url is not configured; the platform cannot reach the media stream");
    }

    let ws_url = format!("{}/media-stream", websocket_base_url(&config.server.public_url));

    let twiml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Say>Connecting you now.</Say>
    <Connect>
        <Stream url="{}">
            <Parameter name="caller" value="{}" />
        </Stream>
    </Connect>
</Response>"#,
        ws_url,
        xml_escape(caller)
    );

    HttpResponse::Ok()
        .content_type("application/xml")
        .body(twiml)
}

/// Derive the WebSocket scheme from the configured public base URL.
fn websocket_base_url(public_url: &str) -> String {
    public_url
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1)
}

/// Minimal escaping for XML attribute values.
fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_incoming_call_returns_twiml() {
        let mut config = AppConfig::default();
        config.server.public_url = "https://bridge.example.com".to_string();
        let state = AppState::new(config);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/incoming", web::post().to(incoming_call)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/incoming")
            .set_form([("From", "+1234567890"), ("CallSid", "CA123")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/xml"));

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<Response>"));
        assert!(body.contains("<Connect>"));
        assert!(body.contains("wss://bridge.example.com/media-stream"));
        assert!(body.contains(r#"value="+1234567890""#));
    }

    #[actix_web::test]
    async fn test_incoming_call_without_form_fields() {
        let state = AppState::new(AppConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/incoming", web::post().to(incoming_call)),
        )
        .await;

        let empty_form: [(&str, &str); 0] = [];
        let req = test::TestRequest::post()
            .uri("/incoming")
            .set_form(empty_form)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains(r#"value="unknown""#));
    }

    #[::core::prelude::v1::test]
    fn test_websocket_base_url_schemes() {
        assert_eq!(
            websocket_base_url("https://bridge.example.com"),
            "wss://bridge.example.com"
        );
        assert_eq!(
            websocket_base_url("http://localhost:8082"),
            "ws://localhost:8082"
        );
    }

    #[::core::prelude::v1::test]
    fn test_xml_escape() {
        assert_eq!(xml_escape(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}

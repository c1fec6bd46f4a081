//! Runtime configuration endpoints.
//!
//! `GET /api/v1/config` exposes the active configuration with credentials
//! redacted; `PUT /api/v1/config` applies a partial update after validation.

use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;

fn config_view(config: &crate::config::AppConfig) -> serde_json::Value {
    json!({
        "server": {
            "host": config.server.host,
            "port": config.server.port,
            "public_url": config.server.public_url
        },
        "ai": {
            "provider": config.ai.provider,
            "gemini_model": config.ai.gemini_model,
            "voice": config.ai.voice,
            "api_key_set": !config.ai.gemini_api_key.is_empty()
        },
        "audio": {
            "telephony_rate": config.audio.telephony_rate,
            "input_rate": config.audio.input_rate,
            "output_rate": config.audio.output_rate,
            "frame_threshold_bytes": config.audio.frame_threshold_bytes
        }
    })
}

pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": config_view(&config)
    })))
}

pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let mut current_config = state.get_config();
    current_config
        .update_from_json(&json_str)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .update_config(current_config.clone())
        .map_err(AppError::BadRequest)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": config_view(&current_config)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_get_config_redacts_api_key() {
        let mut config = AppConfig::default();
        config.ai.gemini_api_key = "super-secret".to_string();
        let state = AppState::new(config);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/config", web::get().to(get_config)),
        )
        .await;

        let req = test::TestRequest::get().uri("/config").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["config"]["ai"]["api_key_set"], true);
        assert!(!body.to_string().contains("super-secret"));
    }

    #[actix_web::test]
    async fn test_update_config_applies_partial_change() {
        let state = AppState::new(AppConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/config", web::put().to(update_config)),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/config")
            .set_json(json!({"ai": {"voice": "Puck"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert_eq!(state.get_config().ai.voice, "Puck");
    }
}

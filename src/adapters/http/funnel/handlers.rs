//! HTTP handlers for funnel tracking and the conversions relay.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Json, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::ApiJson;
use crate::adapters::http::middleware::client_ip;
use crate::adapters::http::state::AppState;
use crate::application::handlers::funnel::{ForwardConversionCommand, TrackEventCommand};
use crate::domain::funnel::RequestMeta;

use super::dto::{ConversionRequest, SuccessResponse, TrackEventRequest};

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

/// POST /api/analytics/track - Record a funnel event
pub async fn track_event(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<TrackEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.track_event_handler();
    let cmd = TrackEventCommand {
        event_type: request.event_type,
        session_id: request.session_id,
        data: request.data,
        meta: RequestMeta {
            user_agent: header_value(&headers, header::USER_AGENT),
            referrer: header_value(&headers, header::REFERER),
            ip_address: client_ip(&headers, connect_info.as_ref()),
        },
    };

    handler.handle(cmd).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/facebook/capi - Relay a conversion event server-side
pub async fn forward_conversion(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ConversionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.forward_conversion_handler();
    let cmd = ForwardConversionCommand {
        event_name: request.event_name,
        user_data: request.user_data.map(Into::into).unwrap_or_default(),
        custom_data: request.custom_data.map(Into::into),
        source_url: header_value(&headers, header::REFERER).unwrap_or_default(),
        client_ip: client_ip(&headers, connect_info.as_ref()),
        user_agent: header_value(&headers, header::USER_AGENT),
        cookies: header_value(&headers, header::COOKIE),
    };

    let success = handler.handle(cmd).await?;

    Ok(Json(SuccessResponse { success }))
}

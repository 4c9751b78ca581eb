// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Visitor tracking endpoints (public).
//!
//! A visit counts once per address per day; repeats are acknowledged but not
//! recorded. Tracking failures are deliberately soft - a broken counter must
//! never break the page that calls it.

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState, storage::VisitorRepository};

/// Response after recording a visit.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub message: String,
    /// Whether this visit was counted (first from this address today).
    pub counted: bool,
}

/// Aggregate visitor counts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStatsResponse {
    /// Unique visitors today.
    pub today_visitors: usize,
    /// Distinct addresses across all recorded days.
    pub total_visitors: usize,
}

/// Best-effort client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.trim().is_empty() {
            return real_ip.trim().to_string();
        }
    }
    "unknown".to_string()
}

/// Record a visit from the calling address.
#[utoipa::path(
    post,
    path = "/visitor/track",
    tag = "Visitors",
    responses(
        (status = 200, description = "Visit processed", body = TrackResponse)
    )
)]
pub async fn track_visitor(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<TrackResponse> {
    let ip = client_ip(&headers);
    let user_agent = headers.get("user-agent").and_then(|v| v.to_str().ok());
    let referer = headers.get("referer").and_then(|v| v.to_str().ok());

    let repo = VisitorRepository::new(state.storage());
    let counted = match repo.record(&ip, Utc::now().date_naive(), user_agent, referer) {
        Ok(counted) => counted,
        Err(e) => {
            tracing::warn!(error = %e, "visitor tracking failed");
            false
        }
    };

    Json(TrackResponse {
        message: if counted {
            "Visit recorded".to_string()
        } else {
            "Visit already counted today".to_string()
        },
        counted,
    })
}

/// Aggregate visitor statistics.
#[utoipa::path(
    get,
    path = "/visitor/stats",
    tag = "Visitors",
    responses(
        (status = 200, description = "Visitor statistics", body = VisitorStatsResponse)
    )
)]
pub async fn visitor_stats(
    State(state): State<AppState>,
) -> Result<Json<VisitorStatsResponse>, ApiError> {
    let counts = VisitorRepository::new(state.storage()).counts(Utc::now().date_naive())?;

    Ok(Json(VisitorStatsResponse {
        today_visitors: counts.today,
        total_visitors: counts.total,
    }))
}

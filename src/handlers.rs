// region:    --- Imports
use crate::live::engine::LiveAuctionEngine;
use crate::live::error::LiveAuctionError;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Requests

/// 입찰 요청 본문. 구매자 식별자는 본문이 아니라 세션 헤더에서 온다.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    pub auction_item_id: i64,
    pub quantity: i32,
}

/// 세션 헤더에서 구매자 식별자 추출
fn buyer_from_session(headers: &HeaderMap) -> Result<i64, LiveAuctionError> {
    headers
        .get("x-buyer-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or(LiveAuctionError::NoSession)
}

// endregion: --- Requests

// region:    --- Command Handlers

/// 경매 시작 요청 처리 (경매인/관리자 전용)
pub async fn handle_start(
    State(engine): State<Arc<LiveAuctionEngine>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 시작 요청 id: {}", "Command", auction_id);
    match engine.start(auction_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(engine): State<Arc<LiveAuctionEngine>>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<PlaceBidRequest>,
) -> impl IntoResponse {
    let buyer_id = match buyer_from_session(&headers) {
        Ok(buyer_id) => buyer_id,
        Err(e) => return e.into_response(),
    };
    info!(
        "{:<12} --> 입찰 요청 auction: {}, buyer: {}, item: {}",
        "Command", auction_id, buyer_id, req.auction_item_id
    );
    match engine
        .place_bid(auction_id, buyer_id, req.auction_item_id, req.quantity)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 다음 상품 진행 요청 처리 (경매인/관리자 전용)
pub async fn handle_advance(
    State(engine): State<Arc<LiveAuctionEngine>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 다음 상품 진행 요청 id: {}", "Command", auction_id);
    match engine.advance(auction_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 진행 상태 조회. 클라이언트가 약 2초 주기로 폴링하므로 부수 효과 없이
/// 가볍게 응답해야 한다.
pub async fn handle_live_snapshot(
    State(engine): State<Arc<LiveAuctionEngine>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    match engine.snapshot(auction_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Query Handlers

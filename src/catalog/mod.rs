/// 영속 카탈로그 저장소 어댑터
/// 경매/출품 상품/입찰에 대한 모든 SQL 접근은 이 모듈을 거친다
// region:    --- Imports
use crate::database::DatabaseManager;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::debug;

pub mod model;
pub mod queries;

use model::{Auction, AuctionItem, ItemWithProduct};
// endregion: --- Imports

// region:    --- Pool Reads

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<Auction>, SqlxError> {
    debug!("{:<12} --> 경매 조회 id: {}", "Catalog", auction_id);
    sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await
}

/// 경매 출품 상품 목록 조회
pub async fn get_auction_items(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<AuctionItem>, SqlxError> {
    debug!(
        "{:<12} --> 출품 상품 목록 조회 auction_id: {}",
        "Catalog", auction_id
    );
    sqlx::query_as::<_, AuctionItem>(queries::GET_AUCTION_ITEMS)
        .bind(auction_id)
        .fetch_all(db_manager.pool())
        .await
}

/// 출품 상품 + 상품/품종 조인 조회
pub async fn get_item_with_product(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<ItemWithProduct>, SqlxError> {
    debug!("{:<12} --> 상품 조인 조회 item_id: {}", "Catalog", item_id);
    sqlx::query_as::<_, ItemWithProduct>(queries::GET_ITEM_WITH_PRODUCT)
        .bind(item_id)
        .fetch_optional(db_manager.pool())
        .await
}

// endregion: --- Pool Reads

// region:    --- Transaction Writes

/// 다른 진행 중 경매 종료
pub async fn end_other_live_auctions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::END_OTHER_LIVE_AUCTIONS)
        .bind(auction_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 경매 상태 변경
pub async fn set_auction_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    status: &str,
) -> Result<(), SqlxError> {
    sqlx::query(queries::SET_AUCTION_STATUS)
        .bind(auction_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 이전 프로세스가 남긴 LIVE 상품 복구
pub async fn reset_live_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::RESET_LIVE_ITEMS)
        .bind(auction_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 현재 라운드 시작 이후의 입찰 조회
pub async fn find_round_bid(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    item_id: i64,
    after: DateTime<Utc>,
) -> Result<Option<i64>, SqlxError> {
    let row = sqlx::query(queries::FIND_ROUND_BID)
        .bind(auction_id)
        .bind(item_id)
        .bind(after)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|r| r.get("id")))
}

/// 출품 상품 행 잠금 및 상태 조회
pub async fn lock_item_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: i64,
) -> Result<Option<String>, SqlxError> {
    let row = sqlx::query(queries::LOCK_ITEM_STATUS)
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|r| r.get("status")))
}

/// 입찰 기록 삽입
pub async fn insert_bid(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    item_id: i64,
    buyer_id: i64,
    price: i64,
    quantity: i32,
    bid_time: DateTime<Utc>,
) -> Result<i64, SqlxError> {
    let row = sqlx::query(queries::INSERT_BID)
        .bind(auction_id)
        .bind(item_id)
        .bind(buyer_id)
        .bind(price)
        .bind(quantity)
        .bind(bid_time)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("id"))
}

/// 낙찰 처리
pub async fn mark_item_sold(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: i64,
    buyer_id: i64,
    sold_price: i64,
    sold_quantity: i32,
    sold_at: DateTime<Utc>,
) -> Result<(), SqlxError> {
    sqlx::query(queries::MARK_ITEM_SOLD)
        .bind(item_id)
        .bind(buyer_id)
        .bind(sold_price)
        .bind(sold_quantity)
        .bind(sold_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 첫 입찰 시 LIVE 승격
pub async fn promote_item_live(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::PROMOTE_ITEM_LIVE)
        .bind(item_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 미낙찰 LIVE 상품 강등
pub async fn demote_item_pending(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::DEMOTE_ITEM_PENDING)
        .bind(item_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// endregion: --- Transaction Writes

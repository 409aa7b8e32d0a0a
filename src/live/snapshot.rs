// region:    --- Imports
use crate::catalog::model::ItemWithProduct;
use crate::live::registry::{DEFAULT_DECAY_PER_SECOND, DEFAULT_MAX_ROUNDS, DEFAULT_STARTING_PRICE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Product View

/// 현재 출품 상품의 상품/품종 조인 뷰
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub species: String,
    pub stem_length: i32,
    pub quantity: i32,
    pub min_price: i64,
    pub pot_size: i32,
}

impl From<&ItemWithProduct> for ProductView {
    fn from(item: &ItemWithProduct) -> Self {
        Self {
            id: item.product_id,
            title: item.title.clone(),
            photo_url: item.photo_url.clone(),
            species: item.species.clone(),
            stem_length: item.stem_length_cm,
            quantity: item.quantity,
            min_price: item.min_price,
            pot_size: item.pot_size,
        }
    }
}

// endregion: --- Product View

// region:    --- Snapshot

/// 진행 중 경매의 읽기 전용 스냅샷
/// 휘발성 상태(라운드/타이머)와 영속 조인(상품 정보)을 합친 뷰
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub auction_id: i64,
    pub status: String,
    pub server_time_utc: DateTime<Utc>,
    pub round_index: i32,
    pub max_rounds: i32,
    pub round_started_at_utc: DateTime<Utc>,
    pub starting_price: i64,
    pub min_price: i64,
    pub decay_per_second: i64,
    pub current_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_item_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_auction_item_id: Option<i64>,
}

pub const STATUS_RUNNING: &str = "running";
pub const STATUS_STOPPED: &str = "stopped";

impl Snapshot {
    /// 시작된 적 없는 경매의 정지 스냅샷 (라운드 0, 상품 없음)
    pub fn stopped(auction_id: i64) -> Self {
        let now = Utc::now();
        Self {
            auction_id,
            status: STATUS_STOPPED.to_string(),
            server_time_utc: now,
            round_index: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_started_at_utc: now,
            starting_price: DEFAULT_STARTING_PRICE,
            min_price: 0,
            decay_per_second: DEFAULT_DECAY_PER_SECOND,
            current_price: DEFAULT_STARTING_PRICE,
            auction_item_id: None,
            product: None,
            next_auction_item_id: None,
        }
    }
}

// endregion: --- Snapshot

// region:    --- Bid Outcome

/// 입찰 처리 결과
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidOutcome {
    pub accepted: bool,
    pub accepted_price: i64,
    pub bid_id: i64,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub state: Snapshot,
}

// endregion: --- Bid Outcome

/// 휘발성 경매 레지스트리
/// 경매 식별자 -> 진행 상태 맵. 프로세스 내 유일한 공유 가변 상태이며
/// 영속되지 않는다. 재시작하면 라운드/타이머는 사라지고 낙찰 기록만 남는다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

// endregion: --- Imports

/// 시작 전 기본 시작가
pub const DEFAULT_STARTING_PRICE: i64 = 300;
/// 시작 전 기본 초당 하락폭
pub const DEFAULT_DECAY_PER_SECOND: i64 = 5;
/// 경매당 기본 최대 라운드 수
pub const DEFAULT_MAX_ROUNDS: i32 = 3;

// region:    --- Live Auction State

/// 진행 중 경매의 휘발성 상태
#[derive(Debug, Clone)]
pub struct LiveAuctionState {
    pub current_item_id: Option<i64>,
    pub round_index: i32,
    pub max_rounds: i32,
    pub round_started_at: DateTime<Utc>,
    pub starting_price: i64,
    pub decay_per_second: i64,
    pub is_running: bool,
}

impl Default for LiveAuctionState {
    fn default() -> Self {
        Self {
            current_item_id: None,
            round_index: 1,
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_started_at: Utc::now(),
            starting_price: DEFAULT_STARTING_PRICE,
            decay_per_second: DEFAULT_DECAY_PER_SECOND,
            is_running: false,
        }
    }
}

/// 경매 단위 잠금을 포함한 공유 상태 핸들
pub type SharedLiveState = Arc<Mutex<LiveAuctionState>>;

// endregion: --- Live Auction State

// region:    --- Registry

#[derive(Default)]
pub struct LiveAuctionRegistry {
    auctions: DashMap<i64, SharedLiveState>,
}

impl LiveAuctionRegistry {
    pub fn new() -> Self {
        Self {
            auctions: DashMap::new(),
        }
    }

    /// 상태 조회 또는 생성 (멱등)
    pub fn get_or_create(&self, auction_id: i64) -> SharedLiveState {
        self.auctions
            .entry(auction_id)
            .or_insert_with(|| Arc::new(Mutex::new(LiveAuctionState::default())))
            .clone()
    }

    /// 상태 조회 (없으면 None, 생성하지 않는다)
    pub fn try_get(&self, auction_id: i64) -> Option<SharedLiveState> {
        self.auctions
            .get(&auction_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// 상태 제거
    pub fn remove(&self, auction_id: i64) {
        self.auctions.remove(&auction_id);
    }
}

// endregion: --- Registry

// endregion: --- Tests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum AuctionEvent {
    // 경매 시작 이벤트
    AuctionStarted {
        auction_id: i64,
        item_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },
    // 입찰 수락 이벤트
    BidAccepted {
        auction_id: i64,
        item_id: i64,
        buyer_id: i64,
        price: i64,
        quantity: i32,
        round_index: i32,
        final_round: bool,
        timestamp: DateTime<Utc>,
    },
    // 낙찰 이벤트
    ItemSold {
        auction_id: i64,
        item_id: i64,
        buyer_id: i64,
        price: i64,
        quantity: i32,
        timestamp: DateTime<Utc>,
    },
    // 경매 종료 이벤트
    AuctionEnded {
        auction_id: i64,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    /// 이벤트 타입 이름
    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionStarted { .. } => "AuctionStarted",
            AuctionEvent::BidAccepted { .. } => "BidAccepted",
            AuctionEvent::ItemSold { .. } => "ItemSold",
            AuctionEvent::AuctionEnded { .. } => "AuctionEnded",
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub starting_price: i64,
    pub decay_per_second: i64,
    pub max_rounds: i32,
    pub created_at: DateTime<Utc>,
}

// 출품 상품 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct AuctionItem {
    pub id: i64,
    pub auction_id: i64,
    pub product_id: i64,
    pub status: String,
    pub buyer_id: Option<i64>,
    pub sold_price: Option<i64>,
    pub sold_quantity: Option<i32>,
    pub sold_at: Option<DateTime<Utc>>,
}

// 출품 상품 + 상품/품종 조인 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ItemWithProduct {
    pub id: i64,
    pub auction_id: i64,
    pub status: String,
    pub product_id: i64,
    pub title: String,
    pub photo_url: Option<String>,
    pub species: String,
    pub stem_length_cm: i32,
    pub quantity: i32,
    pub min_price: i64,
    pub pot_size: i32,
}

// 입찰 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub item_id: i64,
    pub buyer_id: i64,
    pub price: i64,
    pub quantity: i32,
    pub bid_time: DateTime<Utc>,
}

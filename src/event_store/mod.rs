// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Event Model
/// 이벤트 저장소에 저장되는 이벤트 모델 (감사 추적 용도)
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: i64,
    pub auction_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
// endregion: --- Event Model

// region:    --- Event Store Trait
/// 이벤트 저장소 트레이트
/// 진행 경매의 확정 상태는 엔진 트랜잭션이 직접 기록하므로, 여기의 이벤트는
/// 쓰기 모델이 아니라 커밋 이후의 감사/연동 채널이다.
#[async_trait]
pub trait EventStore {
    async fn append_and_publish(&self, auction_id: i64, event: AuctionEvent)
        -> Result<(), String>;
}

/// 이벤트 저장소 구현체
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
    kafka_producer: Arc<KafkaProducer>,
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append_and_publish(
        &self,
        auction_id: i64,
        event: AuctionEvent,
    ) -> Result<(), String> {
        let data = serde_json::to_value(&event).map_err(|e| e.to_string())?;
        let timestamp = Utc::now();

        let event_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (auction_id, event_type, data, timestamp)
            VALUES ($1, $2, $3, $4)
            RETURNING id",
        )
        .bind(auction_id)
        .bind(event.event_type())
        .bind(&data)
        .bind(timestamp)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| e.to_string())?;

        let stored = Event {
            id: event_id,
            auction_id,
            event_type: event.event_type().to_string(),
            data,
            timestamp,
        };

        // 이벤트를 카프카에 발행
        self.kafka_producer
            .send_message(
                "auction-events",
                &event_id.to_string(),
                &serde_json::to_string(&stored).map_err(|e| e.to_string())?,
            )
            .await?;

        info!(
            "{:<12} --> 이벤트 기록: {} (id: {})",
            "EventStore",
            stored.event_type,
            event_id
        );
        Ok(())
    }
}

/// 이벤트 저장소 생성
impl PostgresEventStore {
    pub fn new(pool: Arc<PgPool>, kafka_producer: Arc<KafkaProducer>) -> Self {
        Self {
            pool,
            kafka_producer,
        }
    }
}

// endregion: --- Event Store Trait

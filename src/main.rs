// region:    --- Imports
use crate::database::DatabaseManager;
use crate::event_store::PostgresEventStore;
use crate::live::engine::LiveAuctionEngine;
use crate::live::registry::LiveAuctionRegistry;
use axum::{
    routing::{get, post},
    Router,
};
use message_broker::KafkaManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod catalog;
mod database;
mod event_store;
mod handlers;
mod live;
mod message_broker;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화 (RECREATE_DB=1 이면 전체 재생성)
    let recreate = std::env::var("RECREATE_DB").map(|v| v == "1").unwrap_or(false);
    let init_result = if recreate {
        db_manager.recreate_database().await
    } else {
        db_manager.initialize_database().await
    };
    if let Err(e) = init_result {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 초기화
    let kafka_manager = Arc::new(KafkaManager::new());
    if let Err(e) = kafka_manager.initialize().await {
        error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 토픽 생성
    kafka_manager.create_topic("auction-events", 5, 1).await?;

    // 진행 경매 엔진 조립: 휘발성 레지스트리 + 이벤트 저장소
    // 배경 타이머는 없다. 현재 가격은 조회 시점마다 시계 함수로 계산한다.
    let registry = Arc::new(LiveAuctionRegistry::new());
    let event_store = Arc::new(PostgresEventStore::new(
        db_manager.get_pool(),
        kafka_manager.get_producer(),
    ));
    let engine = Arc::new(LiveAuctionEngine::new(
        Arc::clone(&db_manager),
        registry,
        event_store,
    ));

    // 폴링 클라이언트를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/auctions/:id/live/start", post(handlers::handle_start))
        .route("/auctions/:id/live", get(handlers::handle_live_snapshot))
        .route("/auctions/:id/live/bid", post(handlers::handle_place_bid))
        .route(
            "/auctions/:id/live/advance",
            post(handlers::handle_advance),
        )
        .layer(cors)
        .with_state(engine);

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main

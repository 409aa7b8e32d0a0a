use chrono::{Duration, Utc};
use flower_auction_service::database::DatabaseManager;
use flower_auction_service::live::snapshot::{BidOutcome, Snapshot};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::Row;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::info;

const BASE_URL: &str = "http://localhost:3000";

/// 진행 중 경매는 시스템 전역에 하나뿐이므로 테스트를 직렬화한다
static TEST_GUARD: OnceLock<tokio::sync::Mutex<()>> = OnceLock::new();

async fn serial() -> tokio::sync::MutexGuard<'static, ()> {
    TEST_GUARD
        .get_or_init(|| tokio::sync::Mutex::new(()))
        .lock()
        .await
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 테스트용 품종 생성
async fn seed_species(db: &DatabaseManager, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO species (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .fetch_one(db.pool())
    .await
    .unwrap()
}

/// 테스트용 상품 생성
async fn seed_product(db: &DatabaseManager, species_id: i64, min_price: i64, quantity: i32) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (title, photo_url, species_id, stem_length_cm, quantity, min_price, pot_size)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind("테스트 튤립")
    .bind(Option::<String>::None)
    .bind(species_id)
    .bind(40)
    .bind(quantity)
    .bind(min_price)
    .bind(12)
    .fetch_one(db.pool())
    .await
    .unwrap()
}

/// 테스트용 경매 생성
async fn seed_auction(
    db: &DatabaseManager,
    starting_price: i64,
    decay_per_second: i64,
    max_rounds: i32,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO auctions (title, status, starting_price, decay_per_second, max_rounds, created_at)
         VALUES ($1, 'SCHEDULED', $2, $3, $4, $5)
         RETURNING id",
    )
    .bind("테스트 화훼 경매")
    .bind(starting_price)
    .bind(decay_per_second)
    .bind(max_rounds)
    .bind(Utc::now())
    .fetch_one(db.pool())
    .await
    .unwrap()
}

/// 테스트용 출품 상품 생성
async fn seed_item(db: &DatabaseManager, auction_id: i64, product_id: i64, status: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO auction_items (auction_id, product_id, status)
         VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(auction_id)
    .bind(product_id)
    .bind(status)
    .fetch_one(db.pool())
    .await
    .unwrap()
}

/// 상품 2개 짜리 경매 한 벌 생성
async fn seed_two_item_auction(
    db: &DatabaseManager,
    starting_price: i64,
    decay_per_second: i64,
    max_rounds: i32,
    min_price: i64,
) -> (i64, i64, i64) {
    let species_id = seed_species(db, "튤립").await;
    let product_a = seed_product(db, species_id, min_price, 50).await;
    let product_b = seed_product(db, species_id, min_price, 50).await;
    let auction_id = seed_auction(db, starting_price, decay_per_second, max_rounds).await;
    let item_a = seed_item(db, auction_id, product_a, "PENDING").await;
    let item_b = seed_item(db, auction_id, product_b, "PENDING").await;
    (auction_id, item_a, item_b)
}

async fn start_auction(client: &Client, auction_id: i64) -> Snapshot {
    let response = client
        .post(format!("{}/auctions/{}/live/start", BASE_URL, auction_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    response.json::<Snapshot>().await.unwrap()
}

async fn place_bid(
    client: &Client,
    auction_id: i64,
    buyer_id: i64,
    item_id: i64,
    quantity: i32,
) -> (StatusCode, String) {
    let response = client
        .post(format!("{}/auctions/{}/live/bid", BASE_URL, auction_id))
        .header("x-buyer-id", buyer_id.to_string())
        .json(&json!({ "auctionItemId": item_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.text().await.unwrap();
    (status, body)
}

async fn get_snapshot(client: &Client, auction_id: i64) -> Snapshot {
    let response = client
        .get(format!("{}/auctions/{}/live", BASE_URL, auction_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    response.json::<Snapshot>().await.unwrap()
}

/// 시작된 적 없는 경매 스냅샷 테스트 (라운드 0, 오류 아님)
#[tokio::test]
async fn test_snapshot_never_started() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, _, _) = seed_two_item_auction(&db, 100, 10, 3, 20).await;

    let snapshot = get_snapshot(&client, auction_id).await;
    assert_eq!(snapshot.status, "stopped");
    assert_eq!(snapshot.round_index, 0);
    assert!(snapshot.auction_item_id.is_none());
    assert!(snapshot.product.is_none());
}

/// 경매 시작 테스트: 첫 상품과 라운드 1
#[tokio::test]
async fn test_start_selects_first_item() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, item_a, item_b) = seed_two_item_auction(&db, 100, 10, 3, 20).await;

    let snapshot = start_auction(&client, auction_id).await;
    assert_eq!(snapshot.status, "running");
    assert_eq!(snapshot.round_index, 1);
    assert_eq!(snapshot.max_rounds, 3);
    assert_eq!(snapshot.auction_item_id, Some(item_a));
    assert_eq!(snapshot.next_auction_item_id, Some(item_b));
    assert_eq!(snapshot.starting_price, 100);
    assert_eq!(snapshot.decay_per_second, 10);
    assert!(snapshot.current_price <= 100);
    assert!(snapshot.current_price >= 20);

    let product = snapshot.product.expect("product payload missing");
    assert_eq!(product.species, "튤립");
    assert_eq!(product.min_price, 20);

    // 경매 행이 LIVE 로 전환되었는지 확인
    let status: String = sqlx::query("SELECT status FROM auctions WHERE id = $1")
        .bind(auction_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
        .get("status");
    assert_eq!(status, "LIVE");
}

/// 진행할 상품이 없는 경매 시작 거부 테스트
#[tokio::test]
async fn test_start_empty_auction() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let species_id = seed_species(&db, "튤립").await;
    let product_id = seed_product(&db, species_id, 20, 10).await;
    let auction_id = seed_auction(&db, 100, 10, 3).await;
    seed_item(&db, auction_id, product_id, "SOLD").await;

    let response = client
        .post(format!("{}/auctions/{}/live/start", BASE_URL, auction_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "EMPTY_AUCTION");
}

/// 존재하지 않는 경매 시작 테스트
#[tokio::test]
async fn test_start_unknown_auction() {
    let _guard = serial().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/auctions/{}/live/start", BASE_URL, 9_999_999_999_i64))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

/// 라운드 진행 및 최종 낙찰 테스트
/// 라운드 1 -> 2 -> 3 을 거쳐 최종 라운드 입찰이 낙찰 처리되고
/// 다음 상품으로 자동 진행되는지 확인한다
#[tokio::test]
async fn test_bid_walks_rounds_and_sells() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, item_a, item_b) = seed_two_item_auction(&db, 100, 10, 3, 20).await;
    start_auction(&client, auction_id).await;

    // 라운드 1 입찰
    let (status, body) = place_bid(&client, auction_id, 1, item_a, 5).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: BidOutcome = serde_json::from_str(&body).unwrap();
    assert!(outcome.accepted);
    assert!(!outcome.is_final);
    assert!(outcome.accepted_price <= 100 && outcome.accepted_price >= 20);
    assert_eq!(outcome.state.round_index, 2);
    assert_eq!(outcome.state.auction_item_id, Some(item_a));
    // 새 라운드는 시작가에서 다시 하락한다
    assert!(outcome.state.current_price >= outcome.accepted_price);

    // 라운드 2 입찰
    let (status, body) = place_bid(&client, auction_id, 2, item_a, 5).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: BidOutcome = serde_json::from_str(&body).unwrap();
    assert!(!outcome.is_final);
    assert_eq!(outcome.state.round_index, 3);
    assert_eq!(outcome.state.auction_item_id, Some(item_a));

    // 라운드 3 (최종) 입찰: 낙찰 후 다음 상품으로 진행
    let (status, body) = place_bid(&client, auction_id, 3, item_a, 5).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: BidOutcome = serde_json::from_str(&body).unwrap();
    assert!(outcome.is_final);
    assert_eq!(outcome.state.auction_item_id, Some(item_b));
    assert_eq!(outcome.state.round_index, 1);
    let final_price = outcome.accepted_price;

    // 낙찰 기록 확인: 수락 시점 가격 그대로 저장
    let row = sqlx::query(
        "SELECT status, buyer_id, sold_price, sold_quantity FROM auction_items WHERE id = $1",
    )
    .bind(item_a)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(row.get::<String, _>("status"), "SOLD");
    assert_eq!(row.get::<Option<i64>, _>("buyer_id"), Some(3));
    assert_eq!(row.get::<Option<i64>, _>("sold_price"), Some(final_price));
    assert_eq!(row.get::<Option<i32>, _>("sold_quantity"), Some(5));

    // 입찰 이력은 라운드당 1건씩 3건
    let bid_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bids WHERE item_id = $1")
        .bind(item_a)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(bid_count, 3);
}

/// 다른 상품에 대한 입찰 거부 테스트 (낡은 클라이언트 상태)
#[tokio::test]
async fn test_wrong_item_rejected() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, _item_a, item_b) = seed_two_item_auction(&db, 100, 10, 3, 20).await;
    start_auction(&client, auction_id).await;

    let (status, body) = place_bid(&client, auction_id, 1, item_b, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "WRONG_ITEM");
}

/// 수량 검증 테스트
#[tokio::test]
async fn test_invalid_quantity_rejected() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, item_a, _) = seed_two_item_auction(&db, 100, 10, 3, 20).await;
    start_auction(&client, auction_id).await;

    let (status, body) = place_bid(&client, auction_id, 1, item_a, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "INVALID_QUANTITY");

    // 보유 수량 초과도 거부
    let (status, body) = place_bid(&client, auction_id, 1, item_a, 10_000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "INVALID_QUANTITY");
}

/// 세션 헤더 없는 입찰 거부 테스트
#[tokio::test]
async fn test_missing_session_rejected() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, item_a, _) = seed_two_item_auction(&db, 100, 10, 3, 20).await;
    start_auction(&client, auction_id).await;

    let response = client
        .post(format!("{}/auctions/{}/live/bid", BASE_URL, auction_id))
        .json(&json!({ "auctionItemId": item_a, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NO_SESSION");
}

/// 시작 전 입찰 거부 테스트
#[tokio::test]
async fn test_bid_before_start_rejected() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, item_a, _) = seed_two_item_auction(&db, 100, 10, 3, 20).await;

    let (status, body) = place_bid(&client, auction_id, 1, item_a, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "NOT_RUNNING");
}

/// 수동 진행 및 경매 종료 테스트
#[tokio::test]
async fn test_advance_to_end() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let species_id = seed_species(&db, "장미").await;
    let product_id = seed_product(&db, species_id, 20, 10).await;
    let auction_id = seed_auction(&db, 100, 10, 3).await;
    let item_id = seed_item(&db, auction_id, product_id, "PENDING").await;

    start_auction(&client, auction_id).await;

    // 유일한 상품을 건너뛰면 경매가 끝난다
    let response = client
        .post(format!("{}/auctions/{}/live/advance", BASE_URL, auction_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot: Snapshot = response.json().await.unwrap();
    assert_eq!(snapshot.status, "stopped");
    assert!(snapshot.auction_item_id.is_none());

    // 종단 상태: 이후 입찰은 전부 거부
    let (status, body) = place_bid(&client, auction_id, 1, item_id, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "NOT_RUNNING");

    let status: String = sqlx::query("SELECT status FROM auctions WHERE id = $1")
        .bind(auction_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
        .get("status");
    assert_eq!(status, "ENDED");
}

/// 폴링 중 가격 단조 하락 테스트
#[tokio::test]
async fn test_price_is_non_increasing_within_round() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, _, _) = seed_two_item_auction(&db, 300, 1, 3, 50).await;
    start_auction(&client, auction_id).await;

    let first = get_snapshot(&client, auction_id).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(1500)).await;
    let second = get_snapshot(&client, auction_id).await;

    assert!(second.current_price <= first.current_price);
    assert!(second.current_price >= 50);
}

/// 동시성 입찰 테스트
/// 같은 라운드를 향한 동시 입찰 중 정확히 한 건만 그 라운드를 가져간다.
/// 상품 1개, 최대 3 라운드이므로 수락은 정확히 3건이고 나머지는 경매 종료
/// 이후 도착으로 거부된다.
#[tokio::test]
async fn test_concurrent_bidding_single_winner_per_round() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let species_id = seed_species(&db, "백합").await;
    let product_id = seed_product(&db, species_id, 20, 100).await;
    let auction_id = seed_auction(&db, 1_000, 1, 3).await;
    let item_id = seed_item(&db, auction_id, product_id, "PENDING").await;

    start_auction(&client, auction_id).await;

    // 50개의 동시 입찰 생성
    let mut handles = vec![];
    for buyer_id in 1..=50_i64 {
        let handle = tokio::spawn(async move {
            let client = Client::new();
            let response = client
                .post(format!("{}/auctions/{}/live/bid", BASE_URL, auction_id))
                .header("x-buyer-id", buyer_id.to_string())
                .json(&json!({ "auctionItemId": item_id, "quantity": 1 }))
                .send()
                .await
                .unwrap();
            let status = response.status();
            let body = response.text().await.unwrap();
            (status, body)
        });
        handles.push(handle);
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::OK {
            accepted += 1;
        } else {
            let error_info: Value = serde_json::from_str(&body).unwrap();
            assert!(
                error_info["code"] == "NOT_RUNNING"
                    || error_info["code"] == "ROUND_ALREADY_WON"
                    || error_info["code"] == "ITEM_NO_LONGER_LIVE",
                "예상하지 못한 거부 코드: {:?}",
                error_info
            );
            rejected += 1;
        }
    }

    info!("수락된 입찰 수: {}, 거부된 입찰 수: {}", accepted, rejected);

    // 라운드당 1건, 총 3 라운드
    assert_eq!(accepted, 3);
    assert_eq!(rejected, 47);

    // 상품은 정확히 한 번 낙찰
    let row = sqlx::query("SELECT status, buyer_id FROM auction_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("status"), "SOLD");
    assert!(row.get::<Option<i64>, _>("buyer_id").is_some());

    // 입찰 이력은 라운드당 1건
    let bid_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bids WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(bid_count, 3);
}

/// 외부 기록자와의 라운드 경합 테스트
/// 다른 프로세스가 이번 라운드의 입찰을 먼저 커밋한 상황을 흉내 낸다.
/// 저장소 수준의 확인-후-삽입 보호가 동작해야 한다.
#[tokio::test]
async fn test_round_already_won_against_external_bid() {
    let _guard = serial().await;
    let db = setup().await;
    let client = Client::new();

    let (auction_id, item_a, _) = seed_two_item_auction(&db, 100, 10, 3, 20).await;
    start_auction(&client, auction_id).await;

    // 라운드 시작 이후 시각으로 입찰 행을 직접 삽입
    sqlx::query(
        "INSERT INTO bids (auction_id, item_id, buyer_id, price, quantity, bid_time)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(auction_id)
    .bind(item_a)
    .bind(999_i64)
    .bind(90_i64)
    .bind(1_i32)
    .bind(Utc::now() + Duration::seconds(1))
    .execute(db.pool())
    .await
    .unwrap();

    let (status, body) = place_bid(&client, auction_id, 1, item_a, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "ROUND_ALREADY_WON");
}

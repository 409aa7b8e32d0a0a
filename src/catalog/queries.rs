/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, title, status, starting_price, decay_per_second, max_rounds, created_at FROM auctions WHERE id = $1";

/// 경매 출품 상품 목록 조회
pub const GET_AUCTION_ITEMS: &str = r#"
    SELECT id, auction_id, product_id, status, buyer_id, sold_price, sold_quantity, sold_at
    FROM auction_items
    WHERE auction_id = $1
    ORDER BY id
"#;

/// 출품 상품 + 상품/품종 조인 조회
pub const GET_ITEM_WITH_PRODUCT: &str = r#"
    SELECT ai.id, ai.auction_id, ai.status, p.id AS product_id, p.title, p.photo_url,
           s.name AS species, p.stem_length_cm, p.quantity, p.min_price, p.pot_size
    FROM auction_items ai
    JOIN products p ON p.id = ai.product_id
    JOIN species s ON s.id = p.species_id
    WHERE ai.id = $1
"#;

/// 다른 진행 중 경매 종료 (시스템 전역 단일 진행 경매 불변식)
pub const END_OTHER_LIVE_AUCTIONS: &str =
    "UPDATE auctions SET status = 'ENDED' WHERE status = 'LIVE' AND id <> $1";

/// 경매 상태 변경
pub const SET_AUCTION_STATUS: &str = "UPDATE auctions SET status = $2 WHERE id = $1";

/// 이전 프로세스가 남긴 LIVE 상품을 PENDING 으로 복구
pub const RESET_LIVE_ITEMS: &str =
    "UPDATE auction_items SET status = 'PENDING' WHERE auction_id = $1 AND status = 'LIVE'";

/// 현재 라운드 시작 이후의 입찰 존재 여부 조회
pub const FIND_ROUND_BID: &str = r#"
    SELECT id FROM bids
    WHERE auction_id = $1 AND item_id = $2 AND bid_time > $3
    ORDER BY bid_time
    LIMIT 1
"#;

/// 출품 상품 행 잠금 및 상태 조회
pub const LOCK_ITEM_STATUS: &str = "SELECT status FROM auction_items WHERE id = $1 FOR UPDATE";

/// 입찰 기록 삽입
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, item_id, buyer_id, price, quantity, bid_time)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id
"#;

/// 낙찰 처리 (최종 라운드)
pub const MARK_ITEM_SOLD: &str = r#"
    UPDATE auction_items
    SET status = 'SOLD', buyer_id = $2, sold_price = $3, sold_quantity = $4, sold_at = $5
    WHERE id = $1
"#;

/// 첫 입찰 시 PENDING -> LIVE 승격
pub const PROMOTE_ITEM_LIVE: &str =
    "UPDATE auction_items SET status = 'LIVE' WHERE id = $1 AND status = 'PENDING'";

/// 수동 진행 시 미낙찰 LIVE 상품을 PENDING 으로 강등
pub const DEMOTE_ITEM_PENDING: &str =
    "UPDATE auction_items SET status = 'PENDING' WHERE id = $1 AND status = 'LIVE'";

/// 하향식 시계 경매 엔진
/// 1. 경매 시작
/// 2. 진행 상태 스냅샷 조회
/// 3. 입찰 중재 (라운드당 최대 1건 낙찰)
/// 4. 다음 상품 진행 / 경매 종료
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::catalog;
use crate::database::DatabaseManager;
use crate::event_store::EventStore;
use crate::live::clock;
use crate::live::error::LiveAuctionError;
use crate::live::registry::{LiveAuctionRegistry, LiveAuctionState};
use crate::live::sequencer;
use crate::live::snapshot::{BidOutcome, ProductView, Snapshot, STATUS_RUNNING, STATUS_STOPPED};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Engine

pub struct LiveAuctionEngine {
    db: Arc<DatabaseManager>,
    registry: Arc<LiveAuctionRegistry>,
    event_store: Arc<dyn EventStore + Send + Sync>,
}

impl LiveAuctionEngine {
    pub fn new(
        db: Arc<DatabaseManager>,
        registry: Arc<LiveAuctionRegistry>,
        event_store: Arc<dyn EventStore + Send + Sync>,
    ) -> Self {
        Self {
            db,
            registry,
            event_store,
        }
    }

    /// 경매 시작
    /// 시스템 전역에서 진행 중 경매는 하나뿐이다. 다른 진행 중 경매는 모두
    /// 종료 처리하고 본 경매를 LIVE 로 전환한 뒤 첫 상품부터 라운드 1 을 연다.
    pub async fn start(&self, auction_id: i64) -> Result<Snapshot, LiveAuctionError> {
        info!("{:<12} --> 경매 시작 id: {}", "Engine", auction_id);

        let auction = catalog::get_auction(&self.db, auction_id)
            .await?
            .ok_or(LiveAuctionError::NotFound)?;
        let items = catalog::get_auction_items(&self.db, auction_id).await?;

        // 진행 가능한 상품(PENDING/LIVE)이 하나도 없으면 시작 거부
        let eligible = items
            .iter()
            .any(|item| item.status == "PENDING" || item.status == "LIVE");
        if !eligible {
            return Err(LiveAuctionError::EmptyAuction);
        }

        self.db
            .transaction::<_, _, LiveAuctionError>(move |tx| {
                Box::pin(async move {
                    catalog::end_other_live_auctions(tx, auction_id).await?;
                    catalog::set_auction_status(tx, auction_id, "LIVE").await?;
                    // 이전 프로세스가 남긴 LIVE 상품은 PENDING 으로 복구
                    catalog::reset_live_items(tx, auction_id).await?;
                    Ok(())
                })
            })
            .await?;

        // 복구 반영 후 첫 상품 선택
        let items = catalog::get_auction_items(&self.db, auction_id).await?;
        let first_item_id = sequencer::next_pending_item(&items, None);

        let shared = self.registry.get_or_create(auction_id);
        let mut state = shared.lock().await;
        let now = Utc::now();
        state.starting_price = auction.starting_price;
        state.decay_per_second = auction.decay_per_second;
        state.max_rounds = auction.max_rounds;
        state.round_index = 1;
        state.round_started_at = now;
        state.current_item_id = first_item_id;
        state.is_running = true;

        self.publish(
            auction_id,
            AuctionEvent::AuctionStarted {
                auction_id,
                item_id: first_item_id,
                timestamp: now,
            },
        )
        .await;

        self.compose_snapshot(auction_id, &state).await
    }

    /// 진행 상태 스냅샷 조회 (읽기 전용)
    /// 시작된 적 없는 경매는 오류가 아니라 정지 스냅샷(라운드 0)으로 응답한다.
    pub async fn snapshot(&self, auction_id: i64) -> Result<Snapshot, LiveAuctionError> {
        match self.registry.try_get(auction_id) {
            Some(shared) => {
                let state = shared.lock().await;
                self.compose_snapshot(auction_id, &state).await
            }
            None => Ok(Snapshot::stopped(auction_id)),
        }
    }

    /// 입찰 처리
    /// 검증부터 확정까지 경매 단위 잠금으로 직렬화하고, 확인-후-삽입 구간은
    /// 직렬화 가능 트랜잭션 + 행 잠금으로 한 번 더 보호한다.
    pub async fn place_bid(
        &self,
        auction_id: i64,
        buyer_id: i64,
        item_id: i64,
        quantity: i32,
    ) -> Result<BidOutcome, LiveAuctionError> {
        info!(
            "{:<12} --> 입찰 처리 auction: {}, buyer: {}, item: {}, qty: {}",
            "Engine", auction_id, buyer_id, item_id, quantity
        );

        let shared = self
            .registry
            .try_get(auction_id)
            .ok_or(LiveAuctionError::NotRunning)?;
        let mut state = shared.lock().await;

        if !state.is_running {
            return Err(LiveAuctionError::NotRunning);
        }
        let current_item_id = state
            .current_item_id
            .ok_or(LiveAuctionError::NoCurrentItem)?;
        if item_id != current_item_id {
            // 이미 다음 상품으로 넘어간 뒤 도착한 입찰
            return Err(LiveAuctionError::WrongItem);
        }
        if quantity <= 0 {
            return Err(LiveAuctionError::InvalidQuantity);
        }

        let item = catalog::get_item_with_product(&self.db, current_item_id)
            .await?
            .ok_or(LiveAuctionError::NotFound)?;
        if quantity > item.quantity {
            return Err(LiveAuctionError::InvalidQuantity);
        }

        // 수락 가격은 검증 시점의 시계 가격으로 고정한다 (커밋 시점이 아니라)
        let now = Utc::now();
        let accepted_price = clock::current_price(
            state.starting_price,
            item.min_price,
            state.decay_per_second,
            state.round_started_at,
            now,
        );
        let final_round = state.round_index >= state.max_rounds;
        let round_started_at = state.round_started_at;

        let bid_id = self
            .db
            .serializable_transaction::<_, _, LiveAuctionError>(move |tx| {
                Box::pin(async move {
                    // 이번 라운드에 이미 확정된 입찰이 있으면 패배 처리
                    if catalog::find_round_bid(tx, auction_id, item_id, round_started_at)
                        .await?
                        .is_some()
                    {
                        return Err(LiveAuctionError::RoundAlreadyWon);
                    }

                    // 상품 행을 잠그고 아직 판매 가능한 상태인지 재확인
                    match catalog::lock_item_status(tx, item_id).await?.as_deref() {
                        Some("PENDING") | Some("LIVE") => {}
                        _ => return Err(LiveAuctionError::ItemNoLongerLive),
                    }

                    let bid_id = catalog::insert_bid(
                        tx,
                        auction_id,
                        item_id,
                        buyer_id,
                        accepted_price,
                        quantity,
                        now,
                    )
                    .await?;

                    if final_round {
                        catalog::mark_item_sold(
                            tx,
                            item_id,
                            buyer_id,
                            accepted_price,
                            quantity,
                            now,
                        )
                        .await?;
                    } else {
                        catalog::promote_item_live(tx, item_id).await?;
                    }
                    Ok(bid_id)
                })
            })
            .await?;

        info!(
            "{:<12} --> 입찰 수락 bid: {}, price: {}, round: {}/{}",
            "Engine", bid_id, accepted_price, state.round_index, state.max_rounds
        );

        self.publish(
            auction_id,
            AuctionEvent::BidAccepted {
                auction_id,
                item_id,
                buyer_id,
                price: accepted_price,
                quantity,
                round_index: state.round_index,
                final_round,
                timestamp: now,
            },
        )
        .await;

        if final_round {
            self.publish(
                auction_id,
                AuctionEvent::ItemSold {
                    auction_id,
                    item_id,
                    buyer_id,
                    price: accepted_price,
                    quantity,
                    timestamp: now,
                },
            )
            .await;
            // 낙찰 확정 후 다음 상품으로 자동 진행 (잠금 유지)
            self.advance_locked(auction_id, &mut state).await?;
        } else {
            // 새 라운드는 시작가에서 다시 하락한다. 직전 라운드 종료 가격을
            // 이어받지 않는다.
            state.round_index += 1;
            state.round_started_at = Utc::now();
        }

        let snapshot = self.compose_snapshot(auction_id, &state).await?;
        Ok(BidOutcome {
            accepted: true,
            accepted_price,
            bid_id,
            is_final: final_round,
            state: snapshot,
        })
    }

    /// 다음 상품 진행 (경매인 수동 조작)
    pub async fn advance(&self, auction_id: i64) -> Result<Snapshot, LiveAuctionError> {
        info!("{:<12} --> 다음 상품 진행 id: {}", "Engine", auction_id);

        let shared = self
            .registry
            .try_get(auction_id)
            .ok_or(LiveAuctionError::NotRunning)?;
        let mut state = shared.lock().await;
        if !state.is_running {
            return Err(LiveAuctionError::NotRunning);
        }

        self.advance_locked(auction_id, &mut state).await?;
        self.compose_snapshot(auction_id, &state).await
    }

    /// 다음 상품으로 진행한다. 호출자가 경매 잠금을 보유한 상태여야 한다.
    /// 남은 상품이 없으면 경매를 종료 처리한다.
    async fn advance_locked(
        &self,
        auction_id: i64,
        state: &mut LiveAuctionState,
    ) -> Result<(), LiveAuctionError> {
        let items = catalog::get_auction_items(&self.db, auction_id).await?;
        let outgoing = state.current_item_id;

        // 미낙찰 LIVE 상품은 PENDING 으로 되돌려 이후 재선택 대상에 포함
        let demote = outgoing
            .and_then(|id| items.iter().find(|item| item.id == id))
            .filter(|item| item.status == "LIVE")
            .map(|item| item.id);

        let next = sequencer::next_pending_item(&items, outgoing);
        let now = Utc::now();

        match next {
            Some(next_item_id) => {
                if let Some(demote_id) = demote {
                    self.db
                        .transaction::<_, _, LiveAuctionError>(move |tx| {
                            Box::pin(async move {
                                catalog::demote_item_pending(tx, demote_id).await?;
                                Ok(())
                            })
                        })
                        .await?;
                }
                state.current_item_id = Some(next_item_id);
                state.round_index = 1;
                state.round_started_at = now;
                info!(
                    "{:<12} --> 다음 상품 선택 item: {}",
                    "Engine", next_item_id
                );
            }
            None => {
                // 남은 상품 없음: 경매 종료 (종단 상태)
                self.db
                    .transaction::<_, _, LiveAuctionError>(move |tx| {
                        Box::pin(async move {
                            if let Some(demote_id) = demote {
                                catalog::demote_item_pending(tx, demote_id).await?;
                            }
                            catalog::set_auction_status(tx, auction_id, "ENDED").await?;
                            Ok(())
                        })
                    })
                    .await?;
                state.current_item_id = None;
                state.is_running = false;
                self.publish(
                    auction_id,
                    AuctionEvent::AuctionEnded {
                        auction_id,
                        timestamp: now,
                    },
                )
                .await;
                info!("{:<12} --> 경매 종료 id: {}", "Engine", auction_id);
            }
        }
        Ok(())
    }

    /// 스냅샷 합성
    /// 경매가 그 사이 삭제되었더라도 휘발성 필드만으로 응답한다. 진행 화면은
    /// 일시적 읽기 경합으로 오류를 내지 않는다.
    async fn compose_snapshot(
        &self,
        auction_id: i64,
        state: &LiveAuctionState,
    ) -> Result<Snapshot, LiveAuctionError> {
        let now = Utc::now();

        let item = match state.current_item_id {
            Some(item_id) => catalog::get_item_with_product(&self.db, item_id).await?,
            None => None,
        };

        let all_items = catalog::get_auction_items(&self.db, auction_id).await?;
        let next_auction_item_id = sequencer::next_pending_item(&all_items, state.current_item_id);

        let min_price = item.as_ref().map(|i| i.min_price).unwrap_or(0);
        let current_price = if state.is_running {
            clock::current_price(
                state.starting_price,
                min_price,
                state.decay_per_second,
                state.round_started_at,
                now,
            )
        } else {
            state.starting_price
        };

        Ok(Snapshot {
            auction_id,
            status: if state.is_running {
                STATUS_RUNNING.to_string()
            } else {
                STATUS_STOPPED.to_string()
            },
            server_time_utc: now,
            round_index: state.round_index,
            max_rounds: state.max_rounds,
            round_started_at_utc: state.round_started_at,
            starting_price: state.starting_price,
            min_price,
            decay_per_second: state.decay_per_second,
            current_price,
            auction_item_id: state.current_item_id,
            product: item.as_ref().map(ProductView::from),
            next_auction_item_id,
        })
    }

    /// 감사 이벤트 기록/발행. 낙찰 확정은 이미 커밋된 뒤이므로 실패는 경고로만
    /// 남긴다.
    async fn publish(&self, auction_id: i64, event: AuctionEvent) {
        if let Err(e) = self.event_store.append_and_publish(auction_id, event).await {
            warn!("{:<12} --> 이벤트 발행 실패: {}", "Engine", e);
        }
    }
}

// endregion: --- Engine

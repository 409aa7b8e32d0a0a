// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

/// 진행 경매 엔진 오류
/// 비즈니스 규칙 위반은 전부 이름 있는 변형으로 엔진 경계에서 드러낸다.
/// 저장소 오류는 삼키지 않고 그대로 전파한다.
#[derive(Debug, Error)]
pub enum LiveAuctionError {
    #[error("경매를 찾을 수 없습니다.")]
    NotFound,

    #[error("진행할 출품 상품이 없는 경매입니다.")]
    EmptyAuction,

    #[error("진행 중인 경매가 아닙니다.")]
    NotRunning,

    #[error("현재 진행 중인 출품 상품이 없습니다.")]
    NoCurrentItem,

    #[error("이미 다음 상품으로 넘어갔습니다. 최신 상태를 다시 조회하세요.")]
    WrongItem,

    #[error("유효하지 않은 수량입니다.")]
    InvalidQuantity,

    #[error("이번 라운드의 낙찰자가 이미 있습니다.")]
    RoundAlreadyWon,

    #[error("출품 상품이 더 이상 진행 중이 아닙니다.")]
    ItemNoLongerLive,

    #[error("구매자 세션이 없습니다.")]
    NoSession,

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
}

impl LiveAuctionError {
    /// 클라이언트용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            LiveAuctionError::NotFound => "NOT_FOUND",
            LiveAuctionError::EmptyAuction => "EMPTY_AUCTION",
            LiveAuctionError::NotRunning => "NOT_RUNNING",
            LiveAuctionError::NoCurrentItem => "NO_CURRENT_ITEM",
            LiveAuctionError::WrongItem => "WRONG_ITEM",
            LiveAuctionError::InvalidQuantity => "INVALID_QUANTITY",
            LiveAuctionError::RoundAlreadyWon => "ROUND_ALREADY_WON",
            LiveAuctionError::ItemNoLongerLive => "ITEM_NO_LONGER_LIVE",
            LiveAuctionError::NoSession => "NO_SESSION",
            LiveAuctionError::Database(_) => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            LiveAuctionError::NotFound => StatusCode::NOT_FOUND,
            LiveAuctionError::EmptyAuction => StatusCode::UNPROCESSABLE_ENTITY,
            LiveAuctionError::InvalidQuantity => StatusCode::BAD_REQUEST,
            LiveAuctionError::NoSession => StatusCode::UNAUTHORIZED,
            LiveAuctionError::NotRunning
            | LiveAuctionError::NoCurrentItem
            | LiveAuctionError::WrongItem
            | LiveAuctionError::RoundAlreadyWon
            | LiveAuctionError::ItemNoLongerLive => StatusCode::CONFLICT,
            LiveAuctionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LiveAuctionError {
    fn into_response(self) -> Response {
        if let LiveAuctionError::Database(ref e) = self {
            error!("{:<12} --> 데이터베이스 오류: {:?}", "Engine", e);
        }
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (self.status_code(), body).into_response()
    }
}

// endregion: --- Tests

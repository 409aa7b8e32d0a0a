use crate::catalog::model::AuctionItem;

/// 다음 출품 상품 선택
/// PENDING 상태 중 가장 낮은 식별자를 고른다 (현재 상품 제외).
/// None 이면 더 진행할 상품이 없다는 뜻이다.
pub fn next_pending_item(items: &[AuctionItem], current_item_id: Option<i64>) -> Option<i64> {
    items
        .iter()
        .filter(|item| item.status == "PENDING")
        .filter(|item| Some(item.id) != current_item_id)
        .map(|item| item.id)
        .min()
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, status: &str) -> AuctionItem {
        AuctionItem {
            id,
            auction_id: 1,
            product_id: id,
            status: status.to_string(),
            buyer_id: None,
            sold_price: None,
            sold_quantity: None,
            sold_at: None,
        }
    }

    #[test]
    fn picks_lowest_pending_id() {
        let items = vec![item(7, "PENDING"), item(3, "PENDING"), item(5, "PENDING")];
        assert_eq!(next_pending_item(&items, None), Some(3));
    }

    #[test]
    fn skips_current_item() {
        let items = vec![item(3, "PENDING"), item(5, "PENDING")];
        assert_eq!(next_pending_item(&items, Some(3)), Some(5));
    }

    #[test]
    fn ignores_non_pending_statuses() {
        let items = vec![item(1, "SOLD"), item(2, "LIVE"), item(4, "PASSED"), item(9, "PENDING")];
        assert_eq!(next_pending_item(&items, Some(2)), Some(9));
    }

    #[test]
    fn none_when_exhausted() {
        let items = vec![item(1, "SOLD"), item(2, "SOLD")];
        assert_eq!(next_pending_item(&items, None), None);
        assert_eq!(next_pending_item(&[], None), None);
    }

    #[test]
    fn none_when_only_current_remains() {
        let items = vec![item(4, "PENDING")];
        assert_eq!(next_pending_item(&items, Some(4)), None);
    }
}
// endregion: --- Tests

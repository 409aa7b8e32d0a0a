use chrono::{DateTime, Utc};

/// 시계 가격 함수
/// 현재 가격 = max(하한가, 시작가 - 초당 하락폭 * 경과 초)
/// 순수 함수이며 상태를 갖지 않는다. 모든 조회 시점에 새로 계산한다.
pub fn current_price(
    starting_price: i64,
    floor_price: i64,
    decay_per_second: i64,
    round_started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    // now 가 라운드 시작보다 이르면 경과 시간은 0
    let elapsed_seconds = (now - round_started_at).num_seconds().max(0);
    starting_price
        .saturating_sub(decay_per_second.saturating_mul(elapsed_seconds))
        .max(floor_price)
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(started: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        started + Duration::seconds(secs)
    }

    #[test]
    fn decays_linearly_from_starting_price() {
        let started = Utc::now();
        assert_eq!(current_price(300, 50, 1, started, at(started, 0)), 300);
        assert_eq!(current_price(300, 50, 1, started, at(started, 100)), 200);
        assert_eq!(current_price(100, 20, 10, started, at(started, 1)), 90);
    }

    #[test]
    fn clamps_at_floor_price() {
        let started = Utc::now();
        // 300 - 260 = 40 이지만 하한가 50 에서 멈춘다
        assert_eq!(current_price(300, 50, 1, started, at(started, 260)), 50);
        assert_eq!(current_price(300, 50, 1, started, at(started, 100_000)), 50);
    }

    #[test]
    fn never_negative_without_floor() {
        let started = Utc::now();
        assert_eq!(current_price(100, 0, 10, started, at(started, 1_000)), 0);
    }

    #[test]
    fn clock_skew_counts_as_zero_elapsed() {
        let started = Utc::now();
        assert_eq!(current_price(300, 50, 1, started, at(started, -30)), 300);
    }

    #[test]
    fn non_increasing_over_time() {
        let started = Utc::now();
        let mut last = i64::MAX;
        for secs in 0..400 {
            let price = current_price(300, 50, 1, started, at(started, secs));
            assert!(price <= last);
            assert!(price >= 50);
            last = price;
        }
    }

    #[test]
    fn saturates_on_extreme_parameters() {
        let started = Utc::now();
        assert_eq!(
            current_price(i64::MAX, 0, i64::MAX, started, at(started, 10)),
            0
        );
    }
}
// endregion: --- Tests

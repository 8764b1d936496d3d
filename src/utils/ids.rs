//! ID 生成
//!
//! 毫秒时间戳 (41 bit) + 随机数 (12 bit) 拼成 53 bit 整数，
//! 保证可以无损通过 JSON number 传给前端。

use chrono::Utc;
use rand::Rng;

/// 自定义纪元: 2024-01-01T00:00:00Z
const EPOCH_MILLIS: i64 = 1_704_067_200_000;

/// 当前 Unix 毫秒
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 生成时间有序的 53 bit ID
pub fn snowflake_id() -> i64 {
    let elapsed = now_millis() - EPOCH_MILLIS;
    let random = rand::thread_rng().gen_range(0..0x1000_i64);
    (elapsed << 12) | random
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_fit_in_js_number() {
        // 2^53 - 1 is the largest integer JSON numbers carry exactly
        const JS_MAX_SAFE: i64 = 9_007_199_254_740_991;
        for _ in 0..1000 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id <= JS_MAX_SAFE);
        }
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let a = snowflake_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = snowflake_id();
        assert!(b > a);
    }

    #[test]
    fn test_now_millis_is_after_epoch() {
        assert!(now_millis() > EPOCH_MILLIS);
    }
}

//! 评分聚合
//!
//! 所有均分都由这里的纯函数重算，数据库中的 `rating_average`
//! 只是缓存列，写入路径负责在每次评分变更后全量重算。

/// 对非空评分求算术平均；没有任何评分时返回 0.0
pub fn average<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0;
    let mut count = 0u32;
    for rating in ratings.into_iter().flatten() {
        sum += rating;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / f64::from(count) }
}

#[cfg(test)]
mod tests {
    use super::average;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(average([]), 0.0);
        assert_eq!(average([None, None, None]), 0.0);
    }

    #[test]
    fn test_single_rating() {
        assert_eq!(average([Some(4.0)]), 4.0);
    }

    #[test]
    fn test_nulls_are_skipped_not_counted() {
        // unrated participants must not drag the mean down
        assert_eq!(average([Some(4.0), None, None]), 4.0);
        assert_eq!(average([None, Some(2.0), Some(4.0), None]), 3.0);
    }

    #[test]
    fn test_flat_mean_across_visits() {
        // one 4.0 from an earlier visit plus 4.0 and 2.0 from a later
        // visit average to 10/3, not the mean of per-visit means (3.5)
        let all = [Some(4.0), Some(4.0), Some(2.0)];
        let avg = average(all);
        assert!((avg - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_ratings() {
        assert_eq!(average([Some(3.5), Some(4.5)]), 4.0);
    }
}

/// Rendered in place of any rate whose denominator is zero.
pub const NO_DATA: &str = "—";

pub fn pct(count: u32, total: u32) -> String {
    if total == 0 {
        return NO_DATA.to_string();
    }
    format!("{:.1}%", f64::from(count) * 100.0 / f64::from(total))
}

pub fn mean(sum: u32, total: u32) -> String {
    if total == 0 {
        return NO_DATA.to_string();
    }
    format!("{:.2}", f64::from(sum) / f64::from(total))
}

/// `count/total (pct)` as used in report rows.
/// Converts a list length to a counter value, saturating instead of wrapping.
pub fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

pub fn ratio_with_pct(count: u32, total: u32) -> String {
    if total == 0 {
        return NO_DATA.to_string();
    }
    format!("{count}/{total} ({})", pct(count, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_no_data() {
        assert_eq!(pct(0, 0), NO_DATA);
        assert_eq!(pct(3, 0), NO_DATA);
        assert_eq!(mean(0, 0), NO_DATA);
        assert_eq!(ratio_with_pct(0, 0), NO_DATA);
    }

    #[test]
    fn fixed_precision() {
        assert_eq!(pct(1, 3), "33.3%");
        assert_eq!(pct(2, 2), "100.0%");
        assert_eq!(pct(0, 5), "0.0%");
        assert_eq!(mean(7, 3), "2.33");
        assert_eq!(mean(0, 4), "0.00");
        assert_eq!(ratio_with_pct(7, 10), "7/10 (70.0%)");
    }

    #[test]
    fn list_lengths_saturate_at_u32_max() {
        assert_eq!(saturating_count(7), 7);
        assert_eq!(saturating_count(u32::MAX as usize), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(saturating_count(u32::MAX as usize + 5), u32::MAX);
    }
}

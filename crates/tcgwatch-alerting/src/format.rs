//! 알림 메시지에 들어가는 수치 표기.

/// 정수면 소수점 없이, 아니면 그대로
fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// 300000 → "5 minutes"
pub fn window_minutes(window_ms: u64) -> String {
    format!("{} minutes", trim_number(window_ms as f64 / 60_000.0))
}

/// 3600000 → "1 heure(s)"
pub fn window_hours(window_ms: u64) -> String {
    format!("{} heure(s)", trim_number(window_ms as f64 / 3_600_000.0))
}

/// 임계값 대비 초과율 (반올림 정수 퍼센트). 2500 / 2000 → "25%"
pub fn exceed_percent(value: f64, limit: f64) -> String {
    format!("{}%", ((value - limit) / limit * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_hours() {
        assert_eq!(window_minutes(300_000), "5 minutes");
        assert_eq!(window_minutes(90_000), "1.5 minutes");
        assert_eq!(window_hours(3_600_000), "1 heure(s)");
        assert_eq!(window_hours(7_200_000), "2 heure(s)");
    }

    #[test]
    fn exceed_is_rounded() {
        assert_eq!(exceed_percent(2500.0, 2000.0), "25%");
        assert_eq!(exceed_percent(1001.0, 1000.0), "0%");
        assert_eq!(exceed_percent(1005.0, 1000.0), "1%");
        assert_eq!(exceed_percent(4001.0, 2000.0), "100%");
    }
}

//! UseCase: Session Timeout Monitor
//!
//! 最後のアクティビティから一定時間（既定 15 分）経過するとセッションを期限切れにします。
//! 警告状態や猶予期間はなく、期限切れからの復帰もできません。
//! ポーリング自体はアクティビティとして数えません。

use std::time::Duration;

use crate::domain::Timestamp;

/// Idle window after which the session ends
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(15 * 60);

/// Interval between expiry checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Active,
    Expired,
}

#[derive(Debug, Clone)]
pub struct SessionTimeoutMonitor {
    idle_threshold_ms: i64,
    last_activity: Timestamp,
    state: MonitorState,
}

impl SessionTimeoutMonitor {
    /// Start monitoring; the session counts as active at `now`.
    pub fn new(idle_threshold: Duration, now: Timestamp) -> Self {
        Self {
            idle_threshold_ms: i64::try_from(idle_threshold.as_millis()).unwrap_or(i64::MAX),
            last_activity: now,
            state: MonitorState::Active,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// Reset the idle clock. Has no effect once expired.
    pub fn record_activity(&mut self, now: Timestamp) {
        if self.state == MonitorState::Expired {
            return;
        }
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Compare the idle time against the threshold. Never touches the clock.
    pub fn poll(&mut self, now: Timestamp) -> MonitorState {
        if self.state == MonitorState::Active && self.idle_ms(now) >= self.idle_threshold_ms {
            tracing::info!(
                "Session idle for {} ms (threshold {} ms), expiring",
                self.idle_ms(now),
                self.idle_threshold_ms
            );
            self.state = MonitorState::Expired;
        }
        self.state
    }

    /// Time left before expiry, clamped to zero.
    pub fn time_remaining(&self, now: Timestamp) -> Duration {
        if self.state == MonitorState::Expired {
            return Duration::ZERO;
        }
        let remaining = self.idle_threshold_ms - self.idle_ms(now);
        u64::try_from(remaining)
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO)
    }

    /// Whole minutes left before expiry; reads 0 during the final minute.
    pub fn minutes_remaining(&self, now: Timestamp) -> u64 {
        self.time_remaining(now).as_secs() / 60
    }

    fn idle_ms(&self, now: Timestamp) -> i64 {
        now.value().saturating_sub(self.last_activity.value()).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_poll_before_threshold_stays_active() {
        // テスト項目: しきい値前のポーリングではアクティブのまま
        // given (前提条件):
        let mut monitor = SessionTimeoutMonitor::new(DEFAULT_IDLE_THRESHOLD, Timestamp::new(0));

        // when (操作):
        let state = monitor.poll(Timestamp::new(14 * MINUTE));

        // then (期待する結果):
        assert_eq!(state, MonitorState::Active);
        assert_eq!(monitor.last_activity(), Timestamp::new(0));
    }

    #[test]
    fn test_poll_at_threshold_expires() {
        // テスト項目: 15 分間アクティビティがなければ期限切れになる
        // given (前提条件):
        let mut monitor = SessionTimeoutMonitor::new(DEFAULT_IDLE_THRESHOLD, Timestamp::new(0));

        // when (操作):
        let state = monitor.poll(Timestamp::new(15 * MINUTE));

        // then (期待する結果):
        assert_eq!(state, MonitorState::Expired);
        assert_eq!(monitor.time_remaining(Timestamp::new(15 * MINUTE)), Duration::ZERO);
    }

    #[test]
    fn test_activity_resets_idle_clock() {
        // テスト項目: アクティビティがあるとアイドル時間がリセットされる
        // given (前提条件):
        let mut monitor = SessionTimeoutMonitor::new(DEFAULT_IDLE_THRESHOLD, Timestamp::new(0));

        // when (操作):
        monitor.record_activity(Timestamp::new(10 * MINUTE));
        let state = monitor.poll(Timestamp::new(20 * MINUTE));

        // then (期待する結果):
        assert_eq!(state, MonitorState::Active);
        assert_eq!(monitor.minutes_remaining(Timestamp::new(20 * MINUTE)), 5);
    }

    #[test]
    fn test_expired_is_terminal() {
        // テスト項目: 期限切れ後はアクティビティがあっても復帰しない
        // given (前提条件):
        let mut monitor = SessionTimeoutMonitor::new(DEFAULT_IDLE_THRESHOLD, Timestamp::new(0));
        monitor.poll(Timestamp::new(16 * MINUTE));

        // when (操作):
        monitor.record_activity(Timestamp::new(17 * MINUTE));
        let state = monitor.poll(Timestamp::new(17 * MINUTE));

        // then (期待する結果):
        assert_eq!(state, MonitorState::Expired);
        assert_eq!(monitor.minutes_remaining(Timestamp::new(17 * MINUTE)), 0);
    }

    #[test]
    fn test_minutes_remaining_reads_zero_in_final_minute() {
        // テスト項目: 最後の 1 分間は残り時間（分）が 0 と表示される
        // given (前提条件):
        let monitor = SessionTimeoutMonitor::new(DEFAULT_IDLE_THRESHOLD, Timestamp::new(0));

        // when (操作):
        let at_start = monitor.minutes_remaining(Timestamp::new(0));
        let final_minute_start = monitor.minutes_remaining(Timestamp::new(14 * MINUTE + 1));
        let final_minute_end = monitor.minutes_remaining(Timestamp::new(15 * MINUTE - 1));
        let past = monitor.time_remaining(Timestamp::new(20 * MINUTE));

        // then (期待する結果):
        assert_eq!(at_start, 15);
        assert_eq!(final_minute_start, 0);
        assert_eq!(final_minute_end, 0);
        assert_eq!(past, Duration::ZERO);
    }
}

use chrono::{DateTime, Duration, Utc};

pub const RESEND_COOLDOWN_SECS: i64 = 60;

/// Gate on re-sending a one-time code.
#[derive(Debug, Clone, PartialEq)]
pub struct ResendCooldown {
    cooldown: Duration,
    last_sent: Option<DateTime<Utc>>,
}

impl Default for ResendCooldown {
    fn default() -> Self {
        Self::new(Duration::seconds(RESEND_COOLDOWN_SECS))
    }
}

impl ResendCooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: None,
        }
    }

    /// Marks a code as sent at `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.last_sent = Some(now);
    }

    /// Whole seconds left before another send is allowed, rounded up.
    pub fn remaining(&self, now: DateTime<Utc>) -> i64 {
        match self.last_sent {
            Some(sent) => {
                let left = (sent + self.cooldown - now).num_milliseconds();
                if left <= 0 {
                    0
                } else {
                    (left + 999) / 1000
                }
            }
            None => 0,
        }
    }

    pub fn can_resend(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cooldown_allows_sending() {
        assert!(ResendCooldown::default().can_resend(Utc::now()));
    }

    #[test]
    fn resend_blocked_until_cooldown_elapses() {
        let sent = Utc::now();
        let mut cooldown = ResendCooldown::default();
        cooldown.start(sent);

        assert!(!cooldown.can_resend(sent));
        assert_eq!(cooldown.remaining(sent), 60);
        assert_eq!(cooldown.remaining(sent + Duration::milliseconds(59_500)), 1);
        assert!(cooldown.can_resend(sent + Duration::seconds(60)));
    }
}

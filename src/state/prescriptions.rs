use chrono::{DateTime, Duration, Utc};

use crate::api::models::{Prescription, PrescriptionStatus};

/// What a prescription is shown as, which may differ from its stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Active,
    Completed,
    Cancelled,
    Unknown,
}

impl DisplayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Active => "Active",
            DisplayStatus::Completed => "Completed",
            DisplayStatus::Cancelled => "Cancelled",
            DisplayStatus::Unknown => "Unknown",
        }
    }
}

/// An active prescription past its expiry date displays as completed.
pub fn display_status(prescription: &Prescription, now: DateTime<Utc>) -> DisplayStatus {
    match prescription.status {
        PrescriptionStatus::Active => match prescription.expiry_date {
            Some(expiry) if expiry < now => DisplayStatus::Completed,
            _ => DisplayStatus::Active,
        },
        PrescriptionStatus::Completed => DisplayStatus::Completed,
        PrescriptionStatus::Cancelled => DisplayStatus::Cancelled,
        PrescriptionStatus::Unknown => DisplayStatus::Unknown,
    }
}

/// Still-active prescriptions that expire within `window` from `now`.
pub fn expiring_within(
    prescriptions: &[Prescription],
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<&Prescription> {
    let horizon = now + window;
    prescriptions
        .iter()
        .filter(|p| display_status(p, now) == DisplayStatus::Active)
        .filter(|p| matches!(p.expiry_date, Some(expiry) if expiry <= horizon))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Ref;

    fn prescription(status: PrescriptionStatus, expiry: Option<DateTime<Utc>>) -> Prescription {
        Prescription {
            id: "rx".to_string(),
            patient: Ref::Id("p1".to_string()),
            doctor: Ref::Id("d1".to_string()),
            appointment: None,
            diagnosis: "Hypertension".to_string(),
            medications: vec![],
            status,
            created_at: None,
            expiry_date: expiry,
            notes: None,
        }
    }

    #[test]
    fn expired_active_prescription_reads_completed() {
        let now = Utc::now();
        let expired = prescription(PrescriptionStatus::Active, Some(now - Duration::hours(1)));
        assert_eq!(display_status(&expired, now), DisplayStatus::Completed);
        assert_eq!(display_status(&expired, now).label(), "Completed");
    }

    #[test]
    fn active_without_or_before_expiry_stays_active() {
        let now = Utc::now();
        assert_eq!(
            display_status(&prescription(PrescriptionStatus::Active, None), now),
            DisplayStatus::Active
        );
        assert_eq!(
            display_status(
                &prescription(PrescriptionStatus::Active, Some(now + Duration::days(1))),
                now
            ),
            DisplayStatus::Active
        );
    }

    #[test]
    fn cancelled_is_never_overridden() {
        let now = Utc::now();
        let cancelled =
            prescription(PrescriptionStatus::Cancelled, Some(now - Duration::days(3)));
        assert_eq!(display_status(&cancelled, now), DisplayStatus::Cancelled);
    }

    #[test]
    fn expiring_window_excludes_expired_and_far_future() {
        let now = Utc::now();
        let list = vec![
            prescription(PrescriptionStatus::Active, Some(now + Duration::days(1))),
            prescription(PrescriptionStatus::Active, Some(now - Duration::days(1))),
            prescription(PrescriptionStatus::Active, Some(now + Duration::days(30))),
            prescription(PrescriptionStatus::Completed, Some(now + Duration::days(1))),
            prescription(PrescriptionStatus::Active, None),
        ];

        let soon = expiring_within(&list, now, Duration::days(3));
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].expiry_date, Some(now + Duration::days(1)));
    }
}

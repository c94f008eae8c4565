use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

use crate::api::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppointmentFilter {
    Upcoming,
    Past,
    #[default]
    All,
}

impl FromStr for AppointmentFilter {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" | "next" => Ok(AppointmentFilter::Upcoming),
            "past" | "history" => Ok(AppointmentFilter::Past),
            "" | "all" => Ok(AppointmentFilter::All),
            _ => Err("Allowed filters: upcoming, past, all"),
        }
    }
}

/// Selects appointments relative to `now`.
///
/// Upcoming means `appointment_date >= now` and past is its exact complement, so the
/// two never overlap and together cover the input. Input order is kept.
pub fn filter_appointments<'a>(
    appointments: &'a [Appointment],
    filter: AppointmentFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|appointment| match filter {
            AppointmentFilter::Upcoming => appointment.appointment_date >= now,
            AppointmentFilter::Past => appointment.appointment_date < now,
            AppointmentFilter::All => true,
        })
        .collect()
}

/// Counts shown on the doctor's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppointmentStats {
    pub total: usize,
    pub today: usize,
    pub upcoming: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub pending: usize,
}

fn is_same_day<Tz: TimeZone>(appointment: &Appointment, now: &DateTime<Tz>) -> bool {
    appointment
        .appointment_date
        .with_timezone(&now.timezone())
        .date_naive()
        == now.date_naive()
}

/// Appointments falling on `now`'s calendar day, in `now`'s time zone.
pub fn todays_appointments<'a, Tz: TimeZone>(
    appointments: &'a [Appointment],
    now: &DateTime<Tz>,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|appointment| is_same_day(appointment, now))
        .collect()
}

/// Rescans the whole list; callers are expected to hold tens of items, not thousands.
///
/// `today` compares calendar days in the time zone of `now`, so an appointment at
/// 23:30 local time counts for today even if it is already tomorrow in UTC.
pub fn appointment_stats<Tz: TimeZone>(
    appointments: &[Appointment],
    now: &DateTime<Tz>,
) -> AppointmentStats {
    let now_utc = now.with_timezone(&Utc);

    appointments
        .iter()
        .fold(AppointmentStats::default(), |mut stats, appointment| {
            stats.total += 1;
            if is_same_day(appointment, now) {
                stats.today += 1;
            }
            if appointment.appointment_date >= now_utc {
                stats.upcoming += 1;
            }
            match appointment.status {
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                AppointmentStatus::Scheduled | AppointmentStatus::Confirmed => {
                    stats.pending += 1
                }
                _ => {}
            }
            stats
        })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset};

    use super::*;
    use crate::api::models::{AppointmentType, Ref};

    fn appointment(id: &str, date: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: id.to_string(),
            patient: Ref::Id("p1".to_string()),
            doctor: Ref::Id("d1".to_string()),
            appointment_date: date,
            duration: Some(30),
            kind: AppointmentType::InPerson,
            status,
            reason: None,
            notes: None,
        }
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn upcoming_and_past_partition_the_list() {
        let now = at("2026-10-17T12:00:00Z");
        let list = vec![
            appointment("a", now - Duration::days(2), AppointmentStatus::Completed),
            appointment("b", now, AppointmentStatus::Scheduled),
            appointment("c", now + Duration::hours(1), AppointmentStatus::Confirmed),
            appointment("d", now - Duration::seconds(1), AppointmentStatus::Scheduled),
        ];

        let upcoming: Vec<&str> = filter_appointments(&list, AppointmentFilter::Upcoming, now)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        let past: Vec<&str> = filter_appointments(&list, AppointmentFilter::Past, now)
            .iter()
            .map(|a| a.id.as_str())
            .collect();

        assert_eq!(upcoming, vec!["b", "c"]);
        assert_eq!(past, vec!["a", "d"]);
        assert_eq!(upcoming.len() + past.len(), list.len());
        assert!(upcoming.iter().all(|id| !past.contains(id)));
        assert_eq!(
            filter_appointments(&list, AppointmentFilter::All, now).len(),
            list.len()
        );
    }

    #[test]
    fn filter_parses_user_input() {
        assert_eq!("Upcoming".parse::<AppointmentFilter>(), Ok(AppointmentFilter::Upcoming));
        assert_eq!("".parse::<AppointmentFilter>(), Ok(AppointmentFilter::All));
        assert!("tomorrow".parse::<AppointmentFilter>().is_err());
    }

    #[test]
    fn today_uses_local_calendar_day() {
        // UTC+2: local day 2026-10-17 runs from 2026-10-16T22:00Z to 2026-10-17T22:00Z
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();

        let list = vec![
            appointment("early", at("2026-10-16T22:30:00Z"), AppointmentStatus::Completed),
            appointment("late", at("2026-10-17T21:59:00Z"), AppointmentStatus::Scheduled),
            appointment("tomorrow", at("2026-10-17T22:00:00Z"), AppointmentStatus::Scheduled),
            appointment("yesterday", at("2026-10-16T21:00:00Z"), AppointmentStatus::Cancelled),
        ];

        let stats = appointment_stats(&list, &now);
        assert_eq!(stats.today, 2);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.upcoming, 2);

        let ids: Vec<&str> = todays_appointments(&list, &now)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn unknown_statuses_only_count_toward_total() {
        let now = Utc::now();
        let list = vec![appointment(
            "x",
            now - Duration::days(30),
            AppointmentStatus::Unknown,
        )];

        let stats = appointment_stats(&list, &now);
        assert_eq!(
            stats,
            AppointmentStats {
                total: 1,
                ..Default::default()
            }
        );
    }
}

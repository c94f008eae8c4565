use std::sync::Arc;

use chrono::{Duration, Local, Utc};
use futures::future;
use teloxide::prelude::*;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::api::models::{Appointment, AppointmentFilters, Prescription, PrescriptionFilters};
use crate::api::ApiClient;
use crate::db::models::StoredSession;
use crate::db::sessions::SessionStore;
use crate::state::appointments::todays_appointments;
use crate::state::prescriptions::expiring_within;
use crate::utils::{escape_markdown, format_date, format_datetime};

/// Schedules the daily reminder run.
///
/// This function sets up a scheduled job that walks every stored session and sends
/// each signed-in chat a digest of today's appointments and of prescriptions about
/// to expire. It uses the `tokio_cron_scheduler` crate to run on `schedule`.
///
/// Parameters:
/// - `store`: Where the signed-in sessions are persisted.
/// - `client`: Unauthenticated API client; each session's token is applied per run.
/// - `bot`: A Telegram Bot instance for sending reminders.
/// - `schedule`: Six-field cron expression (seconds first).
/// - `expiry_window`: How far ahead a prescription expiry is worth a reminder.
///
/// Returns:
/// - `Ok(())` if the job is successfully scheduled and started.
/// - `Err(Box<dyn std::error::Error>)` if any step fails.
pub async fn schedule_reminders(
    store: Arc<dyn SessionStore>,
    client: ApiClient,
    bot: Bot,
    schedule: &str,
    expiry_window: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sched = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let store = store.clone();
        let client = client.clone();
        let bot = bot.clone();
        Box::pin(async move {
            match send_reminders(store.as_ref(), &client, &bot, expiry_window).await {
                Ok(sent) => log::info!("Reminder run completed, {} chats notified", sent),
                Err(e) => log::error!("Error running reminders: {}", e),
            }
        })
    })
    .map_err(|e| {
        log::error!("Failed to create reminder job: {}", e);
        e
    })?;

    sched.add(job).await.map_err(|e| {
        log::error!("Failed to add reminder job to scheduler: {}", e);
        e
    })?;

    tokio::spawn(async move {
        if let Err(e) = sched.start().await {
            log::error!("Scheduler error: {}", e);
        }
    });

    log::info!("Reminder scheduler started ({})", schedule);
    Ok(())
}

/// Sends one reminder digest per stored session, concurrently.
///
/// Sessions whose key isn't a chat id, whose token is rejected, or who have nothing
/// due today are skipped. Returns how many chats received a message.
async fn send_reminders(
    store: &dyn SessionStore,
    client: &ApiClient,
    bot: &Bot,
    expiry_window: Duration,
) -> Result<usize, crate::db::sessions::StoreError> {
    let sessions = store.all().await?;

    let runs: Vec<_> = sessions
        .iter()
        .map(|(key, session)| remind_chat(key, session, client, bot, expiry_window))
        .collect();

    let sent = future::join_all(runs)
        .await
        .into_iter()
        .filter(|delivered| *delivered)
        .count();

    Ok(sent)
}

async fn remind_chat(
    key: &str,
    session: &StoredSession,
    client: &ApiClient,
    bot: &Bot,
    expiry_window: Duration,
) -> bool {
    let Ok(chat_id) = key.parse::<i64>() else {
        log::debug!("Skipping non-chat session {}", key);
        return false;
    };

    let client = client.with_token(&session.token);
    let appointments = match client
        .appointments()
        .list(&AppointmentFilters::default())
        .await
    {
        Ok(appointments) => appointments,
        Err(e) => {
            log::warn!("Reminder fetch failed for {}: {}", key, e);
            return false;
        }
    };
    // Prescriptions are optional in the digest.
    let prescriptions = client
        .prescriptions()
        .list(&PrescriptionFilters::default())
        .await
        .unwrap_or_else(|e| {
            log::warn!("Prescription fetch failed for {}: {}", key, e);
            Vec::new()
        });

    let now = Local::now();
    let today: Vec<&Appointment> = todays_appointments(&appointments, &now)
        .into_iter()
        .filter(|a| a.appointment_date >= now.with_timezone(&Utc))
        .collect();
    let expiring = expiring_within(&prescriptions, Utc::now(), expiry_window);

    let Some(message) = build_reminder(&today, &expiring) else {
        return false;
    };

    match bot
        .send_message(ChatId(chat_id), message)
        .parse_mode(teloxide::types::ParseMode::MarkdownV2)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            log::error!("Failed to send reminder to {}: {}", chat_id, e);
            false
        }
    }
}

/// Builds the MarkdownV2 digest, or `None` when there is nothing to remind about.
fn build_reminder(today: &[&Appointment], expiring: &[&Prescription]) -> Option<String> {
    if today.is_empty() && expiring.is_empty() {
        return None;
    }

    let mut sections = vec!["⏰ *Daily reminder*".to_string()];

    if !today.is_empty() {
        let lines: Vec<String> = today
            .iter()
            .map(|a| {
                format!(
                    "• `{}` {}",
                    escape_markdown(&format_datetime(a.appointment_date)),
                    escape_markdown(a.reason.as_deref().unwrap_or("Appointment"))
                )
            })
            .collect();
        sections.push(format!("*Appointments today:*\n{}", lines.join("\n")));
    }

    if !expiring.is_empty() {
        let lines: Vec<String> = expiring
            .iter()
            .map(|p| {
                let expiry = p.expiry_date.map(format_date).unwrap_or_default();
                format!(
                    "• {} \\(expires `{}`\\)",
                    escape_markdown(&p.diagnosis),
                    escape_markdown(&expiry)
                )
            })
            .collect();
        sections.push(format!("*Prescriptions expiring soon:*\n{}", lines.join("\n")));
    }

    Some(sections.join("\n\n"))
}

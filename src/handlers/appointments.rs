use chrono::{Local, Utc};
use teloxide::prelude::*;

use crate::api::models::{Appointment, AppointmentFilters, AppointmentStatus, Role, User};
use crate::handlers::{report_failure, require_doctor, require_user, send_chunked};
use crate::session::Sessions;
use crate::state::appointments::{
    appointment_stats, filter_appointments, AppointmentFilter, AppointmentStats,
};
use crate::utils::format_datetime;
use crate::Error;

/// One line per appointment, naming the other party from the viewer's side.
pub fn format_appointment(appointment: &Appointment, viewer: Role) -> String {
    let counterpart = match viewer {
        Role::Doctor => appointment.patient.populated().map(User::full_name),
        _ => appointment
            .doctor
            .populated()
            .map(|d| format!("Dr. {}", d.full_name())),
    }
    .unwrap_or_else(|| "—".to_string());

    let mut line = format!(
        "🗓 {} · {} · {:?} · {}",
        format_datetime(appointment.appointment_date),
        counterpart,
        appointment.kind,
        appointment.status.label()
    );
    if let Some(reason) = &appointment.reason {
        line.push_str(&format!("\n   Reason: {}", reason));
    }
    line.push_str(&format!("\n   ID: {}", appointment.id));
    line
}

pub fn format_stats(stats: &AppointmentStats) -> String {
    [
        "📊 Appointment overview".to_string(),
        format!("Today: {}", stats.today),
        format!("Upcoming: {}", stats.upcoming),
        format!("Pending: {}", stats.pending),
        format!("Completed: {}", stats.completed),
        format!("Cancelled: {}", stats.cancelled),
        format!("Total: {}", stats.total),
    ]
    .join("\n")
}

/// Lists the user's appointments, filtered client-side.
///
/// # Arguments
///
/// * `arg` - `upcoming`, `past` or `all` (empty means all)
pub async fn list_appointments(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let filter = match arg.parse::<AppointmentFilter>() {
        Ok(filter) => filter,
        Err(hint) => {
            bot.send_message(msg.chat.id, hint).await?;
            return Ok(());
        }
    };
    let Some((client, user)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    log::info!("Listing {:?} appointments", filter);
    let appointments = match client
        .appointments()
        .list(&AppointmentFilters::default())
        .await
    {
        Ok(appointments) => appointments,
        Err(e) => return Ok(report_failure(&bot, msg.chat.id, &e).await?),
    };

    let selected = filter_appointments(&appointments, filter, Utc::now());
    if selected.is_empty() {
        bot.send_message(msg.chat.id, "No appointments found.")
            .await?;
        return Ok(());
    }

    let message = selected
        .iter()
        .map(|appointment| format_appointment(appointment, user.role))
        .collect::<Vec<String>>()
        .join("\n\n");

    send_chunked(&bot, msg.chat.id, &message).await?;
    Ok(())
}

/// `/cancel <id> [reason...]`
pub async fn cancel_appointment(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let mut parts = arg.splitn(2, char::is_whitespace);
    let Some(id) = parts.next().filter(|id| !id.is_empty()) else {
        bot.send_message(msg.chat.id, "Usage: /cancel <appointment id> [reason]")
            .await?;
        return Ok(());
    };
    let reason = parts
        .next()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let Some((client, _)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    match client.appointments().cancel(id, reason).await {
        Ok(appointment) => {
            log::info!("Cancelled appointment {}", appointment.id);
            bot.send_message(msg.chat.id, "Appointment cancelled.")
                .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

/// `/status <id> <confirmed|completed|no-show>`, doctors only.
pub async fn update_status(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    let status = match parts.get(1).copied() {
        Some("confirmed") => AppointmentStatus::Confirmed,
        Some("completed") => AppointmentStatus::Completed,
        Some("no-show") => AppointmentStatus::NoShow,
        _ => {
            bot.send_message(
                msg.chat.id,
                "Usage: /status <appointment id> <confirmed|completed|no-show>",
            )
            .await?;
            return Ok(());
        }
    };

    let Some((client, _)) = require_doctor(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    match client
        .appointments()
        .update_status(parts[0], status, None)
        .await
    {
        Ok(appointment) => {
            bot.send_message(
                msg.chat.id,
                format!("Appointment is now {}.", appointment.status.label()),
            )
            .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

pub async fn show_stats(bot: Bot, msg: Message, sessions: Sessions) -> Result<(), Error> {
    let Some((client, _)) = require_doctor(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    match client
        .appointments()
        .list(&AppointmentFilters::default())
        .await
    {
        Ok(appointments) => {
            let stats = appointment_stats(&appointments, &Local::now());
            bot.send_message(msg.chat.id, format_stats(&stats)).await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

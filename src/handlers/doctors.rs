use teloxide::prelude::*;

use crate::api::models::{Doctor, DoctorSearch};
use crate::handlers::{report_failure, require_doctor, require_user, send_chunked};
use crate::session::Sessions;
use crate::Error;

pub const MISSING_PROFILE_REPLY: &str =
    "You haven't set up your doctor profile yet, so you won't appear in /doctors search results.";

pub fn format_doctor(doctor: &Doctor) -> String {
    let mut line = format!("🩺 {} · {}", doctor.display_name(), doctor.specialization);
    if let Some(years) = doctor.experience {
        line.push_str(&format!("\n   Experience: {} years", years));
    }
    if let Some(fee) = doctor.consultation_fee {
        line.push_str(&format!("\n   Fee: {:.2}", fee));
    }
    if let Some(rating) = doctor.rating {
        line.push_str(&format!("\n   Rating: {:.1}/5", rating));
    }
    if !doctor.availability.is_empty() {
        let slots = doctor
            .availability
            .iter()
            .map(|slot| format!("{} {}-{}", slot.day, slot.start_time, slot.end_time))
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!("\n   Available: {}", slots));
    }
    line
}

/// `/doctors [specialization]` lists all doctors, or searches by specialization.
pub async fn list_doctors(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let Some((client, _)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    let query = arg.trim();
    let result = if query.is_empty() {
        client.doctors().list().await
    } else {
        client
            .doctors()
            .search(&DoctorSearch {
                specialization: Some(query.to_string()),
                name: None,
            })
            .await
    };

    match result {
        Ok(doctors) if doctors.is_empty() => {
            bot.send_message(msg.chat.id, "No doctors found.").await?;
        }
        Ok(doctors) => {
            let message = doctors
                .iter()
                .map(format_doctor)
                .collect::<Vec<String>>()
                .join("\n\n");
            send_chunked(&bot, msg.chat.id, &message).await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

/// Shows the signed-in doctor's own profile, which may not exist yet.
pub async fn show_doctor_profile(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some((client, _)) = require_doctor(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    match client.doctors().my_profile().await {
        Ok(Some(doctor)) => {
            bot.send_message(msg.chat.id, format_doctor(&doctor)).await?;
        }
        Ok(None) => {
            bot.send_message(msg.chat.id, MISSING_PROFILE_REPLY).await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

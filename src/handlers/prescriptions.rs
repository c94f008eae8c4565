use chrono::{DateTime, Utc};
use teloxide::prelude::*;

use crate::api::models::{Prescription, PrescriptionFilters};
use crate::handlers::{failure_text, require_user, send_chunked};
use crate::session::Sessions;
use crate::state::prescriptions::display_status;
use crate::state::Loadable;
use crate::utils::format_date;
use crate::Error;

pub fn format_prescription(prescription: &Prescription, now: DateTime<Utc>) -> String {
    let mut text = format!(
        "💊 {} · {}",
        prescription.diagnosis,
        display_status(prescription, now).label()
    );
    for item in &prescription.medications {
        text.push_str(&format!(
            "\n   • {} {} {} for {}",
            item.name, item.dosage, item.frequency, item.duration
        ));
        if let Some(instructions) = &item.instructions {
            text.push_str(&format!(" ({})", instructions));
        }
    }
    if let Some(expiry) = prescription.expiry_date {
        text.push_str(&format!("\n   Valid until {}", format_date(expiry)));
    }
    text
}

pub async fn list_prescriptions(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
) -> Result<(), Error> {
    let Some((client, _)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    log::info!("Listing prescriptions");
    let mut prescriptions = Loadable::new();
    prescriptions
        .refresh(|| async {
            client
                .prescriptions()
                .list(&PrescriptionFilters::default())
                .await
        })
        .await;

    let message = match (&prescriptions.error, &prescriptions.data) {
        (Some(error), _) => failure_text(error),
        (None, Some(list)) if !list.is_empty() => {
            let now = Utc::now();
            list.iter()
                .map(|p| format_prescription(p, now))
                .collect::<Vec<String>>()
                .join("\n\n")
        }
        _ => "No prescriptions found.".to_string(),
    };
    send_chunked(&bot, msg.chat.id, &message).await?;
    Ok(())
}

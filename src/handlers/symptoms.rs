use teloxide::prelude::*;

use crate::api::models::{SymptomAssessment, SymptomAssessmentRequest};
use crate::handlers::{report_failure, require_user, send_chunked};
use crate::session::Sessions;
use crate::Error;

pub fn parse_symptoms(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn format_assessment(assessment: &SymptomAssessment) -> String {
    let mut sections = Vec::new();

    if let Some(urgency) = &assessment.urgency_level {
        sections.push(format!("⚠️ Urgency: {}", urgency));
    }
    if !assessment.possible_conditions.is_empty() {
        let lines = assessment
            .possible_conditions
            .iter()
            .map(|c| match c.probability {
                Some(p) => format!("  • {} ({:.0}%)", c.name, p * 100.0),
                None => format!("  • {}", c.name),
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Possible conditions:\n{}", lines));
    }
    if !assessment.recommendations.is_empty() {
        let lines = assessment
            .recommendations
            .iter()
            .map(|r| format!("  • {}", r))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Recommendations:\n{}", lines));
    }

    sections.push("This is not a diagnosis. Book an appointment if symptoms persist.".to_string());
    sections.join("\n\n")
}

/// `/symptoms a, b, c` assesses; bare `/symptoms` lists common symptoms.
pub async fn assess_symptoms(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let Some((client, _)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };
    let symptoms = parse_symptoms(&arg);

    if symptoms.is_empty() {
        match client.symptom_assessments().common_symptoms().await {
            Ok(common) => {
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Common symptoms: {}\n\nUsage: /symptoms fever, cough",
                        common.join(", ")
                    ),
                )
                .await?;
            }
            Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
        }
        return Ok(());
    }

    let request = SymptomAssessmentRequest {
        symptoms,
        ..Default::default()
    };
    match client.symptom_assessments().assess(&request).await {
        Ok(assessment) => {
            send_chunked(&bot, msg.chat.id, &format_assessment(&assessment)).await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

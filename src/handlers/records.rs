use chrono::Utc;
use teloxide::prelude::*;

use crate::api::models::{BloodPressure, MedicalRecord, Role, VitalSigns};
use crate::handlers::{report_failure, require_user, send_chunked};
use crate::session::Sessions;
use crate::state::records::{remove_entry, RecordSection};
use crate::state::vitals::{bmi, bmi_category, latest};
use crate::utils::format_date;
use crate::Error;

fn numbered<T>(title: &str, items: &[T], describe: impl Fn(&T) -> String) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let lines = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("  {}. {}", i + 1, describe(item)))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("{}:\n{}", title, lines))
}

pub fn format_vitals(vitals: &VitalSigns) -> String {
    let mut lines = Vec::new();
    if let Some(at) = vitals.recorded_at {
        lines.push(format!("Recorded {}", format_date(at)));
    }
    if let Some(bp) = vitals.blood_pressure {
        lines.push(format!("Blood pressure: {}/{} mmHg", bp.systolic, bp.diastolic));
    }
    if let Some(hr) = vitals.heart_rate {
        lines.push(format!("Heart rate: {} bpm", hr));
    }
    if let Some(t) = vitals.temperature {
        lines.push(format!("Temperature: {:.1} °C", t));
    }
    if let Some(spo2) = vitals.oxygen_saturation {
        lines.push(format!("SpO₂: {}%", spo2));
    }
    if let Some(value) = bmi(vitals.weight, vitals.height) {
        lines.push(format!("BMI: {:.1} ({})", value, bmi_category(value)));
    }
    lines.join("\n")
}

/// Plain-text overview of every section of the record, numbered for `/remove`.
pub fn format_record(record: &MedicalRecord) -> String {
    let sections = [
        numbered("Allergies", &record.allergies, |a| match &a.severity {
            Some(severity) => format!("{} ({})", a.allergen, severity),
            None => a.allergen.clone(),
        }),
        numbered("Conditions", &record.conditions, |c| c.name.clone()),
        numbered("Medications", &record.medications, |m| match &m.dosage {
            Some(dosage) => format!("{} {}", m.name, dosage),
            None => m.name.clone(),
        }),
        numbered("Surgeries", &record.surgeries, |s| s.procedure.clone()),
        numbered("Immunizations", &record.immunizations, |i| i.vaccine.clone()),
        numbered("Family history", &record.family_history, |f| {
            format!("{}: {}", f.relation, f.condition)
        }),
        latest(&record.vital_signs).map(|v| format!("Latest vitals:\n{}", format_vitals(v))),
    ];

    let body: Vec<String> = sections.into_iter().flatten().collect();
    if body.is_empty() {
        "📋 Your medical record is empty.".to_string()
    } else {
        format!("📋 Medical record\n\n{}", body.join("\n\n"))
    }
}

/// `/record [patient id]`; doctors must name the patient.
pub async fn show_record(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let Some((client, user)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    let patient_id = arg.trim();
    let result = match (user.role, patient_id.is_empty()) {
        (Role::Doctor, true) => {
            bot.send_message(msg.chat.id, "Usage: /record <patient id>")
                .await?;
            return Ok(());
        }
        (Role::Doctor, false) => client.medical_records().for_patient(patient_id).await,
        _ => client.medical_records().mine().await,
    };

    match result {
        Ok(record) => {
            send_chunked(&bot, msg.chat.id, &format_record(&record)).await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

/// A reading typed by the user: finite and strictly positive.
fn measurement(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Reply to `/bmi <weight kg> <height cm>`.
pub fn bmi_reply(arg: &str) -> String {
    let values: Option<Vec<f64>> = arg.split_whitespace().map(measurement).collect();

    match values.as_deref() {
        Some(&[weight, height]) => match bmi(Some(weight), Some(height)) {
            Some(value) => format!("BMI: {:.1} ({})", value, bmi_category(value)),
            None => "Height must be greater than zero.".to_string(),
        },
        _ => "Usage: /bmi <weight kg> <height cm> (positive numbers)".to_string(),
    }
}

pub async fn compute_bmi(bot: Bot, msg: Message, arg: String) -> Result<(), Error> {
    bot.send_message(msg.chat.id, bmi_reply(&arg)).await?;
    Ok(())
}

/// Parses `key=value` readings such as `bp=120/80 hr=72 weight=70`.
///
/// Returns the readings and an optional `patient=<id>` target, or `None` when a token
/// is malformed or no reading was given.
pub fn parse_vitals(arg: &str) -> Option<(VitalSigns, Option<String>)> {
    let mut vitals = VitalSigns::default();
    let mut patient = None;

    for token in arg.split_whitespace() {
        let (key, value) = token.split_once('=')?;
        match key.to_lowercase().as_str() {
            "bp" => {
                let (systolic, diastolic) = value.split_once('/')?;
                vitals.blood_pressure = Some(BloodPressure {
                    systolic: systolic.parse().ok()?,
                    diastolic: diastolic.parse().ok()?,
                });
            }
            "hr" => vitals.heart_rate = Some(measurement(value)?),
            "temp" => vitals.temperature = Some(measurement(value)?),
            "weight" => vitals.weight = Some(measurement(value)?),
            "height" => vitals.height = Some(measurement(value)?),
            "spo2" => vitals.oxygen_saturation = Some(measurement(value)?),
            "patient" => patient = Some(value.to_string()),
            _ => return None,
        }
    }

    if vitals == VitalSigns::default() {
        return None;
    }
    Some((vitals, patient))
}

/// `/vitals bp=120/80 hr=72 temp=36.8 weight=70 height=175 spo2=98 [patient=<id>]`
pub async fn record_vitals(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let Some((mut vitals, patient_id)) = parse_vitals(&arg) else {
        bot.send_message(
            msg.chat.id,
            "Usage: /vitals bp=120/80 hr=72 temp=36.8 weight=70 height=175 spo2=98 [patient=<id>]",
        )
        .await?;
        return Ok(());
    };

    let Some((client, _)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };

    vitals.recorded_at = Some(Utc::now());
    match client
        .medical_records()
        .add_vital_signs(&vitals, patient_id.as_deref())
        .await
    {
        Ok(_) => {
            bot.send_message(
                msg.chat.id,
                format!("✅ Vital signs recorded.\n{}", format_vitals(&vitals)),
            )
            .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

/// `/remove <section> <number> [patient id]`
///
/// Removes one entry locally and saves the whole record back.
pub async fn remove_record_entry(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    arg: String,
) -> Result<(), Error> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    let parsed = match parts.as_slice() {
        [section, number] | [section, number, _] => section
            .parse::<RecordSection>()
            .ok()
            .zip(number.parse::<usize>().ok().filter(|n| *n > 0)),
        _ => None,
    };
    let Some((section, number)) = parsed else {
        bot.send_message(
            msg.chat.id,
            "Usage: /remove <allergies|conditions|medications|surgeries|immunizations|family> <number> [patient id]",
        )
        .await?;
        return Ok(());
    };
    let patient_id = parts.get(2).copied();

    let Some((client, _)) = require_user(&bot, &sessions, msg.chat.id).await? else {
        return Ok(());
    };
    let records = client.medical_records();

    let record = match patient_id {
        Some(id) => records.for_patient(id).await,
        None => records.mine().await,
    };
    let record = match record {
        Ok(record) => record,
        Err(e) => return Ok(report_failure(&bot, msg.chat.id, &e).await?),
    };

    let updated = match remove_entry(&record, section, number - 1) {
        Ok(updated) => updated,
        Err(e) => return Ok(report_failure(&bot, msg.chat.id, &e).await?),
    };

    match records.save(&updated, patient_id).await {
        Ok(_) => {
            bot.send_message(msg.chat.id, format!("Removed entry {} from {}.", number, section))
                .await?;
        }
        Err(e) => report_failure(&bot, msg.chat.id, &e).await?,
    }
    Ok(())
}

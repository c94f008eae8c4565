use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::api::models::MedicalRecord;

/// Array sections of a medical record that can be edited locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSection {
    Allergies,
    Conditions,
    Medications,
    Surgeries,
    Immunizations,
    FamilyHistory,
}

impl fmt::Display for RecordSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordSection::Allergies => "allergies",
            RecordSection::Conditions => "conditions",
            RecordSection::Medications => "medications",
            RecordSection::Surgeries => "surgeries",
            RecordSection::Immunizations => "immunizations",
            RecordSection::FamilyHistory => "family history",
        };
        f.write_str(name)
    }
}

impl FromStr for RecordSection {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allergy" | "allergies" => Ok(RecordSection::Allergies),
            "condition" | "conditions" => Ok(RecordSection::Conditions),
            "medication" | "medications" => Ok(RecordSection::Medications),
            "surgery" | "surgeries" => Ok(RecordSection::Surgeries),
            "immunization" | "immunizations" => Ok(RecordSection::Immunizations),
            "family" | "familyhistory" | "family-history" => Ok(RecordSection::FamilyHistory),
            _ => Err("Allowed sections: allergies, conditions, medications, surgeries, immunizations, family"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("No entry {index} in {section} (it has {len})")]
pub struct EntryOutOfRange {
    pub section: RecordSection,
    pub index: usize,
    pub len: usize,
}

fn remove_at<T>(
    items: &mut Vec<T>,
    section: RecordSection,
    index: usize,
) -> Result<(), EntryOutOfRange> {
    if index >= items.len() {
        return Err(EntryOutOfRange {
            section,
            index,
            len: items.len(),
        });
    }
    items.remove(index);
    Ok(())
}

/// Returns a copy of `record` with one entry removed, ready to be saved whole.
pub fn remove_entry(
    record: &MedicalRecord,
    section: RecordSection,
    index: usize,
) -> Result<MedicalRecord, EntryOutOfRange> {
    let mut updated = record.clone();
    match section {
        RecordSection::Allergies => remove_at(&mut updated.allergies, section, index)?,
        RecordSection::Conditions => remove_at(&mut updated.conditions, section, index)?,
        RecordSection::Medications => remove_at(&mut updated.medications, section, index)?,
        RecordSection::Surgeries => remove_at(&mut updated.surgeries, section, index)?,
        RecordSection::Immunizations => remove_at(&mut updated.immunizations, section, index)?,
        RecordSection::FamilyHistory => remove_at(&mut updated.family_history, section, index)?,
    }
    Ok(updated)
}

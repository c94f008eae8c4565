use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Anything the backend identifies with an `_id`.
pub trait HasId {
    fn id(&self) -> &str;
}

/// Removes the `id` virtual from every object that also carries `_id`.
///
/// Documents serialized with virtuals send both keys, which serde would reject as a
/// duplicate of the aliased field.
pub(crate) fn dedupe_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.contains_key("_id") {
                map.remove("id");
            }
            map.values_mut().for_each(dedupe_ids);
        }
        Value::Array(items) => items.iter_mut().for_each(dedupe_ids),
        _ => {}
    }
}

/// A reference the backend sometimes populates and sometimes sends as a bare id.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Ref<T> {
    Populated(T),
    Id(String),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(Ref::Id(id)),
            mut value => {
                dedupe_ids(&mut value);
                serde_json::from_value(value)
                    .map(Ref::Populated)
                    .map_err(D::Error::custom)
            }
        }
    }
}

impl<T: HasId> Ref<T> {
    pub fn id(&self) -> &str {
        match self {
            Ref::Populated(value) => value.id(),
            Ref::Id(id) => id,
        }
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Populated(value) => Some(value),
            Ref::Id(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Patient,
    Doctor,
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl HasId for User {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Body returned by every flow that signs the user in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct VerifyResponse {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    #[default]
    InPerson,
    Video,
    Phone,
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No-show",
            AppointmentStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub patient: Ref<User>,
    pub doctor: Ref<User>,
    pub appointment_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "type", default)]
    pub kind: AppointmentType,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HasId for Appointment {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub doctor: String,
    pub appointment_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Query-string filters for `GET /appointments`.
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Doctors
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Ref<User>>,
    #[serde(default)]
    pub specialization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl Doctor {
    /// Display name, falling back to the specialization when the user isn't populated.
    pub fn display_name(&self) -> String {
        match self.user.as_ref().and_then(Ref::populated) {
            Some(user) => format!("Dr. {}", user.full_name()),
            None => format!("Doctor ({})", self.specialization),
        }
    }
}

impl HasId for Doctor {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Editable part of a doctor's profile, sent whole on every save.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    #[serde(default)]
    pub specialization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct DoctorSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Prescriptions
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MedicationItem {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub patient: Ref<User>,
    pub doctor: Ref<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment: Option<Ref<Appointment>>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medications: Vec<MedicationItem>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub patient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<String>,
    pub diagnosis: String,
    pub medications: Vec<MedicationItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct PrescriptionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PrescriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
}

// ---------------------------------------------------------------------------
// Medical records
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Allergy {
    pub allergen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordMedication {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Surgery {
    pub procedure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Immunization {
    pub vaccine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FamilyHistoryEntry {
    pub relation: String,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, alias = "date", skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Ref<User>>,
    #[serde(default)]
    pub allergies: Vec<Allergy>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub medications: Vec<RecordMedication>,
    #[serde(default)]
    pub surgeries: Vec<Surgery>,
    #[serde(default)]
    pub immunizations: Vec<Immunization>,
    #[serde(default)]
    pub family_history: Vec<FamilyHistoryEntry>,
    #[serde(default)]
    pub vital_signs: Vec<VitalSigns>,
}

// ---------------------------------------------------------------------------
// Symptom assessments
// ---------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SymptomAssessmentRequest {
    pub symptoms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PossibleCondition {
    pub name: String,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SymptomAssessment {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub possible_conditions: Vec<PossibleCondition>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub urgency_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn populated_reference_with_both_id_keys_decodes() {
        let appointment: Appointment = serde_json::from_value(json!({
            "_id": "a1",
            "patient": { "_id": "p1", "id": "p1", "firstName": "Ada" },
            "doctor": "d1",
            "appointmentDate": "2026-03-01T09:30:00Z"
        }))
        .unwrap();

        assert_eq!(appointment.patient.id(), "p1");
        assert_eq!(
            appointment.patient.populated().map(|p| p.first_name.as_str()),
            Some("Ada")
        );
    }

    #[test]
    fn dedupe_ids_keeps_underscore_id_at_every_depth() {
        let mut value = json!([
            { "_id": "a1", "id": "a1", "doctor": { "_id": "d1", "id": "d1" } },
            { "id": "a2" }
        ]);
        dedupe_ids(&mut value);

        assert_eq!(
            value,
            json!([
                { "_id": "a1", "doctor": { "_id": "d1" } },
                { "id": "a2" }
            ])
        );
    }

    #[test]
    fn appointment_accepts_populated_and_bare_references() {
        let appointment: Appointment = serde_json::from_value(json!({
            "_id": "a1",
            "patient": { "_id": "p1", "firstName": "Ada", "lastName": "Obi" },
            "doctor": "d1",
            "appointmentDate": "2026-03-01T09:30:00.000Z",
            "type": "video",
            "status": "confirmed"
        }))
        .unwrap();

        assert_eq!(appointment.patient.id(), "p1");
        assert_eq!(
            appointment.patient.populated().map(User::full_name),
            Some("Ada Obi".to_string())
        );
        assert_eq!(appointment.doctor.id(), "d1");
        assert!(appointment.doctor.populated().is_none());
        assert_eq!(appointment.kind, AppointmentType::Video);
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn unknown_enum_values_are_tolerated() {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": "a2",
            "patient": "p1",
            "doctor": "d1",
            "appointmentDate": "2026-03-01T09:30:00Z",
            "type": "home-visit",
            "status": "rescheduled"
        }))
        .unwrap();

        assert_eq!(appointment.id, "a2");
        assert_eq!(appointment.kind, AppointmentType::Other);
        assert_eq!(appointment.status, AppointmentStatus::Unknown);
    }

    #[test]
    fn no_show_status_uses_kebab_case() {
        let status: AppointmentStatus = serde_json::from_value(json!("no-show")).unwrap();
        assert_eq!(status, AppointmentStatus::NoShow);
        assert_eq!(
            serde_json::to_value(AppointmentStatus::NoShow).unwrap(),
            json!("no-show")
        );
    }

    #[test]
    fn sparse_medical_record_fills_empty_sections() {
        let record: MedicalRecord = serde_json::from_value(json!({
            "_id": "r1",
            "allergies": [{ "allergen": "Penicillin", "severity": "high" }],
            "vitalSigns": [{ "date": "2026-01-10T08:00:00Z", "weight": 70.0, "height": 175.0 }]
        }))
        .unwrap();

        assert_eq!(record.id.as_deref(), Some("r1"));
        assert_eq!(record.allergies.len(), 1);
        assert!(record.conditions.is_empty());
        assert!(record.family_history.is_empty());
        assert!(record.vital_signs[0].recorded_at.is_some());
    }

    #[test]
    fn filters_skip_unset_fields() {
        let filters = AppointmentFilters {
            status: Some(AppointmentStatus::Scheduled),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filters).unwrap(),
            json!({ "status": "scheduled" })
        );
    }

    #[test]
    fn doctor_display_name_prefers_populated_user() {
        let doctor: Doctor = serde_json::from_value(json!({
            "_id": "doc1",
            "user": { "_id": "u9", "firstName": "Lena", "lastName": "Park" },
            "specialization": "Cardiology"
        }))
        .unwrap();
        assert_eq!(doctor.display_name(), "Dr. Lena Park");

        let bare: Doctor = serde_json::from_value(json!({
            "_id": "doc2",
            "user": "u10",
            "specialization": "Dermatology"
        }))
        .unwrap();
        assert_eq!(bare.display_name(), "Doctor (Dermatology)");
    }
}

use reqwest::{Method, RequestBuilder};

use super::models::{MedicalRecord, VitalSigns};
use super::{ApiClient, ApiError, PATIENT_ID_HEADER};

/// Wrapper over `/medical-records`.
///
/// Patients act on their own record. Doctors act on a patient's record by passing
/// `patient_id`, which is forwarded in the `X-Patient-ID` header.
pub struct MedicalRecordsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn medical_records(&self) -> MedicalRecordsApi<'_> {
        MedicalRecordsApi { client: self }
    }
}

impl MedicalRecordsApi<'_> {
    fn scoped(&self, method: Method, path: &str, patient_id: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, path);
        match patient_id {
            Some(id) => builder.header(PATIENT_ID_HEADER, id),
            None => builder,
        }
    }

    /// The signed-in patient's own record.
    pub async fn mine(&self) -> Result<MedicalRecord, ApiError> {
        let request = self.client.request(Method::GET, "/medical-records");
        self.client
            .send(request, "Failed to fetch medical record")
            .await
    }

    pub async fn for_patient(&self, patient_id: &str) -> Result<MedicalRecord, ApiError> {
        let request = self.scoped(
            Method::GET,
            &format!("/medical-records/patient/{}", patient_id),
            Some(patient_id),
        );
        self.client
            .send(request, "Failed to fetch patient medical record")
            .await
    }

    /// Saves the whole record back. There is no partial update.
    pub async fn save(
        &self,
        record: &MedicalRecord,
        patient_id: Option<&str>,
    ) -> Result<MedicalRecord, ApiError> {
        let request = self
            .scoped(Method::PUT, "/medical-records", patient_id)
            .json(record);
        self.client
            .send(request, "Failed to update medical record")
            .await
    }

    pub async fn add_vital_signs(
        &self,
        vitals: &VitalSigns,
        patient_id: Option<&str>,
    ) -> Result<MedicalRecord, ApiError> {
        let request = self
            .scoped(Method::POST, "/medical-records/vital-signs", patient_id)
            .json(vitals);
        self.client
            .send(request, "Failed to add vital signs")
            .await
    }

    pub async fn update_vital_signs(
        &self,
        id: &str,
        vitals: &VitalSigns,
        patient_id: Option<&str>,
    ) -> Result<MedicalRecord, ApiError> {
        let request = self
            .scoped(
                Method::PUT,
                &format!("/medical-records/vital-signs/{}", id),
                patient_id,
            )
            .json(vitals);
        self.client
            .send(request, "Failed to update vital signs")
            .await
    }

    pub async fn delete_vital_signs(
        &self,
        id: &str,
        patient_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self.scoped(
            Method::DELETE,
            &format!("/medical-records/vital-signs/{}", id),
            patient_id,
        );
        self.client
            .send_discard(request, "Failed to delete vital signs")
            .await
    }
}

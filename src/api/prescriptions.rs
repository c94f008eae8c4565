use reqwest::Method;

use super::models::{NewPrescription, Prescription, PrescriptionFilters};
use super::{ApiClient, ApiError};

pub struct PrescriptionsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn prescriptions(&self) -> PrescriptionsApi<'_> {
        PrescriptionsApi { client: self }
    }
}

impl PrescriptionsApi<'_> {
    /// Issues a prescription. Only doctors are allowed to call this.
    pub async fn create(&self, prescription: &NewPrescription) -> Result<Prescription, ApiError> {
        let request = self
            .client
            .request(Method::POST, "/prescriptions")
            .json(prescription);
        self.client
            .send(request, "Failed to create prescription")
            .await
    }

    pub async fn list(&self, filters: &PrescriptionFilters) -> Result<Vec<Prescription>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "/prescriptions")
            .query(filters);
        self.client
            .send(request, "Failed to fetch prescriptions")
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Prescription, ApiError> {
        let request = self
            .client
            .request(Method::GET, &format!("/prescriptions/{}", id));
        self.client
            .send(request, "Failed to fetch prescription")
            .await
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::api::models::{MedicationItem, NewPrescription, PrescriptionStatus};
    use crate::api::testing::serve;

    #[tokio::test]
    async fn create_posts_medication_lines() {
        let router = Router::new().route(
            "/prescriptions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["patient"], "p1");
                assert_eq!(body["medications"][0]["name"], "Amoxicillin");
                assert!(body.get("appointment").is_none());
                Json(json!({
                    "_id": "rx1",
                    "patient": "p1",
                    "doctor": "d1",
                    "diagnosis": body["diagnosis"],
                    "medications": body["medications"],
                    "status": "active"
                }))
            }),
        );
        let client = serve(router).await.with_token("tok");

        let created = client
            .prescriptions()
            .create(&NewPrescription {
                patient: "p1".to_string(),
                appointment: None,
                diagnosis: "Sinusitis".to_string(),
                medications: vec![MedicationItem {
                    name: "Amoxicillin".to_string(),
                    dosage: "500mg".to_string(),
                    frequency: "3x daily".to_string(),
                    duration: "7 days".to_string(),
                    instructions: None,
                    quantity: Some(21),
                }],
                expiry_date: None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(created.id, "rx1");
        assert_eq!(created.status, PrescriptionStatus::Active);
        assert_eq!(created.medications[0].quantity, Some(21));
    }
}

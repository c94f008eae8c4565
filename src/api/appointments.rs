use reqwest::Method;

use super::models::{
    Appointment, AppointmentFilters, AppointmentStatus, CancelRequest, NewAppointment,
    StatusUpdate,
};
use super::{ApiClient, ApiError};

pub struct AppointmentsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn appointments(&self) -> AppointmentsApi<'_> {
        AppointmentsApi { client: self }
    }
}

impl AppointmentsApi<'_> {
    /// Books a new appointment for the signed-in patient.
    pub async fn create(&self, appointment: &NewAppointment) -> Result<Appointment, ApiError> {
        let request = self
            .client
            .request(Method::POST, "/appointments")
            .json(appointment);
        self.client.send(request, "Failed to book appointment").await
    }

    /// Lists the appointments visible to the signed-in user.
    ///
    /// The backend scopes the result by role: patients see their own bookings,
    /// doctors see the appointments booked with them.
    pub async fn list(&self, filters: &AppointmentFilters) -> Result<Vec<Appointment>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "/appointments")
            .query(filters);
        self.client
            .send(request, "Failed to fetch appointments")
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Appointment, ApiError> {
        let request = self
            .client
            .request(Method::GET, &format!("/appointments/{}", id));
        self.client
            .send(request, "Failed to fetch appointment")
            .await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        let body = StatusUpdate { status, notes };
        let request = self
            .client
            .request(Method::PATCH, &format!("/appointments/{}/status", id))
            .json(&body);
        self.client
            .send(request, "Failed to update appointment status")
            .await
    }

    pub async fn cancel(&self, id: &str, reason: Option<String>) -> Result<Appointment, ApiError> {
        let body = CancelRequest {
            cancellation_reason: reason,
        };
        let request = self
            .client
            .request(Method::PATCH, &format!("/appointments/{}/cancel", id))
            .json(&body);
        self.client
            .send(request, "Failed to cancel appointment")
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::api::models::{AppointmentFilters, AppointmentStatus};
    use crate::api::testing::serve;

    fn appointment(id: &str, status: &str) -> Value {
        json!({
            "_id": id,
            "patient": "p1",
            "doctor": { "_id": "d1", "firstName": "Lena", "lastName": "Park", "role": "doctor" },
            "appointmentDate": "2026-11-02T10:00:00Z",
            "duration": 30,
            "type": "in-person",
            "status": status
        })
    }

    #[tokio::test]
    async fn list_forwards_filters_as_query() {
        let router = Router::new().route(
            "/appointments",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                assert_eq!(query.get("status").map(String::as_str), Some("confirmed"));
                assert!(!query.contains_key("doctor"));
                Json(json!([appointment("a1", "confirmed")]))
            }),
        );
        let client = serve(router).await.with_token("tok");

        let filters = AppointmentFilters {
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        };
        let appointments = client.appointments().list(&filters).await.unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].duration, Some(30));
    }

    #[tokio::test]
    async fn list_accepts_documents_with_id_virtuals() {
        let router = Router::new().route(
            "/appointments",
            get(|| async {
                let mut body = appointment("a1", "scheduled");
                body["id"] = json!("a1");
                body["patient"] = json!({ "_id": "p1", "id": "p1", "firstName": "Ada" });
                Json(json!([body]))
            }),
        );
        let client = serve(router).await.with_token("tok");

        let appointments = client
            .appointments()
            .list(&AppointmentFilters::default())
            .await
            .unwrap();
        assert_eq!(appointments[0].id, "a1");
        assert_eq!(appointments[0].patient.id(), "p1");
    }

    #[tokio::test]
    async fn cancel_patches_the_cancel_endpoint() {
        let router = Router::new().route(
            "/appointments/:id/cancel",
            patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(body["cancellationReason"], "feeling better");
                Json(appointment(&id, "cancelled"))
            }),
        );
        let client = serve(router).await.with_token("tok");

        let cancelled = client
            .appointments()
            .cancel("a7", Some("feeling better".to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.id, "a7");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn update_status_sends_new_status() {
        let router = Router::new().route(
            "/appointments/:id/status",
            patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                let status = body["status"].as_str().unwrap_or_default().to_string();
                Json(appointment(&id, &status))
            }),
        );
        let client = serve(router).await.with_token("tok");

        let updated = client
            .appointments()
            .update_status("a3", AppointmentStatus::NoShow, None)
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::NoShow);
    }
}

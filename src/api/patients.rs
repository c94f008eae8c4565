use std::collections::HashSet;

use super::models::{AppointmentFilters, Ref, User};
use super::{ApiClient, ApiError};

pub struct PatientsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn patients(&self) -> PatientsApi<'_> {
        PatientsApi { client: self }
    }
}

impl PatientsApi<'_> {
    pub async fn get(&self, id: &str) -> Result<User, ApiError> {
        self.client.auth().get_user(id).await
    }

    /// Builds the signed-in doctor's patient roster from their appointments.
    ///
    /// The backend has no roster endpoint, so the list is reconstructed client-side:
    /// every appointment's patient reference is collected once, in first-seen order.
    /// Populated references are used as-is and bare ids are resolved one by one.
    /// A patient that cannot be fetched is logged and left out of the roster.
    ///
    /// # Errors
    ///
    /// Fails only when the appointment list itself cannot be fetched.
    pub async fn doctor_patients(&self) -> Result<Vec<User>, ApiError> {
        let appointments = self
            .client
            .appointments()
            .list(&AppointmentFilters::default())
            .await?;

        let mut seen = HashSet::new();
        let mut roster = Vec::new();

        for appointment in appointments {
            if !seen.insert(appointment.patient.id().to_string()) {
                continue;
            }

            match appointment.patient {
                Ref::Populated(user) => roster.push(user),
                Ref::Id(id) => match self.get(&id).await {
                    Ok(user) => roster.push(user),
                    Err(e) => log::warn!("Skipping patient {}: {}", id, e),
                },
            }
        }

        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use crate::api::testing::serve;

    fn appointments() -> serde_json::Value {
        json!([
            { "_id": "a1", "patient": { "_id": "p1", "firstName": "Ada" }, "doctor": "d1",
              "appointmentDate": "2026-10-01T09:00:00Z" },
            { "_id": "a2", "patient": "p2", "doctor": "d1",
              "appointmentDate": "2026-10-02T09:00:00Z" },
            { "_id": "a3", "patient": "p1", "doctor": "d1",
              "appointmentDate": "2026-10-03T09:00:00Z" },
            { "_id": "a4", "patient": "p2", "doctor": "d1",
              "appointmentDate": "2026-10-04T09:00:00Z" },
            { "_id": "a5", "patient": "gone", "doctor": "d1",
              "appointmentDate": "2026-10-05T09:00:00Z" }
        ])
    }

    #[tokio::test]
    async fn roster_is_deduplicated_and_resolves_bare_ids() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let counter = lookups.clone();

        let router = Router::new()
            .route("/appointments", get(|| async { Json(appointments()) }))
            .route(
                "/auth/user/:id",
                get(move |Path(id): Path<String>| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        if id == "gone" {
                            return StatusCode::NOT_FOUND.into_response();
                        }
                        Json(json!({ "_id": id, "firstName": "Fetched" })).into_response()
                    }
                }),
            );
        let client = serve(router).await.with_token("tok");

        let roster = client.patients().doctor_patients().await.unwrap();
        let ids: Vec<&str> = roster.iter().map(|u| u.id.as_str()).collect();

        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(roster[0].first_name, "Ada");
        assert_eq!(roster[1].first_name, "Fetched");
        // p2 once, "gone" once; p1 was populated
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn appointment_failure_fails_the_roster() {
        let router = Router::new().route(
            "/appointments",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = serve(router).await.with_token("tok");

        let err = client.patients().doctor_patients().await.unwrap_err();
        assert_eq!(err.message(), "Failed to fetch appointments");
    }
}

use reqwest::Method;

use super::models::{Doctor, DoctorProfile, DoctorSearch};
use super::{ApiClient, ApiError};

pub struct DoctorsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn doctors(&self) -> DoctorsApi<'_> {
        DoctorsApi { client: self }
    }
}

impl DoctorsApi<'_> {
    pub async fn list(&self) -> Result<Vec<Doctor>, ApiError> {
        let request = self.client.request(Method::GET, "/doctors");
        self.client.send(request, "Failed to fetch doctors").await
    }

    pub async fn search(&self, filters: &DoctorSearch) -> Result<Vec<Doctor>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "/doctors/search")
            .query(filters);
        self.client.send(request, "Failed to search doctors").await
    }

    pub async fn get(&self, id: &str) -> Result<Doctor, ApiError> {
        let request = self.client.request(Method::GET, &format!("/doctors/{}", id));
        self.client.send(request, "Failed to fetch doctor").await
    }

    pub async fn update_profile(&self, profile: &DoctorProfile) -> Result<Doctor, ApiError> {
        let request = self
            .client
            .request(Method::PUT, "/doctors/profile")
            .json(profile);
        self.client
            .send(request, "Failed to update doctor profile")
            .await
    }

    /// Fetches the signed-in doctor's own profile.
    ///
    /// A doctor who has never saved a profile gets a 404 from the backend; that case
    /// is reported as `Ok(None)` so callers can start from an empty form.
    pub async fn my_profile(&self) -> Result<Option<Doctor>, ApiError> {
        let request = self.client.request(Method::GET, "/doctors/profile/me");
        match self
            .client
            .send(request, "Failed to fetch doctor profile")
            .await
        {
            Ok(doctor) => Ok(Some(doctor)),
            Err(e) if e.is_not_found() => {
                log::info!("No doctor profile yet, starting from an empty one");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save_my_profile(&self, profile: &DoctorProfile) -> Result<Doctor, ApiError> {
        let request = self
            .client
            .request(Method::PUT, "/doctors/profile/me")
            .json(profile);
        self.client
            .send(request, "Failed to save doctor profile")
            .await
    }
}

use reqwest::Method;

use super::models::{SymptomAssessment, SymptomAssessmentRequest};
use super::{ApiClient, ApiError};

pub struct SymptomAssessmentsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn symptom_assessments(&self) -> SymptomAssessmentsApi<'_> {
        SymptomAssessmentsApi { client: self }
    }
}

impl SymptomAssessmentsApi<'_> {
    pub async fn assess(
        &self,
        body: &SymptomAssessmentRequest,
    ) -> Result<SymptomAssessment, ApiError> {
        let request = self
            .client
            .request(Method::POST, "/symptom-assessments")
            .json(body);
        self.client
            .send(request, "Failed to assess symptoms")
            .await
    }

    pub async fn common_symptoms(&self) -> Result<Vec<String>, ApiError> {
        let request = self
            .client
            .request(Method::GET, "/symptom-assessments/common-symptoms");
        self.client
            .send(request, "Failed to fetch common symptoms")
            .await
    }
}

//! Client-side derived state: the fetch/refresh holder and the pure computations
//! applied to fetched lists.

use std::future::Future;

use crate::api::ApiError;

pub mod appointments;
pub mod otp;
pub mod patients;
pub mod prescriptions;
pub mod records;
pub mod vitals;

/// `data / loading / error` triple for one fetched resource.
///
/// Each holder fetches independently; two holders for the same resource never share
/// results. A failed refresh keeps the previous data and records the error message.
#[derive(Debug, Clone, PartialEq)]
pub struct Loadable<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> Loadable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fetch` and stores its outcome.
    pub async fn refresh<F, Fut>(&mut self, fetch: F) -> Option<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.loading = true;
        self.error = None;

        match fetch().await {
            Ok(data) => self.data = Some(data),
            Err(e) => {
                log::warn!("Refresh failed: {}", e);
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
        self.data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::unreachable_client;

    #[tokio::test]
    async fn refresh_stores_data() {
        let mut holder = Loadable::new();
        let data = holder.refresh(|| async { Ok(vec![1, 2, 3]) }).await;

        assert_eq!(data, Some(&vec![1, 2, 3]));
        assert!(!holder.loading);
        assert!(holder.error.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_data() {
        let mut holder = Loadable {
            data: Some(vec!["cached".to_string()]),
            ..Default::default()
        };
        let client = unreachable_client();

        holder
            .refresh(|| async { client.symptom_assessments().common_symptoms().await })
            .await;

        assert_eq!(holder.data, Some(vec!["cached".to_string()]));
        assert_eq!(
            holder.error.as_deref(),
            Some("Failed to fetch common symptoms")
        );
    }
}

//! Throwaway HTTP backend for exercising the wrappers end to end.

use axum::Router;

use super::ApiClient;

/// Serves `router` on an ephemeral local port and returns a client pointed at it.
pub(crate) async fn serve(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ApiClient::new(&format!("http://{}", addr), 5).unwrap()
}

/// Base URL nothing listens on, for transport-failure cases.
pub(crate) fn unreachable_client() -> ApiClient {
    ApiClient::new("http://127.0.0.1:9", 2).unwrap()
}

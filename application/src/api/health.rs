//! Liveness check.

use axum::Json;
use serde::Serialize;

/// Status of a running server.
#[derive(Clone, Copy, Debug, Serialize)]
pub(super) struct Health {
    /// Always `ok` while the server responds.
    status: &'static str,
}

/// Reports the server being alive.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub(super) async fn check() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[cfg(test)]
mod spec {
    use super::check;

    #[tokio::test]
    async fn reports_ok() {
        let json = serde_json::to_value(check().await.0).unwrap();
        assert_eq!(json["status"], "ok");
    }
}

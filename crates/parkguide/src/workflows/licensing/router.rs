use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApprovalId, LicenseKind, RenewalId, RenewalView};
use super::scheduler::SweepOutcome;
use super::service::{LicensingService, LicensingServiceError};
use super::store::{ApprovalStore, NotificationSender, RenewalStore, StoreError};

/// Router builder exposing the licensing operations over HTTP.
pub fn licensing_router<AS, RS, N>(service: Arc<LicensingService<AS, RS, N>>) -> Router
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/licenses/approvals",
            get(list_approvals_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/approvals/:id/status",
            post(approval_status_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/renewals",
            get(list_renewals_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/renewals/:id/payment",
            post(payment_status_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/renewals/bulk-renew",
            post(bulk_renew_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/send/:kind/:id",
            post(send_license_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/stats",
            get(stats_handler::<AS, RS, N>),
        )
        .route(
            "/api/v1/licenses/sweep",
            post(sweep_handler::<AS, RS, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalStatusRequest {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) reviewed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentStatusRequest {
    pub(crate) payment: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkRenewRequest {
    pub(crate) ids: Vec<String>,
}

pub(crate) async fn list_approvals_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    match service.list_approvals() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_renewals_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    match service.list_renewals() {
        Ok(records) => {
            let views: Vec<RenewalView> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approval_status_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<ApprovalStatusRequest>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    let id = ApprovalId(id);
    match service.update_approval_status(&id, &request.status, request.reviewed_by) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn payment_status_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<PaymentStatusRequest>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    let id = RenewalId(id);
    match service.update_payment_status(&id, &request.payment) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn bulk_renew_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
    axum::Json(request): axum::Json<BulkRenewRequest>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    let ids: Vec<RenewalId> = request.ids.into_iter().map(RenewalId).collect();
    match service.bulk_renew(&ids) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn send_license_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
    Path((kind, id)): Path<(String, String)>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    let kind = match LicenseKind::parse(&kind) {
        Ok(kind) => kind,
        Err(err) => return error_response(LicensingServiceError::Validation(err)),
    };

    match service.send_license(kind, &id) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "sent": true }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stats_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    match service.license_stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sweep_handler<AS, RS, N>(
    State(service): State<Arc<LicensingService<AS, RS, N>>>,
) -> Response
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    match service.run_sweep().await {
        Ok(SweepOutcome::Completed(report)) => (
            StatusCode::OK,
            axum::Json(json!({
                "outcome": "completed",
                "scanned": report.scanned,
                "dispatched": report.dispatched,
                "failed": report.failed,
            })),
        )
            .into_response(),
        Ok(SweepOutcome::Skipped) => (
            StatusCode::ACCEPTED,
            axum::Json(json!({ "outcome": "skipped" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: LicensingServiceError) -> Response {
    let status = match &err {
        LicensingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LicensingServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        LicensingServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        LicensingServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

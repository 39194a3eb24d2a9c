use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::domain::{CreatedDomain, Domain, DomainKind, DomainPatch, VerificationInfo};
use crate::reconcile::VerifyOutcome;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub routes: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateDomainRequest {
    pub domain: String,
    #[serde(rename = "type", default)]
    pub kind: Option<DomainKind>,
}

#[derive(Debug, Serialize)]
pub struct DomainList {
    pub domains: Vec<Domain>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub message: &'static str,
}

impl From<VerifyOutcome> for VerifyResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        match outcome {
            VerifyOutcome::AlreadyVerified => Self {
                verified: true,
                message: "Domain is already verified",
            },
            VerifyOutcome::Verified => Self {
                verified: true,
                message: "Domain verified successfully",
            },
            VerifyOutcome::Pending => Self {
                verified: false,
                message: "CNAME record not found. Please add the DNS record and try again.",
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrimaryResponse {
    pub message: &'static str,
    pub domain: Domain,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: "domain-gateway",
        version: env!("CARGO_PKG_VERSION"),
        routes: state.service.route_count().await,
    })
}

pub async fn create_domain(
    State(state): State<AppState>,
    Path(tenant): Path<Uuid>,
    Json(request): Json<CreateDomainRequest>,
) -> Result<(StatusCode, Json<CreatedDomain>), ApiError> {
    let created = state
        .service
        .create(tenant, &request.domain, request.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_domains(
    State(state): State<AppState>,
    Path(tenant): Path<Uuid>,
) -> Result<Json<DomainList>, ApiError> {
    let domains = state.service.list(tenant).await?;
    Ok(Json(DomainList {
        total: domains.len(),
        domains,
    }))
}

pub async fn get_domain(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Domain>, ApiError> {
    Ok(Json(state.service.get(tenant, id).await?))
}

pub async fn update_domain(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<DomainPatch>,
) -> Result<Json<Domain>, ApiError> {
    Ok(Json(state.service.update(tenant, id, &patch).await?))
}

pub async fn delete_domain(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_instructions(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VerificationInfo>, ApiError> {
    Ok(Json(state.service.instructions(tenant, id).await?))
}

/// Runs bounded-retry verification; aborted by process shutdown.
pub async fn verify_domain(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let cancel = state.shutdown.child_token();
    let outcome = state.service.verify(tenant, id, &cancel).await?;
    Ok(Json(outcome.into()))
}

pub async fn set_primary(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PrimaryResponse>, ApiError> {
    let domain = state.service.set_primary(tenant, id).await?;
    Ok(Json(PrimaryResponse {
        message: "Primary domain updated successfully",
        domain,
    }))
}

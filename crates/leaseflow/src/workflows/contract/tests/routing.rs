use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::contract::domain::{Contract, ContractId, SignatureRole};
use crate::workflows::contract::progress::Viewer;
use crate::workflows::contract::router::contract_router;

fn build_router(contract: Contract) -> (axum::Router, std::sync::Arc<MemoryContracts>) {
    let (service, gateway) = build_service(contract);
    (contract_router(service), gateway)
}

fn post_json(uri: String, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request")
}

fn run_payload(viewer: &Viewer, roles: &[(SignatureRole, Option<usize>)]) -> serde_json::Value {
    let signatures: Vec<_> = roles
        .iter()
        .map(|(role, guarantor_index)| {
            let mut entry = json!({
                "role": role,
                "signature": signature(),
            });
            if let Some(index) = guarantor_index {
                entry["guarantor_id"] = json!(guarantor(*index).id);
            }
            entry
        })
        .collect();
    json!({ "viewer": viewer, "signatures": signatures })
}

#[tokio::test]
async fn progress_route_reports_completion() {
    let mut contract = contract_with_guarantors(1);
    contract.signatures.hoster_signed = true;
    let contract_id = contract.id.0.clone();
    let (router, _) = build_router(contract);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/contracts/{contract_id}/progress"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["contract_id"], contract_id);
    assert_eq!(body["progress"]["completed"], 1);
    assert_eq!(body["progress"]["total"], 3);
    assert_eq!(body["progress"]["percentage"], 33);
}

#[tokio::test]
async fn progress_route_maps_unknown_contracts_to_not_found() {
    let (router, _) = build_router(contract_with_guarantors(0));

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/contracts/contract-missing/progress")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "contract not found");
}

#[tokio::test]
async fn entitlements_route_renders_the_viewer_slots() {
    let contract = contract_with_guarantors(1);
    let contract_id = contract.id.0.clone();
    let (router, _) = build_router(contract);

    let response = router
        .oneshot(post_json(
            format!("/api/v1/contracts/{contract_id}/entitlements"),
            serde_json::to_value(guarantor_viewer(1)).expect("viewer json"),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let slots = body["slots"].as_array().expect("slots array");
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0]["role"], "tenant");
    assert_eq!(slots[0]["viewer_may_sign"], false);
    assert_eq!(slots[2]["role"], "guarantor");
    assert_eq!(slots[2]["viewer_may_sign"], true);
    assert_eq!(slots[2]["guarantor_id"], guarantor(1).id.0);
}

#[tokio::test]
async fn sign_route_commits_and_reports_progress() {
    let contract = contract_with_guarantors(0);
    let contract_id = contract.id.0.clone();
    let (router, gateway) = build_router(contract);

    let response = router
        .oneshot(post_json(
            format!("/api/v1/contracts/{contract_id}/signatures"),
            run_payload(&tenant_viewer(), &[(SignatureRole::Tenant, None)]),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["committed"], 1);
    assert_eq!(body["contract"]["signatures"]["tenant_signed"], true);
    assert_eq!(body["progress"]["completed"], 1);
    assert_eq!(body["progress"]["total"], 2);
    assert_eq!(gateway.sign_calls(), 1);
}

#[tokio::test]
async fn failed_run_reports_role_and_committed_count() {
    // The tenant also guarantees the lease here so one viewer is entitled to
    // both slots and the run can fail mid-batch.
    let mut contract = contract_with_guarantors(1);
    contract.guarantors[0].email = tenant_viewer().email;
    let contract_id = contract.id.0.clone();
    let (router, gateway) = build_router(contract);
    gateway.fail_signing_as(SignatureRole::Guarantor);

    let response = router
        .oneshot(post_json(
            format!("/api/v1/contracts/{contract_id}/signatures"),
            run_payload(
                &tenant_viewer(),
                &[(SignatureRole::Tenant, None), (SignatureRole::Guarantor, None)],
            ),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json_body(response).await;
    assert_eq!(body["role"], "guarantor");
    assert_eq!(body["committed"], 1);
    assert_eq!(body["progress"]["completed"], 1);
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("guarantor"));

    let stored = gateway.stored(&ContractId(contract_id)).expect("stored");
    assert!(stored.signatures.tenant_signed, "prior commit is durable");
}

#[tokio::test]
async fn sign_route_rejects_viewers_without_the_role() {
    let contract = contract_with_guarantors(0);
    let contract_id = contract.id.0.clone();
    let (router, gateway) = build_router(contract);

    let response = router
        .oneshot(post_json(
            format!("/api/v1/contracts/{contract_id}/signatures"),
            run_payload(&stranger(), &[(SignatureRole::Tenant, None)]),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(gateway.sign_calls(), 0);
}

#[tokio::test]
async fn sign_route_rejects_an_empty_run() {
    let contract = contract_with_guarantors(0);
    let contract_id = contract.id.0.clone();
    let (router, _) = build_router(contract);

    let response = router
        .oneshot(post_json(
            format!("/api/v1/contracts/{contract_id}/signatures"),
            json!({ "viewer": tenant_viewer(), "signatures": [] }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn sign_route_maps_already_signed_slots_to_conflict() {
    let mut contract = contract_with_guarantors(0);
    contract.signatures.tenant_signed = true;
    let contract_id = contract.id.0.clone();
    let (router, gateway) = build_router(contract);

    let response = router
        .oneshot(post_json(
            format!("/api/v1/contracts/{contract_id}/signatures"),
            run_payload(&tenant_viewer(), &[(SignatureRole::Tenant, None)]),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["committed"], 0);
    assert_eq!(gateway.sign_calls(), 0, "local slot check fails first");
}

use crate::infra::{
    demo_contract, InMemoryApplicationBackend, InMemoryContractLedger, InMemoryDocumentStore,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use leaseflow::config::VerificationConfig;
use leaseflow::error::AppError;
use leaseflow::workflows::application::{
    ApplicationDesk, DraftPatch, GuardianContact, OccupationType, PaymentResponsible,
    PendingDocument, PropertyId, VerificationResult, VerificationStatus, VerificationUpdate,
    WidgetEvent, WidgetMount, WizardSnapshot,
};
use leaseflow::workflows::contract::{
    ContractService, PartyId, SignatureImage, SignatureRequest, SignatureRole, Viewer,
};
use std::sync::Arc;

type DemoDesk = ApplicationDesk<InMemoryDocumentStore, InMemoryApplicationBackend>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the wizard advances against (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the contract signing portion of the demo.
    #[arg(long)]
    pub(crate) skip_contract: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        skip_contract,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    println!("Rental workflow demo (evaluated {today})");

    let backend = Arc::new(InMemoryApplicationBackend::default());
    let desk = ApplicationDesk::new(
        Arc::new(InMemoryDocumentStore::default()),
        backend.clone(),
        VerificationConfig {
            client_id: "verify-client-demo".to_string(),
            flow_id: "kyc-demo".to_string(),
        },
    );

    professional_walk(&desk, &backend, today).await?;
    student_guardian_walk(&desk, &backend, today).await?;

    if skip_contract {
        return Ok(());
    }
    contract_walk().await
}

async fn professional_walk(
    desk: &DemoDesk,
    backend: &InMemoryApplicationBackend,
    today: NaiveDate,
) -> Result<(), AppError> {
    println!("\nProfessional applicant");
    let (id, opening) = desk.open_wizard();
    print_step(&opening);

    let snapshot = desk.apply_patch(
        &id,
        DraftPatch {
            property_id: Some(PropertyId("prop-demo-12".to_string())),
            contract_duration_months: Some(12),
            occupancy_date: Some(today + chrono::Duration::days(30)),
            occupation_type: Some(OccupationType::Professional),
            phone: Some("+52 55 1901 2233".to_string()),
            ..DraftPatch::default()
        },
    )?;
    println!(
        "- Core details captured; the plan settles at {} steps",
        snapshot.progress.total
    );

    for _ in 0..3 {
        let snapshot = desk.advance(&id, today)?;
        print_step(&snapshot);
    }

    desk.apply_patch(
        &id,
        DraftPatch {
            company: Some("Cumbre Analytics".to_string()),
            position: Some("Data engineer".to_string()),
            ..DraftPatch::default()
        },
    )?;
    print_step(&desk.advance(&id, today)?);

    desk.apply_patch(
        &id,
        DraftPatch {
            income_documents: Some(vec![document("payslip-july.pdf")]),
            ..DraftPatch::default()
        },
    )?;
    let snapshot = desk.advance(&id, today)?;
    print_step(&snapshot);
    if let Some(phase) = snapshot.verification_phase {
        println!("- {}", phase.label());
    }

    desk.apply_patch(
        &id,
        DraftPatch {
            id_document: Some(document("ine-front.jpg")),
            video_selfie: Some(document("selfie.mp4")),
            ..DraftPatch::default()
        },
    )?;

    let mount = desk.verification_mount(&id)?;
    print_mount(&mount);
    let update = desk.verification_event(
        &id,
        WidgetEvent::Finished {
            result: verified("verif-demo-applicant"),
        },
    )?;
    print_update(update.as_ref());

    let snapshot = desk.advance(&id, today)?;
    println!("- Wizard complete: {}", snapshot.complete);

    let submitted = desk.submit(&id).await?;
    println!("- Submitted as {} (status {})", submitted.id, submitted.status);
    print_last_submission(backend);
    Ok(())
}

async fn student_guardian_walk(
    desk: &DemoDesk,
    backend: &InMemoryApplicationBackend,
    today: NaiveDate,
) -> Result<(), AppError> {
    println!("\nStudent applicant, guardian pays");
    let (id, _) = desk.open_wizard();

    desk.apply_patch(
        &id,
        DraftPatch {
            property_id: Some(PropertyId("prop-demo-31".to_string())),
            contract_duration_months: Some(6),
            occupancy_date: Some(today + chrono::Duration::days(21)),
            occupation_type: Some(OccupationType::Student),
            phone: Some("+52 81 3344 5566".to_string()),
            ..DraftPatch::default()
        },
    )?;
    for _ in 0..3 {
        desk.advance(&id, today)?;
    }

    desk.apply_patch(
        &id,
        DraftPatch {
            university: Some("Tec de Monterrey".to_string()),
            ..DraftPatch::default()
        },
    )?;
    print_step(&desk.advance(&id, today)?);

    desk.apply_patch(
        &id,
        DraftPatch {
            payment_responsible: Some(PaymentResponsible::Guardian),
            ..DraftPatch::default()
        },
    )?;
    print_step(&desk.advance(&id, today)?);

    desk.apply_patch(
        &id,
        DraftPatch {
            guardian: Some(GuardianContact {
                full_name: "Rosa Fuentes".to_string(),
                email: "rosa.fuentes@example.com".to_string(),
                phone: None,
            }),
            ..DraftPatch::default()
        },
    )?;
    print_step(&desk.advance(&id, today)?);

    desk.apply_patch(
        &id,
        DraftPatch {
            guardian_income_documents: Some(vec![document("guardian-payslip.pdf")]),
            ..DraftPatch::default()
        },
    )?;
    let snapshot = desk.advance(&id, today)?;
    print_step(&snapshot);
    if let Some(phase) = snapshot.verification_phase {
        println!("- {}", phase.label());
    }

    desk.apply_patch(
        &id,
        DraftPatch {
            id_document: Some(document("credencial.jpg")),
            video_selfie: Some(document("selfie.mp4")),
            guardian_id_document: Some(document("guardian-id.jpg")),
            ..DraftPatch::default()
        },
    )?;

    let mount = desk.verification_mount(&id)?;
    print_mount(&mount);
    let update = desk.verification_event(
        &id,
        WidgetEvent::Finished {
            result: verified("verif-demo-guardian"),
        },
    )?;
    print_update(update.as_ref());
    let update = desk.verification_event(
        &id,
        WidgetEvent::Finished {
            result: verified("verif-demo-student"),
        },
    )?;
    print_update(update.as_ref());

    desk.advance(&id, today)?;
    let submitted = desk.submit(&id).await?;
    println!("- Submitted as {} (status {})", submitted.id, submitted.status);
    print_last_submission(backend);
    Ok(())
}

async fn contract_walk() -> Result<(), AppError> {
    println!("\nContract signing");
    let service = ContractService::new(Arc::new(InMemoryContractLedger::with_demo_contract()));
    let contract = demo_contract();
    let id = contract.id.clone();

    let view = service.progress(&id).await?;
    println!(
        "- Starting at {}/{} signatures ({}%)",
        view.progress.completed, view.progress.total, view.progress.percentage
    );

    let tenant_viewer = Viewer {
        user_id: contract.tenant.id.clone(),
        email: contract.tenant.email.clone(),
    };
    let hoster_viewer = Viewer {
        user_id: contract.hoster.id.clone(),
        email: contract.hoster.email.clone(),
    };
    let guarantor_viewer = Viewer {
        user_id: PartyId("user-demo-guarantor".to_string()),
        email: contract
            .guarantors
            .first()
            .map(|guarantor| guarantor.email.clone())
            .unwrap_or_default(),
    };
    let guarantor_name = contract
        .guarantors
        .first()
        .map(|guarantor| guarantor.full_name.as_str())
        .unwrap_or("the guarantor");

    let signers = [
        (SignatureRole::Tenant, &tenant_viewer, contract.tenant.full_name.as_str()),
        (SignatureRole::Hoster, &hoster_viewer, contract.hoster.full_name.as_str()),
        (SignatureRole::Guarantor, &guarantor_viewer, guarantor_name),
    ];
    for (role, viewer, name) in signers {
        let report = service
            .run_signatures(
                &id,
                viewer,
                vec![SignatureRequest {
                    role,
                    guarantor_id: None,
                    signature: signature(),
                }],
            )
            .await?;
        println!(
            "- {} signed as {}: {}/{} ({}%)",
            name,
            role.label(),
            report.progress.completed,
            report.progress.total,
            report.progress.percentage
        );
    }

    let entitlements = service.entitlements(&id, &tenant_viewer).await?;
    println!("- Final signing screen");
    for slot in &entitlements.slots {
        let state = if slot.signed { "signed" } else { "pending" };
        println!("  - {} ({}): {}", slot.party_name, slot.role_label, state);
    }
    Ok(())
}

fn print_step(snapshot: &WizardSnapshot) {
    match &snapshot.subflow {
        Some(subflow) => println!(
            "- Step {}/{}: {} -> {} ({}/{})",
            snapshot.progress.current,
            snapshot.progress.total,
            snapshot.step_label,
            subflow.step_label,
            subflow.ordinal,
            subflow.total
        ),
        None => println!(
            "- Step {}/{}: {}",
            snapshot.progress.current, snapshot.progress.total, snapshot.step_label
        ),
    }
}

fn print_mount(mount: &WidgetMount) {
    let pass = mount
        .metadata
        .get("pass")
        .map(String::as_str)
        .unwrap_or("unspecified");
    println!(
        "- Widget mounted: client {} | flow {} | nonce {} | pass {}",
        mount.client_id, mount.flow_id, mount.nonce, pass
    );
}

fn print_update(update: Option<&VerificationUpdate>) {
    match update {
        Some(VerificationUpdate::GuardianVerified { result, mount }) => {
            println!("- Guardian pass verified ({})", result.verification_id);
            print_mount(mount);
        }
        Some(VerificationUpdate::Completed { result }) => {
            println!("- Verification completed ({})", result.verification_id);
            if let Some(metadata) = &result.metadata {
                for (key, value) in metadata {
                    println!("  - {key}: {value}");
                }
            }
        }
        Some(VerificationUpdate::Retry { notice, .. }) => {
            println!("- Verification retry: {notice}");
        }
        Some(VerificationUpdate::Fault { message }) => {
            println!("- Verification fault: {message}");
        }
        None => println!("- No verification update"),
    }
}

fn print_last_submission(backend: &InMemoryApplicationBackend) {
    let submissions = backend.submissions();
    let Some(payload) = submissions.last() else {
        return;
    };
    println!(
        "- Payload: {} for {} months from {}",
        payload.property_id.0, payload.contract_duration_months, payload.occupancy_date
    );
    println!(
        "  - {} income document(s), {} guardian income document(s)",
        payload.income_document_urls.len(),
        payload.guardian_income_document_urls.len()
    );
    if let Some(verification) = &payload.identity_verification {
        println!("  - Verification id {}", verification.verification_id);
    }
}

fn verified(id: &str) -> VerificationResult {
    VerificationResult {
        verification_id: id.to_string(),
        status: VerificationStatus::Completed,
        identity_id: Some(format!("identity-{id}")),
        metadata: None,
    }
}

fn document(file_name: &str) -> PendingDocument {
    PendingDocument {
        file_name: file_name.to_string(),
        media_type: media_type(file_name),
        content: file_name.as_bytes().to_vec(),
    }
}

fn media_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn signature() -> SignatureImage {
    SignatureImage("data:image/png;base64,iVBORw0KGgoAAAANSUhEUg=".to_string())
}

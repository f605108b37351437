//! End-to-end tests for the document lifecycle: draft generation, rollback
//! on render failure, validation/signing, and download access control.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use ma_commune_server::auth::model::{AuthUser, Role};
use ma_commune_server::config::Config;
use ma_commune_server::demande::models::{Demande, Statut};
use ma_commune_server::documents::{LifecycleManager, WorkflowError};
use ma_commune_server::store::DemandeStore;

use common::{admin, citoyen, demande, InMemoryStore, StubRasterizer};

struct Harness {
    store: Arc<InMemoryStore>,
    rasterizer: Arc<StubRasterizer>,
    lifecycle: Arc<LifecycleManager>,
    // Holds the documents directory alive for the duration of the test.
    _documents: TempDir,
}

fn harness() -> Harness {
    let documents = TempDir::new().expect("temp documents dir");
    let config = Arc::new(Config {
        public_base_url: "https://commune.example.org".to_string(),
        documents_dir: documents.path().to_path_buf(),
        assets_dir: documents.path().join("no-assets"),
        ..Config::default()
    });
    let store = Arc::new(InMemoryStore::new());
    let rasterizer = Arc::new(StubRasterizer::new());
    let lifecycle = Arc::new(LifecycleManager::new(
        store.clone(),
        rasterizer.clone(),
        config,
    ));
    Harness {
        store,
        rasterizer,
        lifecycle,
        _documents: documents,
    }
}

fn admin_user(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: Role::Admin,
    }
}

fn citizen_user(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: Role::Citoyen,
    }
}

async fn stored(h: &Harness, id: i64) -> Demande {
    h.store.get_demande(id).await.unwrap().expect("demande exists")
}

#[tokio::test]
async fn generate_draft_sets_artifact_pair_and_writes_file() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;

    let doc = h.lifecycle.generate_draft(42).await.unwrap();

    let row = stored(&h, 42).await;
    let token = row.verification_token.clone().expect("token minted");
    assert_eq!(doc.filename, format!("acte_residence_42_{token}.pdf"));
    assert_eq!(row.document_path.as_deref(), Some(doc.filename.as_str()));
    assert_eq!(row.statut, Statut::EnTraitement, "draft never changes statut");
    assert_eq!(
        doc.verification_url,
        format!("https://commune.example.org/verify-document?token={token}")
    );

    let html = h.rasterizer.last_html().await.unwrap();
    assert!(html.contains(&doc.verification_url));
    assert!(html.contains("Mbala"), "citizen name rendered");
}

#[tokio::test]
async fn failed_draft_clears_both_artifact_fields() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    let mut d = demande(42, "acte_residence", Statut::EnTraitement, 5);
    // Simulate a stale artifact pair left by an earlier generation.
    d.document_path = Some("acte_residence_42_old.pdf".to_string());
    d.verification_token = Some("old-token".to_string());
    h.store.insert_demande(d).await;

    h.rasterizer.fail_next();
    let err = h.lifecycle.generate_draft(42).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Rendering(_)));

    let row = stored(&h, 42).await;
    assert!(row.document_path.is_none(), "path rolled back");
    assert!(row.verification_token.is_none(), "token rolled back");
}

#[tokio::test]
async fn regenerated_draft_reuses_the_original_token() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_naissance", Statut::EnTraitement, 5))
        .await;

    let first = h.lifecycle.generate_draft(42).await.unwrap();
    let second = h.lifecycle.generate_draft(42).await.unwrap();
    assert_eq!(first.filename, second.filename);
    assert_eq!(first.verification_url, second.verification_url);
}

#[tokio::test]
async fn validate_requires_en_traitement() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, Some("Jean"), Some("Kabila"))).await;
    let mut d = demande(42, "acte_residence", Statut::Soumise, 5);
    d.document_path = Some("acte_residence_42_t.pdf".to_string());
    d.verification_token = Some("t".to_string());
    h.store.insert_demande(d).await;

    let err = h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

    let row = stored(&h, 42).await;
    assert_eq!(row.statut, Statut::Soumise, "no mutation on refusal");
    assert_eq!(row.document_path.as_deref(), Some("acte_residence_42_t.pdf"));
}

#[tokio::test]
async fn validate_requires_an_existing_draft() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, Some("Jean"), Some("Kabila"))).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;

    let err = h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));
}

#[tokio::test]
async fn full_workflow_draft_then_signed() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, Some("Jean"), Some("Kabila"))).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;

    let draft = h.lifecycle.generate_draft(42).await.unwrap();
    let signed = h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap();

    let row = stored(&h, 42).await;
    let token = row.verification_token.clone().unwrap();
    assert_eq!(draft.filename, format!("acte_residence_42_{token}.pdf"));
    assert_eq!(signed.filename, format!("acte_residence_42_{token}_signed.pdf"));
    assert_eq!(
        draft.verification_url, signed.verification_url,
        "both phases share the token"
    );
    assert_eq!(row.statut, Statut::Validee);
    assert_eq!(row.document_path.as_deref(), Some(signed.filename.as_str()));

    let html = h.rasterizer.last_html().await.unwrap();
    assert!(html.contains("Jean Kabila"), "approver name in signature block");
}

#[tokio::test]
async fn signing_failure_leaves_the_draft_in_place() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, Some("Jean"), Some("Kabila"))).await;
    h.store
        .insert_demande(demande(42, "acte_mariage", Statut::EnTraitement, 5))
        .await;

    let draft = h.lifecycle.generate_draft(42).await.unwrap();

    h.rasterizer.fail_next();
    let err = h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Rendering(_)));

    let row = stored(&h, 42).await;
    assert_eq!(row.statut, Statut::EnTraitement);
    assert_eq!(row.document_path.as_deref(), Some(draft.filename.as_str()));
    assert!(row.verification_token.is_some());
}

#[tokio::test]
async fn validation_is_admin_only() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;

    let err = h
        .lifecycle
        .validate_and_sign(42, &citizen_user(5))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden(_)));
}

#[tokio::test]
async fn unresolvable_approver_is_refused() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;
    h.lifecycle.generate_draft(42).await.unwrap();

    // No administrateur record with id 99 exists.
    let err = h
        .lifecycle
        .validate_and_sign(42, &admin_user(99))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden(_)));

    let row = stored(&h, 42).await;
    assert_eq!(row.statut, Statut::EnTraitement, "CAS never reached");
}

#[tokio::test]
async fn nameless_approver_signs_with_the_generic_title() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, None, None)).await;
    h.store
        .insert_demande(demande(42, "carte_identite", Statut::EnTraitement, 5))
        .await;

    h.lifecycle.generate_draft(42).await.unwrap();
    h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap();

    let html = h.rasterizer.last_html().await.unwrap();
    assert!(html.contains("Le Bourgmestre"));
}

#[tokio::test]
async fn download_is_limited_to_admins_and_the_owner() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;
    let draft = h.lifecycle.generate_draft(42).await.unwrap();

    let (filename, bytes) = h
        .lifecycle
        .fetch_artifact(42, &citizen_user(5))
        .await
        .expect("owner can download");
    assert_eq!(filename, draft.filename);
    assert!(!bytes.is_empty());

    let err = h
        .lifecycle
        .fetch_artifact(42, &citizen_user(99))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden(_)));

    h.lifecycle
        .fetch_artifact(42, &admin_user(7))
        .await
        .expect("admins can download");
}

#[tokio::test]
async fn download_without_artifact_is_not_found() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::Soumise, 5))
        .await;

    let err = h
        .lifecycle
        .fetch_artifact(42, &admin_user(7))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));
}

#[tokio::test]
async fn token_lookup_resolves_the_demande() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store
        .insert_demande(demande(42, "acte_naissance", Statut::EnTraitement, 5))
        .await;
    h.lifecycle.generate_draft(42).await.unwrap();

    let token = stored(&h, 42).await.verification_token.unwrap();
    let found = h
        .store
        .get_demande_by_token(&token)
        .await
        .unwrap()
        .expect("token resolves");
    assert_eq!(found.id, 42);

    assert!(h
        .store
        .get_demande_by_token("no-such-token")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn concurrent_validations_commit_exactly_once() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, Some("Jean"), Some("Kabila"))).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;
    h.lifecycle.generate_draft(42).await.unwrap();

    let first = {
        let lifecycle = h.lifecycle.clone();
        tokio::spawn(async move { lifecycle.validate_and_sign(42, &admin_user(7)).await })
    };
    let second = {
        let lifecycle = h.lifecycle.clone();
        tokio::spawn(async move { lifecycle.validate_and_sign(42, &admin_user(7)).await })
    };
    let first = first.await.unwrap();
    let second = second.await.unwrap();

    let committed = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1, "exactly one validation may commit");
    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser.unwrap_err(),
        WorkflowError::PreconditionFailed(_)
    ));

    let row = stored(&h, 42).await;
    assert_eq!(row.statut, Statut::Validee);
    assert!(row.document_path.unwrap().ends_with("_signed.pdf"));

    // A later validation attempt is refused the same way.
    let err = h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));
}

#[tokio::test]
async fn mark_validated_commits_only_from_en_traitement() {
    let store = InMemoryStore::new();
    store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;

    assert!(store.mark_validated(42, "acte_residence_42_t_signed.pdf").await.unwrap());
    assert!(
        !store.mark_validated(42, "acte_residence_42_t_signed.pdf").await.unwrap(),
        "a second commit must lose the status check"
    );
    let row = store.get_demande(42).await.unwrap().unwrap();
    assert_eq!(row.statut, Statut::Validee);
}

#[tokio::test]
async fn workflow_locks_are_released_after_each_operation() {
    let h = harness();
    h.store.insert_citoyen(citoyen(5, "Mbala", "Kalonji", "Gombe")).await;
    h.store.insert_administrateur(admin(7, Some("Jean"), Some("Kabila"))).await;
    h.store
        .insert_demande(demande(42, "acte_residence", Statut::EnTraitement, 5))
        .await;

    h.lifecycle.generate_draft(42).await.unwrap();
    assert_eq!(h.lifecycle.pending_locks(), 0);

    h.rasterizer.fail_next();
    h.lifecycle.generate_draft(42).await.unwrap_err();
    assert_eq!(h.lifecycle.pending_locks(), 0, "released on the failure path too");

    h.lifecycle.generate_draft(42).await.unwrap();
    h.lifecycle.validate_and_sign(42, &admin_user(7)).await.unwrap();
    assert_eq!(h.lifecycle.pending_locks(), 0);
}

//! Two-phase document lifecycle: draft generation and validation/signing.
//!
//! Invariant maintained here: the stored demande never references an
//! artifact that does not exist on disk. The draft phase rolls the artifact
//! fields back to null when rendering fails; the signing phase leaves the
//! draft untouched on failure and commits the status transition with a
//! compare-and-swap.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use super::rasterizer::Rasterizer;
use super::templates::{self, SignatureMode, TemplateData};
use super::verification;
use super::{DocumentRef, WorkflowError};
use crate::auth::model::AuthUser;
use crate::config::Config;
use crate::demande::models::{Demande, DonneesDemande};
use crate::store::DemandeStore;

const LOGO_FILENAME: &str = "app_logo.png";

pub struct LifecycleManager {
    store: Arc<dyn DemandeStore>,
    rasterizer: Arc<dyn Rasterizer>,
    config: Arc<Config>,
    /// One async mutex per demande id, so the precondition check and the
    /// commit of a transition cannot interleave for the same demande.
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn DemandeStore>,
        rasterizer: Arc<dyn Rasterizer>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            rasterizer,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, id: i64) -> Arc<AsyncMutex<()>> {
        self.locks.lock().entry(id).or_default().clone()
    }

    /// Remove the lock entry once no task holds it anymore, so the map does
    /// not grow with every demande ever touched.
    fn prune_lock(&self, id: i64) {
        let mut locks = self.locks.lock();
        if locks.get(&id).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(&id);
        }
    }

    /// Number of demandes with an in-flight workflow operation.
    pub fn pending_locks(&self) -> usize {
        self.locks.lock().len()
    }

    /// Phase one: render the unsigned draft, mint the verification token if
    /// the demande has none yet, and persist the artifact pair. The statut
    /// does not change.
    pub async fn generate_draft(&self, demande_id: i64) -> Result<DocumentRef, WorkflowError> {
        let lock = self.lock_for(demande_id);
        let guard = lock.lock().await;
        let result = self.generate_draft_locked(demande_id).await;
        drop(guard);
        drop(lock);
        self.prune_lock(demande_id);
        result
    }

    async fn generate_draft_locked(
        &self,
        demande_id: i64,
    ) -> Result<DocumentRef, WorkflowError> {
        log::info!("generating draft document for demande {demande_id}");

        let demande = self
            .store
            .get_demande(demande_id)
            .await?
            .ok_or(WorkflowError::NotFound("demande"))?;

        // Mint once: a regenerated draft keeps the original token so the
        // public verification URL stays stable.
        let token = demande
            .verification_token
            .clone()
            .unwrap_or_else(verification::mint_token);

        let filename = format!(
            "{}_{}_{}.pdf",
            demande.type_demande.as_str(),
            demande.id,
            token
        );

        let result = self
            .render_to_file(&demande, &token, SignatureMode::Draft, &filename)
            .await;

        if let Err(err) = result {
            // Roll back so the row never claims an artifact that was not
            // produced.
            log::error!("draft generation failed for demande {demande_id}, clearing artifact fields: {err}");
            if let Err(db_err) = self.store.set_artifact(demande_id, None).await {
                log::error!("rollback of demande {demande_id} artifact fields failed: {db_err}");
            }
            return Err(err);
        }

        if let Err(db_err) = self.store.set_artifact(demande_id, Some((&filename, &token))).await {
            log::error!(
                "demande {demande_id}: PDF {filename} written but row update failed: {db_err}"
            );
            return Err(WorkflowError::Persistence { filename });
        }

        log::info!("draft {filename} generated for demande {demande_id}");
        Ok(DocumentRef {
            filename,
            verification_url: self.config.verification_url(&token),
        })
    }

    /// Phase two: re-render with the approver's signature, reusing the token
    /// minted for the draft, and transition the statut to "validée".
    pub async fn validate_and_sign(
        &self,
        demande_id: i64,
        acting_user: &AuthUser,
    ) -> Result<DocumentRef, WorkflowError> {
        if !acting_user.role.is_admin_level() {
            return Err(WorkflowError::Forbidden(
                "seul un bourgmestre peut valider un document".to_string(),
            ));
        }

        let lock = self.lock_for(demande_id);
        let guard = lock.lock().await;
        let result = self.validate_and_sign_locked(demande_id, acting_user).await;
        drop(guard);
        drop(lock);
        self.prune_lock(demande_id);
        result
    }

    async fn validate_and_sign_locked(
        &self,
        demande_id: i64,
        acting_user: &AuthUser,
    ) -> Result<DocumentRef, WorkflowError> {
        log::info!(
            "validating demande {demande_id} as administrateur {}",
            acting_user.id
        );

        let demande = self
            .store
            .get_demande(demande_id)
            .await?
            .ok_or(WorkflowError::NotFound("demande"))?;

        if demande.statut != crate::demande::models::Statut::EnTraitement {
            return Err(WorkflowError::PreconditionFailed(format!(
                "la demande ne peut être validée que si elle est 'en traitement' (statut actuel : '{}')",
                demande.statut.as_str()
            )));
        }
        let Some(token) = demande.verification_token.clone() else {
            return Err(WorkflowError::PreconditionFailed(
                "aucun document généré pour cette demande".to_string(),
            ));
        };
        if demande.document_path.is_none() {
            return Err(WorkflowError::PreconditionFailed(
                "aucun document généré pour cette demande".to_string(),
            ));
        }

        // The signer is whoever invokes the validation, not the demande's
        // assigned agent. An unresolvable identity hard-fails rather than
        // producing a document with a placeholder signer.
        let approver = self
            .store
            .get_administrateur(acting_user.id)
            .await?
            .ok_or_else(|| {
                WorkflowError::Forbidden("administrateur inconnu".to_string())
            })?
            .display_name();

        let signed_filename = format!(
            "{}_{}_{}_signed.pdf",
            demande.type_demande.as_str(),
            demande.id,
            token
        );

        // Failure here leaves the draft artifact fields untouched.
        self.render_to_file(
            &demande,
            &token,
            SignatureMode::Signed { approver },
            &signed_filename,
        )
        .await?;

        match self.store.mark_validated(demande_id, &signed_filename).await {
            Ok(true) => {}
            Ok(false) => {
                // Lost a race despite the keyed lock (e.g. out-of-band update).
                return Err(WorkflowError::PreconditionFailed(
                    "la demande n'est plus 'en traitement'".to_string(),
                ));
            }
            Err(db_err) => {
                log::error!(
                    "demande {demande_id}: signed PDF {signed_filename} written but statut update failed: {db_err}"
                );
                return Err(WorkflowError::Persistence {
                    filename: signed_filename,
                });
            }
        }

        log::info!("demande {demande_id} validated and signed as {signed_filename}");
        Ok(DocumentRef {
            filename: signed_filename,
            verification_url: self.config.verification_url(&token),
        })
    }

    /// Read the current artifact for download. Admin-level callers and the
    /// owning citizen only.
    pub async fn fetch_artifact(
        &self,
        demande_id: i64,
        acting_user: &AuthUser,
    ) -> Result<(String, Vec<u8>), WorkflowError> {
        let demande = self
            .store
            .get_demande(demande_id)
            .await?
            .ok_or(WorkflowError::NotFound("demande"))?;

        let filename = demande
            .document_path
            .clone()
            .ok_or(WorkflowError::NotFound("document"))?;

        let owns = acting_user.role == crate::auth::model::Role::Citoyen
            && acting_user.id == demande.citoyen_id;
        if !acting_user.role.is_admin_level() && !owns {
            return Err(WorkflowError::Forbidden("accès interdit".to_string()));
        }

        let path = self.config.documents_dir.join(&filename);
        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                WorkflowError::NotFound("document")
            } else {
                WorkflowError::ArtifactIo(err)
            }
        })?;

        Ok((filename, bytes))
    }

    /// Resolve everything a template needs and drive one render.
    async fn render_to_file(
        &self,
        demande: &Demande,
        token: &str,
        mode: SignatureMode,
        filename: &str,
    ) -> Result<(), WorkflowError> {
        let citoyen = self
            .store
            .get_citoyen(demande.citoyen_id)
            .await?
            .ok_or(WorkflowError::NotFound("citoyen"))?;

        let donnees = demande.donnees_typees();

        let (commune_naissance, province_naissance) =
            if let DonneesDemande::ActeNaissance(d) = &donnees {
                let commune = match d.commune_naissance_enfant_id {
                    Some(id) => self.store.get_commune(id).await?.map(|c| c.nom),
                    None => None,
                };
                let province = match d.province_naissance_enfant_id {
                    Some(id) => self.store.get_province(id).await?.map(|p| p.nom),
                    None => None,
                };
                (commune, province)
            } else {
                (None, None)
            };

        let verification_url = self.config.verification_url(token);
        let qr_data_uri = verification::qr_data_uri(&verification_url)?;

        let data = TemplateData {
            demande_id: demande.id,
            type_demande: demande.type_demande.clone(),
            photo_url: donnees.photo_url().map(|s| s.to_string()),
            citoyen,
            commune_naissance,
            province_naissance,
            donnees,
            verification_url,
            qr_data_uri,
            logo_src: self.logo_src().await,
            date_emission: templates::common::today_fr(),
        };

        let html = templates::render(&data, &mode);
        let output = self.config.documents_dir.join(filename);
        self.rasterizer.render_pdf(&html, &output).await?;
        Ok(())
    }

    /// Inline the commune logo as a data URI when the local asset exists.
    /// Falling back to the hosted URL reintroduces one network fetch during
    /// rasterization; accepted tradeoff so a missing asset does not block
    /// issuance.
    async fn logo_src(&self) -> String {
        let path = self.config.assets_dir.join(LOGO_FILENAME);
        match tokio::fs::read(&path).await {
            Ok(bytes) => format!("data:image/png;base64,{}", STANDARD.encode(&bytes)),
            Err(_) => {
                log::warn!("local logo not found at {}, using hosted URL", path.display());
                format!(
                    "{}/public/assets/images/{}",
                    self.config.public_base_url.trim_end_matches('/'),
                    LOGO_FILENAME
                )
            }
        }
    }
}

//! Shared test doubles: an in-memory store and a stub rasterizer, so the
//! lifecycle tests run without a database or a Chromium binary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use ma_commune_server::auth::model::Compte;
use ma_commune_server::demande::models::{
    Administrateur, Citoyen, Commune, Demande, DemandeType, Province, Statut,
};
use ma_commune_server::documents::{Rasterizer, RasterizerError};
use ma_commune_server::store::{DemandeStore, NewDemande, StoreError};

#[derive(Default)]
pub struct InMemoryStore {
    pub demandes: Mutex<HashMap<i64, Demande>>,
    pub citoyens: Mutex<HashMap<i64, Citoyen>>,
    pub communes: Mutex<HashMap<i64, Commune>>,
    pub provinces: Mutex<HashMap<i64, Province>>,
    pub administrateurs: Mutex<HashMap<i64, Administrateur>>,
    pub comptes: Mutex<HashMap<String, Compte>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_demande(&self, demande: Demande) {
        self.demandes.lock().await.insert(demande.id, demande);
    }

    pub async fn insert_citoyen(&self, citoyen: Citoyen) {
        self.citoyens.lock().await.insert(citoyen.id, citoyen);
    }

    pub async fn insert_administrateur(&self, admin: Administrateur) {
        self.administrateurs.lock().await.insert(admin.id, admin);
    }
}

#[async_trait]
impl DemandeStore for InMemoryStore {
    async fn get_demande(&self, id: i64) -> Result<Option<Demande>, StoreError> {
        Ok(self.demandes.lock().await.get(&id).cloned())
    }

    async fn get_demande_by_token(&self, token: &str) -> Result<Option<Demande>, StoreError> {
        Ok(self
            .demandes
            .lock()
            .await
            .values()
            .find(|d| d.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list_demandes(&self) -> Result<Vec<Demande>, StoreError> {
        Ok(self.demandes.lock().await.values().cloned().collect())
    }

    async fn list_demandes_by_citoyen(&self, citoyen_id: i64) -> Result<Vec<Demande>, StoreError> {
        Ok(self
            .demandes
            .lock()
            .await
            .values()
            .filter(|d| d.citoyen_id == citoyen_id)
            .cloned()
            .collect())
    }

    async fn list_demandes_by_statut(&self, statut: Statut) -> Result<Vec<Demande>, StoreError> {
        Ok(self
            .demandes
            .lock()
            .await
            .values()
            .filter(|d| d.statut == statut)
            .cloned()
            .collect())
    }

    async fn create_demande(&self, new: NewDemande) -> Result<Demande, StoreError> {
        let mut demandes = self.demandes.lock().await;
        let id = demandes.keys().max().copied().unwrap_or(0) + 1;
        let demande = Demande {
            id,
            type_demande: DemandeType::parse(&new.type_demande),
            donnees: new.donnees,
            statut: Statut::Soumise,
            citoyen_id: new.citoyen_id,
            agent_id: None,
            document_path: None,
            verification_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        demandes.insert(id, demande.clone());
        Ok(demande)
    }

    async fn set_artifact(
        &self,
        id: i64,
        artifact: Option<(&str, &str)>,
    ) -> Result<(), StoreError> {
        let mut demandes = self.demandes.lock().await;
        if let Some(demande) = demandes.get_mut(&id) {
            match artifact {
                Some((path, token)) => {
                    demande.document_path = Some(path.to_string());
                    demande.verification_token = Some(token.to_string());
                }
                None => {
                    demande.document_path = None;
                    demande.verification_token = None;
                }
            }
            demande.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_validated(&self, id: i64, signed_filename: &str) -> Result<bool, StoreError> {
        let mut demandes = self.demandes.lock().await;
        match demandes.get_mut(&id) {
            Some(demande) if demande.statut == Statut::EnTraitement => {
                demande.statut = Statut::Validee;
                demande.document_path = Some(signed_filename.to_string());
                demande.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_citoyen(&self, id: i64) -> Result<Option<Citoyen>, StoreError> {
        Ok(self.citoyens.lock().await.get(&id).cloned())
    }

    async fn get_commune(&self, id: i64) -> Result<Option<Commune>, StoreError> {
        Ok(self.communes.lock().await.get(&id).cloned())
    }

    async fn get_province(&self, id: i64) -> Result<Option<Province>, StoreError> {
        Ok(self.provinces.lock().await.get(&id).cloned())
    }

    async fn get_administrateur(&self, id: i64) -> Result<Option<Administrateur>, StoreError> {
        Ok(self.administrateurs.lock().await.get(&id).cloned())
    }

    async fn get_compte_by_email(&self, email: &str) -> Result<Option<Compte>, StoreError> {
        Ok(self.comptes.lock().await.get(email).cloned())
    }
}

/// Rasterizer double: writes the HTML bytes to the output path so the file
/// exists on disk, and records every render for assertions.
#[derive(Default)]
pub struct StubRasterizer {
    pub fail: AtomicBool,
    pub rendered: Mutex<Vec<(String, String)>>,
}

impl StubRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub async fn last_html(&self) -> Option<String> {
        self.rendered.lock().await.last().map(|(_, html)| html.clone())
    }
}

#[async_trait]
impl Rasterizer for StubRasterizer {
    async fn render_pdf(&self, html: &str, output: &Path) -> Result<(), RasterizerError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(RasterizerError::EngineExit(1));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(RasterizerError::Output)?;
        }
        tokio::fs::write(output, html)
            .await
            .map_err(RasterizerError::Output)?;
        let filename = output
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.rendered.lock().await.push((filename, html.to_string()));
        Ok(())
    }
}

pub fn demande(id: i64, type_demande: &str, statut: Statut, citoyen_id: i64) -> Demande {
    Demande {
        id,
        type_demande: DemandeType::parse(type_demande),
        donnees: serde_json::json!({}),
        statut,
        citoyen_id,
        agent_id: None,
        document_path: None,
        verification_token: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn citoyen(id: i64, nom: &str, postnom: &str, commune: &str) -> Citoyen {
    Citoyen {
        id,
        nom: Some(nom.to_string()),
        postnom: Some(postnom.to_string()),
        prenom: None,
        sexe: None,
        date_naissance: None,
        lieu_naissance: None,
        numero_unique: None,
        commune: Some(Commune {
            id: 1,
            nom: commune.to_string(),
        }),
    }
}

pub fn admin(id: i64, prenom: Option<&str>, nom: Option<&str>) -> Administrateur {
    Administrateur {
        id,
        nom: nom.map(|s| s.to_string()),
        prenom: prenom.map(|s| s.to_string()),
    }
}

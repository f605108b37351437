//! Persistence layer for demandes and their related entities.
//!
//! The document workflow only speaks to the [`DemandeStore`] trait; the
//! Postgres implementation lives in [`postgres`], and tests substitute an
//! in-memory store.

mod postgres;

pub use postgres::PgDemandeStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::model::Compte;
use crate::demande::models::{Administrateur, Citoyen, Commune, Demande, Province, Statut};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("row {id} carries unknown statut '{raw}'")]
    UnknownStatut { id: i64, raw: String },
}

/// Fields for a new demande; statut always starts at "soumise".
#[derive(Debug, Clone)]
pub struct NewDemande {
    pub type_demande: String,
    pub donnees: serde_json::Value,
    pub citoyen_id: i64,
}

#[async_trait]
pub trait DemandeStore: Send + Sync {
    async fn get_demande(&self, id: i64) -> Result<Option<Demande>, StoreError>;
    async fn get_demande_by_token(&self, token: &str) -> Result<Option<Demande>, StoreError>;
    async fn list_demandes(&self) -> Result<Vec<Demande>, StoreError>;
    async fn list_demandes_by_citoyen(&self, citoyen_id: i64) -> Result<Vec<Demande>, StoreError>;
    async fn list_demandes_by_statut(&self, statut: Statut) -> Result<Vec<Demande>, StoreError>;
    async fn create_demande(&self, new: NewDemande) -> Result<Demande, StoreError>;

    /// Set or clear the artifact pair. Passing `None` clears both fields,
    /// which is the rollback path after a failed render; the two columns are
    /// never written independently.
    async fn set_artifact(
        &self,
        id: i64,
        artifact: Option<(&str, &str)>,
    ) -> Result<(), StoreError>;

    /// Atomically transition `en traitement` → `validée` and point
    /// `document_path` at the signed artifact. Returns false when the row was
    /// not in `en traitement` anymore (lost a concurrent race).
    async fn mark_validated(&self, id: i64, signed_filename: &str) -> Result<bool, StoreError>;

    /// Citizen record with its commune eagerly attached.
    async fn get_citoyen(&self, id: i64) -> Result<Option<Citoyen>, StoreError>;
    async fn get_commune(&self, id: i64) -> Result<Option<Commune>, StoreError>;
    async fn get_province(&self, id: i64) -> Result<Option<Province>, StoreError>;
    async fn get_administrateur(&self, id: i64) -> Result<Option<Administrateur>, StoreError>;

    /// Login lookup.
    async fn get_compte_by_email(&self, email: &str) -> Result<Option<Compte>, StoreError>;
}

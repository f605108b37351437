//! Postgres-backed [`DemandeStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use super::{DemandeStore, NewDemande, StoreError};
use crate::auth::model::{Compte, Role};
use crate::demande::models::{
    Administrateur, Citoyen, Commune, Demande, DemandeType, Province, Statut,
};

#[derive(Clone)]
pub struct PgDemandeStore {
    pool: PgPool,
}

impl PgDemandeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[derive(FromRow)]
struct DemandeRow {
    id: i64,
    type_demande: String,
    donnees: serde_json::Value,
    statut: String,
    citoyen_id: i64,
    agent_id: Option<i64>,
    document_path: Option<String>,
    verification_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DemandeRow {
    fn into_demande(self) -> Result<Demande, StoreError> {
        let statut = Statut::parse(&self.statut).ok_or_else(|| StoreError::UnknownStatut {
            id: self.id,
            raw: self.statut.clone(),
        })?;
        Ok(Demande {
            id: self.id,
            type_demande: DemandeType::parse(&self.type_demande),
            donnees: self.donnees,
            statut,
            citoyen_id: self.citoyen_id,
            agent_id: self.agent_id,
            document_path: self.document_path,
            verification_token: self.verification_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CitoyenRow {
    id: i64,
    nom: Option<String>,
    postnom: Option<String>,
    prenom: Option<String>,
    sexe: Option<String>,
    date_naissance: Option<NaiveDate>,
    lieu_naissance: Option<String>,
    numero_unique: Option<String>,
    commune_id: Option<i64>,
    commune_nom: Option<String>,
}

const DEMANDE_COLUMNS: &str = "id, type_demande, donnees, statut, citoyen_id, agent_id, \
     document_path, verification_token, created_at, updated_at";

fn rows_to_demandes(rows: Vec<DemandeRow>) -> Result<Vec<Demande>, StoreError> {
    rows.into_iter().map(DemandeRow::into_demande).collect()
}

#[async_trait]
impl DemandeStore for PgDemandeStore {
    async fn get_demande(&self, id: i64) -> Result<Option<Demande>, StoreError> {
        let row = sqlx::query_as::<_, DemandeRow>(&format!(
            "SELECT {DEMANDE_COLUMNS} FROM demandes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DemandeRow::into_demande).transpose()
    }

    async fn get_demande_by_token(&self, token: &str) -> Result<Option<Demande>, StoreError> {
        let row = sqlx::query_as::<_, DemandeRow>(&format!(
            "SELECT {DEMANDE_COLUMNS} FROM demandes WHERE verification_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DemandeRow::into_demande).transpose()
    }

    async fn list_demandes(&self) -> Result<Vec<Demande>, StoreError> {
        let rows = sqlx::query_as::<_, DemandeRow>(&format!(
            "SELECT {DEMANDE_COLUMNS} FROM demandes ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows_to_demandes(rows)
    }

    async fn list_demandes_by_citoyen(&self, citoyen_id: i64) -> Result<Vec<Demande>, StoreError> {
        let rows = sqlx::query_as::<_, DemandeRow>(&format!(
            "SELECT {DEMANDE_COLUMNS} FROM demandes WHERE citoyen_id = $1 ORDER BY created_at DESC"
        ))
        .bind(citoyen_id)
        .fetch_all(&self.pool)
        .await?;
        rows_to_demandes(rows)
    }

    async fn list_demandes_by_statut(&self, statut: Statut) -> Result<Vec<Demande>, StoreError> {
        let rows = sqlx::query_as::<_, DemandeRow>(&format!(
            "SELECT {DEMANDE_COLUMNS} FROM demandes WHERE statut = $1 ORDER BY created_at DESC"
        ))
        .bind(statut.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows_to_demandes(rows)
    }

    async fn create_demande(&self, new: NewDemande) -> Result<Demande, StoreError> {
        let row = sqlx::query_as::<_, DemandeRow>(&format!(
            "INSERT INTO demandes (type_demande, donnees, statut, citoyen_id) \
             VALUES ($1, $2, $3, $4) RETURNING {DEMANDE_COLUMNS}"
        ))
        .bind(&new.type_demande)
        .bind(&new.donnees)
        .bind(Statut::Soumise.as_str())
        .bind(new.citoyen_id)
        .fetch_one(&self.pool)
        .await?;
        row.into_demande()
    }

    async fn set_artifact(
        &self,
        id: i64,
        artifact: Option<(&str, &str)>,
    ) -> Result<(), StoreError> {
        let (path, token) = match artifact {
            Some((path, token)) => (Some(path), Some(token)),
            None => (None, None),
        };
        sqlx::query(
            "UPDATE demandes SET document_path = $1, verification_token = $2, \
             updated_at = NOW() WHERE id = $3",
        )
        .bind(path)
        .bind(token)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_validated(&self, id: i64, signed_filename: &str) -> Result<bool, StoreError> {
        // Compare-and-swap on statut so two concurrent validations cannot
        // both commit.
        let result = sqlx::query(
            "UPDATE demandes SET statut = $1, document_path = $2, updated_at = NOW() \
             WHERE id = $3 AND statut = $4",
        )
        .bind(Statut::Validee.as_str())
        .bind(signed_filename)
        .bind(id)
        .bind(Statut::EnTraitement.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_citoyen(&self, id: i64) -> Result<Option<Citoyen>, StoreError> {
        let row = sqlx::query_as::<_, CitoyenRow>(
            "SELECT c.id, c.nom, c.postnom, c.prenom, c.sexe, c.date_naissance, \
             c.lieu_naissance, c.numero_unique, co.id AS commune_id, co.nom AS commune_nom \
             FROM citoyens c LEFT JOIN communes co ON co.id = c.commune_id \
             WHERE c.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| Citoyen {
            id: r.id,
            nom: r.nom,
            postnom: r.postnom,
            prenom: r.prenom,
            sexe: r.sexe,
            date_naissance: r.date_naissance,
            lieu_naissance: r.lieu_naissance,
            numero_unique: r.numero_unique,
            commune: match (r.commune_id, r.commune_nom) {
                (Some(id), Some(nom)) => Some(Commune { id, nom }),
                _ => None,
            },
        }))
    }

    async fn get_commune(&self, id: i64) -> Result<Option<Commune>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            nom: String,
        }
        let row = sqlx::query_as::<_, Row>("SELECT id, nom FROM communes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Commune { id: r.id, nom: r.nom }))
    }

    async fn get_province(&self, id: i64) -> Result<Option<Province>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            nom: String,
        }
        let row = sqlx::query_as::<_, Row>("SELECT id, nom FROM provinces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Province { id: r.id, nom: r.nom }))
    }

    async fn get_administrateur(&self, id: i64) -> Result<Option<Administrateur>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            nom: Option<String>,
            prenom: Option<String>,
        }
        let row =
            sqlx::query_as::<_, Row>("SELECT id, nom, prenom FROM administrateurs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| Administrateur {
            id: r.id,
            nom: r.nom,
            prenom: r.prenom,
        }))
    }

    async fn get_compte_by_email(&self, email: &str) -> Result<Option<Compte>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            email: String,
            password_hash: String,
            role: String,
        }
        let row = sqlx::query_as::<_, Row>(
            "SELECT id, email, password_hash, role FROM comptes WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|r| {
            let role = Role::parse(&r.role)?;
            Some(Compte {
                id: r.id,
                email: r.email,
                password_hash: r.password_hash,
                role,
            })
        }))
    }
}

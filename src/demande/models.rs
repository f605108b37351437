//! Domain model for demandes (citizen requests for civic documents).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of document types the commune issues. Anything else is carried
/// through as `Autre` and rendered with the fallback template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemandeType {
    ActeNaissance,
    ActeMariage,
    ActeResidence,
    CarteIdentite,
    Autre(String),
}

impl DemandeType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "acte_naissance" => DemandeType::ActeNaissance,
            "acte_mariage" => DemandeType::ActeMariage,
            "acte_residence" => DemandeType::ActeResidence,
            "carte_identite" => DemandeType::CarteIdentite,
            other => DemandeType::Autre(other.to_string()),
        }
    }

    /// Canonical string used in filenames and storage.
    pub fn as_str(&self) -> &str {
        match self {
            DemandeType::ActeNaissance => "acte_naissance",
            DemandeType::ActeMariage => "acte_mariage",
            DemandeType::ActeResidence => "acte_residence",
            DemandeType::CarteIdentite => "carte_identite",
            DemandeType::Autre(s) => s,
        }
    }

    /// Human-readable document title for the rendered page.
    pub fn titre(&self) -> &str {
        match self {
            DemandeType::ActeNaissance => "ACTE DE NAISSANCE",
            DemandeType::ActeMariage => "ACTE DE MARIAGE",
            DemandeType::ActeResidence => "CERTIFICAT DE RÉSIDENCE",
            DemandeType::CarteIdentite => "CARTE D'IDENTITÉ",
            DemandeType::Autre(_) => "DOCUMENT NON STANDARD",
        }
    }
}

/// Processing state of a demande. Stored as a string, treated as a closed
/// enum everywhere in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Statut {
    #[serde(rename = "soumise")]
    Soumise,
    #[serde(rename = "en traitement")]
    EnTraitement,
    #[serde(rename = "validée")]
    Validee,
}

impl Statut {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "soumise" => Some(Statut::Soumise),
            "en traitement" => Some(Statut::EnTraitement),
            "validée" => Some(Statut::Validee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Statut::Soumise => "soumise",
            Statut::EnTraitement => "en traitement",
            Statut::Validee => "validée",
        }
    }
}

/// Typed payload carried by a demande, one shape per document type.
///
/// Every field is optional: the renderer substitutes "N/A" for anything
/// missing rather than refusing to produce a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActeNaissanceDonnees {
    pub nom_enfant: Option<String>,
    pub postnom_enfant: Option<String>,
    pub prenom_enfant: Option<String>,
    pub sexe_enfant: Option<String>,
    pub date_naissance_enfant: Option<String>,
    pub lieu_naissance_enfant: Option<String>,
    pub commune_naissance_enfant_id: Option<i64>,
    pub province_naissance_enfant_id: Option<i64>,
    pub nom_pere: Option<String>,
    pub prenom_pere: Option<String>,
    pub nom_mere: Option<String>,
    pub prenom_mere: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActeMariageDonnees {
    pub nom_conjoint: Option<String>,
    pub postnom_conjoint: Option<String>,
    pub prenom_conjoint: Option<String>,
    pub date_mariage: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActeResidenceDonnees {
    pub adresse_complete: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CarteIdentiteDonnees {
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DonneesDemande {
    ActeNaissance(ActeNaissanceDonnees),
    ActeMariage(ActeMariageDonnees),
    ActeResidence(ActeResidenceDonnees),
    CarteIdentite(CarteIdentiteDonnees),
    Autre(serde_json::Value),
}

impl DonneesDemande {
    /// Interpret a raw JSON payload according to the demande type.
    ///
    /// A malformed payload degrades to the default (all-absent) shape so
    /// that rendering still succeeds with "N/A" placeholders.
    pub fn from_raw(type_demande: &DemandeType, raw: &serde_json::Value) -> Self {
        match type_demande {
            DemandeType::ActeNaissance => DonneesDemande::ActeNaissance(
                serde_json::from_value(raw.clone()).unwrap_or_default(),
            ),
            DemandeType::ActeMariage => DonneesDemande::ActeMariage(
                serde_json::from_value(raw.clone()).unwrap_or_default(),
            ),
            DemandeType::ActeResidence => DonneesDemande::ActeResidence(
                serde_json::from_value(raw.clone()).unwrap_or_default(),
            ),
            DemandeType::CarteIdentite => DonneesDemande::CarteIdentite(
                serde_json::from_value(raw.clone()).unwrap_or_default(),
            ),
            DemandeType::Autre(_) => DonneesDemande::Autre(raw.clone()),
        }
    }

    /// Ingestion-time check: for known types the payload must deserialize
    /// into its typed shape. Unknown types carry arbitrary JSON.
    pub fn validate_raw(
        type_demande: &DemandeType,
        raw: &serde_json::Value,
    ) -> Result<(), String> {
        fn check<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<(), String> {
            serde_json::from_value::<T>(raw.clone())
                .map(|_| ())
                .map_err(|e| e.to_string())
        }
        if raw.is_null() {
            // An empty payload is a valid all-absent shape.
            return Ok(());
        }
        match type_demande {
            DemandeType::ActeNaissance => check::<ActeNaissanceDonnees>(raw),
            DemandeType::ActeMariage => check::<ActeMariageDonnees>(raw),
            DemandeType::ActeResidence => check::<ActeResidenceDonnees>(raw),
            DemandeType::CarteIdentite => check::<CarteIdentiteDonnees>(raw),
            DemandeType::Autre(_) => Ok(()),
        }
    }

    pub fn photo_url(&self) -> Option<&str> {
        match self {
            DonneesDemande::CarteIdentite(d) => d.photo_url.as_deref(),
            _ => None,
        }
    }
}

/// A citizen's application for a civic document.
#[derive(Debug, Clone)]
pub struct Demande {
    pub id: i64,
    pub type_demande: DemandeType,
    pub donnees: serde_json::Value,
    pub statut: Statut,
    pub citoyen_id: i64,
    pub agent_id: Option<i64>,
    /// Filename of the last generated artifact, relative to the documents
    /// directory. Set and cleared together with `verification_token`.
    pub document_path: Option<String>,
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Demande {
    /// Typed view of the raw payload.
    pub fn donnees_typees(&self) -> DonneesDemande {
        DonneesDemande::from_raw(&self.type_demande, &self.donnees)
    }

    pub fn has_artifact(&self) -> bool {
        self.document_path.is_some() && self.verification_token.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Commune {
    pub id: i64,
    pub nom: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Province {
    pub id: i64,
    pub nom: String,
}

/// Demographic record, read-only input to rendering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Citoyen {
    pub id: i64,
    pub nom: Option<String>,
    pub postnom: Option<String>,
    pub prenom: Option<String>,
    pub sexe: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub lieu_naissance: Option<String>,
    pub numero_unique: Option<String>,
    pub commune: Option<Commune>,
}

/// Administrative account able to sign documents (bourgmestre).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Administrateur {
    pub id: i64,
    pub nom: Option<String>,
    pub prenom: Option<String>,
}

impl Administrateur {
    /// Display name used in the signature block: "prenom nom", trimmed.
    /// Both fields empty falls back to the generic title so the signature
    /// line is never blank.
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.prenom.as_deref().unwrap_or(""),
            self.nom.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        if name.is_empty() {
            "Le Bourgmestre".to_string()
        } else {
            name
        }
    }
}

/// Payload for creating a demande.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDemandeRequest {
    pub type_demande: String,
    #[serde(default)]
    pub donnees: serde_json::Value,
    pub citoyen_id: i64,
}

/// Serialized view of a demande for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct DemandeResponse {
    pub id: i64,
    pub type_demande: String,
    pub donnees: serde_json::Value,
    pub statut: Statut,
    pub citoyen_id: i64,
    pub agent_id: Option<i64>,
    pub document_path: Option<String>,
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Demande> for DemandeResponse {
    fn from(d: Demande) -> Self {
        DemandeResponse {
            id: d.id,
            type_demande: d.type_demande.as_str().to_string(),
            donnees: d.donnees,
            statut: d.statut,
            citoyen_id: d.citoyen_id,
            agent_id: d.agent_id,
            document_path: d.document_path,
            verification_token: d.verification_token,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_parse_roundtrip() {
        assert_eq!(
            DemandeType::parse("acte_naissance"),
            DemandeType::ActeNaissance
        );
        assert_eq!(
            DemandeType::parse("acte_deces"),
            DemandeType::Autre("acte_deces".to_string())
        );
        assert_eq!(DemandeType::parse("carte_identite").as_str(), "carte_identite");
    }

    #[test]
    fn statut_parse_is_closed() {
        assert_eq!(Statut::parse("en traitement"), Some(Statut::EnTraitement));
        assert_eq!(Statut::parse("validée"), Some(Statut::Validee));
        assert_eq!(Statut::parse("rejetée"), None);
    }

    #[test]
    fn donnees_degrade_to_default_on_malformed_payload() {
        let raw = json!("not an object");
        match DonneesDemande::from_raw(&DemandeType::ActeResidence, &raw) {
            DonneesDemande::ActeResidence(d) => assert!(d.adresse_complete.is_none()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn display_name_falls_back_when_empty() {
        let admin = Administrateur {
            id: 7,
            nom: Some("".to_string()),
            prenom: None,
        };
        assert_eq!(admin.display_name(), "Le Bourgmestre");

        let admin = Administrateur {
            id: 7,
            nom: Some("Kabila".to_string()),
            prenom: Some("Jean".to_string()),
        };
        assert_eq!(admin.display_name(), "Jean Kabila");
    }
}

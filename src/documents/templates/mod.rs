//! HTML templates for the issued documents.
//!
//! Rendering is a pure function from `(type, data, mode)` to a self-contained
//! HTML string: styles are inlined and the QR code ships as a data URI, so
//! the rasterizer needs no network beyond what the logo source itself embeds.
//! Missing fields always render as "N/A"; no input can make rendering fail.

pub mod common;

mod acte_mariage;
mod acte_naissance;
mod acte_residence;
mod carte_identite;
mod fallback;

use crate::demande::models::{Citoyen, DemandeType, DonneesDemande};

/// Whether the document carries the generic draft placeholder or the
/// approver's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureMode {
    Draft,
    Signed { approver: String },
}

/// Resolved inputs for one render. Everything the templates interpolate is
/// already looked up; the renderer itself does no I/O.
#[derive(Debug, Clone)]
pub struct TemplateData {
    pub demande_id: i64,
    pub type_demande: DemandeType,
    pub citoyen: Citoyen,
    /// Birth commune / province names for the acte de naissance, when the
    /// payload references them.
    pub commune_naissance: Option<String>,
    pub province_naissance: Option<String>,
    pub donnees: DonneesDemande,
    pub verification_url: String,
    pub qr_data_uri: String,
    pub photo_url: Option<String>,
    /// Logo image source: a data URI when the local asset exists, otherwise
    /// the hosted absolute URL.
    pub logo_src: String,
    /// Issue date, already formatted DD/MM/YYYY.
    pub date_emission: String,
}

impl TemplateData {
    pub fn commune_nom(&self) -> &str {
        self.citoyen
            .commune
            .as_ref()
            .map(|c| c.nom.as_str())
            .unwrap_or("XXX")
    }
}

/// Render the document body for a demande. Infallible by contract: unknown
/// types fall back to the placeholder document.
pub fn render(data: &TemplateData, mode: &SignatureMode) -> String {
    match &data.type_demande {
        DemandeType::ActeNaissance => acte_naissance::render(data, mode),
        DemandeType::ActeMariage => acte_mariage::render(data, mode),
        DemandeType::ActeResidence => acte_residence::render(data, mode),
        DemandeType::CarteIdentite => carte_identite::render(data, mode),
        DemandeType::Autre(_) => fallback::render(data, mode),
    }
}

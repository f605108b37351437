//! Residency certificate template.

use super::common::{esc, letter_page, na};
use super::{SignatureMode, TemplateData};
use crate::demande::models::{ActeResidenceDonnees, DonneesDemande};

pub fn render(data: &TemplateData, mode: &SignatureMode) -> String {
    let d: ActeResidenceDonnees = match &data.donnees {
        DonneesDemande::ActeResidence(d) => d.clone(),
        _ => Default::default(),
    };
    let citoyen = &data.citoyen;

    let content = format!(
        r#"    <p>Je soussigné, le Bourgmestre de la commune de {commune},</p>
    <p>atteste que le citoyen :</p>
    <p><strong>Nom :</strong> {nom}</p>
    <p><strong>Postnom :</strong> {postnom}</p>
    <p><strong>Prénom :</strong> {prenom}</p>
    <p><strong>Réside à :</strong> {adresse}, {commune}, Kinshasa.</p>
    <p>Délivré à Kinshasa, le {date}.</p>"#,
        commune = esc(data.commune_nom()),
        nom = na(citoyen.nom.as_deref()),
        postnom = na(citoyen.postnom.as_deref()),
        prenom = na(citoyen.prenom.as_deref()),
        adresse = na(d.adresse_complete.as_deref()),
        date = data.date_emission,
    );

    letter_page(data, mode, "CERTIFICAT DE RÉSIDENCE", &content)
}

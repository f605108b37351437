//! Birth certificate template.

use super::common::{date_fr, esc, letter_page, na};
use super::{SignatureMode, TemplateData};
use crate::demande::models::{ActeNaissanceDonnees, DonneesDemande};

pub fn render(data: &TemplateData, mode: &SignatureMode) -> String {
    let d: ActeNaissanceDonnees = match &data.donnees {
        DonneesDemande::ActeNaissance(d) => d.clone(),
        _ => Default::default(),
    };

    let lieu_naissance = format!(
        "{}, {}, {}",
        na(d.lieu_naissance_enfant.as_deref()),
        data.commune_naissance.as_deref().map(esc).unwrap_or_default(),
        data.province_naissance.as_deref().map(esc).unwrap_or_default(),
    );

    let content = format!(
        r#"    <p>Je soussigné, le Bourgmestre de la commune de {commune},</p>
    <p>atteste que l'enfant :</p>
    <p><strong>Nom :</strong> {nom}</p>
    <p><strong>Postnom :</strong> {postnom}</p>
    <p><strong>Prénom :</strong> {prenom}</p>
    <p><strong>Sexe :</strong> {sexe}</p>
    <p><strong>Né(e) le :</strong> {date_naissance}</p>
    <p><strong>Lieu de naissance :</strong> {lieu_naissance}</p>
    <p><strong>Père :</strong> {prenom_pere} {nom_pere}</p>
    <p><strong>Mère :</strong> {prenom_mere} {nom_mere}</p>
    <p>Délivré à Kinshasa, le {date}.</p>"#,
        commune = esc(data.commune_nom()),
        nom = na(d.nom_enfant.as_deref()),
        postnom = na(d.postnom_enfant.as_deref()),
        prenom = na(d.prenom_enfant.as_deref()),
        sexe = na(d.sexe_enfant.as_deref()),
        date_naissance = date_fr(d.date_naissance_enfant.as_deref()),
        lieu_naissance = lieu_naissance,
        prenom_pere = na(d.prenom_pere.as_deref()),
        nom_pere = na(d.nom_pere.as_deref()),
        prenom_mere = na(d.prenom_mere.as_deref()),
        nom_mere = na(d.nom_mere.as_deref()),
        date = data.date_emission,
    );

    letter_page(data, mode, "ACTE DE NAISSANCE", &content)
}

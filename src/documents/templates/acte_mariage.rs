//! Marriage certificate template.

use super::common::{date_fr, esc, letter_page, na};
use super::{SignatureMode, TemplateData};
use crate::demande::models::{ActeMariageDonnees, DonneesDemande};

/// "Nom Postnom Prenom" where the postnom is simply omitted when absent.
fn full_name(nom: Option<&str>, postnom: Option<&str>, prenom: Option<&str>) -> String {
    let postnom = match postnom {
        Some(p) if !p.trim().is_empty() => format!("{} ", esc(p)),
        _ => String::new(),
    };
    format!("{} {}{}", na(nom), postnom, na(prenom))
}

pub fn render(data: &TemplateData, mode: &SignatureMode) -> String {
    let d: ActeMariageDonnees = match &data.donnees {
        DonneesDemande::ActeMariage(d) => d.clone(),
        _ => Default::default(),
    };
    let citoyen = &data.citoyen;

    let content = format!(
        r#"    <p>Le mariage entre :</p>
    <p><strong>Époux :</strong> {epoux}</p>
    <p><strong>Épouse :</strong> {epouse}</p>
    <p>a été célébré le {date_mariage} dans notre commune.</p>
    <p>Délivré à Kinshasa, le {date}.</p>"#,
        epoux = full_name(
            citoyen.nom.as_deref(),
            citoyen.postnom.as_deref(),
            citoyen.prenom.as_deref()
        ),
        epouse = full_name(
            d.nom_conjoint.as_deref(),
            d.postnom_conjoint.as_deref(),
            d.prenom_conjoint.as_deref()
        ),
        date_mariage = date_fr(d.date_mariage.as_deref()),
        date = data.date_emission,
    );

    letter_page(data, mode, "ACTE DE MARIAGE", &content)
}

//! Placeholder document for unrecognized demande types. Still carries the
//! signature block and the verification footer.

use super::common::{esc, signature_block};
use super::{SignatureMode, TemplateData};

pub fn render(data: &TemplateData, mode: &SignatureMode) -> String {
    format!(
        r#"<body>
  <h1>Document Non Standard</h1>
  <p>Type de document non reconnu ou template non disponible.</p>
  <p>ID Demande : {id}</p>
  <p>Type : {type_demande}</p>
  <p>Délivré à Kinshasa, le {date}.</p>
  {signature}
</body>"#,
        id = data.demande_id,
        type_demande = esc(data.type_demande.as_str()),
        date = data.date_emission,
        signature = signature_block(data, mode),
    )
}

//! Identity card template: compact card layout rather than the full-page
//! letter used by the actes.

use super::common::{esc, naive_date_fr, na};
use super::{SignatureMode, TemplateData};

const PHOTO_PLACEHOLDER: &str = "https://placehold.co/70x70/003DA5/FFFFFF?text=PHOTO";

const CARD_STYLE: &str = r#"
  body {
    font-family: Arial, sans-serif;
    margin: 0;
    padding: 0;
    display: flex;
    justify-content: center;
    align-items: center;
    height: 100vh;
    background: #f0f0f0;
  }
  .id-card {
    width: 336px;
    height: 204px;
    border: 1px solid #003da5;
    border-radius: 10px;
    position: relative;
    box-shadow: 2px 2px 6px rgba(0,0,0,0.2);
    display: flex;
    flex-direction: column;
    padding: 6px;
    box-sizing: border-box;
    background: #ffffff;
    background-image: url("data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' width='336' height='204'><defs><pattern id='waveCross' patternUnits='userSpaceOnUse' width='40' height='40'><path d='M0 20 Q 10 10 20 20 T 40 20' stroke='%23003da522' fill='none' stroke-width='1'/><path d='M20 0 Q 10 10 20 20 T 20 40' stroke='%23003da522' fill='none' stroke-width='1'/></pattern></defs><rect width='336' height='204' fill='url(%23waveCross)'/></svg>");
    background-size: cover;
    background-position: center;
  }
  .header-with-image {
    display: flex;
    align-items: center;
    justify-content: center;
    position: relative;
    margin-bottom: 4px;
  }
  .header-image { position: absolute; left: 0; top: 50%; transform: translateY(-50%); width: 28px; }
  .header-text { font-size: 8px; line-height: 1.2; text-align: center; flex-grow: 1; }
  .header-text h3 { margin: 0; font-size: 9px; color: #003da5; }
  .card-body { display: flex; flex: 1; }
  .card-left { flex: 1; text-align: center; }
  .card-right { flex: 2; font-size: 9px; line-height: 1.2; padding-left: 6px; }
  .profile-pic {
    width: 70px;
    height: 70px;
    border-radius: 5px;
    object-fit: cover;
    border: 1px solid #003da5;
    margin-bottom: 6px;
  }
  .qr-code img { width: 55px; height: 55px; margin-top: 4px; }
  .verification-link { font-size: 6px; word-break: break-all; }
  .card-info p { margin: 1px 0; }
  .signature {
    font-size: 8px;
    text-align: right;
    margin-top: 4px;
    font-family: 'Brush Script MT', 'Lucida Handwriting', cursive;
  }
  .footer-line {
    position: absolute;
    bottom: 0;
    left: 0;
    width: 100%;
    height: 3px;
    background: linear-gradient(to right, #0095c9 0%, #0095c9 33.33%, #fff24b 33.33%, #fff24b 66.66%, #db3832 66.66%, #db3832 100%);
    border-bottom-left-radius: 10px;
    border-bottom-right-radius: 10px;
    margin: 0;
  }
"#;

pub fn render(data: &TemplateData, mode: &SignatureMode) -> String {
    let citoyen = &data.citoyen;
    let photo = data
        .photo_url
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(esc)
        .unwrap_or_else(|| PHOTO_PLACEHOLDER.to_string());

    let signature = match mode {
        SignatureMode::Draft => "<p>Le Bourgmestre</p>".to_string(),
        SignatureMode::Signed { approver } => format!(
            "<p>Le Bourgmestre</p>\n              <p class=\"bourgmestre-name\">{}</p>",
            esc(approver)
        ),
    };

    format!(
        r#"<style>{style}</style>
<body>
  <div class="id-card">
    <div class="header-with-image">
      <img src="{logo}" alt="Logo" class="header-image">
      <div class="header-text">
        <h3>RÉPUBLIQUE DÉMOCRATIQUE DU CONGO</h3>
        <p>COMMUNE DE {commune}</p>
      </div>
    </div>
    <div class="card-body">
      <div class="card-left">
        <img src="{photo}" alt="Photo de profil" class="profile-pic">
        <div class="qr-code">
          <img src="{qr}" alt="QR Code">
        </div>
        <div class="verification-link">
          <p>{url}</p>
        </div>
      </div>
      <div class="card-right">
        <div class="card-info">
          <p><strong>Nom :</strong> {nom}</p>
          <p><strong>Postnom :</strong> {postnom}</p>
          <p><strong>Prénom :</strong> {prenom}</p>
          <p><strong>Né(e) le :</strong> {date_naissance}</p>
          <p><strong>Sexe :</strong> {sexe}</p>
          <p><strong>Lieu :</strong> {lieu}</p>
          <p><strong>N° Unique :</strong> {numero}</p>
          <p><strong>Délivrée le :</strong> {date}</p>
        </div>
        <div class="signature">
          {signature}
        </div>
      </div>
    </div>
    <div class="footer-line"></div>
  </div>
</body>"#,
        style = CARD_STYLE,
        logo = data.logo_src,
        commune = esc(&data.commune_nom().to_uppercase()),
        photo = photo,
        qr = data.qr_data_uri,
        url = esc(&data.verification_url),
        nom = na(citoyen.nom.as_deref()),
        postnom = na(citoyen.postnom.as_deref()),
        prenom = na(citoyen.prenom.as_deref()),
        date_naissance = naive_date_fr(citoyen.date_naissance),
        sexe = na(citoyen.sexe.as_deref()),
        lieu = na(citoyen.lieu_naissance.as_deref()),
        numero = na(citoyen.numero_unique.as_deref()),
        date = data.date_emission,
        signature = signature,
    )
}

//! Shared building blocks for the document templates: HTML escaping, French
//! date formatting, the commune letterhead and the signature/verification
//! footer shared by every document type.

use chrono::{Local, NaiveDate};

use super::{SignatureMode, TemplateData};

/// Escape a value for interpolation into HTML text or attributes.
pub fn esc(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escaped value, or the "N/A" placeholder when absent or blank. Rendering
/// never fails because a field is missing.
pub fn na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => esc(v),
        _ => "N/A".to_string(),
    }
}

/// Format an ISO-ish date string as DD/MM/YYYY (French locale convention).
/// Unparseable values pass through escaped rather than erroring.
pub fn date_fr(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".to_string();
    };
    if raw.trim().is_empty() {
        return "N/A".to_string();
    }
    // Payload dates arrive either as plain dates or full timestamps.
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%d/%m/%Y").to_string();
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%d/%m/%Y").to_string();
    }
    esc(raw)
}

pub fn naive_date_fr(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// Today's date in the French convention, used as the issue date.
pub fn today_fr() -> String {
    Local::now().format("%d/%m/%Y").to_string()
}

/// Stylesheet for the full-page letter layout shared by the three actes.
pub const LETTER_STYLE: &str = r#"
  body { font-family: Arial, sans-serif; margin: 40px; }
  h1 { color: #003da5; text-align: center; }
  .header-with-image {
    display: flex;
    align-items: center;
    justify-content: center;
    position: relative;
    padding-bottom: 10px;
  }
  .header-image {
    position: absolute;
    left: 0;
    top: 50%;
    transform: translateY(-50%);
    width: 80px;
  }
  .header-text {
    flex-grow: 1;
    text-align: center;
    font-size: 12px;
    line-height: 1.2;
  }
  .header-line {
    position: absolute;
    bottom: -5px;
    left: 0;
    width: 100%;
    border-bottom: 1px solid #ccc;
  }
  .content {
    font-size: 13px;
    text-align: justify;
    margin-top: 10px;
    margin-bottom: 10px;
    line-height: 1.4;
  }
  .bourgmestre-name {
    font-family: 'Brush Script MT', 'Lucida Handwriting', cursive;
    font-size: 1.4em;
    margin-top: 5px;
    font-weight: bold;
    color: #000;
  }
  .footer-line {
    height: 3px;
    width: 100%;
    background: linear-gradient(to right, #0095c9 0%, #0095c9 33.33%, #fff24b 33.33%, #fff24b 66.66%, #db3832 66.66%, #db3832 100%);
    margin-top: 15px;
  }
"#;

/// Letterhead with the national and commune identification.
pub fn letter_header(data: &TemplateData) -> String {
    format!(
        r#"<div class="header-with-image">
    <img src="{logo}" alt="Logo" class="header-image">
    <div class="header-text">
      <h3>RÉPUBLIQUE DÉMOCRATIQUE DU CONGO</h3>
      <p>PROVINCE DE KINSHASA</p>
      <p>COMMUNE DE {commune}</p>
    </div>
    <div class="header-line"></div>
  </div>"#,
        logo = data.logo_src,
        commune = esc(&data.commune_nom().to_uppercase()),
    )
}

/// Assemble a full-page letter document around the type-specific body.
pub fn letter_page(data: &TemplateData, mode: &SignatureMode, title: &str, content: &str) -> String {
    format!(
        r#"<style>{style}</style>
<body>
  {header}
  <h1>{title}</h1>
  <div class="content">
{content}
  </div>
  {signature}
  <div class="footer-line"></div>
</body>"#,
        style = LETTER_STYLE,
        header = letter_header(data),
        title = title,
        content = content,
        signature = signature_block(data, mode),
    )
}

/// Signature block plus the QR/verification footer. The draft mode shows the
/// generic placeholder; the signed mode carries the approver's display name.
pub fn signature_block(data: &TemplateData, mode: &SignatureMode) -> String {
    let signature = match mode {
        SignatureMode::Draft => r#"<p>Le Bourgmestre</p>
      <p>_________________________</p>
      <p>Signature (Numérique)</p>"#
            .to_string(),
        SignatureMode::Signed { approver } => format!(
            r#"<p>Le Bourgmestre</p>
      <p class="bourgmestre-name">{}</p>"#,
            esc(approver)
        ),
    };

    format!(
        r#"<div class="signature-section" style="text-align: right; margin-top: 50px;">
      {signature}
    </div>
    <div class="qr-code" style="text-align: center; margin-top: 30px;">
      <img src="{qr}" alt="QR Code de vérification" width="100" height="100">
    </div>
    <p class="verification-link" style="text-align: center; font-size: 0.9em; margin-top: 10px; color: #555;">Vérifiez l'authenticité : <a href="{url}">{url}</a></p>"#,
        qr = data.qr_data_uri,
        url = esc(&data.verification_url),
    )
}

//! Verification token issuance and QR code generation.
//!
//! A token is minted once per demande, never derived from its content, and
//! stays stable across the draft → signed transition so the public
//! verification URL never changes.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::Luma;
use qrcode::QrCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("failed to serialize QR image: {0}")]
    Image(#[from] image::ImageError),
}

/// Mint an opaque, globally unique token.
pub fn mint_token() -> String {
    Uuid::new_v4().to_string()
}

/// Render `url` as a PNG QR code wrapped in a data URI.
///
/// Deterministic: the same URL always yields the same image. A well-formed
/// verification URL cannot fail to encode; if it does, the error aborts the
/// whole generate/validate operation rather than shipping a broken code.
pub fn qr_data_uri(url: &str) -> Result<String, QrError> {
    let code = QrCode::new(url.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(240, 240)
        .build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

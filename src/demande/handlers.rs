//! HTTP surface for demandes and the document workflow.

use actix_web::{
    web::{self, Path},
    HttpRequest, HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::models::{
    CreateDemandeRequest, DemandeResponse, DemandeType, DonneesDemande, Statut,
};
use crate::auth::middleware::authenticated_user;
use crate::auth::model::Role;
use crate::documents::{DocumentRef, WorkflowError};
use crate::store::NewDemande;
use crate::{AppState, ErrorResponse};

/// Wallet passes are only issued for the identity card; the paper actes are
/// deliberately excluded and answered with 204 No Content.
const WALLET_EXCLUDED_TYPES: [&str; 3] = ["acte_residence", "acte_mariage", "acte_naissance"];

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub message: String,
    #[serde(flatten)]
    pub document: DocumentRef,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationResponse {
    pub valid: bool,
    pub demande_id: Option<i64>,
    pub type_demande: Option<String>,
    pub statut: Option<Statut>,
    /// True once the demande has been validated and signed.
    pub signe: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletPassResponse {
    pub serial_number: String,
    pub organization: String,
    pub description: String,
    pub barcode_message: String,
    pub nom: String,
    pub prenom: String,
    pub numero_unique: String,
}

fn workflow_error_response(err: WorkflowError) -> HttpResponse {
    match &err {
        WorkflowError::NotFound(what) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found(&format!("{what} introuvable")))
        }
        WorkflowError::PreconditionFailed(msg) => {
            HttpResponse::Conflict().json(ErrorResponse::new("PreconditionFailed", msg))
        }
        WorkflowError::Forbidden(msg) => {
            HttpResponse::Forbidden().json(ErrorResponse::new("Forbidden", msg))
        }
        other => {
            log::error!("document workflow error: {other}");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&other.to_string()))
        }
    }
}

fn store_error_response(err: crate::store::StoreError) -> HttpResponse {
    log::error!("store error: {err}");
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Erreur serveur"))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    get,
    path = "/demandes",
    responses(
        (status = 200, description = "All demandes", body = [DemandeResponse]),
        (status = 403, description = "Insufficient role", body = ErrorResponse)
    )
)]
pub async fn get_all_demandes(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    if user.role == Role::Citoyen {
        return HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Accès interdit : rôle insuffisant"));
    }
    match state.store.list_demandes().await {
        Ok(demandes) => HttpResponse::Ok().json(
            demandes
                .into_iter()
                .map(DemandeResponse::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    get,
    path = "/demandes/{id}",
    responses(
        (status = 200, description = "Demande found", body = DemandeResponse),
        (status = 404, description = "Demande not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Demande id"))
)]
pub async fn get_demande_by_id(id: Path<i64>, state: web::Data<AppState>) -> impl Responder {
    match state.store.get_demande(id.into_inner()).await {
        Ok(Some(demande)) => HttpResponse::Ok().json(DemandeResponse::from(demande)),
        Ok(None) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found("Demande non trouvée"))
        }
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    post,
    path = "/demandes",
    request_body = CreateDemandeRequest,
    responses(
        (status = 201, description = "Demande created", body = DemandeResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse)
    )
)]
pub async fn create_demande(
    body: web::Json<CreateDemandeRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let body = body.into_inner();
    let type_demande = DemandeType::parse(&body.type_demande);

    // Typed payloads are checked at ingestion so the renderer always
    // receives a shape it can interpret.
    if let Err(msg) = DonneesDemande::validate_raw(&type_demande, &body.donnees) {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::bad_request(&format!("donnees invalides : {msg}")));
    }

    match state
        .store
        .create_demande(NewDemande {
            type_demande: body.type_demande,
            donnees: body.donnees,
            citoyen_id: body.citoyen_id,
        })
        .await
    {
        Ok(demande) => HttpResponse::Created().json(DemandeResponse::from(demande)),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    get,
    path = "/demandes/mine",
    responses(
        (status = 200, description = "Caller's demandes", body = [DemandeResponse]),
        (status = 403, description = "Citizens only", body = ErrorResponse)
    )
)]
pub async fn get_my_demandes(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    if user.role != Role::Citoyen {
        return HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Accès interdit : rôle insuffisant"));
    }
    match state.store.list_demandes_by_citoyen(user.id).await {
        Ok(demandes) => HttpResponse::Ok().json(
            demandes
                .into_iter()
                .map(DemandeResponse::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    get,
    path = "/demandes/a-valider",
    responses(
        (status = 200, description = "Demandes awaiting validation", body = [DemandeResponse])
    )
)]
pub async fn get_demandes_to_validate(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    if user.role == Role::Citoyen {
        return HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Accès interdit : rôle insuffisant"));
    }
    match state
        .store
        .list_demandes_by_statut(Statut::EnTraitement)
        .await
    {
        Ok(demandes) => HttpResponse::Ok().json(
            demandes
                .into_iter()
                .map(DemandeResponse::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    get,
    path = "/demandes/validees",
    responses(
        (status = 200, description = "Caller's validated demandes", body = [DemandeResponse]),
        (status = 403, description = "Citizens only", body = ErrorResponse)
    )
)]
pub async fn get_validated_documents(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    if user.role != Role::Citoyen {
        return HttpResponse::Forbidden().json(ErrorResponse::new(
            "Forbidden",
            "Seuls les citoyens peuvent consulter leurs documents validés",
        ));
    }
    match state.store.list_demandes_by_citoyen(user.id).await {
        Ok(demandes) => HttpResponse::Ok().json(
            demandes
                .into_iter()
                .filter(|d| d.statut == Statut::Validee)
                .map(DemandeResponse::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => store_error_response(e),
    }
}

/// Generate the unsigned draft document for a demande.
#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    post,
    path = "/demandes/{id}/document",
    responses(
        (status = 200, description = "Draft generated", body = DocumentResponse),
        (status = 404, description = "Demande not found", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Demande id"))
)]
pub async fn generate_document(
    req: HttpRequest,
    id: Path<i64>,
    state: web::Data<AppState>,
) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    if user.role == Role::Citoyen {
        return HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Accès interdit : rôle insuffisant"));
    }
    match state.lifecycle.generate_draft(id.into_inner()).await {
        Ok(document) => HttpResponse::Ok().json(DocumentResponse {
            message: "Document généré avec succès pour la validation.".to_string(),
            document,
        }),
        Err(e) => workflow_error_response(e),
    }
}

/// Validate a demande and produce the signed artifact.
#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    post,
    path = "/demandes/{id}/valider",
    responses(
        (status = 200, description = "Document validated and signed", body = DocumentResponse),
        (status = 403, description = "Caller cannot sign", body = ErrorResponse),
        (status = 404, description = "Demande not found", body = ErrorResponse),
        (status = 409, description = "Demande not ready for validation", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Demande id"))
)]
pub async fn validate_document(
    req: HttpRequest,
    id: Path<i64>,
    state: web::Data<AppState>,
) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    match state.lifecycle.validate_and_sign(id.into_inner(), &user).await {
        Ok(document) => HttpResponse::Ok().json(DocumentResponse {
            message: "Document validé et signé avec succès !".to_string(),
            document,
        }),
        Err(e) => workflow_error_response(e),
    }
}

/// Download the current artifact for a demande.
#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    get,
    path = "/demandes/{id}/document",
    responses(
        (status = 200, description = "PDF bytes", content_type = "application/pdf"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No document", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Demande id"))
)]
pub async fn download_document(
    req: HttpRequest,
    id: Path<i64>,
    state: web::Data<AppState>,
) -> impl Responder {
    let user = match authenticated_user(&req, &state.config.jwt_secret) {
        Ok(user) => user,
        Err(e) => return HttpResponse::from_error(e),
    };
    match state.lifecycle.fetch_artifact(id.into_inner(), &user).await {
        Ok((filename, bytes)) => HttpResponse::Ok()
            .content_type("application/pdf")
            .append_header((
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            ))
            .body(bytes),
        Err(e) => workflow_error_response(e),
    }
}

/// Public authenticity lookup for a verification token.
#[utoipa::path(
    tag = "Documents",
    get,
    path = "/verify-document",
    responses(
        (status = 200, description = "Verification result", body = VerificationResponse)
    )
)]
pub async fn verify_document(
    query: web::Query<VerifyQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.store.get_demande_by_token(&query.token).await {
        Ok(Some(demande)) => HttpResponse::Ok().json(VerificationResponse {
            valid: true,
            demande_id: Some(demande.id),
            type_demande: Some(demande.type_demande.as_str().to_string()),
            statut: Some(demande.statut),
            signe: demande.statut == Statut::Validee,
        }),
        Ok(None) => HttpResponse::Ok().json(VerificationResponse {
            valid: false,
            demande_id: None,
            type_demande: None,
            statut: None,
            signe: false,
        }),
        Err(e) => store_error_response(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Demandes",
    get,
    path = "/statuts",
    responses((status = 200, description = "The closed statut set", body = [String]))
)]
pub async fn get_all_statuts() -> impl Responder {
    HttpResponse::Ok().json([
        Statut::Soumise.as_str(),
        Statut::EnTraitement.as_str(),
        Statut::Validee.as_str(),
    ])
}

/// Wallet-pass issuance. The paper actes short-circuit with 204; only the
/// identity card yields a pass payload.
#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    post,
    path = "/demandes/{id}/wallet-pass",
    responses(
        (status = 200, description = "Pass payload", body = WalletPassResponse),
        (status = 204, description = "Document type not eligible for a pass"),
        (status = 404, description = "Demande not found", body = ErrorResponse)
    ),
    params(("id" = i64, Path, description = "Demande id"))
)]
pub async fn generate_wallet_pass(id: Path<i64>, state: web::Data<AppState>) -> impl Responder {
    let demande = match state.store.get_demande(id.into_inner()).await {
        Ok(Some(demande)) => demande,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("Demande non trouvée"));
        }
        Err(e) => return store_error_response(e),
    };

    if WALLET_EXCLUDED_TYPES.contains(&demande.type_demande.as_str()) {
        return HttpResponse::NoContent().finish();
    }

    let citoyen = match state.store.get_citoyen(demande.citoyen_id).await {
        Ok(Some(citoyen)) => citoyen,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("Citoyen non trouvé"));
        }
        Err(e) => return store_error_response(e),
    };

    let numero = citoyen.numero_unique.unwrap_or_else(|| "N/A".to_string());
    let barcode_message = match &demande.verification_token {
        Some(token) => state.config.verification_url(token),
        None => "N/A".to_string(),
    };

    HttpResponse::Ok().json(WalletPassResponse {
        serial_number: format!("ID-{numero}"),
        organization: "RDC Digital".to_string(),
        description: "Carte citoyen".to_string(),
        barcode_message,
        nom: citoyen.nom.unwrap_or_default(),
        prenom: citoyen.prenom.unwrap_or_default(),
        numero_unique: numero,
    })
}

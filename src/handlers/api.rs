use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::models::{
    CreatePetRequest, Pet, ServiceError, ServiceResult, StoredUpload, UpdatePetRequest,
    UploadError, UploadResponse,
};
use crate::services::{PetService, UploadService, IMAGE_FIELD};

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub pet_service: Arc<PetService>,
    pub upload_service: Arc<UploadService>,
}

/// Create API router with all endpoints
pub fn create_api_router(pet_service: Arc<PetService>, upload_service: Arc<UploadService>) -> Router {
    let state = ApiState {
        pet_service,
        upload_service,
    };

    Router::new()
        .route("/api/upload", post(upload_image))
        .route("/api/pets", get(list_pets).post(create_pet))
        .route("/api/pets/:id", get(get_pet).put(update_pet))
        .with_state(state)
}

// =============================================================================
// PET ENDPOINTS
// =============================================================================

/// List every pet
#[instrument(name = "list_pets", skip(state))]
pub async fn list_pets(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Pet>>, (StatusCode, Json<Value>)> {
    info!("Request received for /api/pets");

    match state.pet_service.list_pets().await {
        Ok(pets) => Ok(Json(pets)),
        Err(err) => {
            error!("Failed to list pets: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific pet by ID
#[instrument(name = "get_pet", skip(state), fields(pet_id = %id))]
pub async fn get_pet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Pet>, (StatusCode, Json<Value>)> {
    info!("Getting pet");

    state
        .pet_service
        .get_pet(&id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Create a new pet
#[instrument(name = "create_pet", skip(state, request), fields(pet_name = request.name()))]
pub async fn create_pet(
    State(state): State<ApiState>,
    Json(request): Json<CreatePetRequest>,
) -> Result<(StatusCode, Json<Pet>), (StatusCode, Json<Value>)> {
    info!("Creating pet");

    match state.pet_service.create_pet(request).await {
        Ok(pet) => {
            info!(pet_id = pet.id(), "Pet created");
            Ok((StatusCode::CREATED, Json(pet)))
        }
        Err(err) => {
            warn!("Failed to create pet: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Merge fields into an existing pet
#[instrument(name = "update_pet", skip(state, request), fields(pet_id = %id))]
pub async fn update_pet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePetRequest>,
) -> Result<Json<Pet>, (StatusCode, Json<Value>)> {
    info!("Updating pet");

    state
        .pet_service
        .update_pet(&id, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

// =============================================================================
// UPLOAD ENDPOINT
// =============================================================================

/// Store the `image` file of a multipart form.
///
/// A body that is not multipart carries no file and gets `{"imageUrl": null}`.
#[instrument(name = "upload_image", skip(state, multipart))]
pub async fn upload_image(
    State(state): State<ApiState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            info!("No multipart body: {}", rejection.body_text());
            state.upload_service.record_missing_image();
            return Ok(Json(UploadResponse { image_url: None }));
        }
    };

    let stored = read_image_field(&state.upload_service, &mut multipart)
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(UploadResponse::from(stored)))
}

/// Save the first `image` field that carries a filename; other fields are skipped
async fn read_image_field(
    upload_service: &UploadService,
    multipart: &mut Multipart,
) -> ServiceResult<Option<StoredUpload>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(upload_service, e))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let contents = field
            .bytes()
            .await
            .map_err(|e| multipart_error(upload_service, e))?;

        let stored = upload_service.store_image(&original_name, &contents).await?;
        return Ok(Some(stored));
    }

    upload_service.record_missing_image();
    Ok(None)
}

fn multipart_error(upload_service: &UploadService, err: MultipartError) -> ServiceError {
    let err = UploadError::Multipart {
        message: err.body_text(),
    };
    upload_service.record_rejected(&err);
    err.into()
}

/// Convert service errors to HTTP responses
pub fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        ServiceError::PetNotFound { .. } => (StatusCode::NOT_FOUND, "Pet not found".to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Upload { source } => match source {
            UploadError::Multipart { .. } => (StatusCode::BAD_REQUEST, source.to_string()),
            UploadError::Io { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store upload".to_string(),
            ),
        },
        ServiceError::Repository { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }

    (status, Json(json!({ "error": message })))
}

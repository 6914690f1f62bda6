//! Model listing endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::api::middleware::RequireToken;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::model::{ModelDescriptor, NetworkType};

/// Longest description returned by the listing, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub total: usize,
    pub models: Vec<ModelInfo>,
}

/// Summary of one model as exposed by the listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub network_type: String,
    pub description: String,
    pub version: String,
    pub enabled: bool,
    pub alias: String,
    pub create_date: String,
    pub last_modified_date: String,
}

impl ModelInfo {
    pub fn from_descriptor(descriptor: &ModelDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            network_type: descriptor.network_type.to_string(),
            description: truncate_description(&descriptor.description),
            version: descriptor.reported_version().to_string(),
            enabled: descriptor.enabled,
            alias: descriptor.alias.clone(),
            create_date: descriptor.create_date.clone(),
            last_modified_date: descriptor.last_modified_date.clone(),
        }
    }
}

/// Cut to 197 characters plus "..." when longer than the limit
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }

    let head: String = description.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
    format!("{}...", head)
}

/// GET /api/v1/models
///
/// Reloads the repository from storage on every call.
pub async fn list_models(
    State(state): State<AppState>,
    RequireToken(identity): RequireToken,
) -> Result<Json<ModelsResponse>, ApiError> {
    debug!(username = %identity.username, "Listing models");

    let result = match state.models.refresh().await {
        Ok(_) => state.models.list().await,
        Err(e) => Err(e),
    };

    let descriptors = result.map_err(|e| {
        error!(error = %e, "Error retrieving models");
        ApiError::internal(format!("Error retrieving models: {}", e))
    })?;

    let models: Vec<ModelInfo> = descriptors.iter().map(ModelInfo::from_descriptor).collect();

    Ok(Json(ModelsResponse {
        total: models.len(),
        models,
    }))
}

/// GET /api/v1/models/{network_type}/{name}
pub async fn get_model(
    State(state): State<AppState>,
    RequireToken(_identity): RequireToken,
    Path((network_type, name)): Path<(String, String)>,
) -> Result<Json<ModelDescriptor>, ApiError> {
    let network_type: NetworkType = network_type.parse()?;

    let descriptor = state.models.get(&name, network_type).await?;

    Ok(Json(descriptor))
}

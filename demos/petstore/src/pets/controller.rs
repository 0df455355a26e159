use super::model::{NewPet, Pet, PetFilter, PetNotFound, PetPage, Rename};
use super::repository::PetRepository;
use axum::http::StatusCode;
use oasbind::prelude::*;
use serde_json::json;
use uuid::Uuid;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Pets available in the store
#[controller(path = "/pets", tag = "pets")]
pub struct PetController {
    repository: Arc<dyn PetRepository>,
}

impl PetController {
    pub fn new(repository: Arc<dyn PetRepository>) -> Self {
        Self { repository }
    }
}

#[routes]
impl PetController {
    /// List pets
    ///
    /// Pets are ordered by name. Every `tag` given must be present on a pet.
    #[get("/")]
    #[response(200, PetPage)]
    async fn list(
        &self,
        #[query] offset: Option<usize>,
        #[query(description = "Page size, at most 100")] limit: Option<usize>,
        #[query] vaccinated: Option<bool>,
        #[query(name = "tag")] tags: Option<Vec<String>>,
    ) -> Json<PetPage> {
        let filter = PetFilter {
            vaccinated,
            tags: tags.unwrap_or_default(),
        };
        let pets = self.repository.find_all(&filter).await;

        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        Json(PetPage {
            total: pets.len(),
            items: pets.into_iter().skip(offset).take(limit).collect(),
            offset,
            limit,
        })
    }

    /// Find a pet by id
    #[get("/{id}")]
    #[response(200, Pet)]
    #[response(404, PetNotFound, "No pet with this id")]
    async fn find(&self, #[path] id: Uuid) -> Reply {
        match self.repository.find_by_id(id).await {
            Some(pet) => Reply::new(pet),
            None => Reply::new(PetNotFound::new(id)),
        }
    }

    /// Add a pet
    #[post("/", operation_id = "createPet")]
    #[response(201, Pet, "Pet created")]
    async fn create(
        &self,
        #[body] pet: NewPet,
        #[header(description = "Correlation id echoed in logs")] x_request_id: Option<String>,
    ) -> Result<Json<Pet>, ApiError> {
        if pet.name.trim().is_empty() {
            return Err(ApiError::bad_request("Invalid pet")
                .with_error(json!({ "name": "name", "message": "must not be empty" })));
        }

        let pet = pet.into_pet();
        tracing::info!(id = %pet.id, request_id = ?x_request_id, "Adding pet");
        self.repository.save(pet.clone()).await;
        Ok(Json(pet))
    }

    /// Rename a pet
    #[patch("/{id}/name")]
    #[response(200, Pet)]
    #[response(404, PetNotFound)]
    async fn rename(&self, #[path] id: Uuid, #[body] rename: Rename) -> Reply {
        match self.repository.find_by_id(id).await {
            Some(mut pet) => {
                pet.name = rename.name;
                self.repository.save(pet.clone()).await;
                Reply::new(pet)
            }
            None => Reply::new(PetNotFound::new(id)),
        }
    }

    /// Remove a pet
    ///
    /// Only callers with the `admin` role cookie may remove pets.
    #[delete("/{id}")]
    #[response(204, "Pet removed")]
    #[response(404, PetNotFound)]
    async fn remove(&self, #[path] id: Uuid, #[cookie] role: Option<String>) -> Result<Reply, ApiError> {
        if role.as_deref() != Some("admin") {
            return Err(ApiError::new(StatusCode::FORBIDDEN, "Admin role required"));
        }

        Ok(match self.repository.remove(id).await {
            Some(_) => Reply::empty(),
            None => Reply::new(PetNotFound::new(id)),
        })
    }

    #[get("/legacy/{id}", deprecated)]
    #[response(200, Pet)]
    #[response(404, PetNotFound)]
    async fn legacy_find(&self, #[path(description = "Pet id")] id: Uuid) -> Reply {
        self.find(id).await
    }
}

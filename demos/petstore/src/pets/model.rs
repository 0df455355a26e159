use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub vaccinated: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPet {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewPet {
    pub fn into_pet(self) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            name: self.name,
            age: self.age,
            vaccinated: self.vaccinated,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Rename {
    pub name: String,
}

/// One page of pets.
#[derive(Debug, Serialize, ToSchema)]
pub struct PetPage {
    pub items: Vec<Pet>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PetNotFound {
    pub id: Uuid,
    pub message: String,
}

impl PetNotFound {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            message: format!("Pet {} not found", id),
        }
    }
}

/// Filters for listing pets.
#[derive(Debug, Default, Clone)]
pub struct PetFilter {
    pub vaccinated: Option<bool>,
    pub tags: Vec<String>,
}

impl PetFilter {
    pub fn matches(&self, pet: &Pet) -> bool {
        self.vaccinated.is_none_or(|v| pet.vaccinated == v)
            && self.tags.iter().all(|t| pet.tags.contains(t))
    }
}

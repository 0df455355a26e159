use super::model::{Pet, PetFilter};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Option<Pet>;
    async fn find_all(&self, filter: &PetFilter) -> Vec<Pet>;
    async fn save(&self, pet: Pet);
    async fn remove(&self, id: Uuid) -> Option<Pet>;
}

#[derive(Default)]
pub struct InMemoryPetRepository {
    pets: DashMap<Uuid, Pet>,
}

impl InMemoryPetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pets(pets: impl IntoIterator<Item = Pet>) -> Self {
        let repository = Self::new();
        for pet in pets {
            repository.pets.insert(pet.id, pet);
        }
        repository
    }
}

#[async_trait]
impl PetRepository for InMemoryPetRepository {
    async fn find_by_id(&self, id: Uuid) -> Option<Pet> {
        self.pets.get(&id).map(|entry| entry.value().clone())
    }

    async fn find_all(&self, filter: &PetFilter) -> Vec<Pet> {
        let mut pets: Vec<Pet> = self
            .pets
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        pets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        pets
    }

    async fn save(&self, pet: Pet) {
        self.pets.insert(pet.id, pet);
    }

    async fn remove(&self, id: Uuid) -> Option<Pet> {
        self.pets.remove(&id).map(|(_, pet)| pet)
    }
}

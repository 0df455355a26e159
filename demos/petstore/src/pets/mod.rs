mod controller;
mod model;
mod repository;

pub use controller::PetController;
pub use model::Pet;
pub use repository::{InMemoryPetRepository, PetRepository};

// Repositories module - data access layer

pub mod pet_repository;
pub mod upload_store;


pub use pet_repository::{InMemoryPetRepository, PetRepository};
pub use upload_store::UploadStore;

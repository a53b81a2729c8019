// Services module - business logic layer

pub mod id_generator;
pub mod pet_service;
pub mod upload_service;

pub use id_generator::IdGenerator;
pub use pet_service::PetService;
pub use upload_service::{UploadService, IMAGE_FIELD};

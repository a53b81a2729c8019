use async_trait::async_trait;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{info, instrument, Instrument};

use crate::models::{Pet, RepositoryError, RepositoryResult, UpdatePetRequest};

/// Trait defining the interface for pet data access operations
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Return every pet in collection order
    async fn find_all(&self) -> RepositoryResult<Vec<Pet>>;

    /// Find a pet by its ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Pet>>;

    /// Append a new pet to the collection
    async fn create(&self, pet: Pet) -> RepositoryResult<Pet>;

    /// Merge an update into the pet with the given ID.
    ///
    /// Returns `None` and leaves the collection untouched when no pet matches.
    async fn update(&self, id: i64, update: UpdatePetRequest) -> RepositoryResult<Option<Pet>>;

    /// Count pets in the collection
    async fn count(&self) -> RepositoryResult<usize>;
}

/// Process-lifetime pet collection seeded from a JSON file.
///
/// Nothing is ever written back to the seed file.
pub struct InMemoryPetRepository {
    pets: RwLock<Vec<Pet>>,
    source: String,
}

impl InMemoryPetRepository {
    /// Create a repository holding the given pets
    pub fn new(pets: Vec<Pet>) -> Self {
        Self {
            pets: RwLock::new(pets),
            source: "memory".to_string(),
        }
    }

    /// Load the initial collection from a JSON array on disk
    pub async fn from_seed_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| RepositoryError::SeedRead {
                    path: path_str.clone(),
                    source,
                })?;

        let pets = Self::parse_seed(&path_str, &contents)?;

        info!(seed_file = %path_str, pets = pets.len(), "Loaded seed pets");

        Ok(Self {
            pets: RwLock::new(pets),
            source: path_str,
        })
    }

    /// Parse the seed document
    pub fn parse_seed(path: &str, contents: &str) -> RepositoryResult<Vec<Pet>> {
        serde_json::from_str(contents).map_err(|source| RepositoryError::SeedParse {
            path: path.to_string(),
            source,
        })
    }

    /// Where the initial collection came from (for logging)
    pub fn source(&self) -> &str {
        &self.source
    }

    fn create_store_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "PetStore",
            "otel.kind" = "internal",
            "otel.name" = format!("PetStore.{}", operation),
            "db.system" = "memory",
            "db.operation" = operation,
            "db.source" = %self.source,
        )
    }
}

#[async_trait]
impl PetRepository for InMemoryPetRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Pet>> {
        let span = self.create_store_span("FindAll");

        async {
            let pets = self.pets.read().await;
            Ok(pets.clone())
        }
        .instrument(span)
        .await
    }

    #[instrument(skip(self), fields(pet_id = id))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Pet>> {
        let span = self.create_store_span("FindById");

        async {
            let pets = self.pets.read().await;
            Ok(pets.iter().find(|pet| pet.id() == Some(id)).cloned())
        }
        .instrument(span)
        .await
    }

    #[instrument(skip(self, pet), fields(pet_id = pet.id()))]
    async fn create(&self, pet: Pet) -> RepositoryResult<Pet> {
        let span = self.create_store_span("Insert");

        async {
            let mut pets = self.pets.write().await;
            pets.push(pet.clone());
            Ok(pet)
        }
        .instrument(span)
        .await
    }

    #[instrument(skip(self, update), fields(pet_id = id))]
    async fn update(&self, id: i64, update: UpdatePetRequest) -> RepositoryResult<Option<Pet>> {
        let span = self.create_store_span("Update");

        async {
            let mut pets = self.pets.write().await;
            match pets.iter_mut().find(|pet| pet.id() == Some(id)) {
                Some(pet) => {
                    pet.apply_update(update);
                    Ok(Some(pet.clone()))
                }
                None => Ok(None),
            }
        }
        .instrument(span)
        .await
    }

    async fn count(&self) -> RepositoryResult<usize> {
        Ok(self.pets.read().await.len())
    }
}

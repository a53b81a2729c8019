use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    parse_pet_id, CreatePetRequest, Pet, ServiceError, ServiceResult, UpdatePetRequest, Validate,
};
use crate::observability::{Metrics, StoreTracing};
use crate::repositories::PetRepository;
use crate::services::IdGenerator;

/// Service for managing pet listings
pub struct PetService {
    repository: Arc<dyn PetRepository>,
    ids: IdGenerator,
    tracing: StoreTracing,
}

impl PetService {
    /// Create a new PetService
    pub fn new(repository: Arc<dyn PetRepository>, metrics: Arc<Metrics>) -> Self {
        Self::with_id_generator(repository, metrics, IdGenerator::new())
    }

    pub fn with_id_generator(
        repository: Arc<dyn PetRepository>,
        metrics: Arc<Metrics>,
        ids: IdGenerator,
    ) -> Self {
        Self {
            repository,
            ids,
            tracing: StoreTracing::new(metrics),
        }
    }

    /// Publish the initial collection size to metrics
    pub async fn refresh_store_size(&self) -> ServiceResult<usize> {
        let count = self.repository.count().await?;
        self.tracing.record_store_size(count);
        Ok(count)
    }

    /// List every pet in collection order
    #[instrument(skip(self))]
    pub async fn list_pets(&self) -> ServiceResult<Vec<Pet>> {
        let pets = self
            .tracing
            .trace_pet_operation("list", None, self.repository.find_all())
            .await?;

        crate::info_with_trace!("Listing {} pets", pets.len());
        Ok(pets)
    }

    /// Get a pet by the raw id from the request path.
    ///
    /// An id that is not an integer matches no pet.
    #[instrument(skip(self), fields(id = %raw_id))]
    pub async fn get_pet(&self, raw_id: &str) -> ServiceResult<Pet> {
        let id = Self::resolve_id(raw_id)?;

        let found = self
            .tracing
            .trace_pet_operation("get", Some(id), self.repository.find_by_id(id))
            .await?;

        match found {
            Some(pet) => {
                crate::info_with_trace!("Pet found: {}", pet.label());
                Ok(pet)
            }
            None => {
                crate::warn_with_trace!("Pet not found");
                Err(ServiceError::PetNotFound {
                    id: raw_id.to_string(),
                })
            }
        }
    }

    /// Validate, assign an id and append a new pet
    #[instrument(skip(self, request))]
    pub async fn create_pet(&self, request: CreatePetRequest) -> ServiceResult<Pet> {
        request.validate()?;

        let pet_id = self.ids.next_id();
        let pet = Pet::new(pet_id, request);

        let created = self
            .tracing
            .trace_pet_operation("create", Some(pet_id), self.repository.create(pet))
            .await?;

        self.refresh_store_size().await?;

        crate::info_with_trace!(pet_id = pet_id, "Created pet {}", created.label());
        Ok(created)
    }

    /// Validate and shallow-merge an update into an existing pet
    #[instrument(skip(self, request), fields(id = %raw_id))]
    pub async fn update_pet(&self, raw_id: &str, request: UpdatePetRequest) -> ServiceResult<Pet> {
        request.validate()?;

        let id = Self::resolve_id(raw_id)?;

        let updated = self
            .tracing
            .trace_pet_operation("update", Some(id), self.repository.update(id, request))
            .await?;

        match updated {
            Some(pet) => {
                crate::info_with_trace!("Updated pet {}", pet.label());
                Ok(pet)
            }
            None => {
                crate::warn_with_trace!("Pet not found for update");
                Err(ServiceError::PetNotFound {
                    id: raw_id.to_string(),
                })
            }
        }
    }

    fn resolve_id(raw_id: &str) -> ServiceResult<i64> {
        parse_pet_id(raw_id).ok_or_else(|| ServiceError::PetNotFound {
            id: raw_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;
    use crate::repositories::PetRepository;
    use async_trait::async_trait;
    use mockall::{mock, predicate::eq};
    use serde_json::json;

    mock! {
        TestPetRepository {}

        #[async_trait]
        impl PetRepository for TestPetRepository {
            async fn find_all(&self) -> Result<Vec<Pet>, RepositoryError>;
            async fn find_by_id(&self, id: i64) -> Result<Option<Pet>, RepositoryError>;
            async fn create(&self, pet: Pet) -> Result<Pet, RepositoryError>;
            async fn update(&self, id: i64, update: UpdatePetRequest) -> Result<Option<Pet>, RepositoryError>;
            async fn count(&self) -> Result<usize, RepositoryError>;
        }
    }

    fn create_test_pet(id: i64, name: &str) -> Pet {
        serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
    }

    fn service_with(mock_repo: MockTestPetRepository) -> (PetService, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = PetService::with_id_generator(
            Arc::new(mock_repo),
            metrics.clone(),
            IdGenerator::with_clock(|| 1_700_000_000_000),
        );
        (service, metrics)
    }

    #[tokio::test]
    async fn test_list_pets_success() {
        let mut mock_repo = MockTestPetRepository::new();
        let pets = vec![create_test_pet(1, "A"), create_test_pet(2, "B")];
        let expected = pets.clone();

        mock_repo
            .expect_find_all()
            .times(1)
            .returning(move || Ok(pets.clone()));

        let (service, _) = service_with(mock_repo);

        let result = service.list_pets().await.unwrap();
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_get_pet_success() {
        let mut mock_repo = MockTestPetRepository::new();
        let pet = create_test_pet(1, "A");

        mock_repo
            .expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(move |_| Ok(Some(pet.clone())));

        let (service, metrics) = service_with(mock_repo);

        let result = service.get_pet("1").await.unwrap();
        assert_eq!(result.name(), Some("A"));

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("pet_operations_total{operation=\"get\",status=\"success\"} 1"));
    }

    #[tokio::test]
    async fn test_get_pet_not_found() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(eq(0))
            .times(1)
            .returning(|_| Ok(None));

        let (service, _) = service_with(mock_repo);

        let result = service.get_pet("0").await;
        assert!(matches!(result, Err(ServiceError::PetNotFound { id }) if id == "0"));
    }

    #[tokio::test]
    async fn test_get_pet_non_numeric_id_skips_repository() {
        let mut mock_repo = MockTestPetRepository::new();
        mock_repo.expect_find_by_id().never();

        let (service, _) = service_with(mock_repo);

        let result = service.get_pet("rex").await;
        assert!(matches!(result, Err(ServiceError::PetNotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_pet_assigns_id() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo
            .expect_create()
            .times(1)
            .returning(|pet| Ok(pet));
        mock_repo.expect_count().times(1).returning(|| Ok(4));

        let (service, metrics) = service_with(mock_repo);

        let request: CreatePetRequest = serde_json::from_value(json!({ "name": "Rex" })).unwrap();
        let created = service.create_pet(request).await.unwrap();

        assert_eq!(created.id(), Some(1_700_000_000_000));
        assert_eq!(created.name(), Some("Rex"));
        assert!(metrics.encode().unwrap().contains("pets_in_store 4"));
    }

    #[tokio::test]
    async fn test_create_pet_without_name() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo.expect_create().times(1).returning(|pet| Ok(pet));
        mock_repo.expect_count().times(1).returning(|| Ok(1));

        let (service, _) = service_with(mock_repo);

        let request: CreatePetRequest = serde_json::from_value(json!({ "breed": "Lab" })).unwrap();
        let created = service.create_pet(request).await.unwrap();

        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            json!({ "id": 1_700_000_000_000i64, "breed": "Lab" })
        );
    }

    #[tokio::test]
    async fn test_create_pet_validation_failure() {
        let mut mock_repo = MockTestPetRepository::new();
        mock_repo.expect_create().never();

        let (service, _) = service_with(mock_repo);

        let request: CreatePetRequest =
            serde_json::from_value(json!({ "name": "Rex", "age": "3" })).unwrap();
        let result = service.create_pet(request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_update_pet_success() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo
            .expect_update()
            .withf(|id, update| *id == 1 && update.name() == Some("B"))
            .times(1)
            .returning(|id, update| {
                let mut pet = create_test_pet(id, "A");
                pet.apply_update(update);
                Ok(Some(pet))
            });

        let (service, _) = service_with(mock_repo);

        let request: UpdatePetRequest = serde_json::from_value(json!({ "name": "B" })).unwrap();
        let updated = service.update_pet("1", request).await.unwrap();

        assert_eq!(updated, create_test_pet(1, "B"));
    }

    #[tokio::test]
    async fn test_update_pet_not_found() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo
            .expect_update()
            .times(1)
            .returning(|_, _| Ok(None));

        let (service, metrics) = service_with(mock_repo);

        let result = service
            .update_pet("404", UpdatePetRequest::default())
            .await;
        assert!(matches!(result, Err(ServiceError::PetNotFound { .. })));

        // A miss is still a successful store operation
        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("pet_operations_total{operation=\"update\",status=\"success\"} 1"));
    }

    #[tokio::test]
    async fn test_update_pet_validation_failure() {
        let mut mock_repo = MockTestPetRepository::new();
        mock_repo.expect_update().never();

        let (service, _) = service_with(mock_repo);

        let request: UpdatePetRequest = serde_json::from_value(json!({ "age": 500 })).unwrap();
        let result = service.update_pet("1", request).await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }
}

use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    require_object, validate_new_pet, Pet, PetFilters, PetId, RepositoryError, ServiceError,
    ServiceResult,
};
use crate::observability::{BusinessTracingMiddleware, Metrics};
use crate::repositories::PetRepository;

/// Service for managing pet records
pub struct PetService {
    repository: Arc<dyn PetRepository>,
    tracer: Option<BusinessTracingMiddleware>,
}

impl PetService {
    /// Create a new PetService
    pub fn new(repository: Arc<dyn PetRepository>) -> Self {
        Self {
            repository,
            tracer: None,
        }
    }

    /// Create a new PetService that records business metrics
    pub fn new_with_metrics(repository: Arc<dyn PetRepository>, metrics: Arc<Metrics>) -> Self {
        Self {
            repository,
            tracer: Some(BusinessTracingMiddleware::new(metrics)),
        }
    }

    /// List pets matching the optional `raza`/`tipo` filters
    #[instrument(skip(self), fields(filters = ?filters))]
    pub async fn list_pets(&self, filters: PetFilters) -> ServiceResult<Vec<Pet>> {
        self.traced("list", async {
            let pets = self.repository.find_all(filters).await?;
            crate::info_with_trace!("Found {} pets matching criteria", pets.len());
            Ok::<_, ServiceError>(pets)
        })
        .await
    }

    /// Get a specific pet by ID
    #[instrument(skip(self))]
    pub async fn get_pet(&self, id: &str) -> ServiceResult<Pet> {
        self.traced("get", async {
            let pet_id = parse_pet_id(id)?;
            match self.repository.find_by_id(pet_id).await? {
                Some(pet) => Ok(pet),
                None => {
                    crate::warn_with_trace!("Pet not found");
                    Err(ServiceError::PetNotFound { id: id.to_string() })
                }
            }
        })
        .await
    }

    /// Create a new pet from a request body
    #[instrument(skip(self, body))]
    pub async fn create_pet(&self, body: Value) -> ServiceResult<Pet> {
        self.traced("create", async {
            let fields = require_object(body)?;
            validate_new_pet(&fields)?;

            let pet = self.repository.create(fields).await?;
            crate::info_with_trace!(pet_id = pet.id, "Pet created");
            Ok::<_, ServiceError>(pet)
        })
        .await
    }

    /// Shallow-merge a request body into an existing pet
    #[instrument(skip(self, body))]
    pub async fn update_pet(&self, id: &str, body: Value) -> ServiceResult<Pet> {
        self.traced("update", async {
            let pet_id = parse_pet_id(id)?;
            let fields = require_object(body)?;

            let pet = self
                .repository
                .update(pet_id, fields)
                .await
                .map_err(|e| not_found_or(e, id))?;
            crate::info_with_trace!(pet_id = pet.id, "Pet updated");
            Ok::<_, ServiceError>(pet)
        })
        .await
    }

    /// Delete a pet and return the removed record
    #[instrument(skip(self))]
    pub async fn delete_pet(&self, id: &str) -> ServiceResult<Pet> {
        self.traced("delete", async {
            let pet_id = parse_pet_id(id)?;

            let pet = self
                .repository
                .delete(pet_id)
                .await
                .map_err(|e| not_found_or(e, id))?;
            crate::info_with_trace!(pet_id = pet.id, "Pet deleted");
            Ok::<_, ServiceError>(pet)
        })
        .await
    }

    /// Count stored pets
    pub async fn count_pets(&self) -> ServiceResult<usize> {
        Ok(self.repository.count().await?)
    }

    async fn traced<T, F>(&self, operation: &str, future: F) -> ServiceResult<T>
    where
        F: std::future::Future<Output = ServiceResult<T>>,
    {
        match self.tracer {
            Some(ref tracer) => tracer.trace_pet_operation(operation, future).await,
            None => future.await,
        }
    }
}

/// Path ids that are not integers can never match a stored pet
fn parse_pet_id(id: &str) -> ServiceResult<PetId> {
    id.trim()
        .parse()
        .map_err(|_| ServiceError::PetNotFound { id: id.to_string() })
}

fn not_found_or(err: RepositoryError, id: &str) -> ServiceError {
    match err {
        RepositoryError::NotFound { .. } => ServiceError::PetNotFound { id: id.to_string() },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryResult;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::{json, Map};

    mock! {
        TestPetRepository {}

        #[async_trait]
        impl PetRepository for TestPetRepository {
            async fn find_all(&self, filters: PetFilters) -> RepositoryResult<Vec<Pet>>;
            async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>>;
            async fn create(&self, fields: Map<String, Value>) -> RepositoryResult<Pet>;
            async fn update(&self, id: PetId, fields: Map<String, Value>) -> RepositoryResult<Pet>;
            async fn delete(&self, id: PetId) -> RepositoryResult<Pet>;
            async fn count(&self) -> RepositoryResult<usize>;
        }
    }

    fn create_test_pet() -> Pet {
        let fields = match json!({
            "nombre": "Rex",
            "tipo": "Perro",
            "raza": "Labrador",
            "edad": 3
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        Pet::new(1, fields)
    }

    #[tokio::test]
    async fn test_list_pets_passes_filters() {
        let mut mock_repo = MockTestPetRepository::new();
        let pets = vec![create_test_pet()];
        let filters = PetFilters {
            raza: None,
            tipo: Some("perro".to_string()),
        };

        mock_repo
            .expect_find_all()
            .with(mockall::predicate::eq(filters.clone()))
            .times(1)
            .returning(move |_| Ok(pets.clone()));

        let service = PetService::new(Arc::new(mock_repo));
        let result = service.list_pets(filters).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].nombre(), Some("Rex"));
    }

    #[tokio::test]
    async fn test_get_pet_success() {
        let mut mock_repo = MockTestPetRepository::new();
        let pet = create_test_pet();

        mock_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(1))
            .times(1)
            .returning(move |_| Ok(Some(pet.clone())));

        let service = PetService::new(Arc::new(mock_repo));
        let result = service.get_pet("1").await.unwrap();

        assert_eq!(result.id, 1);
    }

    #[tokio::test]
    async fn test_get_pet_not_found() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(99))
            .times(1)
            .returning(|_| Ok(None));

        let service = PetService::new(Arc::new(mock_repo));

        match service.get_pet("99").await.unwrap_err() {
            ServiceError::PetNotFound { id } => assert_eq!(id, "99"),
            other => panic!("Expected PetNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_pet_non_numeric_id() {
        let mock_repo = MockTestPetRepository::new();
        let service = PetService::new(Arc::new(mock_repo));

        assert!(matches!(
            service.get_pet("abc").await,
            Err(ServiceError::PetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_pet_validation_skips_repository() {
        let mock_repo = MockTestPetRepository::new();
        let service = PetService::new(Arc::new(mock_repo));

        let result = service
            .create_pet(json!({"nombre": "Rex", "tipo": "Perro", "raza": "Labrador"}))
            .await;

        match result {
            Err(ServiceError::ValidationError { message }) => {
                assert!(message.contains("edad"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_pet_rejects_non_object() {
        let mock_repo = MockTestPetRepository::new();
        let service = PetService::new(Arc::new(mock_repo));

        assert!(matches!(
            service.create_pet(json!(["Rex"])).await,
            Err(ServiceError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_pet_success() {
        let mut mock_repo = MockTestPetRepository::new();
        let pet = create_test_pet();

        mock_repo
            .expect_create()
            .times(1)
            .returning(move |_| Ok(pet.clone()));

        let service = PetService::new(Arc::new(mock_repo));
        let result = service
            .create_pet(json!({
                "nombre": "Rex",
                "tipo": "Perro",
                "raza": "Labrador",
                "edad": 3
            }))
            .await
            .unwrap();

        assert_eq!(result.id, 1);
    }

    #[tokio::test]
    async fn test_update_pet_maps_not_found() {
        let mut mock_repo = MockTestPetRepository::new();

        mock_repo
            .expect_update()
            .times(1)
            .returning(|id, _| Err(RepositoryError::NotFound { id }));

        let service = PetService::new(Arc::new(mock_repo));

        assert!(matches!(
            service.update_pet("4", json!({"edad": 5})).await,
            Err(ServiceError::PetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_pet_records_metrics() {
        let mut mock_repo = MockTestPetRepository::new();
        let pet = create_test_pet();

        mock_repo
            .expect_delete()
            .with(mockall::predicate::eq(1))
            .times(1)
            .returning(move |_| Ok(pet.clone()));

        let metrics = Arc::new(Metrics::new().unwrap());
        let service = PetService::new_with_metrics(Arc::new(mock_repo), metrics.clone());

        let removed = service.delete_pet("1").await.unwrap();

        assert_eq!(removed.id, 1);
        assert_eq!(
            metrics
                .pet_operations_total
                .with_label_values(&["delete", "success"])
                .get(),
            1.0
        );
    }
}

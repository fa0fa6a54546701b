use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{Pet, PetFilters, PetId, RepositoryError, RepositoryResult};
use crate::observability::Metrics;

/// Trait defining the interface for pet data access operations
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Find all pets matching the filters, in insertion order
    async fn find_all(&self, filters: PetFilters) -> RepositoryResult<Vec<Pet>>;

    /// Find a pet by its ID
    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>>;

    /// Append a new pet built from the given fields and assign its ID
    async fn create(&self, fields: Map<String, Value>) -> RepositoryResult<Pet>;

    /// Shallow-merge fields into an existing pet
    async fn update(&self, id: PetId, fields: Map<String, Value>) -> RepositoryResult<Pet>;

    /// Remove a pet and return it
    async fn delete(&self, id: PetId) -> RepositoryResult<Pet>;

    /// Count stored pets
    async fn count(&self) -> RepositoryResult<usize>;
}

/// Pet store kept in memory and mirrored to a pretty-printed JSON file.
///
/// The in-memory collection is the source of truth. Every mutation holds the
/// write lock across modify and flush, so concurrent requests observe the
/// same ordering as a single-threaded request loop. A failed flush is logged
/// and counted but never undoes the mutation.
pub struct JsonFilePetRepository {
    path: PathBuf,
    pets: RwLock<Vec<Pet>>,
    metrics: Option<Arc<Metrics>>,
}

impl JsonFilePetRepository {
    /// Create a repository over an already loaded collection
    pub fn new(path: impl Into<PathBuf>, pets: Vec<Pet>) -> Self {
        Self {
            path: path.into(),
            pets: RwLock::new(pets),
            metrics: None,
        }
    }

    /// Load the backing file. A missing or unparsable file yields an empty store;
    /// individual records that are not valid pets are skipped.
    #[instrument(skip_all)]
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "Loading pets from backing file");

        let pets = match read_pets(&path).await {
            Ok(pets) => {
                info!(count = pets.len(), "Loaded pets from backing file");
                pets
            }
            Err(RepositoryError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!("Backing file not found, starting with an empty collection");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to read backing file, starting with an empty collection");
                Vec::new()
            }
        };

        Self::new(path, pets)
    }

    /// Attach metrics used to count persistence failures and stored pets
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.set_pets_stored(self.pets.get_mut().len());
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot of the whole collection
    pub async fn snapshot(&self) -> Vec<Pet> {
        self.pets.read().await.clone()
    }

    fn create_storage_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "PetStore",
            "otel.kind" = "internal",
            "otel.name" = format!("PetStore.{}", operation),
            "db.system" = "json_file",
            "db.operation" = operation,
            "file.path" = %self.path.display(),
        )
    }

    /// Write the collection to disk, logging instead of failing.
    async fn flush(&self, pets: &[Pet]) {
        if let Some(ref metrics) = self.metrics {
            metrics.set_pets_stored(pets.len());
        }

        if let Err(e) = write_pets(&self.path, pets).await {
            error!(
                error = %e,
                path = %self.path.display(),
                "Failed to persist pets, keeping in-memory state"
            );
            if let Some(ref metrics) = self.metrics {
                metrics.record_persistence_failure();
            }
        }
    }
}

#[async_trait]
impl PetRepository for JsonFilePetRepository {
    async fn find_all(&self, filters: PetFilters) -> RepositoryResult<Vec<Pet>> {
        let span = self.create_storage_span("Scan");
        async {
            let pets = self.pets.read().await;
            Ok(pets
                .iter()
                .filter(|pet| pet.matches_filters(&filters))
                .cloned()
                .collect())
        }
        .instrument(span)
        .await
    }

    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>> {
        let span = self.create_storage_span("GetItem");
        async {
            let pets = self.pets.read().await;
            Ok(pets.iter().find(|pet| pet.id == id).cloned())
        }
        .instrument(span)
        .await
    }

    async fn create(&self, fields: Map<String, Value>) -> RepositoryResult<Pet> {
        let span = self.create_storage_span("PutItem");
        async {
            let mut pets = self.pets.write().await;

            // Follows the last record, not the maximum; relies on append order.
            let id = match pets.last() {
                Some(last) => last
                    .id
                    .checked_add(1)
                    .ok_or(RepositoryError::IdSpaceExhausted { last: last.id })?,
                None => 1,
            };
            let pet = Pet::new(id, fields);
            pets.push(pet.clone());

            self.flush(&pets).await;
            info!(pet_id = id, "Pet stored");
            Ok::<_, RepositoryError>(pet)
        }
        .instrument(span)
        .await
    }

    async fn update(&self, id: PetId, fields: Map<String, Value>) -> RepositoryResult<Pet> {
        let span = self.create_storage_span("UpdateItem");
        async {
            let mut pets = self.pets.write().await;

            let pet = pets
                .iter_mut()
                .find(|pet| pet.id == id)
                .ok_or(RepositoryError::NotFound { id })?;
            pet.merge(fields);
            let updated = pet.clone();

            self.flush(&pets).await;
            Ok::<_, RepositoryError>(updated)
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, id: PetId) -> RepositoryResult<Pet> {
        let span = self.create_storage_span("DeleteItem");
        async {
            let mut pets = self.pets.write().await;

            let index = pets
                .iter()
                .position(|pet| pet.id == id)
                .ok_or(RepositoryError::NotFound { id })?;
            let removed = pets.remove(index);

            self.flush(&pets).await;
            Ok::<_, RepositoryError>(removed)
        }
        .instrument(span)
        .await
    }

    async fn count(&self) -> RepositoryResult<usize> {
        Ok(self.pets.read().await.len())
    }
}

/// Read and parse a backing file.
///
/// The document must be a JSON array. Elements that do not form a pet (no
/// integer `id`, not an object) are logged and dropped so the remaining
/// records survive.
pub async fn read_pets(path: &Path) -> RepositoryResult<Vec<Pet>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RepositoryError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let records: Vec<Value> = serde_json::from_str(&contents)?;
    let total = records.len();

    let pets: Vec<Pet> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Pet>(record) {
            Ok(pet) => Some(pet),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed pet record");
                None
            }
        })
        .collect();

    if pets.len() < total {
        warn!(
            skipped = total - pets.len(),
            path = %path.display(),
            "Backing file contained records that are not valid pets"
        );
    }

    Ok(pets)
}

/// Serialize the collection with two-space indentation and overwrite the file
pub async fn write_pets(path: &Path, pets: &[Pet]) -> RepositoryResult<()> {
    let contents = serde_json::to_string_pretty(pets)?;

    tokio::fs::write(path, contents)
        .await
        .map_err(|source| RepositoryError::Io {
            path: path.display().to_string(),
            source,
        })
}

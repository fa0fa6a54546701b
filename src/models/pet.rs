use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Identifier assigned to a pet by the store
pub type PetId = u64;

/// Core pet record.
///
/// Only `id` is owned by the service. Every other attribute, including the
/// required `nombre`, `tipo`, `raza` and `edad`, lives in an open map so that
/// caller-supplied extras survive a round trip through the backing file in the
/// order they were sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Filters for listing pets
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PetFilters {
    pub raza: Option<String>,
    pub tipo: Option<String>,
}

pub const FIELD_ID: &str = "id";
pub const FIELD_NOMBRE: &str = "nombre";
pub const FIELD_TIPO: &str = "tipo";
pub const FIELD_RAZA: &str = "raza";
pub const FIELD_EDAD: &str = "edad";

impl Pet {
    /// Build a pet from caller-supplied fields. Any `id` in the fields is dropped.
    pub fn new(id: PetId, mut attributes: Map<String, Value>) -> Self {
        attributes.remove(FIELD_ID);
        Self { id, attributes }
    }

    pub fn nombre(&self) -> Option<&str> {
        self.text(FIELD_NOMBRE)
    }

    pub fn tipo(&self) -> Option<&str> {
        self.text(FIELD_TIPO)
    }

    pub fn raza(&self) -> Option<&str> {
        self.text(FIELD_RAZA)
    }

    pub fn edad(&self) -> Option<&Number> {
        match self.attributes.get(FIELD_EDAD) {
            Some(Value::Number(edad)) => Some(edad),
            _ => None,
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).and_then(Value::as_str)
    }

    /// Shallow merge: supplied top-level fields overwrite, everything else is kept.
    /// The identifier is never overwritten.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            if key == FIELD_ID {
                continue;
            }
            self.attributes.insert(key, value);
        }
    }

    /// Check if the pet matches the given filters
    pub fn matches_filters(&self, filters: &PetFilters) -> bool {
        if let Some(ref raza) = filters.raza {
            if !eq_ignore_case(self.raza(), raza) {
                return false;
            }
        }

        if let Some(ref tipo) = filters.tipo {
            if !eq_ignore_case(self.tipo(), tipo) {
                return false;
            }
        }

        true
    }
}

impl PetFilters {
    pub fn is_empty(&self) -> bool {
        self.raza.is_none() && self.tipo.is_none()
    }
}

fn eq_ignore_case(field: Option<&str>, wanted: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase() == wanted.to_lowercase())
}

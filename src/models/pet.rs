use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A listed pet.
///
/// The record is kept exactly as it was seeded or sent, including the original
/// form of its `id`. The parsed integer key is used only for lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Pet {
    #[serde(skip)]
    key: Option<i64>,
    record: Map<String, Value>,
}

/// Request model for creating a new pet. Any JSON object is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatePetRequest {
    pub fields: Map<String, Value>,
}

/// Request model for updating an existing pet.
///
/// Every key in the body is applied, so an explicit `null` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdatePetRequest {
    pub fields: Map<String, Value>,
}

impl Pet {
    /// Build a new pet from a create request. A client-supplied `id` is replaced.
    pub fn new(id: i64, request: CreatePetRequest) -> Self {
        let mut record = request.fields;
        record.insert("id".to_string(), Value::from(id));

        Self {
            key: Some(id),
            record,
        }
    }

    /// Integer key used to match path ids. `None` when the stored id is not an integer.
    pub fn id(&self) -> Option<i64> {
        self.key
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    pub fn breed(&self) -> Option<&str> {
        self.get("breed").and_then(Value::as_str)
    }

    pub fn age(&self) -> Option<u64> {
        self.get("age").and_then(Value::as_u64)
    }

    pub fn image_url(&self) -> Option<&str> {
        self.get("imageUrl").and_then(Value::as_str)
    }

    /// Shallow-merge an update into this pet. The id never changes.
    pub fn apply_update(&mut self, update: UpdatePetRequest) {
        for (key, value) in update.fields {
            if key == "id" {
                continue;
            }
            self.record.insert(key, value);
        }
    }

    /// Display label used in log lines
    pub fn label(&self) -> &str {
        self.name().unwrap_or("<unnamed>")
    }
}

impl<'de> Deserialize<'de> for Pet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = Map::<String, Value>::deserialize(deserializer)?;
        let key = match record.get("id") {
            Some(id) => pet_key(id),
            None => return Err(de::Error::missing_field("id")),
        };

        Ok(Self { key, record })
    }
}

impl CreatePetRequest {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

impl UpdatePetRequest {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for CreatePetRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Map<String, Value>> for UpdatePetRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Seed ids may be numbers or numeric strings.
fn pet_key(id: &Value) -> Option<i64> {
    match id {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                .map(|value| value as i64)
        }),
        Value::String(text) => parse_pet_id(text),
        _ => None,
    }
}

/// Parse a pet id from a path segment or seed value
pub fn parse_pet_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_pet() -> Pet {
        serde_json::from_value(json!({
            "id": 1,
            "name": "A",
            "breed": "Beagle",
            "age": 3,
            "imageUrl": "uploads/1-a.png",
            "color": "brown"
        }))
        .unwrap()
    }

    fn update(body: Value) -> UpdatePetRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_pet_deserialization_keeps_every_field() {
        let pet = create_test_pet();

        assert_eq!(pet.id(), Some(1));
        assert_eq!(pet.name(), Some("A"));
        assert_eq!(pet.age(), Some(3));
        assert_eq!(pet.get("color"), Some(&json!("brown")));
    }

    #[test]
    fn test_pet_id_accepts_numeric_string() {
        let pet: Pet = serde_json::from_value(json!({ "id": "42", "name": "Rex" })).unwrap();
        assert_eq!(pet.id(), Some(42));
    }

    #[test]
    fn test_pet_with_non_numeric_id_has_no_key() {
        let pet: Pet = serde_json::from_value(json!({ "id": "abc" })).unwrap();
        assert_eq!(pet.id(), None);
    }

    #[test]
    fn test_pet_without_id_rejected() {
        let result = serde_json::from_value::<Pet>(json!({ "name": "Rex" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_pet_serializes_record_verbatim() {
        let seed = json!({
            "id": "1",
            "name": "A",
            "imageUrl": null,
            "age": "3 years"
        });

        let pet: Pet = serde_json::from_value(seed.clone()).unwrap();

        assert_eq!(pet.id(), Some(1));
        assert_eq!(pet.age(), None);
        assert_eq!(serde_json::to_value(&pet).unwrap(), seed);
    }

    #[test]
    fn test_new_pet_replaces_client_id() {
        let request: CreatePetRequest =
            serde_json::from_value(json!({ "id": 99, "name": "Rex", "toy": "ball" })).unwrap();

        let pet = Pet::new(5, request);

        assert_eq!(pet.id(), Some(5));
        assert_eq!(
            serde_json::to_value(&pet).unwrap(),
            json!({ "id": 5, "name": "Rex", "toy": "ball" })
        );
    }

    #[test]
    fn test_apply_update_merges_shallowly() {
        let mut pet = create_test_pet();

        pet.apply_update(update(json!({
            "id": 500,
            "name": "B",
            "color": "black",
            "vaccinated": true
        })));

        assert_eq!(pet.id(), Some(1));
        assert_eq!(pet.get("id"), Some(&json!(1)));
        assert_eq!(pet.name(), Some("B"));
        assert_eq!(pet.breed(), Some("Beagle"));
        assert_eq!(pet.get("color"), Some(&json!("black")));
        assert_eq!(pet.get("vaccinated"), Some(&json!(true)));
    }

    #[test]
    fn test_apply_update_null_clears_field() {
        let mut pet = create_test_pet();

        pet.apply_update(update(json!({ "imageUrl": null, "color": null })));

        assert_eq!(pet.image_url(), None);
        assert_eq!(pet.get("imageUrl"), Some(&Value::Null));
        assert_eq!(pet.get("color"), Some(&Value::Null));
        assert_eq!(pet.name(), Some("A"));
    }

    #[test]
    fn test_apply_empty_update_is_noop() {
        let mut pet = create_test_pet();
        let original = pet.clone();

        pet.apply_update(UpdatePetRequest::default());

        assert_eq!(pet, original);
    }

    #[test]
    fn test_parse_pet_id() {
        assert_eq!(parse_pet_id("12"), Some(12));
        assert_eq!(parse_pet_id(" 12 "), Some(12));
        assert_eq!(parse_pet_id("-3"), Some(-3));
        assert_eq!(parse_pet_id("12abc"), None);
        assert_eq!(parse_pet_id(""), None);
    }

    #[test]
    fn test_pet_key_from_float_id() {
        assert_eq!(pet_key(&json!(3.0)), Some(3));
        assert_eq!(pet_key(&json!(3.5)), None);
        assert_eq!(pet_key(&Value::Null), None);
    }
}

//! Clothing record model matching the app's persisted `ClothingItem` shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// One cataloged item of clothing.
///
/// Every field but `id` tolerates being absent so that blobs written by older
/// app builds keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_stored_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub washing_method: Option<String>,
}

impl ClothingRecord {
    /// Build a fresh record from a creation request.
    ///
    /// `created_at` and `updated_at` are both set to `now`.
    pub fn from_request(
        request: CreateClothingRequest,
        id: String,
        owner_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: request.user_id.unwrap_or(owner_id),
            name: request.name.trim().to_string(),
            category: request.category.trim().to_string(),
            color: request.color.trim().to_string(),
            image_url: request.image_url,
            masked_image_url: normalize(request.masked_image_url),
            tags: request.tags,
            created_at: now,
            updated_at: now,
            season: normalize(request.season),
            storage_location: normalize(request.storage_location),
            brand: normalize(request.brand),
            price: request.price,
            size: normalize(request.size),
            link: normalize(request.link),
            purchase_date: normalize(request.purchase_date),
            washing_method: normalize(request.washing_method),
        }
    }

    /// Check the invariants a stored record must hold.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_price(self.price).map_err(|e| {
            AppError::Validation(format!("Clothing item {}: {}", self.id, e.message()))
        })
    }

    /// Image files this record owns.
    pub fn image_paths(&self) -> Vec<&str> {
        std::iter::once(self.image_url.as_str())
            .chain(self.masked_image_url.as_deref())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Request body for creating a new clothing record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateClothingRequest {
    /// Owner; falls back to the configured default owner
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    /// Permanent image path, when the image is already stored
    #[serde(default)]
    pub image_url: String,
    /// Transient picker output to move into permanent storage
    #[serde(default)]
    pub image_source: Option<String>,
    #[serde(default)]
    pub masked_image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub washing_method: Option<String>,
}

impl CreateClothingRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_price(self.price)
    }
}

/// Partial update of a clothing record.
///
/// `None` leaves a field untouched. For optional fields `Some(None)`, sent as
/// an explicit JSON `null`, clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClothingPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub masked_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub season: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub storage_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub brand: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_patch_price")]
    pub price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub purchase_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub washing_method: Option<Option<String>>,
}

impl ClothingPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_price(self.price.flatten())
    }

    /// Apply the patch, leaving identity and `created_at` alone.
    ///
    /// `updated_at` always moves forward, even when the clock has not.
    pub fn apply(self, record: &mut ClothingRecord, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            record.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            record.category = category.trim().to_string();
        }
        if let Some(color) = self.color {
            record.color = color.trim().to_string();
        }
        if let Some(image_url) = self.image_url {
            record.image_url = image_url;
        }
        if let Some(masked) = self.masked_image_url {
            record.masked_image_url = normalize(masked);
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
        if let Some(season) = self.season {
            record.season = normalize(season);
        }
        if let Some(location) = self.storage_location {
            record.storage_location = normalize(location);
        }
        if let Some(brand) = self.brand {
            record.brand = normalize(brand);
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(size) = self.size {
            record.size = normalize(size);
        }
        if let Some(link) = self.link {
            record.link = normalize(link);
        }
        if let Some(date) = self.purchase_date {
            record.purchase_date = normalize(date);
        }
        if let Some(method) = self.washing_method {
            record.washing_method = normalize(method);
        }

        record.updated_at = next_timestamp(record.updated_at, now);
    }
}

/// Request body for updating a clothing record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClothingRequest {
    /// Transient picker output replacing the primary image
    #[serde(default)]
    pub image_source: Option<String>,
    #[serde(flatten)]
    pub patch: ClothingPatch,
}

/// Result of a delete: the removed record, if any was present.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteClothingResponse {
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ClothingRecord>,
}

/// Split comma-separated tag input the way the add/edit forms take it.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Coerce free-form price input; anything non-numeric means "unknown".
pub fn parse_price(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn validate_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(value) if !value.is_finite() || value < 0.0 => Err(AppError::Validation(format!(
            "Price must be a finite, non-negative number (got {})",
            value
        ))),
        _ => Ok(()),
    }
}

fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsInput {
    List(Vec<Option<String>>),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Number(f64),
    Text(String),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<TagsInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TagsInput::Text(text)) => parse_tags(&text),
        Some(TagsInput::List(list)) => list
            .into_iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    };
    Ok(tags)
}

/// Stored tags are kept as written; only legacy comma strings are split.
fn deserialize_stored_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<TagsInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TagsInput::Text(text)) => parse_tags(&text),
        Some(TagsInput::List(list)) => list.into_iter().flatten().collect(),
    };
    Ok(tags)
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match Option::<PriceInput>::deserialize(deserializer)? {
        None => None,
        Some(PriceInput::Number(value)) => Some(value).filter(|v| v.is_finite()),
        Some(PriceInput::Text(text)) => parse_price(&text),
    };
    Ok(price)
}

fn deserialize_patch_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_tags(deserializer).map(Some)
}

fn deserialize_patch_price<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_price(deserializer).map(Some)
}

/// Distinguishes an explicit `null` from an absent key.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_record() -> ClothingRecord {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        ClothingRecord {
            id: "item-1".to_string(),
            user_id: "1".to_string(),
            name: "Blue Shirt".to_string(),
            category: "Tops".to_string(),
            color: "blue".to_string(),
            image_url: "/data/images/a.jpg".to_string(),
            masked_image_url: None,
            tags: vec!["casual".to_string()],
            created_at: created,
            updated_at: created,
            season: Some("summer".to_string()),
            storage_location: None,
            brand: None,
            price: Some(19.5),
            size: None,
            link: None,
            purchase_date: None,
            washing_method: None,
        }
    }

    #[test]
    fn test_parse_tags_trims_and_drops_blanks() {
        assert_eq!(
            parse_tags(" casual, summer ,,cotton "),
            vec!["casual", "summer", "cotton"]
        );
        assert!(parse_tags("").is_empty());
        assert_eq!(parse_tags("a, a"), vec!["a", "a"]);
    }

    #[test]
    fn test_parse_price_coerces_garbage_to_unknown() {
        assert_eq!(parse_price("12.5"), Some(12.5));
        assert_eq!(parse_price(" 0 "), Some(0.0));
        assert_eq!(parse_price("twelve"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn test_reads_legacy_blob_entry() {
        // Shape written by the mobile app: timestamp id, empty strings, string price.
        let raw = json!({
            "id": "1717171717171",
            "user_id": "1",
            "name": "Red Hat",
            "category": "Accessories",
            "color": "red",
            "image_url": "file:///data/user/0/app/files/hat.jpg",
            "tags": "formal, ",
            "created_at": "2024-05-31T16:08:37.171Z",
            "updated_at": "2024-05-31T16:08:37.171Z",
            "season": "",
            "price": "49.90"
        });

        let record: ClothingRecord = serde_json::from_value(raw).unwrap();

        assert_eq!(record.id, "1717171717171");
        assert_eq!(record.tags, vec!["formal"]);
        assert_eq!(record.price, Some(49.9));
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.brand.is_none());
    }

    #[test]
    fn test_stored_tag_list_is_read_verbatim() {
        let record: ClothingRecord =
            serde_json::from_value(json!({ "id": "x", "tags": [" casual ", "", "work"] })).unwrap();
        assert_eq!(record.tags, vec![" casual ", "", "work"]);

        let request: CreateClothingRequest =
            serde_json::from_value(json!({ "tags": [" casual ", "", "work"] })).unwrap();
        assert_eq!(request.tags, vec!["casual", "work"]);

        let patch: ClothingPatch =
            serde_json::from_value(json!({ "tags": [" casual ", ""] })).unwrap();
        assert_eq!(patch.tags, Some(vec!["casual".to_string()]));
    }

    #[test]
    fn test_record_validation_rejects_unusable_prices() {
        let mut record = sample_record();
        for price in [-1.0, f64::NAN, f64::INFINITY] {
            record.price = Some(price);
            assert!(matches!(record.validate(), Err(AppError::Validation(_))));
        }

        record.price = Some(0.0);
        assert!(record.validate().is_ok());
        record.price = None;
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_default() {
        let record: ClothingRecord =
            serde_json::from_value(json!({ "id": "x", "tags": null, "price": "n/a" })).unwrap();

        assert_eq!(record.name, "");
        assert!(record.tags.is_empty());
        assert!(record.price.is_none());
    }

    #[test]
    fn test_absent_price_is_not_serialized() {
        let mut record = sample_record();
        record.price = None;
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("price").is_none());
    }

    #[test]
    fn test_from_request_sets_equal_timestamps() {
        let now = Utc::now();
        let request: CreateClothingRequest = serde_json::from_value(json!({
            "name": " Linen Pants ",
            "category": "Bottoms",
            "tags": "summer, linen",
            "brand": "   ",
            "price": "35"
        }))
        .unwrap();

        let record = ClothingRecord::from_request(request, "id-1".into(), "owner".into(), now);

        assert_eq!(record.name, "Linen Pants");
        assert_eq!(record.user_id, "owner");
        assert_eq!(record.tags, vec!["summer", "linen"]);
        assert!(record.brand.is_none());
        assert_eq!(record.price, Some(35.0));
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_negative_price_fails_validation() {
        let request: CreateClothingRequest =
            serde_json::from_value(json!({ "name": "Coat", "price": -3 })).unwrap();
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));

        let patch: ClothingPatch = serde_json::from_value(json!({ "price": -1.0 })).unwrap();
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: ClothingPatch =
            serde_json::from_value(json!({ "season": null, "brand": "Uniqlo" })).unwrap();

        assert_eq!(patch.season, Some(None));
        assert_eq!(patch.brand, Some(Some("Uniqlo".to_string())));
        assert!(patch.size.is_none());
        assert!(patch.price.is_none());
    }

    #[test]
    fn test_apply_preserves_identity() {
        let mut record = sample_record();
        let original = record.clone();
        let patch: ClothingPatch = serde_json::from_value(json!({
            "name": "Navy Shirt",
            "tags": ["work"],
            "season": null,
            "price": null
        }))
        .unwrap();

        patch.apply(&mut record, Utc::now());

        assert_eq!(record.id, original.id);
        assert_eq!(record.user_id, original.user_id);
        assert_eq!(record.created_at, original.created_at);
        assert!(record.updated_at > original.updated_at);
        assert_eq!(record.name, "Navy Shirt");
        assert_eq!(record.tags, vec!["work"]);
        assert!(record.season.is_none());
        assert!(record.price.is_none());
        assert_eq!(record.category, original.category);
    }

    #[test]
    fn test_apply_moves_updated_at_forward_when_clock_lags() {
        let mut record = sample_record();
        let before = record.updated_at;

        ClothingPatch::default().apply(&mut record, before - Duration::seconds(5));

        assert!(record.updated_at > before);
    }

    #[test]
    fn test_update_request_flattens_patch() {
        let request: UpdateClothingRequest = serde_json::from_value(json!({
            "image_source": "/tmp/picked.jpg",
            "color": "green"
        }))
        .unwrap();

        assert_eq!(request.image_source.as_deref(), Some("/tmp/picked.jpg"));
        assert_eq!(request.patch.color.as_deref(), Some("green"));
    }

    #[test]
    fn test_image_paths_skip_empty() {
        let mut record = sample_record();
        record.masked_image_url = Some("/data/images/b.png".to_string());
        assert_eq!(
            record.image_paths(),
            vec!["/data/images/a.jpg", "/data/images/b.png"]
        );

        record.image_url.clear();
        record.masked_image_url = None;
        assert!(record.image_paths().is_empty());
    }
}

//! Catalog filter.
//!
//! Case-insensitive substring match over name, tags and category. No ranking:
//! results keep the order of the input.

use crate::models::ClothingRecord;

/// Filter records by a free-text query.
///
/// An empty query returns every record unchanged.
pub fn filter_records(records: Vec<ClothingRecord>, query: &str) -> Vec<ClothingRecord> {
    if query.is_empty() {
        return records;
    }

    let needle = query.to_lowercase();
    records
        .into_iter()
        .filter(|record| matches(record, &needle))
        .collect()
}

/// Whether a record matches an already-lowercased query.
pub fn matches(record: &ClothingRecord, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);

    contains(&record.name) || record.tags.iter().any(|t| contains(t)) || contains(&record.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_record(id: &str, name: &str, category: &str, tags: &[&str]) -> ClothingRecord {
        let now = Utc::now();
        ClothingRecord {
            id: id.to_string(),
            user_id: "1".to_string(),
            name: name.to_string(),
            category: category.to_string(),
            color: String::new(),
            image_url: String::new(),
            masked_image_url: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
            season: None,
            storage_location: None,
            brand: None,
            price: None,
            size: None,
            link: None,
            purchase_date: None,
            washing_method: None,
        }
    }

    fn catalog() -> Vec<ClothingRecord> {
        vec![
            create_test_record("1", "Blue Shirt", "Tops", &["casual"]),
            create_test_record("2", "Red Hat", "Accessories", &["formal"]),
        ]
    }

    fn ids(records: &[ClothingRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_name_match() {
        assert_eq!(ids(&filter_records(catalog(), "blue")), vec!["1"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(ids(&filter_records(catalog(), "BLUE")), vec!["1"]);
    }

    #[test]
    fn test_tag_match() {
        assert_eq!(ids(&filter_records(catalog(), "casual")), vec!["1"]);
        assert_eq!(ids(&filter_records(catalog(), "FORM")), vec!["2"]);
    }

    #[test]
    fn test_category_match() {
        assert_eq!(ids(&filter_records(catalog(), "access")), vec!["2"]);
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        assert_eq!(ids(&filter_records(catalog(), "")), vec!["1", "2"]);
    }

    #[test]
    fn test_partial_match_keeps_input_order() {
        // "a" hits "casual" on the first and "Hat" on the second.
        assert_eq!(ids(&filter_records(catalog(), "a")), vec!["1", "2"]);
    }

    #[test]
    fn test_no_match() {
        assert!(filter_records(catalog(), "wool").is_empty());
    }

    #[test]
    fn test_color_is_not_searched() {
        let mut records = catalog();
        records[0].color = "crimson".to_string();
        assert!(filter_records(records, "crimson").is_empty());
    }
}

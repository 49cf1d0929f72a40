//! Natural-language search heuristics.
//!
//! Keyword containment against a fixed synonym table. A query only ever
//! switches filters on; whatever the base state already had is kept.

use crate::listings::filter::{Amenity, BedroomFilter, FurnishedFilter, ListingFilters};
use crate::models::PropertyType;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Distance used for "near campus" style queries, in miles
pub const NEAR_CAMPUS_MILES: f64 = 1.0;

/// Minimum query length (in characters) before suggestions appear
const SUGGESTION_MIN_CHARS: usize = 3;

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$|\bunder\b|\bup to\b|\bless than\b|\bmax\b) ?(\d+)").expect("valid price regex")
});

static PLUS_BEDROOMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\+ bed").expect("valid bedrooms regex"));

const AMENITY_KEYWORDS: &[(Amenity, &[&str])] = &[
    (Amenity::Wifi, &["wifi", "internet"]),
    (Amenity::Laundry, &["laundry", "washer"]),
    (Amenity::Furnished, &["furnished"]),
    (Amenity::Parking, &["parking", "garage"]),
    (Amenity::Pets, &["pet", "dog", "cat"]),
    (Amenity::Gym, &["gym", "fitness"]),
    (Amenity::Pool, &["pool", "swimming"]),
    (Amenity::Security, &["security", "safe"]),
];

const TYPE_KEYWORDS: &[(PropertyType, &str)] = &[
    (PropertyType::Apartment, "apartment"),
    (PropertyType::House, "house"),
    (PropertyType::Dormitory, "dorm"),
    (PropertyType::Studio, "studio"),
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn bedrooms_in(query: &str) -> Option<BedroomFilter> {
    if contains_any(query, &["1 bed", "one bed", "single bed"]) {
        Some(BedroomFilter::Exactly(1))
    } else if contains_any(query, &["2 bed", "two bed"]) {
        Some(BedroomFilter::Exactly(2))
    } else if contains_any(query, &["3 bed", "three bed"]) || PLUS_BEDROOMS_RE.is_match(query) {
        Some(BedroomFilter::ThreePlus)
    } else {
        None
    }
}

/// Derive a filter state from a free-text query, starting from `base`
pub fn interpret_query(query: &str, base: &ListingFilters) -> ListingFilters {
    let query = query.to_lowercase();
    let mut filters = base.clone();

    if let Some(bedrooms) = bedrooms_in(&query) {
        filters.bedrooms = bedrooms;
    }

    for (property_type, keyword) in TYPE_KEYWORDS {
        if query.contains(keyword) {
            filters.housing_type.set(*property_type);
        }
    }

    for (amenity, keywords) in AMENITY_KEYWORDS {
        if contains_any(&query, keywords) {
            filters.amenities.set(*amenity);
        }
    }
    if query.contains("furnished") {
        filters.furnished = FurnishedFilter::Furnished;
    }

    // Any mentioned amount is read as a ceiling
    if let Some(amount) = PRICE_RE
        .captures(&query)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        filters.price_range.max = Some(amount);
    }

    if contains_any(&query, &["near campus", "close to campus"]) {
        filters.max_distance = Some(NEAR_CAMPUS_MILES);
    }

    debug!("Interpreted query '{}' as {:?}", query, filters);
    filters
}

/// Completion suggestions for a partially typed query
pub fn suggestions(query: &str) -> Vec<String> {
    if query.chars().count() < SUGGESTION_MIN_CHARS {
        return Vec::new();
    }
    vec![
        format!("{query} near campus"),
        format!("{query} with utilities included"),
        format!("cheap {query}"),
        format!("luxury {query}"),
        format!("furnished {query}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::filter::BathroomFilter;

    #[test]
    fn reads_bedrooms_type_and_price() {
        let filters = interpret_query("2 bed Apartment under 900", &ListingFilters::default());
        assert_eq!(filters.bedrooms, BedroomFilter::Exactly(2));
        assert!(filters.housing_type.apartment);
        assert!(!filters.housing_type.house);
        assert_eq!(filters.price_range.max, Some(900.0));
    }

    #[test]
    fn plus_bedrooms_and_dollar_amounts() {
        let filters = interpret_query("4+ bedrooms for $1500", &ListingFilters::default());
        assert_eq!(filters.bedrooms, BedroomFilter::ThreePlus);
        assert_eq!(filters.price_range.max, Some(1500.0));
    }

    #[test]
    fn synonyms_switch_amenities_on() {
        let filters = interpret_query("dorm with internet, my dog and a garage", &ListingFilters::default());
        assert!(filters.housing_type.dormitory);
        assert!(filters.amenities.wifi);
        assert!(filters.amenities.pets);
        assert!(filters.amenities.parking);
        assert!(!filters.amenities.pool);
    }

    #[test]
    fn furnished_sets_both_flag_and_status() {
        let filters = interpret_query("furnished studio near campus", &ListingFilters::default());
        assert!(filters.amenities.furnished);
        assert_eq!(filters.furnished, FurnishedFilter::Furnished);
        assert!(filters.housing_type.studio);
        assert_eq!(filters.max_distance, Some(NEAR_CAMPUS_MILES));
    }

    #[test]
    fn base_state_is_kept() {
        let mut base = ListingFilters::default();
        base.bathrooms = BathroomFilter::Shared;
        base.amenities.gym = true;

        let filters = interpret_query("pool", &base);
        assert_eq!(filters.bathrooms, BathroomFilter::Shared);
        assert!(filters.amenities.gym);
        assert!(filters.amenities.pool);
    }

    #[test]
    fn suggestions_need_three_characters() {
        assert!(suggestions("ap").is_empty());
        let list = suggestions("loft");
        assert_eq!(list.len(), 5);
        assert_eq!(list[0], "loft near campus");
        assert_eq!(list[4], "furnished loft");
    }
}

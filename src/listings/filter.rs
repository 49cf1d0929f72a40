//! Filter state and the filter/sort pass over an in-memory listing set.

use crate::listings::parse::distance_miles;
use crate::models::{Listing, PropertyType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Bedroom bucket: any, an exact count, or three and more
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BedroomFilter {
    #[default]
    Any,
    Exactly(u32),
    ThreePlus,
}

impl FromStr for BedroomFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "any" => Ok(Self::Any),
            "3+" => Ok(Self::ThreePlus),
            n => n
                .parse()
                .map(Self::Exactly)
                .map_err(|_| format!("invalid bedroom filter: {n}")),
        }
    }
}

impl fmt::Display for BedroomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Exactly(n) => write!(f, "{n}"),
            Self::ThreePlus => f.write_str("3+"),
        }
    }
}

impl TryFrom<String> for BedroomFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BedroomFilter> for String {
    fn from(value: BedroomFilter) -> Self {
        value.to_string()
    }
}

/// Bathroom bucket; `Shared` only matches shared facilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BathroomFilter {
    #[default]
    Any,
    Exactly(u32),
    ThreePlus,
    Shared,
}

impl FromStr for BathroomFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "any" => Ok(Self::Any),
            "3+" => Ok(Self::ThreePlus),
            "Shared" | "shared" => Ok(Self::Shared),
            n => n
                .parse()
                .map(Self::Exactly)
                .map_err(|_| format!("invalid bathroom filter: {n}")),
        }
    }
}

impl fmt::Display for BathroomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Exactly(n) => write!(f, "{n}"),
            Self::ThreePlus => f.write_str("3+"),
            Self::Shared => f.write_str("Shared"),
        }
    }
}

impl TryFrom<String> for BathroomFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BathroomFilter> for String {
    fn from(value: BathroomFilter) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnishedFilter {
    #[default]
    Any,
    Furnished,
    Unfurnished,
}

impl FromStr for FurnishedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "furnished" => Ok(Self::Furnished),
            "unfurnished" => Ok(Self::Unfurnished),
            other => Err(format!("invalid furnished filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Keep the input order
    #[default]
    Recommended,
    PriceLow,
    PriceHigh,
    /// Availability date, latest first
    Newest,
    /// Parsed distance from campus, nearest first
    Closest,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "recommended" => Ok(Self::Recommended),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "newest" => Ok(Self::Newest),
            "closest" => Ok(Self::Closest),
            other => Err(format!("invalid sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Amenity {
    Wifi,
    Laundry,
    Furnished,
    Parking,
    Pets,
    Gym,
    Pool,
    Security,
}

impl Amenity {
    pub const ALL: [Amenity; 8] = [
        Amenity::Wifi,
        Amenity::Laundry,
        Amenity::Furnished,
        Amenity::Parking,
        Amenity::Pets,
        Amenity::Gym,
        Amenity::Pool,
        Amenity::Security,
    ];

    /// Listing tags that count as carrying this amenity
    fn tags(&self) -> &'static [&'static str] {
        match self {
            Amenity::Wifi => &["WiFi"],
            Amenity::Laundry => &["Laundry"],
            Amenity::Furnished => &["Furnished"],
            Amenity::Parking => &["Parking"],
            Amenity::Pets => &["Pets", "Pets Allowed"],
            Amenity::Gym => &["Gym"],
            Amenity::Pool => &["Pool"],
            Amenity::Security => &["Security System"],
        }
    }

    pub fn is_offered_by(&self, listing: &Listing) -> bool {
        if *self == Amenity::Pets && listing.pets_allowed == Some(true) {
            return true;
        }
        listing.amenities.iter().any(|tag| {
            self.tags()
                .iter()
                .any(|wanted| tag.eq_ignore_ascii_case(wanted))
        })
    }
}

impl FromStr for Amenity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wifi" => Ok(Amenity::Wifi),
            "laundry" => Ok(Amenity::Laundry),
            "furnished" => Ok(Amenity::Furnished),
            "parking" => Ok(Amenity::Parking),
            "pets" => Ok(Amenity::Pets),
            "gym" => Ok(Amenity::Gym),
            "pool" => Ok(Amenity::Pool),
            "security" => Ok(Amenity::Security),
            other => Err(format!("unknown amenity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityFlags {
    pub wifi: bool,
    pub laundry: bool,
    pub furnished: bool,
    pub parking: bool,
    pub pets: bool,
    pub gym: bool,
    pub pool: bool,
    pub security: bool,
}

impl AmenityFlags {
    fn flag_mut(&mut self, amenity: Amenity) -> &mut bool {
        match amenity {
            Amenity::Wifi => &mut self.wifi,
            Amenity::Laundry => &mut self.laundry,
            Amenity::Furnished => &mut self.furnished,
            Amenity::Parking => &mut self.parking,
            Amenity::Pets => &mut self.pets,
            Amenity::Gym => &mut self.gym,
            Amenity::Pool => &mut self.pool,
            Amenity::Security => &mut self.security,
        }
    }

    pub fn set(&mut self, amenity: Amenity) {
        *self.flag_mut(amenity) = true;
    }

    pub fn is_set(&self, amenity: Amenity) -> bool {
        match amenity {
            Amenity::Wifi => self.wifi,
            Amenity::Laundry => self.laundry,
            Amenity::Furnished => self.furnished,
            Amenity::Parking => self.parking,
            Amenity::Pets => self.pets,
            Amenity::Gym => self.gym,
            Amenity::Pool => self.pool,
            Amenity::Security => self.security,
        }
    }

    pub fn selected(&self) -> Vec<Amenity> {
        Amenity::ALL
            .into_iter()
            .filter(|a| self.is_set(*a))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingTypeFlags {
    pub apartment: bool,
    pub house: bool,
    pub dormitory: bool,
    pub studio: bool,
}

impl HousingTypeFlags {
    pub fn set(&mut self, property_type: PropertyType) {
        match property_type {
            PropertyType::Apartment => self.apartment = true,
            PropertyType::House => self.house = true,
            PropertyType::Dormitory => self.dormitory = true,
            PropertyType::Studio => self.studio = true,
        }
    }

    pub fn is_set(&self, property_type: PropertyType) -> bool {
        match property_type {
            PropertyType::Apartment => self.apartment,
            PropertyType::House => self.house,
            PropertyType::Dormitory => self.dormitory,
            PropertyType::Studio => self.studio,
        }
    }

    pub fn selected(&self) -> Vec<PropertyType> {
        PropertyType::ALL
            .into_iter()
            .filter(|t| self.is_set(*t))
            .collect()
    }
}

/// Complete filter state of the listings view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingFilters {
    pub price_range: PriceRange,
    pub bedrooms: BedroomFilter,
    pub bathrooms: BathroomFilter,
    /// Maximum distance from campus, in miles
    pub max_distance: Option<f64>,
    pub amenities: AmenityFlags,
    pub housing_type: HousingTypeFlags,
    /// Only listings available on or before this date (undated listings pass)
    pub available_by: Option<NaiveDate>,
    pub furnished: FurnishedFilter,
    pub sort_by: SortBy,
}

impl ListingFilters {
    /// Whether a listing satisfies every active predicate
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_price(listing)
            && self.matches_bedrooms(listing)
            && self.matches_bathrooms(listing)
            && self.matches_distance(listing)
            && self.matches_availability(listing)
            && self.matches_furnished(listing)
            && self.matches_amenities(listing)
            && self.matches_housing_type(listing)
    }

    fn matches_price(&self, listing: &Listing) -> bool {
        let above_min = self.price_range.min.map_or(true, |min| listing.price >= min);
        let below_max = self.price_range.max.map_or(true, |max| listing.price <= max);
        above_min && below_max
    }

    fn matches_bedrooms(&self, listing: &Listing) -> bool {
        match self.bedrooms {
            BedroomFilter::Any => true,
            BedroomFilter::Exactly(n) => listing.bedrooms == n,
            BedroomFilter::ThreePlus => listing.bedrooms >= 3,
        }
    }

    fn matches_bathrooms(&self, listing: &Listing) -> bool {
        match self.bathrooms {
            BathroomFilter::Any => true,
            BathroomFilter::Exactly(n) => listing.bathrooms.count() == Some(n as f32),
            BathroomFilter::ThreePlus => listing.bathrooms.count().is_some_and(|c| c >= 3.0),
            BathroomFilter::Shared => listing.bathrooms.is_shared(),
        }
    }

    fn matches_distance(&self, listing: &Listing) -> bool {
        match self.max_distance {
            Some(max) => distance_miles(listing.distance_from_campus.as_deref()) <= max,
            None => true,
        }
    }

    fn matches_availability(&self, listing: &Listing) -> bool {
        match (self.available_by, listing.available_from) {
            (Some(by), Some(from)) => from <= by,
            _ => true,
        }
    }

    fn matches_furnished(&self, listing: &Listing) -> bool {
        match self.furnished {
            FurnishedFilter::Any => true,
            FurnishedFilter::Furnished => listing.furnished == Some(true),
            FurnishedFilter::Unfurnished => listing.furnished == Some(false),
        }
    }

    /// At least one selected amenity must be offered
    fn matches_amenities(&self, listing: &Listing) -> bool {
        let selected = self.amenities.selected();
        selected.is_empty() || selected.iter().any(|a| a.is_offered_by(listing))
    }

    fn matches_housing_type(&self, listing: &Listing) -> bool {
        let selected = self.housing_type.selected();
        selected.is_empty() || selected.contains(&listing.property_type)
    }
}

/// Run the filter pass then the sort; never adds listings
pub fn apply_filters(listings: &[Listing], filters: &ListingFilters) -> Vec<Listing> {
    let mut result: Vec<Listing> = listings
        .iter()
        .filter(|listing| filters.matches(listing))
        .cloned()
        .collect();
    sort_listings(&mut result, filters.sort_by);
    result
}

/// Stable sort; `Recommended` leaves the order untouched
pub fn sort_listings(listings: &mut [Listing], sort_by: SortBy) {
    match sort_by {
        SortBy::Recommended => {}
        SortBy::PriceLow => listings.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortBy::PriceHigh => listings.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortBy::Newest => listings.sort_by(|a, b| newest_first(a.available_from, b.available_from)),
        SortBy::Closest => listings.sort_by(|a, b| {
            let da = distance_miles(a.distance_from_campus.as_deref());
            let db = distance_miles(b.distance_from_campus.as_deref());
            da.total_cmp(&db)
        }),
    }
}

/// Undated listings sort after every dated one
fn newest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    b.cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fallback::static_listings;
    use crate::models::Bathrooms;

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn default_filters_keep_everything_in_order() {
        let all = static_listings();
        let result = apply_filters(&all, &ListingFilters::default());
        assert_eq!(ids(&result), ids(&all));
    }

    #[test]
    fn result_is_always_a_subset() {
        let all = static_listings();
        let mut filters = ListingFilters::default();
        filters.price_range.max = Some(900.0);
        filters.amenities.set(Amenity::Wifi);
        filters.sort_by = SortBy::PriceHigh;

        let result = apply_filters(&all, &filters);
        assert!(result.iter().all(|l| all.contains(l)));
        assert_eq!(ids(&result), vec!["1", "3", "8", "4"]);
    }

    #[test]
    fn price_low_and_high_are_reversed() {
        let all = static_listings();
        let low = apply_filters(&all, &ListingFilters { sort_by: SortBy::PriceLow, ..Default::default() });
        let high = apply_filters(&all, &ListingFilters { sort_by: SortBy::PriceHigh, ..Default::default() });

        let mut reversed = ids(&high);
        reversed.reverse();
        assert_eq!(ids(&low), reversed);
    }

    #[test]
    fn listing_without_selected_amenity_or_type_is_excluded() {
        let all = static_listings();
        let mut filters = ListingFilters::default();
        filters.amenities.set(Amenity::Pool);
        assert_eq!(ids(&apply_filters(&all, &filters)), vec!["5"]);

        let mut filters = ListingFilters::default();
        filters.housing_type.set(PropertyType::Dormitory);
        filters.housing_type.set(PropertyType::Studio);
        assert_eq!(ids(&apply_filters(&all, &filters)), vec!["3", "4", "8"]);
    }

    #[test]
    fn pets_matches_pets_allowed_listings() {
        let all = static_listings();
        let mut filters = ListingFilters::default();
        filters.amenities.set(Amenity::Pets);
        assert_eq!(ids(&apply_filters(&all, &filters)), vec!["2"]);
    }

    #[test]
    fn bedroom_and_bathroom_buckets() {
        let all = static_listings();
        let three_plus = ListingFilters { bedrooms: BedroomFilter::ThreePlus, ..Default::default() };
        assert_eq!(ids(&apply_filters(&all, &three_plus)), vec!["2", "6"]);

        let shared = ListingFilters { bathrooms: BathroomFilter::Shared, ..Default::default() };
        assert_eq!(ids(&apply_filters(&all, &shared)), vec!["4"]);

        let two = ListingFilters { bathrooms: BathroomFilter::Exactly(2), ..Default::default() };
        assert_eq!(ids(&apply_filters(&all, &two)), vec!["2", "5", "7"]);
    }

    #[test]
    fn distance_filter_treats_unknown_as_far() {
        let all = static_listings();
        let filters = ListingFilters { max_distance: Some(1.0), ..Default::default() };
        assert_eq!(ids(&apply_filters(&all, &filters)), vec!["1", "2"]);
    }

    #[test]
    fn availability_keeps_undated_listings() {
        let all = static_listings();
        let filters = ListingFilters {
            available_by: NaiveDate::from_ymd_opt(2023, 7, 20),
            ..Default::default()
        };
        let result = apply_filters(&all, &filters);
        assert!(!ids(&result).contains(&"1"));
        assert_eq!(result.len(), all.len() - 1);
    }

    #[test]
    fn furnished_requires_explicit_flag() {
        let all = static_listings();
        let filters = ListingFilters { furnished: FurnishedFilter::Unfurnished, ..Default::default() };
        assert_eq!(ids(&apply_filters(&all, &filters)), vec!["2"]);
    }

    #[test]
    fn newest_and_closest_put_unknowns_last() {
        let all = static_listings();
        let newest = apply_filters(&all, &ListingFilters { sort_by: SortBy::Newest, ..Default::default() });
        assert_eq!(&ids(&newest)[..3], &["1", "2", "3"]);

        let closest = apply_filters(&all, &ListingFilters { sort_by: SortBy::Closest, ..Default::default() });
        assert_eq!(&ids(&closest)[..3], &["1", "2", "3"]);
    }

    #[test]
    fn buckets_serialize_as_strings() {
        let filters = ListingFilters {
            bedrooms: BedroomFilter::ThreePlus,
            bathrooms: BathroomFilter::Exactly(1),
            ..Default::default()
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["bedrooms"], "3+");
        assert_eq!(json["bathrooms"], "1");
        assert_eq!(json["sortBy"], "recommended");

        let back: ListingFilters = serde_json::from_value(json).unwrap();
        assert_eq!(back, filters);
    }

    #[test]
    fn fractional_bathrooms_do_not_match_exact_bucket() {
        let mut listing = static_listings().remove(5);
        listing.bathrooms = Bathrooms::Count(2.5);
        let filters = ListingFilters { bathrooms: BathroomFilter::Exactly(2), ..Default::default() };
        assert!(!filters.matches(&listing));
    }
}

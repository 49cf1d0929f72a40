use crate::models::{Bathrooms, Listing, PropertyType};
use chrono::NaiveDate;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn basic(
    id: &str,
    title: &str,
    description: &str,
    price: f64,
    property_type: PropertyType,
    bedrooms: u32,
    bathrooms: Bathrooms,
    square_feet: u32,
    amenities: &[&str],
    image: &str,
    location: &str,
) -> Listing {
    Listing {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        detailed_description: None,
        price,
        property_type,
        bedrooms,
        bathrooms,
        square_feet: Some(square_feet),
        location: location.to_string(),
        address: None,
        amenities: strings(amenities),
        images: vec![image.to_string()],
        available_from: None,
        lease_term: None,
        pets_allowed: None,
        furnished: None,
        distance_from_campus: None,
        utilities_included: Vec::new(),
        nearby_places: Vec::new(),
        is_available: true,
        owner_id: None,
        created_at: None,
        updated_at: None,
    }
}

/// Built-in catalogue served when no hosted backend is configured
pub fn static_listings() -> Vec<Listing> {
    vec![
        Listing {
            detailed_description: Some(
                "This beautifully renovated apartment is perfect for students who want to be close to campus without sacrificing comfort. The building has secure entry, on-site laundry, and a small community area for studying or socializing.".to_string(),
            ),
            address: Some("123 University Ave, College Town, ST 12345".to_string()),
            images: strings(&[
                "https://images.unsplash.com/photo-1560448204-e02f11c3d0e2?auto=format&fit=crop&w=800&q=80",
                "https://images.unsplash.com/photo-1564013799919-ab600027ffc6?auto=format&fit=crop&w=800&q=80",
                "https://images.unsplash.com/photo-1598928506311-c55ded91a20c?auto=format&fit=crop&w=800&q=80",
            ]),
            available_from: NaiveDate::from_ymd_opt(2023, 8, 1),
            lease_term: Some("12 months".to_string()),
            pets_allowed: Some(false),
            furnished: Some(true),
            distance_from_campus: Some("0.2 miles".to_string()),
            utilities_included: strings(&["Water", "Internet", "Trash", "Electricity"]),
            nearby_places: strings(&[
                "State University Library",
                "College Café",
                "Campus Bookstore",
                "University Health Center",
            ]),
            owner_id: Some("landlord1".to_string()),
            ..basic(
                "1",
                "Modern Campus View Apartment",
                "2 blocks from State University, utilities included",
                850.0,
                PropertyType::Apartment,
                2,
                Bathrooms::Count(1.0),
                750,
                &["WiFi", "Laundry", "Furnished", "Security System", "Study Area"],
                "https://images.unsplash.com/photo-1560448204-e02f11c3d0e2?auto=format&fit=crop&w=800&q=80",
                "Near State University",
            )
        },
        Listing {
            detailed_description: Some(
                "This charming house is ideal for a group of students looking to share accommodations. The backyard is perfect for outdoor gatherings and relaxing after classes.".to_string(),
            ),
            address: Some("456 College St, College Town, ST 12345".to_string()),
            available_from: NaiveDate::from_ymd_opt(2023, 7, 15),
            lease_term: Some("12 months".to_string()),
            pets_allowed: Some(true),
            furnished: Some(false),
            distance_from_campus: Some("0.3 miles".to_string()),
            utilities_included: strings(&["Water", "Trash"]),
            nearby_places: strings(&[
                "Campus Main Gate",
                "Student Union",
                "University Recreation Center",
                "College Town Grocery",
            ]),
            owner_id: Some("landlord2".to_string()),
            ..basic(
                "2",
                "Collegiate Corner House",
                "5 min walk to campus, recently renovated",
                1200.0,
                PropertyType::House,
                3,
                Bathrooms::Count(2.0),
                1200,
                &["Parking", "Backyard", "Pets Allowed", "Washer/Dryer", "High-Speed Internet"],
                "https://images.unsplash.com/photo-1536376072261-38c75010e6c9?auto=format&fit=crop&w=800&q=80",
                "College District",
            )
        },
        basic(
            "3",
            "Bright Downtown Studio",
            "10 min bus ride to campus, all utilities included",
            750.0,
            PropertyType::Studio,
            1,
            Bathrooms::Count(1.0),
            450,
            &["WiFi", "Furnished", "Gym"],
            "https://images.unsplash.com/photo-1522708323590-d24dbb6b0267?auto=format&fit=crop&w=800&q=80",
            "Downtown",
        ),
        basic(
            "4",
            "University Heights Dorm",
            "On campus, meal plan available, shared bathrooms",
            650.0,
            PropertyType::Dormitory,
            1,
            Bathrooms::SHARED,
            300,
            &["WiFi", "Meal Plan", "Laundry"],
            "https://images.unsplash.com/photo-1502672260266-1c1ef2d93688?auto=format&fit=crop&w=800&q=80",
            "On Campus",
        ),
        basic(
            "5",
            "Parkside Student Apartments",
            "Across from City Park, 15 min walk to campus",
            950.0,
            PropertyType::Apartment,
            2,
            Bathrooms::Count(2.0),
            850,
            &["WiFi", "Pool", "Gym"],
            "https://images.unsplash.com/photo-1493809842364-78817add7ffb?auto=format&fit=crop&w=800&q=80",
            "City Park Area",
        ),
        basic(
            "6",
            "Student Group House",
            "Perfect for groups, close to campus and downtown",
            1800.0,
            PropertyType::House,
            4,
            Bathrooms::Count(2.5),
            1800,
            &["Parking", "Laundry", "Backyard"],
            "https://images.unsplash.com/photo-1556912173-46c336c7fd55?auto=format&fit=crop&w=800&q=80",
            "College District",
        ),
        basic(
            "7",
            "Luxury Campus Apartment",
            "Modern amenities, walking distance to university",
            1100.0,
            PropertyType::Apartment,
            2,
            Bathrooms::Count(2.0),
            900,
            &["WiFi", "Gym", "Security"],
            "https://images.unsplash.com/photo-1524758631624-e2822e304c36?auto=format&fit=crop&w=800&q=80",
            "University District",
        ),
        basic(
            "8",
            "Cozy Campus Studio",
            "All utilities included, perfect for singles",
            700.0,
            PropertyType::Studio,
            1,
            Bathrooms::Count(1.0),
            400,
            &["WiFi", "Furnished", "Utilities Included"],
            "https://images.unsplash.com/photo-1505691938895-1758d7feb511?auto=format&fit=crop&w=800&q=80",
            "Campus Edge",
        ),
    ]
}

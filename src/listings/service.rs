use crate::backend::{
    content_type_for, decode_rows, Backend, Query, LISTINGS_BUCKET, LISTINGS_TABLE,
};
use crate::error::{Error, Result};
use crate::listings::filter::{apply_filters, ListingFilters};
use crate::models::{Bathrooms, Listing, NewListing, PropertyType};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Raw listing form input, as typed by the owner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub property_type: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_feet: String,
    pub location: String,
    pub address: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub available_from: String,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ListingForm {
    /// Take every field the form leaves blank from the stored listing
    pub fn fill_blanks_from(&mut self, current: &Listing) {
        fn fill(field: &mut String, value: impl FnOnce() -> Option<String>) {
            if field.trim().is_empty() {
                if let Some(value) = value() {
                    *field = value;
                }
            }
        }

        fill(&mut self.title, || Some(current.title.clone()));
        fill(&mut self.description, || Some(current.description.clone()));
        fill(&mut self.price, || Some(current.price.to_string()));
        fill(&mut self.property_type, || Some(current.property_type.to_string()));
        fill(&mut self.bedrooms, || Some(current.bedrooms.to_string()));
        fill(&mut self.bathrooms, || Some(current.bathrooms.to_string()));
        fill(&mut self.square_feet, || current.square_feet.map(|n| n.to_string()));
        fill(&mut self.location, || Some(current.location.clone()));
        fill(&mut self.address, || current.address.clone());
        fill(&mut self.available_from, || {
            current.available_from.map(|d| d.format("%Y-%m-%d").to_string())
        });

        if self.amenities.is_empty() {
            self.amenities = current.amenities.clone();
        }
        if self.images.is_empty() {
            self.images = current.images.clone();
        }
    }

    /// Check required and numeric fields, then build the insertable listing
    pub fn validate(&self) -> Result<NewListing> {
        let required = [
            ("title", &self.title),
            ("price", &self.price),
            ("propertyType", &self.property_type),
            ("bedrooms", &self.bedrooms),
            ("bathrooms", &self.bathrooms),
            ("address", &self.address),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingFields(missing));
        }

        let shared_bathrooms = self.bathrooms.trim().eq_ignore_ascii_case("shared");
        let numeric = [
            ("price", &self.price, false),
            ("bedrooms", &self.bedrooms, false),
            ("bathrooms", &self.bathrooms, shared_bathrooms),
            ("squareFeet", &self.square_feet, false),
        ];
        let invalid: Vec<String> = numeric
            .iter()
            .filter(|(_, value, exempt)| {
                !exempt && !value.trim().is_empty() && parse_number(value).is_none()
            })
            .map(|(name, _, _)| name.to_string())
            .collect();
        if !invalid.is_empty() {
            return Err(Error::InvalidNumbers(invalid));
        }

        let property_type = PropertyType::from_str(&self.property_type).map_err(Error::Validation)?;

        let available_from = match optional(&self.available_from) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                Error::Validation(format!("availableFrom must be YYYY-MM-DD, got {raw}"))
            })?),
            None => None,
        };

        let bathrooms = if shared_bathrooms {
            Bathrooms::SHARED
        } else {
            Bathrooms::Count(parse_number(&self.bathrooms).unwrap_or_default() as f32)
        };

        Ok(NewListing {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price: parse_number(&self.price).unwrap_or_default(),
            property_type,
            bedrooms: parse_number(&self.bedrooms).unwrap_or_default() as u32,
            bathrooms,
            square_feet: parse_number(&self.square_feet).map(|n| n as u32),
            location: self.location.trim().to_string(),
            address: optional(&self.address),
            amenities: self.amenities.clone(),
            images: self.images.clone(),
            available_from,
            is_available: true,
        })
    }
}

/// Order for an owner's own listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MyListingsSort {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
}

impl FromStr for MyListingsSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            other => Err(format!("invalid sort order: {other}")),
        }
    }
}

/// An image file to attach to a listing
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Listing CRUD over the hosted `listings` table
///
/// The full table is fetched once and cached; every successful mutation drops
/// the cache so the next read refetches everything.
pub struct ListingService {
    backend: Arc<dyn Backend>,
    cache: Mutex<Option<Vec<Listing>>>,
}

impl ListingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(None),
        }
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Every listing, newest first
    pub async fn list(&self) -> Result<Vec<Listing>> {
        let mut cache = self.cache.lock().await;
        if let Some(listings) = cache.as_ref() {
            return Ok(listings.clone());
        }

        let rows = self
            .backend
            .select(&Query::table(LISTINGS_TABLE).order("createdAt", false))
            .await?;
        let listings: Vec<Listing> = decode_rows(rows)?;
        info!(
            "Fetched {} listings from {} backend",
            listings.len(),
            self.backend.source_name()
        );
        *cache = Some(listings.clone());
        Ok(listings)
    }

    /// Filter and sort the cached listing set
    pub async fn search(&self, filters: &ListingFilters) -> Result<Vec<Listing>> {
        Ok(apply_filters(&self.list().await?, filters))
    }

    pub async fn get(&self, id: &str) -> Result<Listing> {
        let rows = self
            .backend
            .select(&Query::table(LISTINGS_TABLE).eq("id", id))
            .await?;
        decode_rows::<Listing>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                entity: "Listing",
                id: id.to_string(),
            })
    }

    async fn owned(&self, owner: &str, id: &str) -> Result<Listing> {
        let listing = self.get(id).await?;
        if !listing.is_owned_by(owner) {
            return Err(Error::Forbidden(
                "You do not have permission to edit this listing".to_string(),
            ));
        }
        Ok(listing)
    }

    pub async fn create(&self, owner: &str, form: &ListingForm) -> Result<Listing> {
        let new_listing = form.validate()?;
        let now = Utc::now();
        let mut row = serde_json::to_value(&new_listing)?;
        if let Value::Object(fields) = &mut row {
            fields.insert("userId".to_string(), json!(owner));
            fields.insert("createdAt".to_string(), json!(now));
            fields.insert("updatedAt".to_string(), json!(now));
        }

        let stored = self.backend.insert(LISTINGS_TABLE, row).await?;
        self.invalidate().await;
        let listing: Listing = serde_json::from_value(stored)?;
        info!("Created listing {} '{}'", listing.id, listing.title);
        Ok(listing)
    }

    pub async fn update(&self, owner: &str, id: &str, form: &ListingForm) -> Result<Listing> {
        let current = self.owned(owner, id).await?;
        let mut form = form.clone();
        form.fill_blanks_from(&current);
        let changes = form.validate()?;
        let mut row = serde_json::to_value(&changes)?;
        if let Value::Object(fields) = &mut row {
            // availability only changes through set_available
            fields.remove("isAvailable");
            fields.insert("updatedAt".to_string(), json!(Utc::now()));
        }

        self.apply_update(id, row).await
    }

    /// Toggle the soft-availability flag
    pub async fn set_available(&self, owner: &str, id: &str, available: bool) -> Result<Listing> {
        self.owned(owner, id).await?;
        self.apply_update(
            id,
            json!({ "isAvailable": available, "updatedAt": Utc::now() }),
        )
        .await
    }

    async fn apply_update(&self, id: &str, changes: Value) -> Result<Listing> {
        let rows = self
            .backend
            .update(&Query::table(LISTINGS_TABLE).eq("id", id), changes)
            .await?;
        self.invalidate().await;
        debug!("Updated listing {}", id);

        decode_rows::<Listing>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                entity: "Listing",
                id: id.to_string(),
            })
    }

    /// Delete an owned listing; favorites pointing at it are left in place
    pub async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        self.owned(owner, id).await?;
        self.backend
            .delete(&Query::table(LISTINGS_TABLE).eq("id", id))
            .await?;
        self.invalidate().await;
        info!("Deleted listing {}", id);
        Ok(())
    }

    /// The owner's listings whose title or description contains `search`
    pub async fn my_listings(
        &self,
        owner: &str,
        search: Option<&str>,
        sort: MyListingsSort,
    ) -> Result<Vec<Listing>> {
        let needle = search.map(str::to_lowercase).filter(|s| !s.is_empty());
        let mut mine: Vec<Listing> = self
            .list()
            .await?
            .into_iter()
            .filter(|listing| listing.is_owned_by(owner))
            .filter(|listing| match &needle {
                Some(needle) => {
                    listing.title.to_lowercase().contains(needle)
                        || listing.description.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();

        match sort {
            MyListingsSort::Newest => mine.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            MyListingsSort::Oldest => mine.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            MyListingsSort::PriceLow => mine.sort_by(|a, b| a.price.total_cmp(&b.price)),
            MyListingsSort::PriceHigh => mine.sort_by(|a, b| b.price.total_cmp(&a.price)),
        }
        Ok(mine)
    }

    /// Store images under the owner's folder and return their public URLs
    pub async fn upload_images(&self, owner: &str, files: Vec<ImageUpload>) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let ext = file
                .file_name
                .rsplit_once('.')
                .map(|(_, ext)| ext)
                .unwrap_or("bin");
            let path = format!("{}/{}.{}", owner, Uuid::new_v4(), ext);
            self.backend
                .upload(
                    LISTINGS_BUCKET,
                    &path,
                    file.bytes,
                    content_type_for(&file.file_name),
                )
                .await?;
            urls.push(self.backend.public_url(LISTINGS_BUCKET, &path));
        }
        info!("Uploaded {} images for {}", urls.len(), owner);
        Ok(urls)
    }
}

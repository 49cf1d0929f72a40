pub mod filter;
pub mod history;
pub mod parse;
pub mod presets;
pub mod query;
pub mod service;

pub use filter::{apply_filters, Amenity, ListingFilters, SortBy};
pub use history::SearchHistory;
pub use presets::{SavedFilter, SavedFilters};
pub use query::{interpret_query, suggestions};
pub use service::{ImageUpload, ListingForm, ListingService, MyListingsSort};

pub mod fallback;
pub mod hosted;
pub mod memory;
pub mod traits;

pub use hosted::HostedBackend;
pub use memory::MemoryBackend;
pub use traits::Backend;

pub const LISTINGS_TABLE: &str = "listings";
pub const FAVORITES_TABLE: &str = "favorites";
pub const USERS_TABLE: &str = "users";

pub const LISTINGS_BUCKET: &str = "listings";
pub const PROFILE_PICTURES_BUCKET: &str = "profile-pictures";

/// Decode table rows into typed records
pub(crate) fn decode_rows<T: serde::de::DeserializeOwned>(
    rows: Vec<serde_json::Value>,
) -> crate::error::Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Guess a content type from a file name's extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Column ordering for a select
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A table query: equality filters ANDed together, plus optional ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<(String, String)>,
    pub order: Option<Order>,
}

impl Query {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }
}

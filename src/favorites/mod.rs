pub mod local;
pub mod remote;
pub mod traits;

pub use local::LocalFavorites;
pub use remote::RemoteFavorites;
pub use traits::{Collections, FavoritesStore};

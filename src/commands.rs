use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use letmeknock::auth::SignUpForm;
use letmeknock::listings::filter::{BathroomFilter, BedroomFilter, FurnishedFilter};
use letmeknock::listings::parse::price_bound;
use letmeknock::listings::{
    interpret_query, suggestions, Amenity, ImageUpload, ListingFilters, ListingForm,
    MyListingsSort, SortBy,
};
use letmeknock::models::{Listing, ProfileUpdate, PropertyType};
use letmeknock::App;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "letmeknock")]
#[command(version)]
#[command(about = "Find, save and manage student housing listings")]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Browse listings with filters and natural-language search
    Listings(SearchArgs),
    /// Show one listing in full
    Show { id: String },
    /// Suggest completions for a partial search
    Suggest { text: String },
    /// Show, prune or clear recent searches
    History {
        #[arg(long)]
        clear: bool,
        /// Forget the entry with this number (as listed)
        #[arg(long, conflicts_with = "clear")]
        remove: Option<usize>,
    },
    /// Manage saved filter presets
    Presets {
        #[command(subcommand)]
        command: Option<PresetCommand>,
    },
    /// Favorites and collections
    Favorites {
        /// Use the hosted favorites table instead of this device
        #[arg(long)]
        remote: bool,
        #[command(subcommand)]
        command: FavoriteCommand,
    },
    /// Sign in, sign up, sign out
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Listings owned by the signed-in user
    MyListings {
        #[arg(long)]
        search: Option<String>,
        /// newest, oldest, price-low or price-high
        #[arg(long, default_value = "newest")]
        sort: MyListingsSort,
    },
    /// Create, edit or delete your listings
    Listing {
        #[command(subcommand)]
        command: ListingCommand,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Args, Default)]
pub struct SearchArgs {
    /// Free text, e.g. "2 bed apartment under 900 near campus"
    #[arg(short, long)]
    query: Option<String>,
    /// recommended, price-low, price-high, newest or closest
    #[arg(long)]
    sort: Option<SortBy>,
    /// Lower price bound, e.g. 500 or "$1,200"; blank clears a preset's bound
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    /// any, 1, 2 or 3+
    #[arg(long)]
    bedrooms: Option<BedroomFilter>,
    /// any, 1, 2, 3+ or shared
    #[arg(long)]
    bathrooms: Option<BathroomFilter>,
    /// Maximum distance from campus in miles
    #[arg(long)]
    max_distance: Option<f64>,
    #[arg(long = "type")]
    types: Vec<PropertyType>,
    #[arg(long = "amenity")]
    amenities: Vec<Amenity>,
    /// Available on or before this date (YYYY-MM-DD)
    #[arg(long)]
    available_by: Option<NaiveDate>,
    /// any, furnished or unfurnished
    #[arg(long)]
    furnished: Option<FurnishedFilter>,
    /// Start from a saved preset
    #[arg(long)]
    preset: Option<String>,
    /// Save the resulting filters under this name
    #[arg(long)]
    save_as: Option<String>,
}

#[derive(Subcommand)]
pub enum PresetCommand {
    List,
    Delete { index: usize },
}

#[derive(Subcommand)]
pub enum FavoriteCommand {
    List,
    Add { id: String },
    Remove { id: String },
    /// Set a note; omit the text to clear it
    Note { id: String, text: Option<String> },
    Collections,
    CreateCollection { name: String },
    Collect { name: String, id: String },
    Uncollect { name: String, id: String },
    DropCollection { name: String },
}

#[derive(Subcommand)]
pub enum AuthCommand {
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LETMEKNOCK_PASSWORD")]
        password: String,
    },
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LETMEKNOCK_PASSWORD")]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        agree_terms: bool,
    },
    SignOut,
    Whoami,
}

#[derive(Subcommand)]
pub enum ListingCommand {
    /// Create from a JSON listing form, optionally uploading images
    Create {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    Available { id: String, available: bool },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    Show,
    SetName { name: String },
    Avatar { path: PathBuf },
}

pub async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Listings(args) => search(app, args).await,
        Command::Show { id } => {
            let listing = app.listings().get(&id).await?;
            print_detail(&listing);
            Ok(())
        }
        Command::Suggest { text } => {
            for suggestion in suggestions(&text) {
                println!("{suggestion}");
            }
            Ok(())
        }
        Command::History { clear, remove } => {
            let history = app.history();
            if clear {
                history.clear().await?;
                return Ok(());
            }

            let entries = match remove {
                // listed numbers start at 1
                Some(number) => match number.checked_sub(1) {
                    Some(index) => history.remove(index).await?,
                    None => history.entries().await,
                },
                None => history.entries().await,
            };
            for (i, entry) in entries.iter().enumerate() {
                println!("{}. {}", i + 1, entry);
            }
            Ok(())
        }
        Command::Presets { command } => presets(app, command.unwrap_or(PresetCommand::List)).await,
        Command::Favorites { remote, command } => favorites(app, remote, command).await,
        Command::Auth { command } => auth(app, command).await,
        Command::MyListings { search, sort } => {
            let owner = app.auth().require_user().await?;
            let mine = app
                .listings()
                .my_listings(&owner, search.as_deref(), sort)
                .await?;
            print_listings(&mine);
            Ok(())
        }
        Command::Listing { command } => listing(app, command).await,
        Command::Profile { command } => profile(app, command).await,
    }
}

impl SearchArgs {
    /// Explicit flags on top of a base filter state
    fn apply_to(&self, mut filters: ListingFilters) -> ListingFilters {
        if let Some(sort) = self.sort {
            filters.sort_by = sort;
        }
        if let Some(min) = &self.min_price {
            filters.price_range.min = price_bound(min);
        }
        if let Some(max) = &self.max_price {
            filters.price_range.max = price_bound(max);
        }
        if let Some(bedrooms) = self.bedrooms {
            filters.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            filters.bathrooms = bathrooms;
        }
        if self.max_distance.is_some() {
            filters.max_distance = self.max_distance;
        }
        for property_type in &self.types {
            filters.housing_type.set(*property_type);
        }
        for amenity in &self.amenities {
            filters.amenities.set(*amenity);
        }
        if self.available_by.is_some() {
            filters.available_by = self.available_by;
        }
        if let Some(furnished) = self.furnished {
            filters.furnished = furnished;
        }
        filters
    }
}

async fn search(app: &App, args: SearchArgs) -> Result<()> {
    let presets = app.presets();
    let base = match &args.preset {
        Some(name) => presets
            .find(name)
            .await
            .with_context(|| format!("No saved filter named '{name}'"))?,
        None => ListingFilters::default(),
    };

    let mut filters = args.apply_to(base);
    if let Some(query) = args.query.as_deref().filter(|q| !q.trim().is_empty()) {
        app.history().record(query).await?;
        filters = interpret_query(query, &filters);
    }

    if let Some(name) = &args.save_as {
        presets.save(name, &filters).await?;
    }

    let results = app.listings().search(&filters).await?;
    info!("✅ {} listings match", results.len());
    print_listings(&results);
    Ok(())
}

async fn presets(app: &App, command: PresetCommand) -> Result<()> {
    let presets = app.presets();
    let saved = match command {
        PresetCommand::List => presets.list().await,
        PresetCommand::Delete { index } => presets.delete(index).await?,
    };
    for (i, preset) in saved.iter().enumerate() {
        println!("{}. {}", i, preset.name);
    }
    Ok(())
}

async fn favorites(app: &App, remote: bool, command: FavoriteCommand) -> Result<()> {
    let store = app.favorites(remote).await?;
    let listings = app.listings();
    info!("Using {} favorites", store.source_name());

    match command {
        FavoriteCommand::List => {
            for id in store.favorite_ids().await? {
                let note = store.note(&id).await?;
                match note {
                    Some(note) => println!("{id}  ({note})"),
                    None => println!("{id}"),
                }
            }
        }
        FavoriteCommand::Add { id } => store.add(&listings.get(&id).await?).await?,
        FavoriteCommand::Remove { id } => store.remove(&id).await?,
        FavoriteCommand::Note { id, text } => {
            store.set_note(&id, text.as_deref().unwrap_or_default()).await?
        }
        FavoriteCommand::Collections => {
            for (name, members) in store.collections().await? {
                println!("{} [{}]", name, members.join(", "));
            }
        }
        FavoriteCommand::CreateCollection { name } => {
            store.create_collection(&name).await?;
            if let Some(notice) = empty_collection_notice(remote, &name) {
                println!("{notice}");
            }
        }
        FavoriteCommand::Collect { name, id } => {
            store.add_to_collection(&name, &listings.get(&id).await?).await?
        }
        FavoriteCommand::Uncollect { name, id } => {
            store.remove_from_collection(&name, &id).await?
        }
        FavoriteCommand::DropCollection { name } => store.delete_collection(&name).await?,
    }
    Ok(())
}

async fn auth(app: &App, command: AuthCommand) -> Result<()> {
    let auth = app.auth();
    match command {
        AuthCommand::SignIn { email, password } => {
            let session = auth.sign_in(&email, &password).await?;
            println!("Signed in as {}", session.user.id);
        }
        AuthCommand::SignUp {
            email,
            password,
            confirm_password,
            agree_terms,
        } => {
            let session = auth
                .sign_up(&SignUpForm {
                    email,
                    password,
                    confirm_password,
                    agree_terms,
                })
                .await?;
            println!("Welcome, {}", session.user.id);
        }
        AuthCommand::SignOut => auth.sign_out().await?,
        AuthCommand::Whoami => match auth.current().await {
            Some(session) => println!(
                "{} ({})",
                session.user.id,
                session.user.email.unwrap_or_default()
            ),
            None => println!("Not signed in"),
        },
    }
    Ok(())
}

async fn read_form(path: &Path) -> Result<ListingForm> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid listing form in {}", path.display()))
}

async fn listing(app: &App, command: ListingCommand) -> Result<()> {
    let owner = app.auth().require_user().await?;
    let service = app.listings();

    match command {
        ListingCommand::Create { file, images } => {
            let mut form = read_form(&file).await?;
            let mut uploads = Vec::with_capacity(images.len());
            for path in &images {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string());
                uploads.push(ImageUpload { file_name, bytes });
            }
            if !uploads.is_empty() {
                form.images.extend(service.upload_images(&owner, uploads).await?);
            }

            let created = service.create(&owner, &form).await?;
            println!("Listing created successfully: {}", created.id);
        }
        ListingCommand::Update { id, file } => {
            let form = read_form(&file).await?;
            service.update(&owner, &id, &form).await?;
            println!("Listing updated successfully");
        }
        ListingCommand::Available { id, available } => {
            service.set_available(&owner, &id, available).await?;
        }
        ListingCommand::Delete { id } => {
            service.delete(&owner, &id).await?;
            println!("Listing deleted successfully");
        }
    }
    Ok(())
}

async fn profile(app: &App, command: ProfileCommand) -> Result<()> {
    let user_id = app.auth().require_user().await?;
    let profiles = app.profiles();

    match command {
        ProfileCommand::Show => {
            let profile = profiles.get(&user_id).await?;
            println!("{} <{}>", profile.name, profile.email);
            if let Some(max_rent) = profile.preferences.max_rent {
                println!("   Max rent: ${max_rent}");
            }
            if !profile.preferences.housing_type.is_empty() {
                println!("   Housing: {}", profile.preferences.housing_type.join(", "));
            }
        }
        ProfileCommand::SetName { name } => {
            let update = ProfileUpdate {
                name: Some(name),
                ..Default::default()
            };
            profiles.update(&user_id, &update).await?;
        }
        ProfileCommand::Avatar { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "avatar".to_string());
            let url = profiles.upload_avatar(&user_id, &file_name, bytes).await?;
            println!("{url}");
        }
    }
    Ok(())
}

/// Hosted collections are only the tags on favorite rows, so an empty one is not stored
fn empty_collection_notice(remote: bool, name: &str) -> Option<String> {
    remote.then(|| {
        format!(
            "Collection '{name}' will appear once a listing is in it: letmeknock favorites --remote collect '{name}' <id>"
        )
    })
}

fn print_listings(listings: &[Listing]) {
    for (i, listing) in listings.iter().enumerate() {
        println!("{}. {} (${}/mo)", i + 1, listing.title, listing.price);
        println!(
            "   {} · {} bd · {} ba · {}",
            listing.property_type, listing.bedrooms, listing.bathrooms, listing.location
        );
        if let Some(distance) = &listing.distance_from_campus {
            println!("   {distance} from campus");
        }
        println!("   ID: {}", listing.id);
        println!();
    }
}

fn print_detail(listing: &Listing) {
    print_listings(std::slice::from_ref(listing));
    println!(
        "   {}",
        listing
            .detailed_description
            .as_deref()
            .unwrap_or(&listing.description)
    );
    if let Some(address) = &listing.address {
        println!("   Address: {address}");
    }
    if let Some(date) = listing.available_from {
        println!("   Available from: {date}");
    }
    if !listing.amenities.is_empty() {
        println!("   Amenities: {}", listing.amenities.join(", "));
    }
    if !listing.utilities_included.is_empty() {
        println!("   Utilities: {}", listing.utilities_included.join(", "));
    }
    if !listing.is_available {
        println!("   (no longer available)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "letmeknock",
            "listings",
            "--query",
            "dorm",
            "--sort",
            "price-low",
            "--bedrooms",
            "3+",
            "--type",
            "studio",
            "--amenity",
            "wifi",
        ])
        .unwrap();

        let Command::Listings(args) = cli.command else {
            panic!("expected listings command");
        };
        let filters = args.apply_to(ListingFilters::default());
        assert_eq!(filters.sort_by, SortBy::PriceLow);
        assert_eq!(filters.bedrooms, BedroomFilter::ThreePlus);
        assert!(filters.housing_type.studio);
        assert!(filters.amenities.wifi);
    }

    #[test]
    fn flags_override_preset_values() {
        let base = ListingFilters {
            sort_by: SortBy::Newest,
            ..Default::default()
        };
        let args = SearchArgs {
            max_price: Some("700".to_string()),
            ..Default::default()
        };
        let filters = args.apply_to(base);
        assert_eq!(filters.sort_by, SortBy::Newest);
        assert_eq!(filters.price_range.max, Some(700.0));
    }

    #[test]
    fn price_flags_accept_typed_amounts() {
        let base = ListingFilters {
            price_range: letmeknock::listings::filter::PriceRange {
                min: Some(300.0),
                max: Some(900.0),
            },
            ..Default::default()
        };
        let args = SearchArgs {
            min_price: Some(" ".to_string()),
            max_price: Some("$1,200".to_string()),
            ..Default::default()
        };
        let filters = args.apply_to(base);
        assert_eq!(filters.price_range.min, None);
        assert_eq!(filters.price_range.max, Some(1200.0));
    }

    #[test]
    fn history_remove_flag_parses() {
        let cli = Cli::try_parse_from(["letmeknock", "history", "--remove", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History {
                clear: false,
                remove: Some(2)
            }
        ));
        assert!(Cli::try_parse_from(["letmeknock", "history", "--clear", "--remove", "1"]).is_err());
    }

    #[test]
    fn only_remote_empty_collections_get_a_notice() {
        assert_eq!(empty_collection_notice(false, "Shortlist"), None);
        let notice = empty_collection_notice(true, "Shortlist").unwrap();
        assert!(notice.contains("collect 'Shortlist'"));
    }
}

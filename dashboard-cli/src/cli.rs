use anyhow::Context;
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Coordinates, Dashboard, FileStore, FixedPosition, Geolocator, IpGeolocator,
    OpenWeatherClient, Preferences, Theme, UnitSystem, Unsupported,
    geolocation::DEFAULT_IP_LOOKUP_BASE,
};
use inquire::{InquireError, Password, Select, Text};
use std::fmt;

use crate::terminal::Terminal;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key, default city and units.
    Configure,

    /// Show the dashboard for a city.
    Show {
        /// City name, e.g. "Jakarta".
        city: String,

        /// metric or imperial; defaults to the configured units.
        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,

        /// Toggle the city in favorites after it is displayed.
        #[arg(long)]
        favorite: bool,
    },

    /// Show the dashboard for your current position.
    Locate {
        /// Latitude; without it the position is looked up from your IP address.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,
    },

    /// Menu-driven dashboard: search, locate, switch units, theme, favorites.
    Interactive {
        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,
    },

    /// Show the theme, or set it to light/dark. `toggle` flips it.
    Theme { theme: Option<String> },

    /// List favorite cities.
    Favorites,

    /// List recent searches, most recent first.
    Recent,
}

fn parse_units(value: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, favorite } => {
                let prefs = open_preferences()?;
                let session = Session::open(&prefs)?;
                let dash = session.dashboard(&Unsupported, prefs, units);

                let rendered = dash.search(&city).await.is_some_and(|o| o.is_rendered());
                if rendered && favorite {
                    let now = dash.toggle_favorite()?;
                    let verb = if now { "added to" } else { "removed from" };
                    println!("{} {verb} favorites.", city_label(&dash));
                } else if rendered && dash.is_current_favorite() {
                    println!("★ favorite");
                }
                Ok(())
            }
            Command::Locate { lat, lon, units } => {
                let prefs = open_preferences()?;
                let session = Session::open(&prefs)?;
                let geolocator: Box<dyn Geolocator> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Box::new(FixedPosition(Coordinates::new(lat, lon))),
                    _ => Box::new(IpGeolocator::new(DEFAULT_IP_LOOKUP_BASE)?),
                };
                let dash = session.dashboard(geolocator.as_ref(), prefs, units);
                dash.locate().await;
                Ok(())
            }
            Command::Interactive { units } => {
                let prefs = open_preferences()?;
                let session = Session::open(&prefs)?;
                let geolocator = IpGeolocator::new(DEFAULT_IP_LOOKUP_BASE)?;
                interactive(&session, session.dashboard(&geolocator, prefs, units)).await
            }
            Command::Theme { theme } => {
                let mut prefs = open_preferences()?;
                let next = match theme.as_deref() {
                    None => {
                        println!("{}", prefs.theme());
                        return Ok(());
                    }
                    Some("toggle") => prefs.toggle_theme()?,
                    Some(name) => {
                        let theme = Theme::try_from(name)?;
                        prefs.set_theme(theme)?;
                        theme
                    }
                };
                println!("Theme set to {next}.");
                Ok(())
            }
            Command::Favorites => {
                print_list("No favorite cities yet.", open_preferences()?.favorites());
                Ok(())
            }
            Command::Recent => {
                print_list("No recent searches.", open_preferences()?.recent_searches());
                Ok(())
            }
        }
    }
}

/// What a dashboard borrows, owned for the duration of one command.
struct Session {
    config: Config,
    api: OpenWeatherClient,
    screen: Terminal,
}

impl Session {
    fn open(prefs: &Preferences) -> anyhow::Result<Self> {
        let config = Config::load()?;
        let api = OpenWeatherClient::new(config.api_key()?, config.endpoints.clone())
            .context("Failed to build HTTP client")?;

        Ok(Self { config, api, screen: Terminal::new(prefs.theme()) })
    }

    fn dashboard<'a>(
        &'a self,
        geolocator: &'a dyn Geolocator,
        prefs: Preferences,
        units: Option<UnitSystem>,
    ) -> Dashboard<'a> {
        let units = units.unwrap_or(self.config.units());
        Dashboard::new(&self.api, geolocator, &self.screen, prefs, units)
    }
}

fn open_preferences() -> anyhow::Result<Preferences> {
    let path = Config::preferences_file_path()?;
    Ok(Preferences::load(Box::new(FileStore::open(path)?)))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let mut key_prompt = Password::new("OpenWeather API key:").without_confirmation();
    if config.stored_api_key().is_some() {
        key_prompt = key_prompt.with_help_message("Leave empty to keep the current key");
    }
    let api_key = key_prompt.prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let city = Text::new("Default city:").with_default(config.default_city()).prompt()?;
    config.default_city = Some(city.trim().to_string());

    let units = Select::new("Units:", UnitSystem::all().to_vec())
        .with_starting_cursor(if config.units() == UnitSystem::Imperial { 1 } else { 0 })
        .prompt()?;
    config.units = Some(units);

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    Search,
    Recent,
    Locate,
    SwitchUnits,
    ToggleTheme,
    ToggleFavorite,
    Favorites,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 8] = [
        MenuItem::Search,
        MenuItem::Recent,
        MenuItem::Locate,
        MenuItem::SwitchUnits,
        MenuItem::ToggleTheme,
        MenuItem::ToggleFavorite,
        MenuItem::Favorites,
        MenuItem::Quit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Search => "Search city",
            MenuItem::Recent => "Recent searches",
            MenuItem::Locate => "Use my location",
            MenuItem::SwitchUnits => "Switch units",
            MenuItem::ToggleTheme => "Toggle theme",
            MenuItem::ToggleFavorite => "Toggle favorite",
            MenuItem::Favorites => "Favorite cities",
            MenuItem::Quit => "Quit",
        })
    }
}

/// `Ok(None)` when the user cancelled the prompt with Esc or Ctrl-C.
fn cancellable<T>(result: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn interactive(session: &Session, dash: Dashboard<'_>) -> anyhow::Result<()> {
    dash.load_default(session.config.default_city()).await;

    loop {
        let Some(item) = cancellable(Select::new("What next?", MenuItem::ALL.to_vec()).prompt())?
        else {
            break;
        };

        match item {
            MenuItem::Search => {
                if let Some(city) = cancellable(Text::new("City:").prompt())? {
                    dash.search(&city).await;
                }
            }
            MenuItem::Recent => {
                if let Some(city) = pick("Recent searches:", dash.recent_searches())? {
                    dash.select_recent(&city).await;
                }
            }
            MenuItem::Locate => {
                dash.locate().await;
            }
            MenuItem::SwitchUnits => {
                let next = dash.unit().toggled();
                println!("Units: {next}");
                dash.set_unit(next).await;
            }
            MenuItem::ToggleTheme => {
                let theme = dash.toggle_theme()?;
                session.screen.set_theme(theme);
                println!("Theme: {theme}");
            }
            MenuItem::ToggleFavorite => match dash.toggle_favorite() {
                Ok(true) => println!("★ {} added to favorites", city_label(&dash)),
                Ok(false) => println!("☆ {} removed from favorites", city_label(&dash)),
                Err(e) => eprintln!("! {e}"),
            },
            MenuItem::Favorites => {
                if let Some(city) = pick("Favorite cities:", dash.favorites())? {
                    dash.select_recent(&city).await;
                }
            }
            MenuItem::Quit => break,
        }
    }

    Ok(())
}

fn pick(prompt: &str, options: Vec<String>) -> anyhow::Result<Option<String>> {
    if options.is_empty() {
        println!("Nothing here yet.");
        return Ok(None);
    }
    cancellable(Select::new(prompt, options).prompt())
}

fn city_label(dash: &Dashboard<'_>) -> String {
    dash.current_city().unwrap_or_else(|| "City".to_string())
}

fn print_list(empty: &str, items: &[String]) {
    if items.is_empty() {
        println!("{empty}");
    }
    for (i, item) in items.iter().enumerate() {
        println!("{}. {item}", i + 1);
    }
}

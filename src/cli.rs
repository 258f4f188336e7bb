use clap::{Parser, Subcommand};
use sunwise_core::SkinType;

#[derive(Debug, Parser)]
#[command(name = "sunwise", version, about = "Tan safely: UV, weather, a smart timer and more")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current weather, UV level and forecast
    Home {
        /// Start the smart sun timer after showing the weather
        #[arg(long)]
        run: bool,
    },
    /// Real sunbathing spots near you
    Map,
    /// A five-song playlist for your mood
    Music {
        /// e.g. "chill beach afternoon"
        vibe: Vec<String>,
    },
    /// Manage the local profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// Show the profile and session history
    Show,
    /// Create a profile
    Onboard {
        name: String,
        /// Skin type, 1-6 or I-VI
        #[arg(long, default_value = "3")]
        skin: SkinType,
    },
    /// Create a default profile without asking anything
    Skip,
    /// Change skin type
    Skin { skin: SkinType },
    /// Delete the profile and its history
    Logout,
    /// Toggle between light and dark theme
    Theme,
}

impl Default for Command {
    fn default() -> Self {
        Command::Home { run: false }
    }
}

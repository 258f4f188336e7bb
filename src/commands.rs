use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sunwise_advisor::GeminiClient;
use sunwise_core::{App, AppError, ExposureProfile, SessionRecorder, SunAdvice, User};
use sunwise_timer::{SunTimer, TimerEvent, TimerPhase};
use sunwise_weather::location::{fallback_from_config, source_from_config};
use sunwise_weather::{resolve_location, Location, WeatherData, WeatherProvider};
use tokio::io::{self as tokio_io, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::time;

use crate::cli::ProfileAction;

pub type Result<T> = std::result::Result<T, AppError>;

const ONBOARDING_HINT: &str =
    "No profile yet. Run `sunwise profile onboard <name> --skin <1-6>` or `sunwise profile skip`.";
const CONTROLS_HINT: &str = "  [p + Enter] play/pause  [r + Enter] reset  [q + Enter] quit";

/// Keyboard commands accepted while the timer screen is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerControl {
    Toggle,
    Reset,
    Quit,
}

impl TimerControl {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" | "play" | "" => Some(Self::Toggle),
            "r" | "reset" => Some(Self::Reset),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Apply a control to the timer. Returns false when the screen should close.
pub fn apply_control(timer: &SunTimer, control: TimerControl) -> bool {
    match control {
        TimerControl::Toggle => {
            if !timer.toggle() {
                println!("\n  Nothing to start. Press r to reset.");
            }
            true
        }
        TimerControl::Reset => {
            timer.reset();
            true
        }
        TimerControl::Quit => {
            timer.dispose();
            false
        }
    }
}

fn print_progress(timer: &SunTimer) -> Result<()> {
    let snapshot = timer.snapshot();
    print!(
        "\r  {}  {:<8} {:>3.0}%",
        snapshot.state.format_remaining(),
        snapshot.state.status_label(),
        snapshot.progress_percent
    );
    std::io::stdout().flush()?;
    Ok(())
}

async fn locate(app: &App) -> Location {
    let config = &app.config().location;
    let source = source_from_config(config);
    resolve_location(source.as_ref(), fallback_from_config(config)).await
}

fn advisor(app: &App) -> GeminiClient {
    let config = &app.config().advisor;
    if !config.is_configured() {
        tracing::warn!("No Gemini API key set (GEMINI_API_KEY); AI features fall back to defaults");
    }
    GeminiClient::from_config(config)
}

fn print_weather(location: &Location, weather: &WeatherData) {
    let place = location
        .city_name
        .clone()
        .unwrap_or_else(|| format!("{:.3}, {:.3}", location.latitude, location.longitude));

    println!("{}", place);
    println!(
        "  {:.0}°C, {}",
        weather.temperature,
        weather.condition().description()
    );
    println!(
        "  UV index {:.1} ({})",
        weather.uv_index,
        weather.uv_level().description()
    );

    let forecast = weather.forecast();
    if !forecast.is_empty() {
        println!("\nForecast");
        for day in forecast {
            let label = day
                .date
                .map(|d| d.format("%a %d %b").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<10} {:>4.0}° / {:>3.0}°  {}",
                label,
                day.high,
                day.low,
                day.condition.description()
            );
        }
    }
}

fn print_advice(advice: &SunAdvice) {
    println!("\n{}", advice.advice);
    println!(
        "  Recommended SPF {}, max {} min",
        advice.spf_recommendation, advice.safe_minutes
    );
}

pub async fn home(app: &App, run: bool) -> Result<()> {
    let store = app.store();
    let user = store.user();

    let location = locate(app).await;
    let weather_provider = WeatherProvider::new(&app.config().weather.base_url)?;
    let weather = weather_provider.fetch_or_default(&location).await;
    print_weather(&location, &weather);

    if !run {
        return Ok(());
    }
    let Some(user) = user else {
        println!("\n{}", ONBOARDING_HINT);
        return Ok(());
    };

    let recorder: Arc<dyn SessionRecorder> = store;
    let timer = SunTimer::with_tick_interval(
        Arc::new(advisor(app)),
        recorder,
        Duration::from_millis(app.config().timer.tick_millis),
    );
    let mut events = timer.subscribe();

    println!("\nSkin type {}", user.skin_type.label());
    let profile = ExposureProfile::new(weather.uv_index, user.skin_type);
    if let Some(advice) = timer.request_advice(profile).await {
        print_advice(&advice);
    }

    if !timer.start() {
        println!("Nothing to count down.");
        return Ok(());
    }
    println!("{}", CONTROLS_HINT);

    let refresh_period = Duration::from_secs(u64::from(app.config().weather.refresh_minutes) * 60);
    let mut refresh = time::interval_at(time::Instant::now() + refresh_period, refresh_period);
    let mut input = BufReader::new(tokio_io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                timer.dispose();
                println!("\nStopped.");
                break;
            }
            line = input.next_line(), if stdin_open => match line? {
                Some(line) => match TimerControl::parse(&line) {
                    Some(control) => {
                        if !apply_control(&timer, control) {
                            println!("\nStopped.");
                            break;
                        }
                    }
                    None => println!("{}", CONTROLS_HINT),
                },
                None => stdin_open = false,
            },
            _ = refresh.tick() => {
                let weather = weather_provider.fetch_or_default(&location).await;
                let timer = timer.clone();
                let skin_type = user.skin_type;
                tokio::spawn(async move {
                    timer
                        .request_advice(ExposureProfile::new(weather.uv_index, skin_type))
                        .await;
                });
            }
            event = events.recv() => match event {
                Ok(TimerEvent::Tick { .. }) => print_progress(&timer)?,
                Ok(TimerEvent::PhaseChanged(TimerPhase::Finished)) => {}
                Ok(TimerEvent::PhaseChanged(_)) => print_progress(&timer)?,
                Ok(TimerEvent::Finished(session)) => {
                    // Terminal bell stands in for the alarm.
                    println!(
                        "\x07\n  Done! {} min in the sun, saved to your history.",
                        session.duration_minutes
                    );
                    timer.dispose();
                    break;
                }
                Ok(TimerEvent::AdviceUpdated(advice)) => {
                    tracing::debug!("Advice refreshed: {} min", advice.safe_minutes);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Timer display skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

pub async fn map(app: &App) -> Result<()> {
    let location = locate(app).await;
    let beaches = advisor(app)
        .beaches_or_empty(location.latitude, location.longitude)
        .await;

    if beaches.is_empty() {
        println!("No spots found nearby.");
        return Ok(());
    }

    println!("Sunbathing spots near you");
    for beach in beaches {
        println!("  {} ({:.4}, {:.4})", beach.name, beach.lat, beach.lon);
        println!("    {}", beach.description);
    }
    Ok(())
}

pub async fn music(app: &App, vibe: &str) -> Result<()> {
    if vibe.trim().is_empty() {
        println!("Describe a vibe, e.g. `sunwise music chill beach afternoon`.");
        return Ok(());
    }

    let songs = advisor(app).playlist_or_empty(vibe).await;
    if songs.is_empty() {
        println!("Couldn't put a playlist together right now.");
        return Ok(());
    }

    println!("Playlist for \"{}\"", vibe.trim());
    for (i, song) in songs.iter().enumerate() {
        println!("  {}. {} - {} ({})", i + 1, song.title, song.artist, song.vibe);
    }
    Ok(())
}

fn print_profile(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("  Skin type {}", user.skin_type.label());
    println!(
        "  {} sessions, {} minutes in total",
        user.session_count(),
        user.total_minutes()
    );

    if user.history.is_empty() {
        println!("  No sessions yet.");
        return;
    }
    println!("\nHistory");
    for session in user.history_newest_first() {
        println!(
            "  {}  {:>3} min  UV {:.1}  {}",
            session.date.format("%Y-%m-%d %H:%M"),
            session.duration_minutes,
            session.uv_index,
            session.location
        );
    }
}

pub fn profile(app: &App, action: ProfileAction) -> Result<()> {
    let store = app.store();

    match action {
        ProfileAction::Show => match store.user() {
            Some(user) => print_profile(&user),
            None => println!("{}", ONBOARDING_HINT),
        },
        ProfileAction::Onboard { name, skin } => {
            if name.trim().is_empty() {
                println!("Name must not be empty.");
                return Ok(());
            }
            let user = User::onboard(&name, skin);
            store.set_user(user.clone())?;
            println!("Welcome, {}!", user.name);
        }
        ProfileAction::Skip => {
            let user = User::skip_onboarding();
            store.set_user(user.clone())?;
            println!("Welcome, {}!", user.name);
        }
        ProfileAction::Skin { skin } => match store.update_skin_type(skin)? {
            Some(user) => println!("Skin type set to {}", user.skin_type.label()),
            None => println!("{}", ONBOARDING_HINT),
        },
        ProfileAction::Logout => {
            store.clear_user()?;
            println!("Logged out.");
        }
        ProfileAction::Theme => {
            let theme = store.toggle_theme()?;
            println!("Theme: {}", theme.as_str());
        }
    }

    Ok(())
}

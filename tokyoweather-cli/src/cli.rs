use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use tokyoweather_core::{
    Config, OpenWeatherProvider, Units, WeatherProvider, WeatherRequest, clock,
    config::{self, API_KEY_ENV},
    model::{DEFAULT_CITY, DEFAULT_TIMEOUT},
};
use tracing::{debug, info, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "tokyoweather",
    version,
    about = "Print the current Tokyo time and weather",
    after_help = "The API key is read from OPENWEATHER_API_KEY (a local .env file is honoured)."
)]
pub struct Cli {
    /// City to report the weather for [default: Tokyo].
    #[arg(long)]
    pub city: Option<String>,

    /// Unit system: metric, imperial or standard [default: metric].
    #[arg(long)]
    pub units: Option<Units>,

    /// Request timeout in seconds [default: 10].
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Read defaults from this TOML file instead of the platform config dir.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    /// Missing API key or unusable config; no request was made.
    Config,
    /// The weather lookup itself failed.
    Weather,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Config => ExitCode::from(1),
            Exit::Weather => ExitCode::from(2),
        }
    }
}

/// Request settings resolved from flags, config file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub city: String,
    pub units: Units,
    pub timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_owned(),
            units: Units::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Options {
    /// Flags take precedence over the config file.
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            city: cli
                .city
                .clone()
                .or_else(|| config.city.clone())
                .unwrap_or(defaults.city),
            units: cli.units.or(config.units).unwrap_or(defaults.units),
            timeout: cli
                .timeout
                .map(Duration::from_secs)
                .or_else(|| config.timeout())
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn request(&self, api_key: String) -> WeatherRequest {
        WeatherRequest::new(api_key)
            .with_city(self.city.clone())
            .with_units(self.units)
            .with_timeout(self.timeout)
    }
}

impl Cli {
    pub async fn run(self) -> Exit {
        let mut out = std::io::stdout();
        let mut err = std::io::stderr();

        let now = clock::format_jst(None);
        let options = match self.load_options() {
            Ok(options) => options,
            Err(e) => {
                let _ = writeln!(out, "Tokyo Time: {now}");
                let _ = writeln!(err, "ERROR: {e:#}");
                return Exit::Config;
            }
        };
        debug!(?options, "resolved options");

        let provider = OpenWeatherProvider::new();
        execute(
            &provider,
            config::api_key_from_env(),
            &options,
            &now,
            &mut out,
            &mut err,
        )
        .await
    }

    fn load_options(&self) -> anyhow::Result<Options> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load().context("Failed to load configuration")?,
        };
        Ok(Options::resolve(self, &config))
    }
}

/// Load `dir/.env` into the process environment if it exists.
///
/// Variables already set in the environment keep their values.
pub fn load_env_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "loaded .env");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable .env file");
            None
        }
    }
}

/// Print the clock line, then fetch and print the weather.
///
/// Write failures on the output streams are ignored; the exit status only
/// reflects configuration and weather outcomes.
pub async fn execute(
    provider: &dyn WeatherProvider,
    api_key: Option<String>,
    options: &Options,
    now: &str,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Exit {
    let _ = writeln!(out, "Tokyo Time: {now}");

    let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
        let _ = writeln!(err, "ERROR: {API_KEY_ENV} environment variable not set.");
        let _ = writeln!(err, "Please set your API key:");
        let _ = writeln!(err, "  export {API_KEY_ENV}=your_api_key_here");
        return Exit::Config;
    };

    match provider.get_weather(&options.request(api_key)).await {
        Ok(report) => {
            info!(city = %options.city, "weather fetched");
            let _ = writeln!(out, "{report}");
            Exit::Success
        }
        Err(e) => {
            debug!(error = ?e, status = ?e.status(), "weather fetch failed");
            let _ = writeln!(err, "ERROR: Failed to fetch weather data: {e}");
            Exit::Weather
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokyoweather_core::{WeatherError, WeatherReport};

    const NOW: &str = "2025-11-19 15:42:07 JST";

    /// Replays one canned outcome and records what it was asked for.
    #[derive(Debug)]
    struct StubProvider {
        outcome: fn() -> Result<WeatherReport, WeatherError>,
        seen: Mutex<Vec<WeatherRequest>>,
    }

    impl StubProvider {
        fn new(outcome: fn() -> Result<WeatherReport, WeatherError>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<WeatherRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn get_weather(
            &self,
            request: &WeatherRequest,
        ) -> Result<WeatherReport, WeatherError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.outcome)()
        }
    }

    fn clear_sky() -> Result<WeatherReport, WeatherError> {
        Ok(WeatherReport {
            description: "clear sky".into(),
            temperature: 18.2,
            humidity: 55,
            wind_speed: 3.4,
            units: Units::Metric,
            raw: None,
        })
    }

    struct Captured {
        exit: Exit,
        out: String,
        err: String,
    }

    async fn run_with(provider: &StubProvider, api_key: Option<&str>, options: &Options) -> Captured {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let exit = execute(
            provider,
            api_key.map(str::to_owned),
            options,
            NOW,
            &mut out,
            &mut err,
        )
        .await;

        Captured {
            exit,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    #[tokio::test]
    async fn success_prints_time_and_report() {
        let provider = StubProvider::new(clear_sky);
        let run = run_with(&provider, Some("test_key"), &Options::default()).await;

        assert_eq!(run.exit, Exit::Success);
        assert_eq!(
            run.out,
            "Tokyo Time: 2025-11-19 15:42:07 JST\n\
             Weather: clear sky\n\
             Temperature: 18.2 °C\n\
             Humidity: 55 %\n\
             Wind: 3.4 m/s\n"
        );
        assert!(run.err.is_empty());

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "test_key");
        assert_eq!(calls[0].city, "Tokyo");
    }

    #[tokio::test]
    async fn missing_key_is_config_error_without_request() {
        let provider = StubProvider::new(clear_sky);

        for key in [None, Some(""), Some("   ")] {
            let run = run_with(&provider, key, &Options::default()).await;

            assert_eq!(run.exit, Exit::Config);
            assert_eq!(run.out, format!("Tokyo Time: {NOW}\n"));
            assert!(run.err.contains("ERROR: OPENWEATHER_API_KEY environment variable not set"));
            assert!(run.err.contains("export OPENWEATHER_API_KEY"));
        }

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn weather_failures_exit_with_two() {
        fn invalid_key() -> Result<WeatherReport, WeatherError> {
            Err(WeatherError::InvalidCredential)
        }
        fn timed_out() -> Result<WeatherReport, WeatherError> {
            Err(WeatherError::Timeout(Duration::from_secs(10)))
        }
        fn not_found() -> Result<WeatherReport, WeatherError> {
            Err(WeatherError::CityNotFound("Tokyo".into()))
        }

        let cases: [(fn() -> Result<WeatherReport, WeatherError>, &str); 3] = [
            (invalid_key, "Invalid API key"),
            (timed_out, "timed out"),
            (not_found, "not found"),
        ];

        for (outcome, fragment) in cases {
            let provider = StubProvider::new(outcome);
            let run = run_with(&provider, Some("test_key"), &Options::default()).await;

            assert_eq!(run.exit, Exit::Weather);
            assert!(run.out.starts_with("Tokyo Time: "));
            assert!(!run.out.contains("Weather:"));
            assert!(run.err.starts_with("ERROR: Failed to fetch weather data: "));
            assert!(run.err.contains(fragment), "{}", run.err);
        }
    }

    #[tokio::test]
    async fn options_are_forwarded_to_provider() {
        let provider = StubProvider::new(clear_sky);
        let options = Options {
            city: "Sapporo".into(),
            units: Units::Imperial,
            timeout: Duration::from_secs(3),
        };

        run_with(&provider, Some("test_key"), &options).await;

        let calls = provider.calls();
        assert_eq!(calls[0].city, "Sapporo");
        assert_eq!(calls[0].units, Units::Imperial);
        assert_eq!(calls[0].timeout, Duration::from_secs(3));
    }

    #[test]
    fn flags_override_config_which_overrides_defaults() {
        let cli = Cli::parse_from(["tokyoweather", "--units", "imperial"]);
        let config = Config {
            city: Some("Osaka".into()),
            units: Some(Units::Standard),
            timeout_secs: None,
        };

        let options = Options::resolve(&cli, &config);
        assert_eq!(options.city, "Osaka");
        assert_eq!(options.units, Units::Imperial);
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn no_flags_and_empty_config_gives_defaults() {
        let cli = Cli::parse_from(["tokyoweather"]);
        assert_eq!(Options::resolve(&cli, &Config::default()), Options::default());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["tokyoweather", "--timeout", "0"]).is_err());
        let cli = Cli::try_parse_from(["tokyoweather", "--timeout", "30", "-vv"]).unwrap();
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn unknown_units_flag_is_rejected() {
        assert!(Cli::try_parse_from(["tokyoweather", "--units", "kelvin"]).is_err());
    }

    #[test]
    fn env_file_populates_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "TOKYOWEATHER_DOTENV_SAMPLE=from_env_file\n",
        )
        .unwrap();

        let loaded = load_env_file(dir.path());

        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(
            std::env::var("TOKYOWEATHER_DOTENV_SAMPLE").as_deref(),
            Ok("from_env_file")
        );
    }

    #[test]
    fn missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_env_file(dir.path()), None);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitCode::from(Exit::Success), ExitCode::SUCCESS);
        assert_eq!(ExitCode::from(Exit::Config), ExitCode::from(1));
        assert_eq!(ExitCode::from(Exit::Weather), ExitCode::from(2));
    }
}

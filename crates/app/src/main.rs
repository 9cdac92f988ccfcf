use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use exam_core::Clock;
use exam_core::model::TestMode;
use services::{AttemptLoopService, ExamApi, HttpExamApi, HttpExamApiConfig, ResultService};
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMode { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    mode: TestMode,
    attempt_loop: Arc<AttemptLoopService>,
    results: Arc<ResultService>,
}

impl UiApp for DesktopApp {
    fn mode(&self) -> TestMode {
        self.mode
    }

    fn attempt_loop(&self) -> Arc<AttemptLoopService> {
        Arc::clone(&self.attempt_loop)
    }

    fn results(&self) -> Arc<ResultService> {
        Arc::clone(&self.results)
    }
}

struct Args {
    api_url: String,
    mode: TestMode,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--api <base_url>] [--mode exam|practice]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api  http://localhost:8000");
    eprintln!("  --mode exam");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_URL, EXAM_MODE");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url = std::env::var("EXAM_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into());
        let mut mode = std::env::var("EXAM_MODE")
            .ok()
            .and_then(|value| value.parse::<TestMode>().ok())
            .unwrap_or(TestMode::Exam);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    api_url = value;
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = value
                        .parse::<TestMode>()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { api_url, mode })
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default_clock();
    let api: Arc<dyn ExamApi> = Arc::new(HttpExamApi::new(HttpExamApiConfig {
        base_url: parsed.api_url,
    }));
    let attempt_loop = Arc::new(AttemptLoopService::new(clock, Arc::clone(&api)));
    let results = Arc::new(ResultService::new(clock, api));

    let app = DesktopApp {
        mode: parsed.mode,
        attempt_loop,
        results,
    };
    let context = build_app_context(&(Arc::new(app) as Arc<dyn UiApp>));

    // Keep the window ordinary; an always-on-top default would behave
    // like a modal during a timed attempt.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("BandPrep")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

// AutoPPT: AI-Powered Presentation Generator
// Copyright (c) 2024 AutoPPT Core Team

use anyhow::{bail, Context};
use autoppt::{
    ai::AIManager,
    config::Config,
    error::Error,
    generator::{Generator, GeneratorOptions},
    progress::ProgressTracker,
    render::{apply_style, style_names, theme::is_known_style, DEFAULT_STYLE},
    types::{PresentationOutline, UserPresentation},
    utils,
};
use clap::Parser;
use console::style;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
use cli::{Cli, Commands, LogFormat};

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // Credentials may live in .env; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            std::process::exit(1);
        }
    };

    if !cli.quiet {
        autoppt::banner::display_banner();
    }

    // Dropping the run future on Ctrl-C also drops its temporary image directory.
    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!("{:#}", e);
                report_error(&e);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{} Interrupted, no presentation was saved", style("✗").red());
            EXIT_INTERRUPTED
        }
    };

    drop(guard);
    std::process::exit(code);
}

/// Initialize logging based on verbosity
/// - 0: warnings only (progress bar mode)
/// - 1 (-v): autoppt info
/// - 2 (-vv): autoppt debug
/// - 3+ (-vvv): autoppt trace
///
/// `RUST_LOG` takes precedence when set.
fn init_logging(cli: &Cli) -> anyhow::Result<Option<WorkerGuard>> {
    let filter_str = match cli.verbose {
        0 => "warn",
        1 => "autoppt=info",
        2 => "autoppt=debug",
        _ => "autoppt=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let (text_layer, json_layer) = match cli.log_format {
        LogFormat::Text => (
            Some(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_ansi(!cli.no_color)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    let (file_layer, guard) = match &cli.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Run the CLI command
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => {
            let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
            let show_progress = cli.verbose == 0 && !cli.quiet;
            run_generate(args, &config, show_progress).await
        }
        Commands::Themes => {
            print_themes();
            Ok(())
        }
        Commands::Providers => {
            let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
            print_providers(&config).await;
            Ok(())
        }
        Commands::Config(cmd) => run_config_command(cmd, cli.config.as_deref()),
    }
}

/// Generate one presentation
async fn run_generate(
    args: cli::GenerateArgs,
    config: &Config,
    show_progress: bool,
) -> anyhow::Result<()> {
    let deck_style = args
        .style
        .unwrap_or_else(|| config.generation.default_style.clone());
    if !is_known_style(&deck_style) {
        tracing::warn!("Unknown style '{}', using '{}'", deck_style, DEFAULT_STYLE);
    }
    let slides = args
        .slides
        .map(|n| n as usize)
        .unwrap_or(config.generation.default_slides);
    let language = args
        .language
        .unwrap_or_else(|| config.generation.default_language.clone());
    let output = args.output.unwrap_or_else(|| {
        utils::default_output_path(
            &config.generation.output_dir,
            &args.topic,
            args.format.extension(),
        )
    });

    let provider_name = args
        .provider
        .clone()
        .unwrap_or_else(|| config.ai.default_provider_name().to_string());
    if !matches!(provider_name.to_ascii_lowercase().as_str(), "mock" | "ollama") {
        config.warn_missing_credentials();
    }

    let options = GeneratorOptions {
        format: args.format,
        no_research: args.no_research,
        pacing_delay: args.pacing_delay.map(Duration::from_secs),
    };
    let progress = Arc::new(ProgressTracker::new(show_progress));
    let generator = Generator::from_config(
        config,
        Some(&provider_name),
        args.model.as_deref(),
        options,
    )
    .context("creating AI provider")?
    .with_progress(Arc::clone(&progress));

    println!("  {}  {}", style("Topic:").bold(), args.topic);
    println!("  {}  {}", style("Style:").bold(), deck_style);
    println!(
        "  {}  {} ({})",
        style("Provider:").bold(),
        generator.provider().name(),
        generator.provider().model()
    );
    println!("  {}  {}", style("Language:").bold(), language);
    println!();

    let started = Instant::now();
    let saved = match &args.outline {
        Some(outline_file) => {
            let outline: PresentationOutline = UserPresentation::from_file(outline_file)
                .with_context(|| format!("reading outline {}", outline_file.display()))?
                .into();
            generator
                .generate_from_outline(&outline, &args.topic, &deck_style, &output, &language)
                .await
        }
        None => {
            generator
                .generate(&args.topic, &deck_style, &output, slides, &language)
                .await
        }
    }
    .context("generating presentation")?;

    println!();
    println!(
        "{} Presentation saved to {} in {}",
        style("✓").green(),
        style(saved.display()).bold(),
        utils::format_duration(started.elapsed())
    );
    if progress.failed() > 0 {
        println!(
            "  {} {} of {} slides could not be generated and contain a placeholder",
            style("⚠").yellow(),
            progress.failed(),
            progress.total()
        );
    }
    Ok(())
}

/// Print the style catalog
fn print_themes() {
    println!("{}", style("Available styles").bold().cyan());
    println!("{}", style("═".repeat(60)).dim());
    for name in style_names() {
        let bundle = apply_style(name);
        let marker = if name == DEFAULT_STYLE { " (default)" } else { "" };
        println!(
            "  {} title {}  text {}  background {}{}  font {}{}",
            style(format!("{:<14}", name)).bold(),
            bundle.title_color.hex(),
            bundle.text_color.hex(),
            bundle.bg_color.hex(),
            bundle
                .gradient_end
                .filter(|_| bundle.gradient)
                .map(|end| format!(" -> {}", end.hex()))
                .unwrap_or_default(),
            bundle.font_name,
            marker
        );
    }
}

/// Print provider availability and models
async fn print_providers(config: &Config) {
    println!("{}", style("AI providers").bold().cyan());
    println!("{}", style("═".repeat(60)).dim());

    let manager = AIManager::new(config.ai.clone());
    for status in manager.describe_providers().await {
        let icon = if status.available {
            style("✓").green()
        } else {
            style("✗").red()
        };
        let marker = if status.name == config.ai.default_provider_name() {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {} {}{}  model {}",
            icon,
            style(&status.name).bold(),
            marker,
            status.model
        );
        if let Some(key) = config.ai.api_key(&status.name) {
            println!("      key: {}", utils::mask_sensitive(&key));
        }
        if let Some(note) = &status.note {
            println!("      {}", style(note).dim());
        }
        for model in status.models.iter().take(8) {
            match model.size {
                Some(_) => println!("      - {} ({})", model.id, model.size_human_readable()),
                None => println!("      - {}", model.id),
            }
        }
    }
}

/// Config subcommands
fn run_config_command(cmd: cli::ConfigCommand, config_path: Option<&Path>) -> anyhow::Result<()> {
    use cli::ConfigAction;

    match cmd.action {
        ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", output.display());
            }
            Config::default().save(&output)?;
            println!("Configuration written to {}", output.display());
        }
        ConfigAction::Validate { config } => {
            Config::from_file(&config)?;
            println!("{} Configuration is valid", style("✓").green());
        }
        ConfigAction::Show => {
            let mut config = Config::load(config_path)?;
            for provider in config.ai.providers.values_mut() {
                if let Some(key) = provider.api_key.as_mut() {
                    if !key.starts_with("${") {
                        *key = utils::mask_sensitive(key);
                    }
                }
            }
            println!("{}", serde_yaml::to_string(&config)?);
        }
    }
    Ok(())
}

/// Print the error chain and remediation tips
fn report_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", style("Error:").red().bold(), err);

    let Some(root) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::root)
    else {
        return;
    };

    match root {
        Error::ApiKey { provider } => {
            eprintln!(
                "  {} Set the API key for '{}' in .env, or run offline with --provider mock",
                style("Tip:").yellow(),
                provider
            );
        }
        Error::RateLimit { retry_after, .. } => {
            let wait = retry_after
                .map(|secs| format!("Wait {}s", secs))
                .unwrap_or_else(|| "Wait a moment".to_string());
            eprintln!(
                "  {} {} before retrying, raise --pacing-delay, or switch --provider",
                style("Tip:").yellow(),
                wait
            );
        }
        Error::ModelNotFound { provider, .. } => {
            eprintln!(
                "  {} Run `autoppt providers` to see the models '{}' offers",
                style("Tip:").yellow(),
                provider
            );
        }
        _ => {}
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use youtube_transcripts::cli::{BatchArgs, Cli, Commands};
use youtube_transcripts::config::Config;
use youtube_transcripts::output::{self, TranscriptFormatter};
use youtube_transcripts::utils;
use youtube_transcripts::{TranscriptApi, TranscriptRequest};

enum BatchTarget {
    Playlist(String),
    Channel(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "youtube_transcripts=debug"
    } else {
        "youtube_transcripts=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Using default configuration: {:#}", e);
            Config::default()
        }
    };

    let api = TranscriptApi::new().with_concurrency(config.app.max_concurrent_jobs);

    match cli.command {
        Commands::List { video, cookies } => {
            let video_id = parse_video(&video)?;
            let cookies = cookies.or_else(|| config.youtube.cookies_path.clone());

            let catalog = match &cookies {
                Some(path) => api.list_transcripts_with_cookies(&video_id, path).await?,
                None => api.list_transcripts(&video_id).await?,
            };
            output::print_catalog(&catalog);
        }
        Commands::Get {
            video,
            languages,
            mode,
            translate,
            format,
            output: output_path,
            cookies,
        } => {
            let video_id = parse_video(&video)?;
            let cookies = cookies.or_else(|| config.youtube.cookies_path.clone());
            let languages = if languages.is_empty() {
                config.youtube.default_languages.clone()
            } else {
                languages
            };
            let codes: Vec<&str> = languages.iter().map(String::as_str).collect();

            tracing::info!("Retrieving transcript for video: {}", video_id);

            let catalog = match &cookies {
                Some(path) => api.list_transcripts_with_cookies(&video_id, path).await?,
                None => api.list_transcripts(&video_id).await?,
            };

            let mut transcript = catalog.select(&codes, mode.into())?;
            if let Some(target) = translate {
                transcript = transcript.translate(&target)?;
            }
            tracing::info!("Selected transcript: {}", transcript);

            let content = transcript.fetch().await?;
            if let Some(last) = content.fragments().last() {
                tracing::info!(
                    "Fetched {} fragments covering {}",
                    content.len(),
                    utils::format_duration(last.end())
                );
            }

            let formatter: TranscriptFormatter =
                format.unwrap_or(config.app.default_output_format).into();
            match output_path {
                Some(path) => {
                    output::save_to_file(&content, &path, formatter)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => output::print_to_console(&content, formatter),
            }
        }
        Commands::Playlist { playlist, batch } => {
            let target = BatchTarget::Playlist(utils::extract_playlist_id(&playlist));
            run_batch(&api, &config, target, batch, cli.quiet).await?;
        }
        Commands::Channel { channel, batch } => {
            run_batch(&api, &config, BatchTarget::Channel(channel), batch, cli.quiet).await?;
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the configuration file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
        Commands::Formats => {
            println!("Supported output formats:");
            println!("  • text        - plain text, one line per caption");
            println!("  • json        - compact JSON array of {{text, start, dur}}");
            println!("  • pretty-json - indented JSON");
            println!("  • srt         - SubRip subtitles");
            println!("  • vtt         - WebVTT subtitles");
        }
    }

    Ok(())
}

fn parse_video(input: &str) -> Result<String> {
    utils::extract_video_id(input)
        .with_context(|| format!("Not a YouTube video id or URL: {}", input))
}

async fn run_batch(
    api: &TranscriptApi,
    config: &Config,
    target: BatchTarget,
    args: BatchArgs,
    quiet: bool,
) -> Result<()> {
    let mut request = match args.api_key.or_else(|| config.youtube.api_key.clone()) {
        Some(key) => TranscriptRequest::new(key),
        None => TranscriptRequest::default(),
    };
    request = request.stop_on_error(config.app.stop_on_error && !args.continue_on_error);
    if let Some(path) = args.cookies.or_else(|| config.youtube.cookies_path.clone()) {
        request = request.with_cookies(path);
    }

    let languages = if args.languages.is_empty() {
        config.youtube.default_languages.clone()
    } else {
        args.languages
    };
    let codes: Vec<&str> = languages.iter().map(String::as_str).collect();

    let progress = spinner(quiet);
    let label = match &target {
        BatchTarget::Playlist(id) => format!("playlist {}", id),
        BatchTarget::Channel(name) => format!("channel {}", name),
    };
    progress.set_message(format!("Retrieving transcripts for {}...", label));

    if args.list_only {
        let outcome = match &target {
            BatchTarget::Playlist(id) => api.list_transcripts_for_playlist(id, &request).await,
            BatchTarget::Channel(name) => api.list_transcripts_for_channel(name, &request).await,
        };
        progress.finish_and_clear();
        let outcome = outcome?;

        for (video_id, result) in outcome.iter() {
            match result {
                Ok(catalog) => {
                    output::print_catalog(catalog);
                    println!();
                }
                Err(e) => eprintln!("{}: {}", video_id, e),
            }
        }
        return Ok(());
    }

    let outcome = match &target {
        BatchTarget::Playlist(id) => api.get_transcripts_for_playlist(id, &request, &codes).await,
        BatchTarget::Channel(name) => api.get_transcripts_for_channel(name, &request, &codes).await,
    };
    progress.finish_and_clear();
    let outcome = outcome?;

    let formatter: TranscriptFormatter =
        args.format.unwrap_or(config.app.default_output_format).into();
    match &args.output_dir {
        Some(dir) => {
            let written = output::save_batch(&outcome, dir, formatter)?;
            println!("Saved {} transcripts to {}", written.len(), dir.display());
        }
        None => {
            for (video_id, content) in outcome.successes() {
                println!("==> {} <==", video_id);
                output::print_to_console(content, formatter);
                println!();
            }
        }
    }

    for (video_id, e) in outcome.failures() {
        eprintln!("{}: {}", video_id, e);
    }

    Ok(())
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

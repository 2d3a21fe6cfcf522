use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use tunesync::catalog::CatalogClient;
use tunesync::config::Config;
use tunesync::downloader::Downloader;
use tunesync::index::{is_audio_filename, FileIndex};
use tunesync::matcher::match_track;
use tunesync::progress::{
    create_progress_bar, create_spinner, format_duration, format_size, log_progress, set_log_only,
};
use tunesync::state;
use tunesync::tags::{self, TagFields};

/// Pause between download attempts; keeps the search endpoint friendly.
const DOWNLOAD_PAUSE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "tunesync")]
#[command(about = "Synchronize a remote playlist with a local audio folder")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Hide progress bars for tail-friendly output
    #[arg(long, global = true)]
    log_only: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the playlist and merge new tracks into the state file
    Refresh,
    /// Download every track not yet marked as downloaded
    Download,
    /// Match on-disk files against the state and update downloaded flags
    Verify,
    /// Embed title/artist/album/cover tags into matched files
    Tag,
    /// Report record and file counts for the current state
    Status,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let args = Args::parse();
    set_log_only(args.log_only);

    let config = Config::from_env()
        .context("incomplete configuration; check the environment or .env file")?;

    match args.command {
        Command::Refresh => cmd_refresh(&config),
        Command::Download => cmd_download(&config),
        Command::Verify => cmd_verify(&config),
        Command::Tag => cmd_tag(&config),
        Command::Status => cmd_status(&config),
    }
}

fn cmd_refresh(config: &Config) -> Result<()> {
    let client = CatalogClient::new(&config.client_id, &config.client_secret);
    let records = state::load(&config.state_file)?;

    let spinner = create_spinner("Fetching playlist");
    let fetched = match client.playlist_tracks(&config.playlist) {
        Ok(fetched) => {
            spinner.finish_with_message(format!("Fetched {} playlist entries", fetched.len()));
            fetched
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    let (merged, outcome) = state::merge_catalog(&records, &fetched);
    if outcome.changed() {
        state::save(&config.state_file, &merged)?;
        info!(
            "refresh: {} added, {} covers filled, {} records total",
            outcome.added,
            outcome.covers_filled,
            merged.len()
        );
    } else {
        info!("refresh: state already current, nothing written");
    }
    Ok(())
}

fn cmd_download(config: &Config) -> Result<()> {
    let mut records = state::load(&config.state_file)?;
    let downloader = Downloader::new(&config.download_dir);

    let pending: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.downloaded)
        .map(|(i, _)| i)
        .collect();
    if pending.is_empty() {
        info!("download: nothing pending");
        return Ok(());
    }

    let total = pending.len();
    info!("download: {total} tracks pending");
    let start = Instant::now();
    let pb = create_progress_bar(total as u64, "Downloading");

    let mut fetched = 0usize;
    let mut failed = 0usize;
    for (done, i) in pending.into_iter().enumerate() {
        let query = records[i].query();
        pb.println(format!("[{}/{}] {}", done + 1, total, query));
        match downloader.fetch(&query) {
            Ok(()) => {
                records[i].downloaded = true;
                fetched += 1;
            }
            Err(e) => {
                warn!("{e}");
                failed += 1;
            }
        }
        // Persist after every track so an interruption loses at most the
        // in-flight item.
        state::save(&config.state_file, &records)?;
        pb.inc(1);
        log_progress("download", (done + 1) as u64, total as u64, 10);
        if done + 1 < total {
            thread::sleep(DOWNLOAD_PAUSE);
        }
    }

    pb.finish_with_message(format!("Downloaded {fetched}, failed {failed}"));
    info!(
        "download: {fetched} fetched, {failed} failed in {}",
        format_duration(start.elapsed())
    );
    Ok(())
}

fn cmd_verify(config: &Config) -> Result<()> {
    let index = FileIndex::scan(&config.download_dir)?;
    let records = state::load(&config.state_file)?;
    info!(
        "verify: {} records against {} indexed files",
        records.len(),
        index.len()
    );

    let results = state::reconcile(&records, &index);
    let mut found = 0usize;
    for (record, result) in records.iter().zip(&results) {
        let marker = if result.accepted() {
            found += 1;
            "✓"
        } else {
            "✗"
        };
        println!(
            "{} {} -> {} (score {:.2})",
            marker,
            record.title,
            result.filename.as_deref().unwrap_or("none"),
            result.score
        );
    }

    let (updated, changed) = state::apply_matches(&records, &results);
    if changed {
        state::save(&config.state_file, &updated)?;
        info!("verify: state updated");
    } else {
        info!("verify: no changes");
    }
    info!("verify: {found} found, {} missing", records.len() - found);
    Ok(())
}

fn cmd_tag(config: &Config) -> Result<()> {
    let index = FileIndex::scan(&config.download_dir)?;
    let records = state::load(&config.state_file)?;
    let client = CatalogClient::new(&config.client_id, &config.client_secret);

    let total = records.len();
    let pb = create_progress_bar(total as u64, "Tagging");
    let mut tagged = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (done, record) in records.iter().enumerate() {
        let result = match_track(record, &index);
        let candidate = if result.accepted() {
            result.filename
        } else {
            None
        };
        let Some(filename) = candidate else {
            skipped += 1;
            pb.inc(1);
            continue;
        };

        // Cover failures are isolated: tag the text fields anyway.
        let cover = record.cover_url.as_deref().and_then(|url| {
            client
                .fetch_cover(url)
                .map_err(|e| warn!("cover for {}: {e}", record.title))
                .ok()
        });

        let fields = TagFields {
            title: &record.title,
            artist: &record.artist,
            album: &record.album,
            cover,
        };
        match tags::embed(&config.download_dir.join(&filename), &fields) {
            Ok(()) => {
                tagged += 1;
                pb.println(format!("tagged {filename}"));
            }
            Err(e) => {
                failed += 1;
                warn!("{e}");
            }
        }
        pb.inc(1);
        log_progress("tag", (done + 1) as u64, total as u64, 10);
    }

    pb.finish_with_message(format!(
        "Tagged {tagged}, skipped {skipped}, failed {failed}"
    ));
    info!("tag: {tagged} tagged, {skipped} without a confident match, {failed} failed");
    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    let records = state::load(&config.state_file)?;
    let downloaded = records.iter().filter(|r| r.downloaded).count();

    let mut file_count = 0usize;
    let mut total_bytes = 0u64;
    let entries = std::fs::read_dir(&config.download_dir)
        .with_context(|| format!("reading {}", config.download_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_audio_filename(name) {
            file_count += 1;
            total_bytes += entry.metadata()?.len();
        }
    }

    println!("Records in state:   {}", records.len());
    println!("  downloaded:       {downloaded}");
    println!("Audio files:        {file_count}");
    println!(
        "Total size:         {total_bytes} bytes ({})",
        format_size(total_bytes)
    );
    Ok(())
}

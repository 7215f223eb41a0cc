use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ativeplay_client::models::{AppStatus, MediaKind, MediaRef};
use ativeplay_client::{views, AppContext, Config, RefreshReport};

const USAGE: &str = "\
Usage: ativeplay-client <command>

Commands:
  status                         Restore the session and show a summary
  login <url> <user> <password>  Log in and download the catalog
  refresh                        Re-download categories and streams
  search <query>                 Search movies, series and channels
  epg <channel_id>               Show the program guide for a channel
  watchlist [add|remove <vod|series> <id>]
  favorite <channel_id>          Toggle a favorite channel
  sign-out                       Forget the login and all local data";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ativeplay_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::info!("Starting AtivePlay Client v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        println!("{}", USAGE);
        return Ok(());
    };

    let app = AppContext::open(config).await?;
    let result = run(&app, command, &args[1..]).await;

    // Let queued writes reach the disk before exiting
    app.store().flush().await;
    result
}

async fn run(app: &AppContext, command: &str, args: &[String]) -> anyhow::Result<()> {
    match command {
        "login" => {
            let [url, username, password] = args else {
                bail!("login needs <url> <user> <password>");
            };
            let report = app.login(url, username, password).await?;
            print_report(&report);
            print_summary(app).await;
        }
        "sign-out" => {
            app.sign_out().await;
            println!("Signed out");
        }
        "status" => {
            let status = app.bootstrap().await;
            println!("Status: {}", status);
            if status == AppStatus::Ready {
                print_summary(app).await;
            }
        }
        other => {
            require_ready(app).await?;
            run_ready(app, other, args).await?;
        }
    }
    Ok(())
}

/// Commands that need a restored session
async fn run_ready(app: &AppContext, command: &str, args: &[String]) -> anyhow::Result<()> {
    match command {
        "refresh" => {
            let report = app.refresh_playlist().await;
            print_report(&report);
            print_summary(app).await;
        }
        "search" => {
            let query = args.join(" ");
            let live = app.live.read().await;
            let vod = app.vod.read().await;
            let series = app.series.read().await;
            let results = views::search(&query, &live.streams, &vod.streams, &series.streams);

            for movie in &results.movies {
                println!("[movie]   {:>8}  {}", movie.stream_id, movie.name);
            }
            for show in &results.series {
                println!("[series]  {:>8}  {}", show.series_id, show.name);
            }
            for channel in &results.channels {
                println!("[channel] {:>8}  {}", channel.stream_id, channel.name);
            }
            println!("{} results", results.total());
        }
        "epg" => {
            let channel_id: i64 = args
                .first()
                .context("epg needs <channel_id>")?
                .parse()
                .context("channel id must be a number")?;

            let listings = app
                .live
                .fetch_short_epg(channel_id, app.config().short_epg_limit)
                .await?;
            let now = chrono::Utc::now().timestamp();
            for program in views::window_listings(&listings.epg_listings, now, app.config().epg_window_limit) {
                let marker = if program.now_playing { "▶" } else { " " };
                println!("{} {:<13} {}", marker, program.time_label, program.title);
            }
        }
        "watchlist" => {
            let changed = match parse_watchlist_edit(args)? {
                None => true,
                Some(WatchlistEdit::Add(item)) => app.watchlist.add(item).await,
                Some(WatchlistEdit::Remove(item)) => app.watchlist.remove(item).await,
            };
            if !changed {
                println!("Watchlist unchanged");
            }

            let items = app.watchlist.items().await;
            let vod = app.vod.read().await;
            let series = app.series.read().await;
            for stream in views::resolve_watchlist(&items, &vod.streams, &series.streams) {
                println!("[{}] {:>8}  {}", stream.kind(), stream.id(), stream.name());
            }
        }
        "favorite" => {
            let channel_id: i64 = args
                .first()
                .context("favorite needs <channel_id>")?
                .parse()
                .context("channel id must be a number")?;
            let added = app.live.toggle_favorite(channel_id).await;
            println!(
                "Channel {} {} favorites",
                channel_id,
                if added { "added to" } else { "removed from" }
            );
        }
        _ => bail!("unknown command: {}\n\n{}", command, USAGE),
    }
    Ok(())
}

async fn require_ready(app: &AppContext) -> anyhow::Result<()> {
    match app.bootstrap().await {
        AppStatus::Ready => Ok(()),
        status => bail!("not logged in (status: {}), run `login` first", status),
    }
}

#[derive(Debug, PartialEq)]
enum WatchlistEdit {
    Add(MediaRef),
    Remove(MediaRef),
}

/// No arguments lists the watchlist; anything else must be a full edit
fn parse_watchlist_edit(args: &[String]) -> anyhow::Result<Option<WatchlistEdit>> {
    let [action, kind, id] = args else {
        if args.is_empty() {
            return Ok(None);
        }
        bail!("usage: watchlist [add|remove <vod|series> <id>]");
    };

    let item = parse_ref(kind, id)?;
    match action.as_str() {
        "add" => Ok(Some(WatchlistEdit::Add(item))),
        "remove" => Ok(Some(WatchlistEdit::Remove(item))),
        _ => bail!("unknown watchlist action: {}", action),
    }
}

fn parse_ref(kind: &str, id: &str) -> anyhow::Result<MediaRef> {
    let id: i64 = id.parse().context("id must be a number")?;
    let kind = match kind {
        "vod" => MediaKind::Vod,
        "series" => MediaKind::Series,
        _ => bail!("watchlist entries are vod or series, got {}", kind),
    };
    Ok(MediaRef::new(id, kind))
}

fn print_report(report: &RefreshReport) {
    for (task, error) in &report.failures {
        println!("! {} failed: {}", task, error);
    }
}

async fn print_summary(app: &AppContext) {
    if let Some(account) = app.session.account_info().await {
        let user = &account.user_info;
        let expires = user
            .exp_timestamp()
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "Account: {} ({}{}), expires {}",
            user.username.as_deref().unwrap_or("-"),
            user.status.as_deref().unwrap_or("Active"),
            if user.is_trial_account() { ", trial" } else { "" },
            expires
        );
    }
    if let Some(base_url) = app.preferred_base_url().await {
        println!("Stream server: {}", base_url);
    }

    {
        let live = app.live.read().await;
        println!("Live: {} categories, {} channels", live.categories.len(), live.streams.len());
    }
    {
        let vod = app.vod.read().await;
        println!("Movies: {} categories, {} titles", vod.categories.len(), vod.streams.len());
    }
    {
        let series = app.series.read().await;
        println!("Series: {} categories, {} shows", series.categories.len(), series.streams.len());
    }
    println!(
        "Watchlist: {} items, favorites: {} channels",
        app.watchlist.len().await,
        app.live.favorites().await.len()
    );
}

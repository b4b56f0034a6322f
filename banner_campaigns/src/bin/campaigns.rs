use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use banner_campaigns::config::{AppConfig, env_today, load_config_path};
use banner_campaigns::dates::{format_date, parse_date, parse_datetime};
use banner_campaigns::seed::{DEFAULT_SEED, seed_store};
use banner_campaigns::storage::{MemoryStore, SqliteStore};
use banner_campaigns::table::{
    BannerTable, ForecastTable, PromotionTable, SeriesTable, ShowingTable, terminal_table,
    terminal_table_with_ids,
};
use banner_campaigns::{
    BannerId, BannerShortData, CampaignRegistry, CampaignStore, ShowingId, ShowingShortData,
    SortMode,
};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Banner campaign tracking CLI")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// SQLite database, overrides config and DATABASE_URL.
    #[arg(long, global = true, value_name = "URL")]
    database: Option<String>,
    /// Reference date (YYYY-MM-DD or dd.mm.yyyy), overrides CAMPAIGNS_TODAY.
    #[arg(long, global = true, value_name = "DATE", value_parser = cli_date)]
    today: Option<NaiveDate>,
    /// Work on a throwaway in-memory store filled with demo data.
    #[arg(long, global = true)]
    memory: bool,
    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending database migrations.
    Migrate,
    /// Replace all data with demo banners and showings.
    Seed {
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    Banner(BannerCmd),
    Showing(ShowingCmd),
    /// Banners that ran on a date and how much of their minimum they met.
    Promotion {
        /// Defaults to the last analysed day.
        #[arg(long, value_parser = cli_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Portfolio-wide lifetime completion.
    Totals {
        #[arg(long)]
        json: bool,
    },
    /// Forecast of daily showings for running banners.
    Forecast {
        /// Show the per-day series of one banner.
        #[arg(long, value_name = "ID")]
        banner: Option<BannerId>,
        #[arg(long)]
        json: bool,
    },
}

/// Manage banners.
#[derive(Args)]
struct BannerCmd {
    #[command(subcommand)]
    sub: BannerSub,
}

#[derive(Subcommand)]
enum BannerSub {
    List {
        #[arg(long, value_enum, default_value_t = SortArg::Start)]
        sort: SortArg,
        #[arg(long)]
        json: bool,
    },
    Add(BannerFields),
    Update {
        id: BannerId,
        #[command(flatten)]
        fields: BannerFields,
    },
    Delete {
        id: BannerId,
    },
}

#[derive(Args)]
struct BannerFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    company: String,
    #[arg(long, value_parser = cli_date)]
    start: NaiveDate,
    #[arg(long, value_parser = cli_date)]
    end: NaiveDate,
    #[arg(long, allow_negative_numbers = true)]
    min: i64,
    #[arg(long, allow_negative_numbers = true)]
    max: i64,
}

impl BannerFields {
    fn into_short_data(self) -> Result<BannerShortData> {
        Ok(BannerShortData::new(
            self.name,
            self.company,
            self.start,
            self.end,
            self.min,
            self.max,
        )?)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Start,
    End,
}

impl From<SortArg> for SortMode {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Start => SortMode::ByDateStart,
            SortArg::End => SortMode::ByDateEnd,
        }
    }
}

/// Manage showings of one banner.
#[derive(Args)]
struct ShowingCmd {
    #[command(subcommand)]
    sub: ShowingSub,
}

#[derive(Subcommand)]
enum ShowingSub {
    List {
        banner: BannerId,
    },
    Add {
        banner: BannerId,
        #[arg(long)]
        site: String,
        /// "dd.mm.yyyy HH:MM"
        #[arg(long, value_parser = cli_datetime)]
        at: NaiveDateTime,
    },
    Update {
        banner: BannerId,
        id: ShowingId,
        #[arg(long)]
        site: String,
        #[arg(long, value_parser = cli_datetime)]
        at: NaiveDateTime,
    },
    Delete {
        banner: BannerId,
        id: ShowingId,
    },
}

fn cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s)
        .or_else(|_| s.trim().parse::<NaiveDate>())
        .map_err(|_| format!("expected dd.mm.yyyy or YYYY-MM-DD, got {s:?}"))
}

fn cli_datetime(s: &str) -> Result<NaiveDateTime, String> {
    parse_datetime(s).map_err(|_| format!("expected \"dd.mm.yyyy HH:MM\", got {s:?}"))
}

fn init_logging(filter: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("banner_campaigns=debug,campaigns=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => AppConfig::default(),
    };
    init_logging(&cfg.logging.filter, cli.verbose);
    cfg.apply_env();
    if let Some(url) = &cli.database {
        cfg.database_url = url.clone();
    }

    let today = match cli.today {
        Some(date) => date,
        None => match env_today()? {
            Some(date) => date,
            None => cfg.today()?,
        },
    };
    tracing::debug!(%today, database = %cfg.database_url, memory = cli.memory, "starting");

    if cli.memory {
        let mut store = MemoryStore::new();
        seed_store(&mut store, today, DEFAULT_SEED)?;
        return run(store, cli.cmd, today, None);
    }
    if let Cmd::Migrate = cli.cmd {
        let applied = banner_campaigns::db::migrate::run_sqlite(&cfg.database_url)?;
        println!("applied {} migration(s)", applied.len());
        for version in applied {
            println!("  {version}");
        }
        return Ok(());
    }
    let store = SqliteStore::open(&cfg.database_url)
        .with_context(|| format!("open database {}", cfg.database_url))?;
    run(store, cli.cmd, today, Some(&cfg.database_url))
}

fn run<S: CampaignStore>(
    store: S,
    cmd: Cmd,
    today: NaiveDate,
    database: Option<&str>,
) -> Result<()> {
    let mut registry = CampaignRegistry::open(store)?;

    match cmd {
        Cmd::Migrate => println!("in-memory store, nothing to migrate"),
        Cmd::Seed { seed } => {
            let report = seed_store(registry.store_mut(), today, seed)?;
            registry.load()?;
            println!(
                "seeded {} banners and {} showings into {}",
                report.banners,
                report.showings,
                database.unwrap_or("memory"),
            );
        }
        Cmd::Banner(BannerCmd { sub }) => banner(&mut registry, sub)?,
        Cmd::Showing(ShowingCmd { sub }) => showing(&mut registry, sub)?,
        Cmd::Promotion { date, json } => {
            let analyzer = registry.promotion(today);
            let Some(date) = date.or(analyzer.max_date()) else {
                println!("no history before {}", format_date(today));
                return Ok(());
            };
            if json {
                return print_json(&analyzer.stats_for_date(date));
            }
            let table = PromotionTable::new(&analyzer, date);
            println!("Promotion on {}", format_date(date));
            println!("{}", terminal_table(&table));
            for stats in analyzer.stats_for_date(date) {
                println!(
                    "{}: {:.1}% of daily minimum, {:.1}% of lifetime minimum ({}/{})",
                    stats.name,
                    stats.completion_today(),
                    stats.completion_all(),
                    stats.fact_all,
                    stats.min_all,
                );
            }
        }
        Cmd::Totals { json } => {
            let totals = registry.promotion(today).alltime_totals();
            if json {
                return print_json(&totals);
            }
            println!("showings:        {}", totals.fact_all);
            println!("lifetime min:    {}", totals.min_all);
            println!("lifetime max:    {}", totals.max_all);
            println!("completion:      {:.2}%", totals.completion());
        }
        Cmd::Forecast { banner, json } => {
            let forecast = registry.forecast(today);
            match banner {
                Some(id) => {
                    let series = forecast
                        .position(id)
                        .and_then(|i| forecast.forecast_for_banner(i));
                    let Some(series) = series else {
                        bail!(
                            "banner {id} has no forecast (unknown or finished before {})",
                            format_date(today)
                        );
                    };
                    if json {
                        return print_json(&series);
                    }
                    println!("{}", terminal_table(&SeriesTable::new(&series)));
                }
                None => {
                    if json {
                        return print_json(&forecast);
                    }
                    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
                    let avg: Vec<String> = days
                        .iter()
                        .zip(forecast.weekday_average())
                        .map(|(d, a)| format!("{d} {a:.1}"))
                        .collect();
                    println!("Average showings per weekday: {}", avg.join(", "));
                    let ids: Vec<_> = forecast.rows().iter().map(|r| r.banner_id).collect();
                    println!("{}", terminal_table_with_ids(&ForecastTable::new(&forecast), &ids));
                }
            }
        }
    }
    Ok(())
}

fn banner<S: CampaignStore>(registry: &mut CampaignRegistry<S>, sub: BannerSub) -> Result<()> {
    match sub {
        BannerSub::List { sort, json } => {
            registry.sort(sort.into());
            if json {
                return print_json(&registry.banners());
            }
            let ids: Vec<_> = registry.banners().iter().map(|b| b.id()).collect();
            let table = BannerTable::new(registry.banners());
            println!("{}", terminal_table_with_ids(&table, &ids));
        }
        BannerSub::Add(fields) => {
            let id = registry.create_banner(fields.into_short_data()?)?;
            println!("created banner {id}");
        }
        BannerSub::Update { id, fields } => {
            registry.update_banner(fields.into_short_data()?, id)?;
            println!("updated banner {id}");
        }
        BannerSub::Delete { id } => {
            registry.delete_banner(id)?;
            println!("deleted banner {id}");
        }
    }
    Ok(())
}

fn showing<S: CampaignStore>(registry: &mut CampaignRegistry<S>, sub: ShowingSub) -> Result<()> {
    match sub {
        ShowingSub::List { banner } => {
            let data = registry.select_banner(banner)?;
            println!(
                "{} ({}), {} - {}, {}..{} per day",
                data.name(),
                data.company_name(),
                format_date(data.date_start()),
                format_date(data.date_end()),
                data.min_showings(),
                data.max_showings(),
            );
            let showings = registry.selected_showings();
            let ids: Vec<_> = showings.iter().map(|s| s.id).collect();
            println!("{}", terminal_table_with_ids(&ShowingTable::new(showings), &ids));
        }
        ShowingSub::Add { banner, site, at } => {
            let id = registry.create_showing(ShowingShortData::new(site, at), banner)?;
            println!("created showing {id}");
        }
        ShowingSub::Update { banner, id, site, at } => {
            registry.update_showing(ShowingShortData::new(site, at), banner, id)?;
            println!("updated showing {id}");
        }
        ShowingSub::Delete { banner, id } => {
            registry.delete_showing(banner, id)?;
            println!("deleted showing {id}");
        }
    }
    Ok(())
}

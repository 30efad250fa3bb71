use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use log::{debug, info};
use serde::Serialize;

use crate::catalog::{
    CatalogSource, FetchOptions, SortOrder, Suggestion, ALL_CATEGORY, DEFAULT_NEW_GAME_DAYS,
};
use crate::cli::args::{CliArgs, Command, ListArgs, RouteArgs, ShowArgs, SitemapArgs, SuggestArgs};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::meta::{self, PageMeta};
use crate::output::sitemap::{SitemapBuilder, DEFAULT_BASE_URL};
use crate::output::{self, GameRecord, Listing, OutputFormat};
use crate::portal::{Options, Portal, View, DEFAULT_RELATED_LIMIT};
use crate::router::{ResolvedRoute, RouteName, Router};
use crate::sanitize::clamp_search_query;

const DEFAULT_TIMEOUT: u64 = 10;
const DEFAULT_SUGGESTION_LIMIT: usize = 5;

fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // RUST_LOG, when set, wins over -v
    builder.parse_env("RUST_LOG");
    builder.format(|fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
    });
    let _ = builder.try_init();
}

fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<10}: {}\n", label, value)
}

/// Picks the subcommand named on the command line so `kloopik list --help`
/// renders the listing flags instead of the top-level ones. Returns the
/// display name alongside the command.
fn help_target<I, S>(argv: I) -> (String, clap::Command)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let root = CliArgs::command();
    for arg in argv.into_iter().skip(1) {
        if let Some(sub) = root.find_subcommand(arg.as_ref()) {
            let name = format!("{} {}", root.get_name(), sub.get_name());
            return (name, sub.clone());
        }
    }
    (root.get_name().to_string(), root)
}

fn render_custom_help(name: &str, cmd: &clap::Command) -> String {
    let mut out = String::new();

    if let Some(version) = cmd.get_version() {
        out.push_str(name);
        out.push(' ');
        out.push_str(version);
        out.push('\n');
    } else {
        out.push_str(name);
        out.push('\n');
    }

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(name);
    out.push_str(" [OPTIONS]");
    for positional in cmd.get_positionals() {
        let value_name = positional
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        out.push_str(&format!(" <{value_name}>"));
    }
    if cmd.has_subcommands() {
        out.push_str(" <COMMAND>");
    }
    out.push_str("\n\n");

    if cmd.has_subcommands() {
        out.push_str("Commands:\n");
        for sub in cmd.get_subcommands() {
            let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
            out.push_str(&format!("  {:<12}{}\n", sub.get_name(), about.trim()));
        }
        out.push('\n');
    }

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }

        let heading = if arg.is_positional() {
            "Arguments".to_string()
        } else {
            arg.get_help_heading().unwrap_or("Options").to_string()
        };

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");

            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                if !flags.is_empty() {
                    flags.push(' ');
                }
                flags.push_str(&format!("<{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            out.push('\n');
        }
    }

    out
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: CatalogSource,
    page_size: usize,
    related_limit: usize,
    new_game_days: i64,
    timeout: u64,
    proxy: Option<String>,
    no_color: bool,
    output_format: Option<OutputFormat>,
    base_url: String,
    sitemap_output: Option<String>,
    favorites: Vec<String>,
    recent: Vec<String>,
    command: Command,
}

fn parse_format(raw: &str, origin: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(raw)
        .ok_or_else(|| format!("invalid {origin} '{raw}', expected text or json"))
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let source = args
        .catalog
        .or(cfg.catalog)
        .map(|raw| CatalogSource::parse(&raw))
        .unwrap_or_default();

    let list_page_size = match &args.command {
        Command::List(list) => list.page_size,
        _ => None,
    };
    let page_size = list_page_size
        .or(cfg.page_size)
        .unwrap_or(crate::catalog::DEFAULT_PAGE_SIZE);
    crate::utils::parse_positive(page_size, "page_size")?;

    let related_limit = cfg.related_limit.unwrap_or(DEFAULT_RELATED_LIMIT);

    let new_game_days = cfg.new_game_days.unwrap_or(DEFAULT_NEW_GAME_DAYS);
    if new_game_days < 0 {
        return Err(format!(
            "invalid new_game_days {new_game_days}, expected zero or more"
        ));
    }

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let proxy = args
        .proxy
        .or(cfg.proxy)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let output_format = cfg
        .output_format
        .as_deref()
        .map(|raw| parse_format(raw, "output_format"))
        .transpose()?;

    let (sitemap_base, sitemap_output) = match &args.command {
        Command::Sitemap(SitemapArgs { base_url, output }) => (base_url.clone(), output.clone()),
        _ => (None, None),
    };
    let base_url = sitemap_base
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let sitemap_output = sitemap_output.or(cfg.sitemap_output);

    let (favorites_arg, recent_arg) = match &args.command {
        Command::Route(RouteArgs {
            favorites, recent, ..
        }) => (favorites.clone(), recent.clone()),
        _ => (None, None),
    };
    let favorites = match favorites_arg {
        Some(raw) => crate::utils::parse_id_csv(&raw),
        None => crate::utils::clean_id_list(&cfg.favorites.unwrap_or_default()),
    };
    let recent = match recent_arg {
        Some(raw) => crate::utils::parse_id_csv(&raw),
        None => crate::utils::clean_id_list(&cfg.recent.unwrap_or_default()),
    };

    Ok(RunConfig {
        source,
        page_size,
        related_limit,
        new_game_days,
        timeout,
        proxy,
        no_color,
        output_format,
        base_url,
        sitemap_output,
        favorites,
        recent,
        command: args.command,
    })
}

fn portal_options(run: &RunConfig) -> Options {
    Options {
        source: run.source.clone(),
        page_size: run.page_size,
        related_limit: run.related_limit,
        new_game_days: run.new_game_days,
        fetch: FetchOptions {
            timeout_seconds: run.timeout,
            proxy: run.proxy.clone(),
        },
    }
}

/// Resolves the output format: explicit flag, then the output file's
/// extension, then the config default.
fn resolve_format(
    flag: Option<&str>,
    output_path: Option<&str>,
    configured: Option<OutputFormat>,
) -> Result<OutputFormat, String> {
    if let Some(raw) = flag {
        return parse_format(raw, "--format");
    }
    Ok(output_path
        .and_then(output::infer_format_from_path)
        .or(configured)
        .unwrap_or(OutputFormat::Text))
}

fn emit(contents: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => {
            let target = config::expand_tilde(path);
            std::fs::write(&target, contents)
                .map_err(|e| format!("failed to write output '{}': {e}", target.display()))?;
            info!("wrote {}", target.display());
            Ok(())
        }
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}

fn list_games(portal: &mut Portal, list: &ListArgs) -> Listing {
    let catalog = portal.catalog_mut();
    catalog.reset();
    if let Some(category) = list.category.as_deref() {
        catalog.filter_by_category(category);
    }
    if let Some(query) = list.search.as_deref() {
        catalog.search(&clamp_search_query(query));
    }
    if let Some(order) = list.sort.as_deref().and_then(SortOrder::parse) {
        catalog.set_sort_order(order);
    }
    let page_size = catalog.page_size();
    catalog.paginate(page_size);
    for _ in 0..list.pages.unwrap_or(1) {
        catalog.load_more();
    }
    Listing {
        state: catalog.filter_state(),
        has_more: catalog.has_more(),
        games: output::build_records(&catalog.current_page()),
    }
}

fn render_listing(listing: &Listing, format: OutputFormat, no_color: bool) -> Result<String, String> {
    match format {
        OutputFormat::Json => {
            let mut out = output::render_json(listing)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => {
            let state = &listing.state;
            let mut out = format!(
                ":: Showing {} of {} games (category: {}, search: '{}', sort: {})\n",
                state.displayed, state.total, state.category, state.search, state.sort
            );
            out.push_str(&output::render_text(&listing.games, no_color));
            if listing.has_more {
                out.push_str(":: more available, raise --pages to see them\n");
            }
            Ok(out)
        }
    }
}

fn render_meta(meta: &PageMeta) -> String {
    let mut out = String::new();
    out.push_str(&format_kv_line("Title", &meta.title));
    out.push_str(&format_kv_line("Summary", &meta.description));
    if let Some(image) = meta.image.as_deref() {
        out.push_str(&format_kv_line("Image", image));
    }
    out
}

fn render_view_text(view: &View<'_>, no_color: bool) -> String {
    let mut out = String::new();
    let games: Vec<GameRecord> = match view {
        View::Home {
            games,
            total,
            has_more,
            recently_added,
            new_count,
        } => {
            out.push_str(&format_kv_line("Games", &format!("{} of {total}", games.len())));
            out.push_str(&format_kv_line("More", &has_more.to_string()));
            out.push_str(&format_kv_line("New", &new_count.to_string()));
            if !recently_added.is_empty() {
                out.push_str(":: Recently added\n");
                out.push_str(&output::render_text(&output::build_records(recently_added), no_color));
                out.push_str(":: All games\n");
            }
            output::build_records(games)
        }
        View::Category {
            category,
            games,
            total,
            has_more,
        } => {
            out.push_str(&format_kv_line("Category", category));
            out.push_str(&format_kv_line("Games", &format!("{} of {total}", games.len())));
            out.push_str(&format_kv_line("More", &has_more.to_string()));
            output::build_records(games)
        }
        View::Favorites { games } | View::Recent { games } => {
            out.push_str(&format_kv_line("Games", &games.len().to_string()));
            output::build_records(games)
        }
        View::Game { game, related, meta } => {
            let record = GameRecord::from(*game);
            let title = if no_color {
                record.title.clone()
            } else {
                record.title.bold().to_string()
            };
            out.push_str(&format_kv_line("Game", &title));
            out.push_str(&format_kv_line("Id", &record.id));
            out.push_str(&format_kv_line("Url", &record.url));
            out.push_str(&format_kv_line("Genres", &record.genres.join(", ")));
            out.push_str(&format_kv_line("Tags", &record.tags.join(", ")));
            out.push_str(&format_kv_line("Mobile", &record.mobile_ready.to_string()));
            out.push_str(&format_kv_line("Thumbnail", &record.thumbnail));
            if let Some(play) = game.game_url.as_deref() {
                out.push_str(&format_kv_line("Play", play));
            }
            out.push_str(&render_meta(meta));
            out.push_str(":: Related\n");
            output::build_records(related)
        }
        View::GameNotFound { slug } => {
            out.push_str(&format_kv_line("Missing", slug));
            Vec::new()
        }
    };
    out.push_str(&output::render_text(&games, no_color));
    out
}

#[derive(Serialize)]
struct RouteReport<'a> {
    route: &'a ResolvedRoute,
    meta: PageMeta,
    view: &'a View<'a>,
}

fn render_route(
    portal: &mut Portal,
    args: &RouteArgs,
    run: &RunConfig,
) -> Result<String, String> {
    let format = resolve_format(args.format.as_deref(), None, run.output_format)?;
    let no_color = run.no_color;
    let (resolved, view) = portal.open(&args.fragment, &run.favorites, &run.recent);
    let meta = match &view {
        View::Game { meta, .. } => meta.clone(),
        _ => meta::page_meta(&resolved),
    };
    match format {
        OutputFormat::Json => {
            let report = RouteReport {
                route: &resolved,
                meta,
                view: &view,
            };
            let mut out = output::render_json(&report)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => {
            let params = resolved
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut out = String::new();
            out.push_str(&format_kv_line("Route", resolved.route.as_str()));
            out.push_str(&format_kv_line("Path", &resolved.path));
            out.push_str(&format_kv_line("Params", &params));
            if !matches!(view, View::Game { .. }) {
                out.push_str(&render_meta(&meta));
            }
            out.push_str(&render_view_text(&view, no_color));
            Ok(out)
        }
    }
}

fn render_show(portal: &mut Portal, args: &ShowArgs, run: &RunConfig) -> Result<String, String> {
    let format = resolve_format(args.format.as_deref(), None, run.output_format)?;
    let params = [("slug".to_string(), args.slug.clone())].into_iter().collect();
    let fragment = format!("#{}", Router::build_url(RouteName::Game, &params));
    let no_color = run.no_color;
    let (_, view) = portal.open(&fragment, &run.favorites, &run.recent);
    if let View::GameNotFound { slug } = &view {
        return Err(format!("game '{slug}' not found"));
    }
    match format {
        OutputFormat::Json => {
            let mut out = output::render_json(&view)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => Ok(render_view_text(&view, no_color)),
    }
}

fn render_categories(portal: &Portal, no_color: bool) -> String {
    let catalog = portal.catalog();
    let mut out = String::new();
    for category in catalog.categories() {
        let count = if category == ALL_CATEGORY {
            catalog.len()
        } else {
            catalog.games_by_genre(&category, usize::MAX).len()
        };
        let label = if no_color {
            category.clone()
        } else {
            category.cyan().to_string()
        };
        out.push_str(&format!("{label:<24} {count}\n"));
    }
    out
}

fn render_suggestions(portal: &Portal, args: &SuggestArgs) -> String {
    let limit = args.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);
    let query = clamp_search_query(&args.query);
    let mut out = String::new();
    for suggestion in portal.catalog().search_suggestions(&query, limit) {
        let (kind, link) = match &suggestion {
            Suggestion::Game { slug, .. } => {
                let params = [("slug".to_string(), slug.clone())].into_iter().collect();
                ("game", Router::build_url(RouteName::Game, &params))
            }
            Suggestion::Category { text } => {
                let params = [("category".to_string(), text.clone())].into_iter().collect();
                ("category", Router::build_url(RouteName::Category, &params))
            }
        };
        out.push_str(&format!("{kind:<9} {:<40} #{link}\n", suggestion.text()));
    }
    out
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let mut portal = Portal::new(portal_options(&run)).map_err(|e| e.to_string())?;
    portal
        .router_mut()
        .subscribe(|route| debug!("route changed to {} ({})", route.route, route.path));
    portal
        .load()
        .await
        .map_err(|e| format!("failed to load catalog '{}': {e}", run.source.describe()))?;

    match &run.command {
        Command::List(list) => {
            let format = resolve_format(
                list.format.as_deref(),
                list.output.as_deref(),
                run.output_format,
            )?;
            let listing = list_games(&mut portal, list);
            emit(
                &render_listing(&listing, format, run.no_color || list.output.is_some())?,
                list.output.as_deref(),
            )
        }
        Command::Show(show) => emit(&render_show(&mut portal, show, &run)?, None),
        Command::Route(route) => emit(&render_route(&mut portal, route, &run)?, None),
        Command::Categories => emit(&render_categories(&portal, run.no_color), None),
        Command::Suggest(suggest) => emit(&render_suggestions(&portal, suggest), None),
        Command::Sitemap(_) => {
            let sitemap = SitemapBuilder::today(&run.base_url).build(portal.catalog());
            info!("sitemap has {} urls", sitemap.len());
            emit(&sitemap.to_xml(), run.sitemap_output.as_deref())
        }
        Command::InitConfig => Ok(()),
    }
}

fn init_config(path: Option<PathBuf>) -> Result<(), String> {
    let path = path
        .or_else(config::default_config_path)
        .ok_or_else(|| "cannot determine home directory for config".to_string())?;
    if config::ensure_default_config_file(&path)? {
        println!(":: wrote default config to {}", path.display());
    } else {
        println!(":: config already exists at {}", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                let (name, cmd) = help_target(std::env::args());
                print!("{}", render_custom_help(&name, &cmd));
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    if matches!(args.command, Command::InitConfig) {
        return init_config(user_config_path);
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    debug!("catalog source: {}", run.source.describe());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

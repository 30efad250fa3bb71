use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "kloopik",
    version,
    about = "browse and route a browser-game catalog",
    long_about = "Kloopik loads a game catalog document, filters and pages it, resolves hash routes to views and builds a sitemap.\n\nExamples:\n  kloopik list --category puzzle --pages 2\n  kloopik route '#/game/block-drop'\n  kloopik --catalog https://cdn.example.com/games.json sitemap -o sitemap.xml\n\nTip: Use --config to persist the catalog location and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'c',
        long = "cat",
        visible_alias = "catalog",
        value_name = "SRC",
        global = true,
        help_heading = "Input",
        help = "Catalog document: a file path or an http(s) URL (defaults to ./games.json)."
    )]
    pub catalog: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.kloopik/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Catalog request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List games, optionally filtered by category and search text.
    List(ListArgs),
    /// Show one game with its page metadata and related games.
    Show(ShowArgs),
    /// Resolve a hash fragment and print the resulting view.
    Route(RouteArgs),
    /// List the categories derived from the catalog.
    Categories,
    /// Suggest games and categories for a partial query.
    Suggest(SuggestArgs),
    /// Build a sitemap of the home page, categories and games.
    Sitemap(SitemapArgs),
    /// Write the default config file if it does not exist.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(
        short = 'g',
        long = "cat-filter",
        visible_alias = "category",
        value_name = "CATEGORY",
        help_heading = "Filters",
        help = "Only show games with this genre ('all' for everything)."
    )]
    pub category: Option<String>,

    #[arg(
        short = 's',
        long = "q",
        visible_alias = "search",
        value_name = "QUERY",
        help_heading = "Filters",
        help = "Case-insensitive search over title, description, tags and genres."
    )]
    pub search: Option<String>,

    #[arg(
        long = "srt",
        visible_alias = "sort",
        value_name = "ORDER",
        help_heading = "Filters",
        help = "Sort order: default, name-asc, name-desc or random."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'n',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Paging",
        help = "Games revealed per page."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'P',
        long = "pg",
        visible_alias = "pages",
        value_name = "N",
        help_heading = "Paging",
        help = "Number of pages to reveal (defaults to 1)."
    )]
    pub pages: Option<usize>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json)."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the listing to a file instead of stdout."
    )]
    pub output: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(value_name = "SLUG", help = "Game slug, e.g. block-drop.")]
    pub slug: String,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json)."
    )]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    #[arg(value_name = "FRAGMENT", help = "Hash fragment, e.g. '#/category/puzzle'.")]
    pub fragment: String,

    #[arg(
        long = "fav",
        visible_alias = "favorites",
        value_name = "IDS",
        help_heading = "Input",
        help = "Favorite game ids for the favorites view (comma-separated)."
    )]
    pub favorites: Option<String>,

    #[arg(
        long = "rec",
        visible_alias = "recent",
        value_name = "IDS",
        help_heading = "Input",
        help = "Recently played game ids for the recent view (comma-separated)."
    )]
    pub recent: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json)."
    )]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SuggestArgs {
    #[arg(value_name = "QUERY", help = "Partial search text (at least 2 characters).")]
    pub query: String,

    #[arg(
        short = 'l',
        long = "lim",
        visible_alias = "limit",
        value_name = "N",
        help_heading = "Output",
        help = "Maximum suggestions (defaults to 5)."
    )]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SitemapArgs {
    #[arg(
        short = 'b',
        long = "bu",
        visible_alias = "base-url",
        value_name = "URL",
        help_heading = "Sitemap",
        help = "Site origin prefixed to every location (defaults to https://kloopik.com)."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the sitemap to a file instead of stdout."
    )]
    pub output: Option<String>,
}

use crate::catalog::SortOrder;
use crate::cli::args::{CliArgs, Command};
use crate::output::OutputFormat;
use crate::sanitize::sanitize_slug;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.catalog.as_deref() {
        if raw.trim().is_empty() {
            return Err("invalid --catalog, expected a path or URL".to_string());
        }
    }
    match &args.command {
        Command::List(list) => {
            if let Some(page_size) = list.page_size {
                crate::utils::parse_positive(page_size, "page-size")?;
            }
            if let Some(pages) = list.pages {
                crate::utils::parse_positive(pages, "pages")?;
            }
            if let Some(raw) = list.sort.as_deref() {
                SortOrder::parse(raw).ok_or_else(|| {
                    format!("invalid --sort '{raw}', expected default, name-asc, name-desc or random")
                })?;
            }
            if let Some(raw) = list.format.as_deref() {
                validate_format(raw)?;
            }
        }
        Command::Show(show) => {
            if sanitize_slug(&show.slug).is_none() {
                return Err(format!("invalid slug '{}'", show.slug));
            }
            if let Some(raw) = show.format.as_deref() {
                validate_format(raw)?;
            }
        }
        Command::Suggest(suggest) => {
            if let Some(limit) = suggest.limit {
                crate::utils::parse_positive(limit, "limit")?;
            }
        }
        Command::Route(route) => {
            if let Some(raw) = route.format.as_deref() {
                validate_format(raw)?;
            }
        }
        Command::Categories | Command::Sitemap(_) | Command::InitConfig => {}
    }
    Ok(())
}

fn validate_format(raw: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(raw).ok_or_else(|| format!("invalid --format '{raw}', expected text or json"))
}

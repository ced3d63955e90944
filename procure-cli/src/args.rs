//! Command line arguments

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(name = "procure")]
#[command(version)]
#[command(about = "Browse procurement documents the way the web tables do")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Site URL, e.g. https://erp.example.com
    #[arg(long, global = true, env = "PROCURE_URL")]
    pub site: Option<String>,

    /// API key of the user to authenticate as
    #[arg(long, global = true, env = "PROCURE_API_KEY")]
    pub api_key: Option<String>,

    /// API secret of the user to authenticate as
    #[arg(long, global = true, env = "PROCURE_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Log debug output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one page of a doctype
    List(ListArgs),

    /// Fetch the distinct values of a field under the current filters
    Facets(FacetArgs),
}

/// Table state shared by both commands.
#[derive(Debug, Args)]
pub struct TableArgs {
    /// The doctype to read
    pub doctype: String,

    /// Fields to fetch
    #[arg(long, value_delimiter = ',', default_value = "name")]
    pub fields: Vec<String>,

    /// URL sync key the state is stored under
    #[arg(long, default_value = "list")]
    pub key: String,

    /// Query string to restore state from, as copied from a shared link
    #[arg(long, default_value = "")]
    pub url: String,

    /// User filter, `field:op:value` or `field=value`
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Filter that is always applied and never written to the URL
    #[arg(long = "static-filter")]
    pub static_filters: Vec<String>,

    /// Search term
    #[arg(long)]
    pub search: Option<String>,

    /// Field to search (must be one of the fetched fields)
    #[arg(long)]
    pub search_field: Option<String>,

    /// Fetched field holding JSON, searched with the JSON predicate
    #[arg(long = "json-field")]
    pub json_fields: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Sort order, `field:asc` or `field:desc`
    #[arg(long)]
    pub sort: Option<String>,

    /// One-based page number
    #[arg(long)]
    pub page: Option<usize>,

    /// Rows per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FacetArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Field whose distinct values are listed
    #[arg(long)]
    pub field: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::try_parse_from([
            "procure",
            "list",
            "Purchase Requisition",
            "--fields",
            "name,status,items",
            "--filter",
            "status=Open",
            "--filter",
            "grand_total:>:1000",
            "--json-field",
            "items",
            "--page",
            "2",
            "--site",
            "https://erp.example.com",
        ])
        .unwrap();

        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.table.doctype, "Purchase Requisition");
        assert_eq!(args.table.fields, vec!["name", "status", "items"]);
        assert_eq!(args.table.filters.len(), 2);
        assert_eq!(args.table.json_fields, vec!["items"]);
        assert_eq!(args.page, Some(2));
        assert_eq!(cli.site.as_deref(), Some("https://erp.example.com"));
    }
}

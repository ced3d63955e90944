//! `procure`: list and facet procurement documents from the command line.
//!
//! Every invocation mounts the same table controller the web views use, so
//! `--url` accepts (and the output prints) the query string a shared link
//! would carry.

mod args;
mod error;
mod filter_arg;
mod output;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use procure_lib::Credentials;
use procure_lib::FrappeClient;
use procure_lib::table::ColumnDef;
use procure_lib::table::SearchField;
use procure_lib::table::ServerDataTable;
use procure_lib::table::TableConfig;
use procure_lib::url_state::UrlStateManager;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::args::Cli;
use crate::args::Command;
use crate::args::FacetArgs;
use crate::args::ListArgs;
use crate::args::TableArgs;
use crate::error::CliError;
use crate::filter_arg::parse_filter;
use crate::filter_arg::parse_sort;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    match &cli.log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = connect(&cli)?;
    match cli.command {
        Command::List(args) => list(client, args).await,
        Command::Facets(args) => facets(client, args).await,
    }
}

fn connect(cli: &Cli) -> Result<FrappeClient, CliError> {
    let site = cli
        .site
        .clone()
        .ok_or(CliError::MissingSetting("site URL (--site or PROCURE_URL)"))?;
    let credentials = match (&cli.api_key, &cli.api_secret) {
        (Some(key), Some(secret)) => Credentials::api_token(key, secret),
        (None, None) => Credentials::None,
        _ => return Err(CliError::MissingSetting("API key or secret (both are required)")),
    };

    Ok(FrappeClient::builder()
        .url(site)
        .credentials(credentials)
        .timeout(Duration::from_secs(cli.timeout))
        .build()?)
}

fn table_config(args: &TableArgs) -> Result<TableConfig, CliError> {
    let mut fields = args.fields.clone();
    for field in &args.json_fields {
        if !fields.contains(field) {
            fields.push(field.clone());
        }
    }

    let mut config = TableConfig::new(&args.doctype, &args.key, fields.clone())
        .with_page_size_options(Vec::new());
    for field in &fields {
        let search = SearchField::new(field, field);
        config = config.with_search_field(if args.json_fields.contains(field) {
            search.json()
        } else {
            search
        });
    }
    for raw in &args.static_filters {
        config = config.with_static_filter(parse_filter(raw)?);
    }
    Ok(config)
}

/// Mounts a table and applies the user's filters and search on top of the
/// state restored from `--url`.
fn mount(
    config: TableConfig,
    client: FrappeClient,
    args: &TableArgs,
) -> Result<(ServerDataTable, UrlStateManager), CliError> {
    let urls = UrlStateManager::in_memory(&args.url);
    let table = ServerDataTable::new(config, Arc::new(client), urls.clone())?;

    for raw in &args.filters {
        table.set_column_filter(parse_filter(raw)?);
    }
    if let Some(field) = &args.search_field {
        table.set_search_field(field)?;
    }
    if let Some(term) = &args.search {
        table.set_search_term(term.as_str());
    }
    Ok((table, urls))
}

async fn list(client: FrappeClient, args: ListArgs) -> Result<(), CliError> {
    let config = table_config(&args.table)?;
    let fields = config.fields.clone();
    let (table, urls) = mount(config, client, &args.table)?;

    if let Some(sort) = &args.sort {
        let order = parse_sort(sort)?;
        table.set_sort(order.field, order.direction);
    }
    if let Some(size) = args.page_size {
        table.set_page_size(size);
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err(CliError::InvalidPage);
        }
        table.set_page_index(page - 1);
    }

    let model = table.settled().await?;
    if let Some(error) = model.error {
        return Err(CliError::Fetch(error));
    }

    let state = table.state();
    let query = urls.query_string();
    if args.json {
        println!("{}", output::render_json(&model, &state, &query)?);
    } else {
        print!("{}", output::render_table(&fields, &model.rows));
        eprintln!(
            "page {} of {} ({} rows)",
            state.page_index + 1,
            table.page_count().max(1),
            model.total_count
        );
        eprintln!("url: ?{}", query);
    }
    Ok(())
}

async fn facets(client: FrappeClient, args: FacetArgs) -> Result<(), CliError> {
    let mut table_args = args.table;
    if !table_args.fields.contains(&args.field) {
        table_args.fields.push(args.field.clone());
    }
    let config = table_config(&table_args)?.with_column(ColumnDef::new(&args.field).with_facet());
    let (table, _urls) = mount(config, client, &table_args)?;

    let values = table.fetch_facet_values(&args.field).await?;
    print!("{}", output::render_facets(&values));
    Ok(())
}

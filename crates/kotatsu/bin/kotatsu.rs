#[macro_use]
extern crate log;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use kotatsu::{
    domain::{
        filter::{FilterMacro, ListFilterOption},
        repositories::suggestion::SuggestionRepository,
        services::{manga::MangaService, suggestion::SuggestionService},
    },
    infrastructure::{
        config::{Config, GLOBAL_CONFIG},
        database,
        domain::repositories::{manga::MangaRepositoryImpl, suggestion::SuggestionRepositoryImpl},
    },
};
use kotatsu_lib::{
    models::{Manga, MangaChapter, MangaSource, MangaTag, SortOrder},
    uid::generate_uid_str,
};
use kotatsu_parsers::{context::MangaLoaderContext, manager::SourceManager};
use serde::Serialize;

#[derive(Parser)]
#[clap(version, about = "Browse manga sources and the local suggestion list")]
struct Opts {
    /// Path to config file
    #[clap(long)]
    config: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List bundled sources
    Sources,
    /// Fetch one page of a source catalogue
    List {
        #[clap(long, default_value = "DESUME")]
        source: MangaSource,
        #[clap(long, default_value_t = 0)]
        offset: usize,
        #[clap(long)]
        query: Option<String>,
        #[clap(long)]
        sort: Option<SortOrder>,
        /// Site native tag key
        #[clap(long)]
        tag: Option<String>,
    },
    /// Fetch details and chapters of a manga by its source relative url
    Details {
        #[clap(long, default_value = "DESUME")]
        source: MangaSource,
        url: String,
        #[clap(long, default_value = "")]
        title: String,
    },
    /// Fetch page images of a chapter by its source relative url
    Pages {
        #[clap(long, default_value = "DESUME")]
        source: MangaSource,
        url: String,
    },
    /// Fetch the tag catalogue of a source
    Tags {
        #[clap(long, default_value = "DESUME")]
        source: MangaSource,
    },
    Suggestions {
        #[clap(subcommand)]
        command: SuggestionCommand,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    #[clap(long, default_value_t = 0)]
    limit: usize,
    /// Only NSFW manga
    #[clap(long)]
    nsfw: bool,
    /// Tag keys, any of them matches
    #[clap(long)]
    tag: Vec<String>,
    #[clap(long, default_value = "DESUME")]
    source: MangaSource,
}

impl FilterArgs {
    fn options(&self) -> Vec<ListFilterOption> {
        let mut options = vec![];
        if self.nsfw {
            options.push(ListFilterOption::Macro(FilterMacro::Nsfw));
        }
        options.extend(self.tag.iter().map(|key| {
            ListFilterOption::Tag(MangaTag {
                key: key.clone(),
                title: key.clone(),
                source: self.source,
            })
        }));

        options
    }
}

#[derive(Subcommand)]
enum SuggestionCommand {
    List(FilterArgs),
    /// Print the list again after every change until interrupted
    Watch(FilterArgs),
    Random {
        #[clap(long, default_value_t = 1)]
        limit: usize,
    },
    Count,
    /// Titles matching a LIKE pattern, e.g. `%one%`
    Titles { pattern: String },
    TopTags {
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
    /// Search a source and store the results as suggestions, ranked by rating
    Add {
        #[clap(long, default_value = "DESUME")]
        source: MangaSource,
        query: String,
        #[clap(long, default_value_t = 5)]
        count: usize,
    },
    Clear,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(kotatsu_log) = std::env::var("KOTATSU_LOG") {
            builder.parse_filters(&format!(
                "kotatsu={kotatsu_log},kotatsu_parsers={kotatsu_log}"
            ));
        }
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logger();

    let opts: Opts = Opts::parse();
    let config = GLOBAL_CONFIG.get_or_try_init(|| Config::open(opts.config.as_deref()))?;

    debug!("config: {:?}", config);

    let loader = Arc::new(MangaLoaderContext::new(
        &config.proxy,
        config.connect_timeout(),
    )?);
    let sources = SourceManager::with_bundled(loader, &config.sources);

    let pool = database::establish_connection(&config.database_path, config.create_database).await?;
    let manga_svc = MangaService::new(MangaRepositoryImpl::new(pool.clone()), sources);
    let suggestion_svc = SuggestionService::new(
        SuggestionRepositoryImpl::new(pool.clone()),
        MangaRepositoryImpl::new(pool.clone()),
    );

    match opts.command {
        Command::Sources => {
            let sources = manga_svc
                .sources()
                .list()
                .into_iter()
                .map(|source| {
                    let repo = manga_svc.sources().get(source)?;
                    Ok(serde_json::json!({
                        "source": source,
                        "title": source.title(),
                        "domain": repo.default_domain(),
                        "sort_orders": repo.sort_orders(),
                        "preferences": repo.preference_keys(),
                    }))
                })
                .collect::<Result<Vec<_>, kotatsu_lib::error::Error>>()?;
            print_json(&sources)?;
        }
        Command::List {
            source,
            offset,
            query,
            sort,
            tag,
        } => {
            let tag = tag.map(|key| MangaTag {
                title: key.clone(),
                key,
                source,
            });
            let list = manga_svc
                .fetch_source_manga(source, offset, query.as_deref(), sort, tag.as_ref())
                .await?;
            print_json(&list)?;
        }
        Command::Details { source, url, title } => {
            let manga = Manga {
                id: generate_uid_str(source, &url),
                source,
                url,
                title,
                ..Default::default()
            };
            let details = manga_svc.sources().get(source)?.get_details(&manga).await?;
            print_json(&details)?;
        }
        Command::Pages { source, url } => {
            let chapter = MangaChapter {
                id: generate_uid_str(source, &url),
                source,
                url,
                name: String::new(),
                number: 0,
            };
            print_json(&manga_svc.fetch_pages(&chapter).await?)?;
        }
        Command::Tags { source } => {
            let mut tags = manga_svc.fetch_tags(source).await?.into_iter().collect::<Vec<_>>();
            tags.sort_by(|a, b| a.key.cmp(&b.key));
            print_json(&tags)?;
        }
        Command::Suggestions { command } => {
            run_suggestions(command, &manga_svc, &suggestion_svc).await?;
        }
    }

    info!("closing database...");
    pool.close().await;

    Ok(())
}

async fn run_suggestions(
    command: SuggestionCommand,
    manga_svc: &MangaService<MangaRepositoryImpl>,
    suggestion_svc: &SuggestionService<SuggestionRepositoryImpl, MangaRepositoryImpl>,
) -> Result<(), anyhow::Error> {
    let repo = suggestion_svc.repo();

    match command {
        SuggestionCommand::List(args) => {
            print_json(&repo.get_all(args.limit, &args.options()).await?)?;
        }
        SuggestionCommand::Watch(args) => {
            let mut stream = repo.observe_filtered(args.limit, &args.options())?;
            loop {
                tokio::select! {
                    next = stream.next() => match next {
                        Some(list) => print_json(&list?)?,
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        info!("ctrl+c signal");
                        break;
                    }
                }
            }
        }
        SuggestionCommand::Random { limit } => {
            print_json(&repo.get_random_many(limit).await?)?;
        }
        SuggestionCommand::Count => {
            println!("{}", repo.count().await?);
        }
        SuggestionCommand::Titles { pattern } => {
            print_json(&repo.get_titles(&pattern).await?)?;
        }
        SuggestionCommand::TopTags { limit } => {
            print_json(&repo.get_top_tags(limit).await?)?;
        }
        SuggestionCommand::Add {
            source,
            query,
            count,
        } => {
            let found = manga_svc
                .fetch_source_manga(source, 0, Some(&query), None, None)
                .await?;
            for manga in found.iter().take(count) {
                let details = manga_svc.fetch_manga_detail(manga).await?;
                let relevance = if details.has_rating() {
                    details.rating as f64
                } else {
                    0.0
                };
                suggestion_svc.suggest(&details, relevance).await?;
                info!("suggested {} ({relevance})", details.title);
            }
        }
        SuggestionCommand::Clear => {
            repo.delete_all().await?;
        }
    }

    Ok(())
}

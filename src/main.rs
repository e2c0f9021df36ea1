#[macro_use]
extern crate prettytable;

use anyhow::{Context, Result};
use clap::{Command, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use clap_verbosity_flag::Verbosity;
use console::style;
use gerrit_rest::{Change, ChangeQuery, GerritClient, Review};
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_log::AsTrace;

mod output;
mod repo;
mod settings;

use crate::output::Format;
use crate::repo::Repo;

#[derive(Debug, Parser)]
#[command(name = "gerrit", author, version, about, long_about = None)] // Read from `Cargo.toml`
struct Cli {
    // If provided, outputs the completion file for given shell
    #[arg(long = "generate", value_enum)]
    generator: Option<Shell>,
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    workdir: Option<PathBuf>,
    /// Defaults to $XDG_CONFIG_HOME/gerrit/config.yaml
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List changes matching the filters, most recently updated first.
    #[command()]
    Query {
        /// Defaults to the project of the `origin` remote, use "any" to search everywhere.
        #[arg(short, long)]
        project: Option<String>,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long, default_value = "open")]
        status: String,
        #[arg(short, long)]
        topic: Option<String>,
        #[arg(long, conflicts_with = "owner")]
        mine: bool,
        #[arg(long)]
        owner: Option<String>,
        /// Extra search operators as key:value.
        #[arg(value_parser = parse_term)]
        terms: Vec<(String, String)>,
    },

    /// Print a change; the Change-Id of HEAD is used when none is given.
    #[command()]
    Show {
        change: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },

    #[command()]
    Project {
        name: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },

    #[command()]
    Topic {
        change: Option<String>,
        #[arg(long, conflicts_with = "delete")]
        set: Option<String>,
        #[arg(long)]
        delete: bool,
    },

    /// Review the current patch set.
    #[command()]
    Review {
        change: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
        /// Label vote, e.g. `-l Code-Review=+2`.
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, i32)>,
        #[arg(long)]
        tag: Option<String>,
    },

    #[command()]
    AddReviewer {
        reviewer: String,
        #[arg(long)]
        change: Option<String>,
    },

    #[command()]
    Abandon { change: Option<String> },

    #[command()]
    Rebase { change: Option<String> },

    #[command()]
    Submit { change: Option<String> },
}

fn parse_label(s: &str) -> Result<(String, i32), String> {
    let (name, vote) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=VOTE, got `{s}`"))?;
    let vote = vote
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid vote `{vote}`: {e}"))?;

    Ok((name.trim().to_owned(), vote))
}

fn parse_term(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected key:value, got `{s}`"))
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn connect(cli: &Cli) -> Result<GerritClient> {
    let path = cli.config.clone().or_else(settings::config_path);
    let mut config = settings::load(path.as_deref()).context("Cannot load gerrit settings")?;

    if config.username.is_some() && config.password.is_none() && console::user_attended() {
        let password = inquire::Password::new("Gerrit HTTP password:")
            .without_confirmation()
            .prompt()?;
        config.password = Some(password);
    }

    debug!("connecting to {}", config.url);

    GerritClient::from_config(&config).context("Cannot create gerrit client")
}

fn find_change<'a>(gerrit: &'a GerritClient, repo: Option<&Repo>, change: Option<String>) -> Result<Change<'a>> {
    let id = match change {
        Some(id) => id,
        None => repo
            .context("Not in a git repository, pass a change explicitly")?
            .head_change_id()?,
    };

    gerrit
        .get_change(&ChangeQuery::change(id.as_str()))?
        .with_context(|| format!("Change {id} not found"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbose.log_level_filter().as_trace())
        .init();

    if let Some(generator) = cli.generator {
        let mut cmd = Cli::command();
        eprintln!("Generating completion file for {generator:?}...");
        print_completions(generator, &mut cmd);

        return Ok(());
    }

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let gerrit = connect(&cli)?;
    let repo = Repo::new(cli.workdir.as_deref()).ok();

    match command {
        Commands::Query {
            project,
            branch,
            status,
            topic,
            mine,
            owner,
            terms,
        } => {
            let project = match project.as_deref() {
                Some("any") => None,
                Some(project) => Some(project.to_owned()),
                None => repo.as_ref().and_then(|r| r.get_name(None).ok()),
            };

            let mut builder = ChangeQuery::builder();
            builder.status(status.as_str());

            if let Some(project) = project {
                builder.project(project);
            }
            if let Some(branch) = branch {
                builder.branch(branch.as_str());
            }
            if let Some(topic) = topic {
                builder.topic(topic.as_str());
            }
            if *mine {
                builder.owner("self");
            } else if let Some(owner) = owner {
                builder.owner(owner.as_str());
            }
            for (key, value) in terms {
                builder.term(key.as_str(), value.as_str());
            }

            let query = builder.build()?;
            debug!("query: {query}");

            let changes = gerrit.query_changes(&query)?;

            if changes.is_empty() {
                println!("{}", style("No changes found").dim());
            } else {
                output::changes_table(&changes).printstd();
            }
        }

        Commands::Show { change, format } => {
            let change = find_change(&gerrit, repo.as_ref(), change.clone())?;

            output::print_value(&serde_json::to_value(change.info())?, *format)?;
        }

        Commands::Project { name, format } => {
            let name = match name {
                Some(name) => name.clone(),
                None => repo
                    .as_ref()
                    .context("Not in a git repository, pass a project name")?
                    .get_name(None)?,
            };
            let project = gerrit.get_project(&name)?;

            output::print_value(&serde_json::to_value(project.info())?, *format)?;
        }

        Commands::Topic { change, set, delete } => {
            let change = find_change(&gerrit, repo.as_ref(), change.clone())?;

            let body = match (set, delete) {
                (Some(topic), _) => change.set_topic(topic)?,
                (None, true) => change.delete_topic()?,
                (None, false) => change.get_topic()?,
            };

            output::print_body(&body, Format::Json)?;
        }

        Commands::Review {
            change,
            message,
            labels,
            tag,
        } => {
            let mut change = find_change(&gerrit, repo.as_ref(), change.clone())?;

            let mut review = Review::new();
            if let Some(message) = message {
                review.set_message(message.as_str());
            }
            if let Some(tag) = tag {
                review.set_tag(tag.as_str());
            }
            review.add_labels(labels.iter().cloned());

            change.add_review(&review)?;

            println!("{} {}", style("✔ reviewed").green().italic(), change);
        }

        Commands::AddReviewer { reviewer, change } => {
            let change = find_change(&gerrit, repo.as_ref(), change.clone())?;
            let body = change.add_reviewer(reviewer)?;

            output::print_body(&body, Format::Json)?;
        }

        Commands::Abandon { change } => {
            let change = find_change(&gerrit, repo.as_ref(), change.clone())?;
            change.abandon()?;

            println!("{} {}", style("✔ abandoned").green().italic(), change);
        }

        Commands::Rebase { change } => {
            let change = find_change(&gerrit, repo.as_ref(), change.clone())?;
            change.rebase()?;

            println!("{} {}", style("✔ rebased").green().italic(), change);
        }

        Commands::Submit { change } => {
            let change = find_change(&gerrit, repo.as_ref(), change.clone())?;
            change.submit()?;

            println!("{} {}", style("✔ submitted").green().italic(), change);
        }
    }

    Ok(())
}

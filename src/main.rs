use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use parapet::checks::keyword::{KeywordStrategy, LocalKeywordCheck, RemoteKeywordCheck};
use parapet::checks::moderation::CategoryModerationCheck;
use parapet::checks::prompt::PromptClassifier;
use parapet::checks::topic::TopicCheck;
use parapet::checks::toxicity::ToxicityCheck;
use parapet::checks::traits::ModerationCheck;
use parapet::client::ApiClient;
use parapet::config::Config;
use parapet::gateway::ConversationGateway;
use parapet::orchestrator::{CheckSet, Moderator};
use parapet::output::terminal;
use parapet::policy::{parse_keyword_list, CategoryName, PolicyConfiguration, PolicyEdit};
use parapet::session::{Session, Turn};

/// Parapet: a content-safety gate for chat.
///
/// Screens every message with the enabled guardrails before it reaches the
/// chat model, and rejects flagged messages with a reason instead.
#[derive(Parser)]
#[command(name = "parapet", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively; `/enable`, `/disable`, `/topics`, `/keywords`
    /// and `/policy` edit the guardrails between messages
    Chat {
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Screen a single message without forwarding it (exit status 1 if rejected)
    Check {
        /// The message to screen
        message: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show the guardrails the given flags would enable
    Policy {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args)]
struct PolicyArgs {
    /// Enable a built-in category (repeatable): hate, harassment, self-harm,
    /// sexual, violence, toxicity
    #[arg(long = "category", value_name = "NAME")]
    categories: Vec<CategoryName>,

    /// Enable the topic check with these topics
    #[arg(long)]
    topics: Option<String>,

    /// Enable the keyword check with these comma-separated keywords
    #[arg(long)]
    keywords: Option<String>,
}

impl PolicyArgs {
    fn into_policy(self) -> PolicyConfiguration {
        let mut policy = PolicyConfiguration::default();
        for category in self.categories {
            policy.set_category(category, true);
        }
        policy.set_topics(self.topics);
        policy.set_keywords(self.keywords.as_deref().map(parse_keyword_list));
        policy
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("parapet=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { policy } => {
            let config = Config::load()?;
            config.require_api_key()?;

            let moderator = create_moderator(&config)?;
            let client = ApiClient::new(&config.api_url, &config.api_key)?;
            let gateway = ConversationGateway::new(client, config.conversation_id.clone());
            let mut session = Session::new(&moderator, &gateway, policy.into_policy());

            println!("{}", "Parapet guardrails chat".bold());
            println!(
                "{}",
                "I screen every message for harmful content. Type /policy to see the guardrails, /quit to leave."
                    .dimmed()
            );
            terminal::display_policy(session.policy());

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                print_prompt().await?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" || line == "/exit" {
                    break;
                }

                if let Some(edit) = PolicyEdit::parse(line) {
                    match edit {
                        Ok(PolicyEdit::Show) => terminal::display_policy(session.policy()),
                        Ok(edit) => {
                            session.edit_policy(edit);
                            info!(policy = ?session.policy(), "Policy updated");
                            terminal::display_policy(session.policy());
                        }
                        Err(e) => println!("{} {}", "Error:".red(), e),
                    }
                    continue;
                }

                match session.submit(line).await {
                    Ok(Turn::Rejected(verdict)) => {
                        terminal::display_rejection(&verdict);
                        terminal::display_failures(&verdict);
                    }
                    Ok(Turn::Replied { reply, verdict }) => {
                        terminal::display_failures(&verdict);
                        terminal::display_reply(&reply);
                    }
                    Err(e) => {
                        warn!(error = %e, "Chat turn failed");
                        println!("{} {}", "Error:".red(), e);
                    }
                }
            }
        }

        Commands::Check { message, policy } => {
            let config = Config::load()?;
            config.require_api_key()?;

            let moderator = create_moderator(&config)?;
            let verdict = moderator.evaluate(&message, &policy.into_policy()).await;
            terminal::display_verdict(&verdict);

            if !verdict.passed {
                std::process::exit(1);
            }
        }

        Commands::Policy { policy } => {
            terminal::display_policy(&policy.into_policy());
        }
    }

    Ok(())
}

/// Wire one adapter per check kind from the configuration.
fn create_moderator(config: &Config) -> Result<Moderator> {
    let client = ApiClient::new(&config.api_url, &config.api_key)?;

    let keyword: Box<dyn ModerationCheck> = match config.keyword_strategy {
        KeywordStrategy::Local => {
            info!("Using local keyword matching");
            Box::new(LocalKeywordCheck)
        }
        KeywordStrategy::Remote => {
            info!("Using remote keyword classifier");
            let prompt_id = config.require_keyword_prompt()?;
            Box::new(RemoteKeywordCheck::new(PromptClassifier::new(
                client.clone(),
                prompt_id,
            )))
        }
    };

    let checks = CheckSet {
        topic: Box::new(TopicCheck::new(PromptClassifier::new(
            client.clone(),
            config.topic_prompt_id.clone(),
        ))),
        toxicity: Box::new(ToxicityCheck::new(PromptClassifier::new(
            client.clone(),
            config.toxicity_prompt_id.clone(),
        ))),
        keyword,
        moderation: Box::new(CategoryModerationCheck::new(client)),
    };

    Ok(Moderator::new(checks, config.moderator_settings()))
}

async fn print_prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    Ok(())
}

//! Command implementations for the support daemon.
//!
//! Handles:
//! - serve: Load config and knowledge base, build the index, run HTTP
//! - ask: One-shot answer on stdout
//! - chat: Interactive terminal conversation
//! - search: Print the closest FAQ entries without calling the LLM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use support_agent::{AgentConfig, SessionStore, SessionStoreConfig, SupportAgent};
use support_embeddings::{CandleEmbedder, ModelCache};
use support_index::{FaqIndex, FaqMatch};
use support_llm::{ApiChatModel, ApiChatModelConfig, ChatModel};
use support_service::{run_server_with_shutdown, AppState};
use support_types::{load_knowledge_base, LlmSettings, Settings};

/// Words that end an interactive chat.
const EXIT_COMMANDS: [&str; 4] = ["exit", "quit", "bye", "q"];

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    kb_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(kb) = kb_override {
        settings.knowledge_base_path = kb.to_string();
    }

    Ok(settings)
}

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// clean for answers.
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Load the knowledge base and embed it with the configured model.
///
/// A missing or malformed knowledge base is fatal.
pub async fn build_index(settings: &Settings) -> Result<Arc<FaqIndex>> {
    let entries = load_knowledge_base(&settings.knowledge_base_path).with_context(|| {
        format!(
            "Failed to load knowledge base from {}",
            settings.knowledge_base_path
        )
    })?;

    let embedding = settings.embedding.clone();
    let index = tokio::task::spawn_blocking(move || -> Result<FaqIndex> {
        let cache = match &embedding.cache_dir {
            Some(dir) => ModelCache::new(dir.clone(), embedding.model_repo.clone()),
            None => ModelCache::for_repo(embedding.model_repo.clone()),
        };
        info!(repo = %embedding.model_repo, "Loading embedding model");
        let embedder = CandleEmbedder::load(&cache, embedding.pooling)
            .context("Failed to load embedding model")?;
        FaqIndex::build(entries, Arc::new(embedder)).context("Failed to build FAQ index")
    })
    .await
    .context("Index build task failed")??;

    Ok(Arc::new(index))
}

/// Configured LLM settings, taking the key from `env_key` (the plain
/// `API_KEY` variable) when none is configured.
fn with_env_api_key(settings: &LlmSettings, env_key: Option<String>) -> LlmSettings {
    let mut settings = settings.clone();
    if settings.api_key.is_none() {
        settings.api_key = env_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);
    }
    settings
}

/// Create the LLM client. Fails without an API key, so callers run this
/// before the slow model load.
pub fn build_llm(settings: &Settings) -> Result<Arc<dyn ChatModel>> {
    let llm_settings = with_env_api_key(&settings.llm, std::env::var("API_KEY").ok());

    let config =
        ApiChatModelConfig::from_settings(&llm_settings).context("Failed to configure LLM")?;
    let llm = ApiChatModel::new(config).context("Failed to create LLM client")?;
    info!(
        provider = ?llm_settings.provider,
        model = %llm_settings.model,
        "LLM client ready"
    );

    Ok(Arc::new(llm))
}

/// Wire the LLM client and session store around a built index.
pub fn build_agent(
    settings: &Settings,
    index: Arc<FaqIndex>,
    llm: Arc<dyn ChatModel>,
) -> Arc<SupportAgent> {
    let sessions = Arc::new(SessionStore::new(SessionStoreConfig::from(
        &settings.sessions,
    )));

    Arc::new(SupportAgent::new(
        index,
        llm,
        sessions,
        AgentConfig {
            min_score: settings.retrieval.min_score,
        },
    ))
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Run the HTTP server until Ctrl+C / SIGTERM.
pub async fn start_server(
    config_path: Option<&str>,
    port_override: Option<u16>,
    host_override: Option<&str>,
    kb_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level_override, kb_override)?;
    if let Some(port) = port_override {
        settings.http_port = port;
    }
    if let Some(host) = host_override {
        settings.http_host = host.to_string();
    }

    init_logging(&settings.log_level)?;

    info!("Support daemon starting...");
    info!("Configuration:");
    info!("  Knowledge base: {}", settings.knowledge_base_path);
    info!("  HTTP address: {}", settings.http_addr());
    info!("  Embedding model: {}", settings.embedding.model_repo);
    info!("  Log level: {}", settings.log_level);

    let addr: SocketAddr = settings
        .http_addr()
        .parse()
        .context("Invalid HTTP address")?;

    let llm = build_llm(&settings)?;
    let index = build_index(&settings).await?;
    let agent = build_agent(&settings, index, llm);

    let sweeper = agent.sessions().spawn_sweeper(std::time::Duration::from_secs(
        settings.sessions.sweep_interval_secs.max(1),
    ));

    let state = AppState::new(agent, settings.chat.anonymous_sessions);
    let result = run_server_with_shutdown(addr, state, shutdown_signal()).await;

    sweeper.abort();

    result.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

/// Answer one question and print the reply.
pub async fn ask_question(
    config_path: Option<&str>,
    question: &str,
    session_id: &str,
    kb_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level_override, kb_override)?;
    init_logging(&settings.log_level)?;

    let llm = build_llm(&settings)?;
    let index = build_index(&settings).await?;
    let agent = build_agent(&settings, index, llm);

    let reply = agent
        .answer(question, session_id)
        .await
        .context("Failed to answer question")?;
    println!("{}", reply);
    Ok(())
}

/// Interactive conversation on stdin/stdout.
pub async fn run_chat(
    config_path: Option<&str>,
    session_id: &str,
    kb_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level_override, kb_override)?;
    init_logging(&settings.log_level)?;

    let llm = build_llm(&settings)?;
    let index = build_index(&settings).await?;
    let agent = build_agent(&settings, index, llm);

    println!("Chatbot is ready! Type 'exit' to quit.");
    chat_loop(
        &agent,
        session_id,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|cmd| input.eq_ignore_ascii_case(cmd))
}

/// Read questions line by line and write answers until EOF or an exit word.
///
/// Answer failures are reported and the loop continues.
pub async fn chat_loop<R, W>(
    agent: &SupportAgent,
    session_id: &str,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            output.write_all(b"Goodbye!\n").await?;
            break;
        }

        let text = match agent.answer(question, session_id).await {
            Ok(reply) => format!("Bot: {}\n\n", reply),
            Err(e) => {
                warn!(error = %e, "Answer failed");
                format!("Error: {}\n\n", e)
            }
        };
        output.write_all(text.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(())
}

/// Print the top `k` FAQ matches for `query`.
pub async fn search_faq(
    config_path: Option<&str>,
    query: &str,
    k: usize,
    kb_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level_override, kb_override)?;
    init_logging(&settings.log_level)?;

    let index = build_index(&settings).await?;
    let matches = index
        .search_blocking(query, k)
        .await
        .context("Search failed")?;

    print!("{}", format_matches(&matches));
    Ok(())
}

pub fn format_matches(matches: &[FaqMatch]) -> String {
    if matches.is_empty() {
        return "No matching FAQ entries.\n".to_string();
    }

    let mut out = String::new();
    for (rank, m) in matches.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{:.3}] {}\n   {}\n",
            rank + 1,
            m.score,
            m.entry.question,
            m.entry.answer
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_types::FaqEntry;

    #[test]
    fn test_exit_commands() {
        for word in ["exit", "QUIT", " bye ", "q"] {
            assert!(is_exit_command(word), "{word}");
        }
        assert!(!is_exit_command("question"));
        assert!(!is_exit_command("exit please"));
    }

    #[test]
    fn test_env_api_key_fallback() {
        let missing = with_env_api_key(&LlmSettings::default(), None);
        assert!(ApiChatModelConfig::from_settings(&missing).is_err());

        let blank = with_env_api_key(&LlmSettings::default(), Some("  ".to_string()));
        assert!(blank.api_key.is_none());

        let from_env = with_env_api_key(&LlmSettings::default(), Some("env-key".to_string()));
        assert!(ApiChatModelConfig::from_settings(&from_env).is_ok());
    }

    #[test]
    fn test_configured_key_wins_over_env() {
        let configured = LlmSettings {
            api_key: Some(SecretString::from("configured-key")),
            ..LlmSettings::default()
        };
        let resolved = with_env_api_key(&configured, Some("env-key".to_string()));
        assert_eq!(
            secrecy::ExposeSecret::expose_secret(resolved.api_key.as_ref().unwrap()),
            "configured-key"
        );
    }

    #[test]
    fn test_format_matches() {
        let matches = vec![FaqMatch {
            entry: FaqEntry::new("How do I reset my password?", "Use the Forgot Password link."),
            score: 0.91234,
        }];
        assert_eq!(
            format_matches(&matches),
            "1. [0.912] How do I reset my password?\n   Use the Forgot Password link.\n"
        );
        assert_eq!(format_matches(&[]), "No matching FAQ entries.\n");
    }
}

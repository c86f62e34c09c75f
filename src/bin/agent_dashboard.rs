//! agent-dashboard - Agent Gateway 终端面板
//!
//! 负责：
//! - 列出 Agent / 连接图 / 任务看板
//! - 浏览和读取工作区报告
//! - 与主 Agent 对话（3 秒轮询 + 乐观发送）

use agent_dashboard_core::agents::binding_labels;
use agent_dashboard_core::files::display_title;
use agent_dashboard_core::tasks::{format_relative_time, now_ms, session_label, visible_channel};
use agent_dashboard_core::{
    ChatSession, Dashboard, FileCategory, GatewayConfig, HttpGateway, SendOutcome, TaskColumn,
    TranscriptCursor,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "agent-dashboard")]
#[command(about = "Operator dashboard for an agent gateway", long_about = None)]
struct Cli {
    /// Gateway 地址
    #[arg(long, global = true, env = "AGENT_DASHBOARD_GATEWAY_URL")]
    url: Option<String>,

    /// Gateway token
    #[arg(long, global = true, env = "AGENT_DASHBOARD_GATEWAY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured agents
    Agents,
    /// Show which agents are reachable through which channels
    Connections,
    /// Show sessions as upcoming / ongoing / done tasks
    Tasks,
    /// List report or feedback files, newest first
    Files {
        /// report | feedback
        category: String,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Print a workspace file
    Read {
        path: String,
        #[arg(long, default_value = "main")]
        agent: String,
    },
    /// Chat with an agent session
    Chat {
        #[arg(long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（stderr，避免和输出混在一起）
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("agent_dashboard_core=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env();
    if let Some(url) = cli.url {
        config.url = url.trim_end_matches('/').to_string();
    }
    if let Some(token) = cli.token {
        config = config.with_token(&token);
    }

    tracing::debug!("🚀 agent-dashboard v{} -> {}", env!("CARGO_PKG_VERSION"), config.url);

    let gateway = HttpGateway::new(&config)?;
    let dashboard = Dashboard::new(gateway, config);

    match cli.command {
        Commands::Agents => print_agents(&dashboard).await,
        Commands::Connections => print_connections(&dashboard).await,
        Commands::Tasks => print_tasks(&dashboard).await,
        Commands::Files { category, agent } => {
            let category: FileCategory = category.parse()?;
            print_files(&dashboard, category, agent.as_deref()).await;
        }
        Commands::Read { path, agent } => {
            println!("{}", dashboard.read_file_at(&path, &agent).await);
        }
        Commands::Chat { session } => {
            let chat = match session {
                Some(key) => dashboard.chat_with(&key),
                None => dashboard.chat(),
            };
            run_chat(chat).await?;
        }
    }

    Ok(())
}

async fn print_agents(dashboard: &Dashboard<HttpGateway>) {
    let agents = dashboard.agents().await;
    if agents.is_empty() {
        println!("No agents found");
        return;
    }

    for agent in &agents {
        let marker = if agent.is_default { " (default)" } else { "" };
        println!("{}{}", agent.id, marker);
        if let Some(workspace) = &agent.workspace {
            println!("  workspace: {}", workspace);
        }
        if let Some(model) = &agent.model {
            println!("  model: {}", model);
        }
        if !agent.bindings.is_empty() {
            println!("  bindings: {}", binding_labels(agent).join(", "));
        }
    }
}

async fn print_connections(dashboard: &Dashboard<HttpGateway>) {
    let connections = dashboard.connections().await;
    if connections.links.is_empty() {
        println!("No bindings configured ({} agents)", connections.agents.len());
        return;
    }

    for link in &connections.links {
        println!("{} -> {}", link.channel, link.agent_ids.join(", "));
    }
}

async fn print_tasks(dashboard: &Dashboard<HttpGateway>) {
    let board = dashboard.task_board().await;
    if board.is_empty() {
        println!("No tasks found");
        return;
    }

    let now = now_ms();
    for column in [TaskColumn::Upcoming, TaskColumn::Ongoing, TaskColumn::Done] {
        let sessions = board.column(column);
        println!("== {} ({})", column.title(), sessions.len());
        for session in sessions {
            let mut line = format!("  {} [{}]", session_label(session), session.kind);
            if let Some(channel) = visible_channel(session) {
                line.push_str(&format!(" #{}", channel));
            }
            if let Some(updated_at) = session.updated_at {
                line.push_str(&format!(" · {}", format_relative_time(updated_at, now)));
            }
            println!("{}", line);
        }
    }
}

async fn print_files(dashboard: &Dashboard<HttpGateway>, category: FileCategory, agent: Option<&str>) {
    let files = dashboard.workspace_files(category, agent).await;
    if files.is_empty() {
        println!("No {} found", category.plural_label());
        return;
    }

    for file in &files {
        println!("{}  {}  {}  ({})", file.date, display_title(file), file.path, file.agent_id);
    }
}

async fn run_chat(chat: ChatSession<HttpGateway>) -> Result<()> {
    let store = chat.store().clone();
    let mut changes = store.subscribe_changes();
    let mut poller = chat.start_polling();

    // 日志内容变化时打印新确认的消息
    let printer = tokio::spawn(async move {
        let mut cursor = TranscriptCursor::new();
        while changes.changed().await.is_ok() {
            for message in cursor.advance(&store.rendered()) {
                let who = if message.is_user { "you" } else { message.role.as_str() };
                println!("[{}] {}", who, message.text);
            }
        }
    });

    println!("Chatting with session '{}'. /refresh to reload, /quit to exit.", chat.session_key());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "/quit" => break,
                    "/refresh" => {
                        chat.refresh().await;
                    }
                    _ => {
                        chat.store().set_input(&line);
                        if chat.submit().await == SendOutcome::RolledBack {
                            eprintln!("(message not delivered, please retype)");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    printer.abort();
    Ok(())
}

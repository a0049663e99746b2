mod check;
mod config;
mod error;
mod http;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use evaluator::EvaluateToolCall;
use mcp::Server;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, ServerConfig};
use error::Result;

const SERVER_NAME: &str = "toolcheck";

#[derive(Parser)]
#[command(name = "toolcheck")]
#[command(about = "MCP server that checks whether an agent used its tools correctly", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./toolcheck.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Serve options used when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the evaluate_tool_call tool (the default)
    Serve(ServeArgs),
    /// Call evaluate_tool_call on a running server
    Check {
        /// MCP endpoint of the server
        #[arg(long, default_value = check::DEFAULT_URL)]
        url: String,
        /// JSON file with the available tools
        #[arg(long)]
        tools: Option<PathBuf>,
        /// JSON file with the message history
        #[arg(long)]
        messages: Option<PathBuf>,
        /// Evaluator model size (0.5B, 3B or 7B)
        #[arg(long)]
        model_size: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Transport to serve on
    #[arg(short, long, value_enum, default_value_t = Transport::Http)]
    transport: Transport,
    /// Address to bind (http transport)
    #[arg(long)]
    host: Option<String>,
    /// Port to bind (http transport)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

impl ServeArgs {
    /// CLI flags and `PORT` take precedence over the config file.
    fn bind_addr(&self, config: &ServerConfig) -> (String, u16) {
        (
            self.host.clone().unwrap_or_else(|| config.host.clone()),
            self.port.unwrap_or(config.port),
        )
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// Streamable HTTP on /mcp
    Http,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays free for the stdio transport.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve(args)) => cmd_serve(config, args).await,
        None => cmd_serve(config, cli.serve).await,
        Some(Commands::Check {
            url,
            tools,
            messages,
            model_size,
        }) => cmd_check(&url, tools, messages, model_size.as_deref()).await,
    }
}

async fn cmd_serve(config: Config, args: ServeArgs) -> Result<()> {
    let evaluator = config.evaluator()?;
    info!(%evaluator, "evaluator ready");

    let server = Server::new(
        SERVER_NAME,
        env!("CARGO_PKG_VERSION"),
        EvaluateToolCall::new(evaluator),
    );

    match args.transport {
        Transport::Stdio => {
            info!("serving on stdio");
            server.serve_stdio().await?;
        }
        Transport::Http => {
            let (host, port) = args.bind_addr(&config.server);
            let listener = TcpListener::bind((host.as_str(), port)).await?;
            http::serve(listener, Arc::new(server)).await?;
        }
    }
    Ok(())
}

async fn cmd_check(
    url: &str,
    tools: Option<PathBuf>,
    messages: Option<PathBuf>,
    model_size: Option<&str>,
) -> Result<()> {
    let tools = match tools {
        Some(path) => check::load_array(&path)?,
        None => check::sample_tools(),
    };
    let messages = match messages {
        Some(path) => check::load_array(&path)?,
        None => check::sample_messages(),
    };

    let result = check::run(url, check::arguments(tools, messages, model_size)).await?;

    println!("Score: {}", result.score);
    if result.reason.is_empty() {
        println!("Reason: (none)");
    } else {
        println!("Reason:");
        for reason in &result.reason {
            println!("  - {reason}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults_to_http() {
        let cli = Cli::try_parse_from(["toolcheck", "serve"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert!(matches!(args.transport, Transport::Http))
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parse_stdio_transport() {
        let cli = Cli::try_parse_from(["toolcheck", "serve", "--transport", "stdio"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Serve(ServeArgs {
                transport: Transport::Stdio,
                ..
            }))
        ));
    }

    #[test]
    fn parse_check_options() {
        let cli = Cli::try_parse_from([
            "toolcheck",
            "check",
            "--url",
            "http://localhost:1234/mcp/",
            "--model-size",
            "7B",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Check {
                url, model_size, ..
            }) => {
                assert_eq!(url, "http://localhost:1234/mcp/");
                assert_eq!(model_size.as_deref(), Some("7B"));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn bare_invocation_reads_port_from_env() {
        // SAFETY: no other test in this binary reads or writes PORT.
        unsafe { std::env::set_var("PORT", "9123") };
        let bare = Cli::try_parse_from(["toolcheck"]);
        let serve = Cli::try_parse_from(["toolcheck", "serve"]);
        unsafe { std::env::remove_var("PORT") };

        let config = ServerConfig::default();
        let cli = bare.unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.bind_addr(&config), ("0.0.0.0".to_string(), 9123));

        match serve.unwrap().command {
            Some(Commands::Serve(args)) => assert_eq!(args.bind_addr(&config).1, 9123),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from(["toolcheck", "--host", "127.0.0.1", "--port", "7000"])
            .unwrap();
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8888,
        };
        assert_eq!(cli.serve.bind_addr(&config), ("127.0.0.1".to_string(), 7000));
    }
}

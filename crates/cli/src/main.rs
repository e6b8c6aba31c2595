use std::io::{self, Write};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use placehub_common::{AUTH_COOKIE, DEFAULT_HOST, DEFAULT_PORT};
use placehub_protocol::{PlaceHeartbeat, ScriptSubmission, paths};

#[derive(Parser, Debug)]
#[command(name = "placehub-cli", about = "PlaceHub CLI client")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Segredo enviado no cookie `auth`
    #[arg(long, env = "PLACEHUB_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Sem subcomando abre o prompt interativo
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Cmd {
    /// Registra ou renova um place
    Heartbeat {
        place_id: String,
        display_name: Option<String>,
    },
    /// Lista os places vivos (requer token)
    Places,
    /// Enfileira um script para um place (requer token)
    Submit { unique_id: String, script: String },
    /// Lista os scripts pendentes
    Pending,
}

struct HubClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl HubClient {
    fn new(host: &str, port: u16, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base: format!("http://{host}:{port}"),
            token,
        }
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header(COOKIE, format!("{AUTH_COOKIE}={token}")),
            None => req,
        }
    }

    async fn execute(&self, cmd: &Cmd) -> anyhow::Result<String> {
        let req = match cmd {
            Cmd::Heartbeat {
                place_id,
                display_name,
            } => {
                let body = PlaceHeartbeat {
                    place_id: place_id.clone(),
                    display_name: display_name.clone(),
                };
                self.http
                    .post(format!("{}{}", self.base, paths::ADD_PLACE))
                    .json(&body)
            }
            Cmd::Places => self.authed(self.http.get(format!("{}{}", self.base, paths::OPTIONS))),
            Cmd::Submit { unique_id, script } => {
                let body = ScriptSubmission {
                    unique_id: unique_id.clone(),
                    script: script.clone(),
                };
                self.authed(self.http.post(format!("{}{}", self.base, paths::EXECUTE)))
                    .json(&body)
            }
            Cmd::Pending => self.http.get(format!("{}{}", self.base, paths::PENDING_SCRIPTS)),
        };

        let response = req.send().await.context("falha ao falar com o servidor")?;
        let status = response.status();
        let text = response.text().await?;
        Ok(format_response(status, &text))
    }
}

/// Interpreta uma linha do prompt como um dos subcomandos.
fn parse_line(tokens: &[String]) -> anyhow::Result<Cmd> {
    let Some((name, rest)) = tokens.split_first() else {
        bail!("linha vazia");
    };
    let cmd = match (name.to_lowercase().as_str(), rest) {
        ("heartbeat", [id]) => Cmd::Heartbeat {
            place_id: id.clone(),
            display_name: None,
        },
        ("heartbeat", [id, name]) => Cmd::Heartbeat {
            place_id: id.clone(),
            display_name: Some(name.clone()),
        },
        ("places", []) => Cmd::Places,
        ("submit", [id, script]) => Cmd::Submit {
            unique_id: id.clone(),
            script: script.clone(),
        },
        ("pending", []) => Cmd::Pending,
        ("heartbeat" | "places" | "submit" | "pending", _) => {
            bail!("número errado de argumentos para '{name}'")
        }
        _ => bail!("comando desconhecido: {name}"),
    };
    Ok(cmd)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = HubClient::new(&args.host, args.port, args.token);

    // Modo comando único
    if let Some(cmd) = &args.command {
        println!("{}", client.execute(cmd).await?);
        return Ok(());
    }

    println!("Conectado a {}", client.base);

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("placehub> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let result = match parse_line(&tokenize(line)) {
            Ok(cmd) => client.execute(&cmd).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(out) => println!("{out}"),
            Err(e) => println!("(error) {e:#}"),
        }
    }

    Ok(())
}

/// Quebra a linha em argumentos; aspas simples ou duplas agrupam espaços.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut started = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), '\\') => match chars.next() {
                Some('n') => current.push('\n'),
                Some('t') => current.push('\t'),
                Some(other) => current.push(other),
                None => current.push('\\'),
            },
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                started = true;
            }
            (None, c) if c.is_whitespace() => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            (None, c) => {
                current.push(c);
                started = true;
            }
        }
    }

    if started {
        tokens.push(current);
    }
    tokens
}

/// Formata a resposta HTTP para exibição humana.
fn format_response(status: StatusCode, body: &str) -> String {
    if status == StatusCode::NO_CONTENT {
        return "(ok)".to_string();
    }
    let rendered = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) if items.is_empty() => "(empty list)".to_string(),
        Ok(Value::Object(map)) if map.is_empty() => "(empty map)".to_string(),
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    };
    if status.is_success() {
        rendered
    } else {
        format!("(error {}) {rendered}", status.as_u16())
    }
}

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use resbot_core::config::BotCfg;
use resbot_core::io::input::{self, InputSender};
use resbot_core::io::output::OutputReceiver;
use resbot_core::router::ResponseRouter;
use resbot_core::runtime::Runtime;
use resbot_core::store::{self, ContentStore};
use resbot_llm::provider::{LlmError, LlmProvider, MockProvider};
use rustyline::error::ReadlineError;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DB_CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_CONSOLE_SENDER: &str = "6280000000001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = PathBuf::from(std::env::var("RESBOT_DATA_DIR").unwrap_or_else(|_| "data".into()));
    std::fs::create_dir_all(&data_dir)?;
    init_tracing(&data_dir)?;
    install_panic_hook();

    let mut startup_notice: Option<String> = None;
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/resbot.db?mode=rwc", data_dir.display()));
    let pool = match open_database(&url).await {
        Ok(pool) => pool,
        Err(reason) => {
            tracing::warn!(reason = %reason, "falling back to in-memory store");
            startup_notice = Some(format!(
                "Catatan: {reason}, bot berjalan dalam mode sementara (ephemeral). Data sesi ini tidak disimpan."
            ));
            store::memory_pool().await?
        }
    };

    let mut cfg = BotCfg::load(&pool).await?;
    if let Ok(owner) = std::env::var("RESBOT_OWNER_NUMBER") {
        if !owner.trim().is_empty() {
            cfg.owner_number = owner.trim().to_owned();
        }
    }

    let store = ContentStore::new(pool, &data_dir);
    match store.import_legacy().await {
        Ok(report) if report.total() > 0 => {
            tracing::info!(records = report.total(), "legacy data imported");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "legacy import failed"),
    }

    let provider: Arc<dyn LlmProvider> = match resbot_llm::http::from_env() {
        Some(p) => Arc::new(p),
        None => {
            tracing::warn!("RESBOT_LLM_API_KEY not set, fallback answers disabled");
            Arc::new(MockProvider::failing(LlmError::Unavailable("no api key configured".into())))
        }
    };

    let sender = std::env::var("RESBOT_CONSOLE_SENDER")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONSOLE_SENDER.to_owned());
    let reply_wait = Duration::from_secs(cfg.llm_timeout_secs + 2);

    let router = ResponseRouter::new(cfg, store, provider).await?;
    let (mut runtime, input_tx, output_rx) = Runtime::new(router);
    let token = runtime.token();

    let repl = Repl { input_tx, output_rx, token: token.clone(), sender, reply_wait };
    let runtime_fut = runtime.run();
    let repl_fut = repl.run(startup_notice);
    tokio::pin!(runtime_fut);
    tokio::pin!(repl_fut);

    tokio::select! {
        _ = &mut runtime_fut => {
            token.cancel();
            (&mut repl_fut).await
        }
        result = &mut repl_fut => {
            token.cancel();
            (&mut runtime_fut).await;
            result
        }
    }
}

/// JSON logs to `<data_dir>/logs/resbot.log`, only when RUST_LOG is set so
/// the console stays readable.
fn init_tracing(data_dir: &Path) -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let dir = data_dir.join("logs");
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new().create(true).append(true).open(dir.join("resbot.log"))?;
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_target(true).with_writer(Arc::new(file)))
        .init();
    Ok(())
}

/// Log panics through tracing, then defer to the default hook.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "unrecoverable panic");
        default_hook(info);
    }));
}

async fn open_database(url: &str) -> Result<SqlitePool, String> {
    match tokio::time::timeout(Duration::from_secs(DB_CONNECT_TIMEOUT_SECS), store::connect(url)).await {
        Ok(Ok(pool)) => Ok(pool),
        Ok(Err(e)) => Err(format!("database tidak bisa dibuka ({e})")),
        Err(_) => Err(format!("koneksi database timeout ({DB_CONNECT_TIMEOUT_SECS}s)")),
    }
}

/// Console transport standing in for WhatsApp.
struct Repl {
    input_tx: InputSender,
    output_rx: OutputReceiver,
    token: CancellationToken,
    sender: String,
    /// How long to wait for a reply before prompting again. Gated messages
    /// get no reply at all.
    reply_wait: Duration,
}

impl Repl {
    async fn run(mut self, startup_notice: Option<String>) -> anyhow::Result<()> {
        if let Some(notice) = startup_notice {
            println!("{notice}");
        }
        println!("Resbot console. Perintah: /as <nomor>, /image [caption], /quit");
        println!("Mengirim sebagai {}", self.sender);

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<InputEvent>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        spawn_input_thread(line_tx, ready_rx);
        request_next_prompt(&ready_tx);

        let mut waiting_since: Option<tokio::time::Instant> = None;

        loop {
            let wait_deadline = waiting_since.map(|t| t + self.reply_wait);
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = wait_expired(wait_deadline) => {
                    println!("(tidak ada balasan)");
                    waiting_since = None;
                    request_next_prompt(&ready_tx);
                }
                line = line_rx.recv() => {
                    let Some(line) = line else { break };
                    match line {
                        InputEvent::Line(line) => {
                            let text = line.trim();
                            if matches!(text, "/q" | "/exit" | "/quit") {
                                break;
                            }
                            if let Some(number) = text.strip_prefix("/as ") {
                                self.sender = number.trim().to_owned();
                                println!("Mengirim sebagai {}", self.sender);
                                request_next_prompt(&ready_tx);
                                continue;
                            }
                            let sent = if let Some(rest) = text.strip_prefix("/image") {
                                input::submit_image(&self.input_tx, self.jid(), rest.trim()).await
                            } else if text.is_empty() {
                                request_next_prompt(&ready_tx);
                                continue;
                            } else {
                                input::submit_text(&self.input_tx, self.jid(), text).await
                            };
                            if sent.is_err() {
                                break;
                            }
                            waiting_since = Some(tokio::time::Instant::now());
                        }
                        InputEvent::Interrupted => {
                            self.token.cancel();
                            break;
                        }
                        InputEvent::Eof => break,
                        InputEvent::Error(err) => {
                            eprintln!("input error: {err}");
                            break;
                        }
                    }
                }
                msg = self.output_rx.recv() => {
                    let Some(msg) = msg else { break };
                    if msg.chat_id == self.jid() {
                        println!("Bot> {}", msg.text);
                    } else {
                        println!("Bot -> {}> {}", msg.chat_id, msg.text);
                    }
                    io::stdout().flush()?;
                    if waiting_since.take().is_some() {
                        request_next_prompt(&ready_tx);
                    }
                }
            }
        }
        drop(ready_tx);
        println!();
        Ok(())
    }

    fn jid(&self) -> String {
        format!("{}@s.whatsapp.net", self.sender.trim_start_matches('+'))
    }
}

async fn wait_expired(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn request_next_prompt(ready_tx: &std::sync::mpsc::Sender<()>) {
    let _ = ready_tx.send(());
}

fn spawn_input_thread(line_tx: mpsc::UnboundedSender<InputEvent>, ready_rx: std::sync::mpsc::Receiver<()>) {
    std::thread::spawn(move || {
        let mut editor = match rustyline::DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = line_tx.send(InputEvent::Error(e.to_string()));
                return;
            }
        };

        while ready_rx.recv().is_ok() {
            match editor.readline("Kamu> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.send(InputEvent::Line(line)).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    let _ = line_tx.send(InputEvent::Interrupted);
                    break;
                }
                Err(ReadlineError::Eof) => {
                    let _ = line_tx.send(InputEvent::Eof);
                    break;
                }
                Err(e) => {
                    let _ = line_tx.send(InputEvent::Error(e.to_string()));
                    break;
                }
            }
        }
    });
}

enum InputEvent {
    Line(String),
    Interrupted,
    Eof,
    Error(String),
}

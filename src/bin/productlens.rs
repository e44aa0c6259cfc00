//! CLI for ProductLens - product photo editing via Gemini.

use clap::{Args, Parser, Subcommand};
use productlens::image::load_path;
use productlens::{
    export, presets, view, EditResult, EditorConfig, GeminiEditor, ImageEditor, ImageEditorExt,
    PendingEdit, Session,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "productlens")]
#[command(about = "Edit product photos with natural-language instructions (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one edit to an image and save the result
    Edit(EditArgs),

    /// List preset actions
    Presets,

    /// Interactive edit session
    Session(SessionArgs),
}

#[derive(Args)]
struct EditorArgs {
    /// Model identifier (default: gemini-2.5-flash-image)
    #[arg(long)]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct EditArgs {
    /// Product photo to edit (PNG, JPEG, WebP; up to 10MB)
    input: PathBuf,

    /// Edit instruction
    #[arg(short, long, conflicts_with = "preset", required_unless_present = "preset")]
    prompt: Option<String>,

    /// Preset action (see `productlens presets`)
    #[arg(long)]
    preset: Option<String>,

    /// Output file path (default: edited-product-<timestamp>.<ext> in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    editor: EditorArgs,
}

#[derive(Args)]
struct SessionArgs {
    /// Image to start with
    input: Option<PathBuf>,

    #[command(flatten)]
    editor: EditorArgs,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "productlens=debug" } else { "productlens=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_editor(args: &EditorArgs) -> anyhow::Result<GeminiEditor> {
    let mut config = EditorConfig::from_env();
    if let Some(model) = &args.model {
        config = config.with_model(model);
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            anyhow::bail!("--timeout must be at least 1 second");
        }
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(GeminiEditor::builder().config(config).build()?)
}

/// Cancels its token on Ctrl-C until dropped.
struct CtrlC {
    token: CancellationToken,
    listener: tokio::task::JoinHandle<()>,
}

impl CtrlC {
    fn listen() -> Self {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let listener = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });
        Self { token, listener }
    }
}

impl Drop for CtrlC {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Edit(args) => edit(args, cli.json).await,
        Commands::Presets => list_presets(cli.json),
        Commands::Session(args) => run_session(args).await,
    }
}

async fn edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let editor = build_editor(&args.editor)?;

    let mut session = Session::new();
    session.set_image(load_path(&args.input).await?)?;
    match (&args.prompt, &args.preset) {
        (_, Some(name)) => session.set_instruction(presets::find(name)?.prompt)?,
        (Some(prompt), None) => session.set_instruction(prompt.as_str())?,
        (None, None) => anyhow::bail!("either --prompt or --preset is required"),
    }

    let ctrl_c = CtrlC::listen();
    let result = session
        .generate_with_cancel(&editor, &ctrl_c.token)
        .await?
        .clone();

    match result {
        EditResult::Success {
            image,
            instruction_echo,
        } => {
            let path = match &args.output {
                Some(path) => {
                    image.save(path).await?;
                    path.clone()
                }
                None => export::download(&image, ".").await?,
            };

            if json_output {
                let out = serde_json::json!({
                    "success": true,
                    "output": path.display().to_string(),
                    "mime_type": image.mime_type(),
                    "format": image.format(),
                    "size_bytes": image.size(),
                    "instruction": instruction_echo,
                    "model": editor.model(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "Edited image: {} ({} bytes) via {}",
                    path.display(),
                    image.size(),
                    editor.name()
                );
            }
            Ok(())
        }
        EditResult::Failure { reason, message } => {
            if json_output {
                let out = serde_json::json!({
                    "success": false,
                    "reason": reason,
                    "message": message,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            anyhow::bail!("{reason}: {message}")
        }
    }
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(presets::PRESETS)?);
    } else {
        println!("Presets:\n");
        for p in presets::PRESETS {
            println!("  {:<18} {}", p.slug, p.label);
            println!("    {}", p.prompt);
        }
    }
    Ok(())
}

const SESSION_HELP: &str = "\
Commands:
  <text>            set the instruction and generate
  /preset <name>    run a preset (see /presets)
  /presets          list presets
  /load <path>      load a new image
  /new              clear the result, keep the image
  /retry            rerun the last instruction
  /save [path]      save the edited image
  /reset            start over
  /status           show the current state
  /quit             leave";

async fn run_session(args: SessionArgs) -> anyhow::Result<()> {
    let editor = build_editor(&args.editor)?;
    let mut session = Session::new();

    if let Some(path) = &args.input {
        load_into(&mut session, path).await;
    }
    println!("{SESSION_HELP}\n");
    print!("{}", view::render(&session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.strip_prefix('/') {
            Some(cmd) => {
                let (name, rest) = cmd.split_once(' ').unwrap_or((cmd, ""));
                (Some(name), rest.trim())
            }
            None => (None, line),
        };

        match command {
            None => {
                if let Err(e) = session.set_instruction(rest) {
                    eprintln!("{e}");
                    continue;
                }
                start(&mut session, &editor, Session::begin_generate).await;
            }
            Some("preset") => match presets::find(rest) {
                Ok(preset) => {
                    start(&mut session, &editor, |s| s.apply_preset(preset)).await;
                }
                Err(e) => eprintln!("{e}"),
            },
            Some("presets") => list_presets(false)?,
            Some("load") if !rest.is_empty() => load_into(&mut session, Path::new(rest)).await,
            Some("new") => {
                if let Err(e) = session.new_edit() {
                    eprintln!("{e}");
                }
            }
            Some("retry") => start(&mut session, &editor, Session::retry).await,
            Some("save") => save(&session, rest).await,
            Some("reset") => session.reset(),
            Some("status") => {}
            Some("quit" | "exit") => break,
            Some(_) => {
                println!("{SESSION_HELP}");
                continue;
            }
        }
        print!("{}", view::render(&session));
    }
    Ok(())
}

async fn load_into(session: &mut Session, path: &Path) {
    match load_path(path).await {
        Ok(image) => {
            if let Err(e) = session.set_image(image) {
                eprintln!("{e}");
            }
        }
        Err(e) => eprintln!("{}: {e}", path.display()),
    }
}

async fn start<F>(session: &mut Session, editor: &GeminiEditor, begin: F)
where
    F: FnOnce(&mut Session) -> productlens::Result<PendingEdit>,
{
    let pending = match begin(session) {
        Ok(pending) => pending,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    print!("{}", view::render(session));

    let ctrl_c = CtrlC::listen();
    let outcome = editor
        .edit_with_cancel(pending.request(), &ctrl_c.token)
        .await;
    if let Err(e) = session.complete(pending.ticket(), outcome) {
        eprintln!("{e}");
    }
}

async fn save(session: &Session, dest: &str) {
    let Some(image) = session.generated() else {
        eprintln!("{}", productlens::LensError::NoResult);
        return;
    };
    let saved = if dest.is_empty() {
        export::download(image, ".").await
    } else {
        image.save(dest).await.map(|()| PathBuf::from(dest))
    };
    match saved {
        Ok(path) => println!("Saved {}", path.display()),
        Err(e) => eprintln!("{e}"),
    }
}

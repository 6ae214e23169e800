use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::{
    Action, AuthError, ClientError, DocumentFields, DocumentKind, DocumentRequest, FieldErrors,
    ProfileForm, RegistrationForm, Sender, Transport, UploadBatch, UploadFile,
};
use crate::frameworks::config::ClientConfig;
use crate::interface_adapters::clients::HttpTransport;
use crate::interface_adapters::storage::FileCredentialStore;
use crate::use_cases::{
    AskPage, DashboardPage, DocumentPage, LegalApi, ProfilePage, SessionManager, UploadPage,
    VerifyPage,
};

// Top-level command-line arguments.
#[derive(Parser)]
#[command(name = "legal-client")]
#[command(about = "Command-line client for the legal assistance service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// One subcommand per page action.
#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Ask a legal question; starts a chat when no question is given
    Ask { question: Option<String> },
    /// Generate a legal document
    Generate {
        #[arg(long = "type")]
        kind: DocumentKind,
        #[arg(long)]
        parties: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        terms: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        /// Write the document here instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Upload documents, optionally asking a question about them
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        question: Option<String>,
    },
    /// List uploaded files
    Files,
    /// Download an uploaded file
    Download {
        filename: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete an uploaded file
    Delete { filename: String },
    /// Show the profile, or update it when any field is given
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the token balance
    Tokens,
    /// Verify a phone number with the code received by SMS
    Verify { code: String },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Diagnostics go to stderr so command output stays clean.
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// Parse arguments, run one command and map the outcome to an exit code.
pub async fn run() -> ExitCode {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

// Wire config, transport and the restored session into the API facade.
async fn connect() -> Result<LegalApi> {
    let config = ClientConfig::load()?;
    tracing::debug!(api_url = %config.api_url, session = %config.session_path.display(), "client configured");

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(config.api_url, config.timeout).context("failed to build http client")?,
    );
    let store = Arc::new(FileCredentialStore::new(config.session_path));
    let session = SessionManager::restore(transport.clone(), store).await;
    Ok(LegalApi::new(transport, session))
}

async fn execute(cli: Cli) -> Result<()> {
    let api = connect().await?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ").await?,
            };
            let identity = api
                .session()
                .login(&email, &password)
                .await
                .map_err(|err| auth_failure(err, Action::Login))?;
            println!("Signed in as {} ({})", identity.name, identity.id);
        }
        Commands::Register {
            name,
            email,
            phone,
            password,
            confirm_password,
            city,
            state,
            country,
        } => {
            let form = RegistrationForm {
                name,
                email,
                phone,
                password,
                confirm_password,
                city,
                state,
                country,
            };
            let registration = api
                .session()
                .register(&form)
                .await
                .map_err(|err| auth_failure(err, Action::Register))?;
            if registration.authenticated {
                println!("Account created; you are signed in.");
            } else {
                println!("Account created. Run `legal-client login` to sign in.");
            }
        }
        Commands::Logout => {
            api.session().logout().await;
            println!("Signed out.");
        }
        Commands::Whoami => match api.session().current_identity() {
            Some(identity) => {
                println!("{} ({})", identity.name, identity.id);
                if let Some(email) = &identity.email {
                    println!("email: {email}");
                }
            }
            None => println!("Not signed in."),
        },
        Commands::Ask { question } => {
            let mut page = AskPage::open(api).map_err(|err| failure(err, Action::AskQuestion))?;
            match question {
                Some(question) => {
                    let answer = page
                        .ask(&question)
                        .await
                        .map_err(|err| failure(err, Action::AskQuestion))?;
                    println!("{answer}");
                }
                None => chat(&mut page).await?,
            }
        }
        Commands::Generate {
            kind,
            parties,
            subject,
            terms,
            duration,
            amount,
            output,
        } => {
            let mut page =
                DocumentPage::open(api).map_err(|err| failure(err, Action::GenerateDocument))?;
            let request = DocumentRequest::new(
                kind,
                DocumentFields {
                    parties,
                    subject,
                    terms,
                    duration,
                    amount,
                },
            );
            let document = page
                .generate(request)
                .await
                .map_err(|err| failure(err, Action::GenerateDocument))?;
            match output {
                Some(path) => {
                    write_file(&path, document.text.as_bytes()).await?;
                    println!("Saved {} to {}", document.kind, path.display());
                }
                None => println!("{}", document.text),
            }
        }
        Commands::Upload { files, question } => {
            let mut page = UploadPage::open(api)
                .await
                .map_err(|err| failure(err, Action::UploadFiles))?;
            // Read every file before dispatching anything.
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_upload(path).await?);
            }
            let mut batch = UploadBatch::new(uploads);
            if let Some(question) = question {
                batch = batch.with_question(question);
            }

            let receipt = page
                .upload(batch)
                .await
                .map_err(|err| failure(err, Action::UploadFiles))?;
            println!("Uploaded {} file(s).", receipt.files);
            if let Some(answer) = receipt.answer {
                println!("{answer}");
            }
            print_files(&page);
        }
        Commands::Files => {
            let page = UploadPage::open(api)
                .await
                .map_err(|err| failure(err, Action::LoadFiles))?;
            if let Some(message) = page.listing().error_message() {
                return Err(anyhow!(message.to_string()));
            }
            print_files(&page);
        }
        Commands::Download { filename, output } => {
            let mut page = UploadPage::open(api)
                .await
                .map_err(|err| failure(err, Action::DownloadFile))?;
            let bytes = page
                .download(&filename)
                .await
                .map_err(|err| failure(err, Action::DownloadFile))?;
            let path = output.unwrap_or_else(|| PathBuf::from(&filename));
            write_file(&path, &bytes).await?;
            println!("Saved {} ({} bytes) to {}", filename, bytes.len(), path.display());
        }
        Commands::Delete { filename } => {
            let mut page = UploadPage::open(api)
                .await
                .map_err(|err| failure(err, Action::DeleteFile))?;
            page.delete(&filename)
                .await
                .map_err(|err| failure(err, Action::DeleteFile))?;
            println!("Deleted {filename}.");
            print_files(&page);
        }
        Commands::Profile { name, email, phone } => {
            let mut page =
                ProfilePage::open(api).map_err(|err| failure(err, Action::UpdateProfile))?;
            if name.is_some() || email.is_some() || phone.is_some() {
                let current = page.form().clone();
                let form = ProfileForm {
                    name: name.unwrap_or(current.name),
                    email: email.unwrap_or(current.email),
                    phone: phone.unwrap_or(current.phone),
                };
                page.save(form)
                    .await
                    .map_err(|err| failure(err, Action::UpdateProfile))?;
                println!("Profile updated.");
            }
            print_profile(&page);
        }
        Commands::Tokens => {
            let page = DashboardPage::open(api)
                .await
                .map_err(|err| failure(err, Action::LoadTokens))?;
            match (page.tokens().result(), page.tokens().error_message()) {
                (Some(tokens), _) => println!("Token balance: {tokens}"),
                (None, Some(message)) => return Err(anyhow!(message.to_string())),
                (None, None) => {}
            }
        }
        Commands::Verify { code } => {
            // Public page: works with or without a stored session.
            let mut page = VerifyPage::open(api);
            let message = page
                .verify(&code)
                .await
                .map_err(|err| failure(err, Action::VerifyPhone))?;
            println!("{message}");
        }
    }

    Ok(())
}

// Interactive chat: one question per line, `/clear` and `/quit` are commands.
async fn chat(page: &mut AskPage) -> Result<()> {
    println!("Ask a legal question. /clear empties the chat, /quit exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt("> ").await?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                page.clear_chat();
                println!("Chat cleared.");
            }
            question => {
                // The page already put the reply or the apology in the transcript.
                let _ = page.ask(question).await;
                if let Some(message) = page.transcript().last() {
                    if message.sender == Sender::Assistant {
                        println!("[{}] {}", message.time_label(), message.text);
                    }
                }
            }
        }
    }
    Ok(())
}

// Turn a page error into the message the user sees.
fn failure(err: ClientError, action: Action) -> anyhow::Error {
    match err.field_errors() {
        Some(fields) => field_failure(fields, action),
        None => anyhow!(err.user_message(action)),
    }
}

fn auth_failure(err: AuthError, action: Action) -> anyhow::Error {
    match &err {
        AuthError::Invalid(fields) => field_failure(fields, action),
        _ => anyhow!(err.user_message(action)),
    }
}

fn field_failure(fields: &FieldErrors, action: Action) -> anyhow::Error {
    let lines: Vec<String> = fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect();
    if lines.is_empty() {
        anyhow!(action.fallback_message())
    } else {
        anyhow!(lines.join("\n"))
    }
}

// Load a local file as an upload part named after the file.
async fn read_upload(path: &Path) -> Result<UploadFile> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    Ok(UploadFile::new(filename, content))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

// Read one line from stdin after printing `label`.
async fn prompt(label: &str) -> Result<String> {
    print_prompt(label).await?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn print_prompt(label: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

// One row per file: name, size and upload day.
fn print_files(page: &UploadPage) {
    if page.files().is_empty() {
        println!("No files uploaded yet.");
        return;
    }
    for file in page.files() {
        println!(
            "{:<40} {:>10}  {}",
            file.filename,
            file.size_label(),
            file.upload_day()
        );
    }
}

fn print_profile(page: &ProfilePage) {
    let form = page.form();
    println!("name:  {}", form.name);
    println!("email: {}", form.email);
    println!("phone: {}", form.phone);
    if let Some(info) = page.account_info() {
        println!("user id: {}", info.user_id);
        if let Some(since) = info.member_since {
            println!("member since: {since}");
        }
        if let Some(last) = info.last_login {
            println!("last login: {last}");
        }
    }
}

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use ai_tutor::clients::{ClientType, FlexibleClient, OpenAIClient, OpenAIConfig};
use ai_tutor::config::{KeyFromEnv, TutorConfig};
use ai_tutor::image::ImageInput;
use ai_tutor::interceptors::FileInterceptor;
use ai_tutor::prompt::{DEMO_CHOICES, DEMO_PASSAGE, DEMO_QUESTION};
use ai_tutor::{AppState, Mode, Outcome, PdfExtractor, Session, Tutor, TutorError};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reading tutor: ask about a textbook excerpt, generate practice questions, \
             analyze missed questions"
)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    OPENAI_API_KEY        API key (also read from .env)
    OPENAI_BASE_URL       OpenAI-compatible endpoint [default: https://api.openai.com/v1]
    TUTOR_MODEL           Model id [default: gpt-4o]
    TUTOR_MAX_TOKENS      Completion token limit
    TUTOR_TEMPERATURE     Sampling temperature
    TUTOR_TRANSCRIPT_DIR  Save every exchange as markdown here
    RUST_LOG              Log filter, e.g. ai_tutor=debug

EXAMPLES:
    tutor ask --pdf chapter3.pdf --question \"What is the author's main claim?\"
    tutor quiz --pdf chapter3.pdf
    tutor demo --choice 4
    tutor diagnose --image missed.jpg --answer 2
    tutor session --pdf chapter3.pdf")]
struct Args {
    /// Backend to use
    #[arg(long, value_enum, default_value_t = ClientType::OpenAI, global = true)]
    client: ClientType,

    /// API key, used when OPENAI_API_KEY is not set
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model id (overrides TUTOR_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory for markdown transcripts (overrides TUTOR_TRANSCRIPT_DIR)
    #[arg(long, global = true)]
    transcript_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question about the first pages of a PDF
    Ask {
        #[arg(long)]
        pdf: PathBuf,
        #[arg(long, default_value = "")]
        question: String,
        /// Print the extracted passage first
        #[arg(long)]
        show_excerpt: bool,
    },
    /// Generate one practice question modeled on the PDF excerpt
    Quiz {
        #[arg(long)]
        pdf: PathBuf,
        #[arg(long)]
        show_excerpt: bool,
    },
    /// Feedback on the built-in demo question for the chosen answer
    Demo {
        /// Choice label, e.g. 4 or ④
        #[arg(long, default_value = "")]
        choice: String,
    },
    /// Diagnose a photographed wrong answer and write a twin question
    Diagnose {
        #[arg(long)]
        image: PathBuf,
        /// The choice the student picked
        #[arg(long, default_value = "")]
        answer: String,
    },
    /// Interactive Q&A over one PDF; `/quiz` generates a question, `/quit` exits
    Session {
        #[arg(long)]
        pdf: PathBuf,
    },
}

fn build_client(
    args: &Args,
    config: &TutorConfig,
    interactive: bool,
) -> Result<FlexibleClient, TutorError> {
    let manual_key = args.api_key.as_deref();
    if interactive && args.client == ClientType::OpenAI {
        let api_key = OpenAIClient::resolve_key_with_user(manual_key)?;
        return Ok(FlexibleClient::openai(OpenAIConfig::from_tutor_config(config, api_key)));
    }
    FlexibleClient::from_type(args.client, config, manual_key)
}

fn load_excerpt(path: &Path) -> anyhow::Result<Session> {
    let session = Session::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    eprintln!("Reading {} (first {} pages)...", path.display(), ai_tutor::MAX_EXCERPT_PAGES);
    session
        .excerpt(&PdfExtractor::default())
        .with_context(|| format!("extracting text from {}", path.display()))?;
    Ok(session)
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Completed(text) => println!("{}", text),
        Outcome::Failed(message) => eprintln!("❌ {}", message),
        Outcome::Skipped(missing) => eprintln!("Nothing to send: no {} provided.", missing),
    }
}

fn print_excerpt(excerpt: &str) {
    println!("----- Extracted passage -----\n{}\n-----------------------------", excerpt);
}

fn print_demo_question() {
    println!("{}\n\n{}", DEMO_PASSAGE, DEMO_QUESTION);
    for choice in DEMO_CHOICES {
        println!("  {}", choice);
    }
    println!();
}

async fn run_session(tutor: &Tutor<FlexibleClient>, session: &Session) -> anyhow::Result<()> {
    let excerpt = session.cached_excerpt().unwrap_or_default().to_string();
    println!("Ask anything about the passage. Commands: /quiz, /excerpt, /quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let state = AppState::default().with_excerpt(excerpt.clone());
        match line.trim() {
            "/quit" | "/exit" => break,
            "/excerpt" => print_excerpt(&excerpt),
            "/quiz" => print_outcome(&tutor.run(Mode::QuizGen, &state).await),
            question => match tutor.run(Mode::Qa, &state.with_question(question)).await {
                // An empty line is not a question
                Outcome::Skipped(_) => continue,
                outcome => print_outcome(&outcome),
            },
        }
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = TutorConfig::from_env();
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(dir) = &args.transcript_dir {
        config = config.with_transcript_dir(dir.clone());
    }

    let interactive = matches!(args.command, Command::Session { .. });
    let client = match build_client(&args, &config, interactive) {
        Ok(client) => client,
        Err(TutorError::MissingCredential(key_name)) => {
            eprintln!(
                "⚠️  No API key. Set {} (environment or .env) or pass --api-key.",
                key_name
            );
            exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    let mut tutor = Tutor::new(client);
    if let Some(dir) = &config.transcript_dir {
        tutor = tutor.with_interceptor(Box::new(FileInterceptor::new(dir.clone())));
    }

    match &args.command {
        Command::Ask { pdf, question, show_excerpt } => {
            let session = load_excerpt(pdf)?;
            let excerpt = session.cached_excerpt().unwrap_or_default();
            if *show_excerpt {
                print_excerpt(excerpt);
            }
            let state = AppState::default().with_excerpt(excerpt).with_question(question.as_str());
            print_outcome(&tutor.run(Mode::Qa, &state).await);
        }
        Command::Quiz { pdf, show_excerpt } => {
            let session = load_excerpt(pdf)?;
            let excerpt = session.cached_excerpt().unwrap_or_default();
            if *show_excerpt {
                print_excerpt(excerpt);
            }
            eprintln!("Writing a practice question (this can take 10-20 seconds)...");
            let state = AppState::default().with_excerpt(excerpt);
            print_outcome(&tutor.run(Mode::QuizGen, &state).await);
        }
        Command::Demo { choice } => {
            print_demo_question();
            let state = AppState::default().with_answer(choice.as_str());
            print_outcome(&tutor.run(Mode::DemoFeedback, &state).await);
        }
        Command::Diagnose { image, answer } => {
            let image = ImageInput::from_path(image)
                .with_context(|| format!("loading image {}", image.display()))?;
            eprintln!("Analyzing the photo...");
            let state = AppState::default().with_image(image).with_answer(answer.as_str());
            print_outcome(&tutor.run(Mode::ImageDiagnosis, &state).await);
        }
        Command::Session { pdf } => {
            let session = load_excerpt(pdf)?;
            run_session(&tutor, &session).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

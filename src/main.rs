//! Terminal interview runner.
//!
//! Plays one participant's interview on stdin/stdout. With a host configured
//! (`INTERVIEW_CHATBOT__HOST__*`) it talks to the host platform; otherwise it
//! runs offline with in-memory stores and scripted assistant replies.
//!
//! ```text
//! interview-chatbot [participant-id]
//! ```
//!
//! Commands: `/done` dismisses a completed exchange, `/retry` re-sends a failed
//! reply, `/quit` leaves (progress is kept).

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use interview_chatbot::adapters::{
    HostApiClient, InMemoryAppDataStore, InMemoryAppSettingsStore, MockCompletionService, RetryPolicy,
    RetryingCompletionService,
};
use interview_chatbot::application::{
    read_settings_file, InteractionSession, ParticipantView, SessionError, SessionOptions, SettingsResolver,
    Step, StepReport, SyncStatus,
};
use interview_chatbot::config::AppConfig;
use interview_chatbot::domain::conversation::Agent;
use interview_chatbot::domain::foundation::{AgentId, ExchangeId};
use interview_chatbot::domain::settings::AllSettings;
use interview_chatbot::ports::{AppDataStore, AppSettingsStore, CompletionService};
use interview_chatbot::telemetry::init_tracing;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PARTICIPANT_ENV: &str = "INTERVIEW_CHATBOT_PARTICIPANT";
const DEFAULT_PARTICIPANT: &str = "local-participant";

struct Collaborators {
    data: Arc<dyn AppDataStore>,
    settings: Arc<dyn AppSettingsStore>,
    completion: Arc<dyn CompletionService>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let participant_id = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(PARTICIPANT_ENV).ok())
        .unwrap_or_else(|| DEFAULT_PARTICIPANT.to_string());
    let participant = Agent::participant(AgentId::new(participant_id.as_str()), participant_id.as_str());

    let collaborators = collaborators(&config)?;
    let settings = SettingsResolver::new(collaborators.settings).resolve().await?;
    let mut session = InteractionSession::open(
        participant,
        collaborators.data,
        &settings,
        collaborators.completion,
        SessionOptions::from(&config.interaction),
    )
    .await?;
    info!(participant = %participant_id, "Session opened");

    let mut screen = Screen::default();
    screen.render(&session.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        let result = match input {
            "/quit" => break,
            "/done" => session.dismiss().await,
            "/retry" => match session.retry_reply().await {
                Ok(StepReport {
                    step: Step::AwaitingReply(pending),
                    ..
                }) => session.fulfil(pending).await,
                other => other,
            },
            _ if !session.interaction().is_started() => session.start().await,
            _ => session.send(input).await,
        };

        match result {
            Ok(report) => note_sync(&report.sync),
            Err(SessionError::Reply { source, sync }) => {
                note_sync(&sync);
                println!("! The assistant could not answer ({}). Type /retry to try again.", source);
            }
            Err(err) => println!("! {}", err),
        }

        let view = session.view();
        screen.render(&view);
        if view.is_finished() {
            break;
        }
    }

    Ok(())
}

fn collaborators(config: &AppConfig) -> Result<Collaborators, BoxError> {
    let policy = RetryPolicy::from(&config.ai);

    if config.host.is_configured() {
        let client = Arc::new(HostApiClient::from_config(&config.host)?);
        info!("Using host platform collaborators");
        return Ok(Collaborators {
            data: client.clone(),
            settings: client.clone(),
            completion: Arc::new(RetryingCompletionService::new(client, policy)),
        });
    }

    let settings = match &config.interaction.settings_path {
        Some(path) => read_settings_file(path)?,
        None => AllSettings::default(),
    };
    warn!("No host configured, running offline with scripted replies");
    Ok(Collaborators {
        data: Arc::new(InMemoryAppDataStore::new()),
        settings: Arc::new(InMemoryAppSettingsStore::seeded(&settings)?),
        completion: Arc::new(RetryingCompletionService::new(
            Arc::new(MockCompletionService::new()),
            policy,
        )),
    })
}

fn note_sync(sync: &SyncStatus) {
    if let SyncStatus::Failed { reason, .. } = sync {
        println!("! Progress not saved yet ({}). It will be sent with the next step.", reason);
    }
}

/// Prints only what changed since the last render.
#[derive(Default)]
struct Screen {
    exchange: Option<ExchangeId>,
    shown: usize,
    notice_shown: bool,
}

impl Screen {
    fn render(&mut self, view: &ParticipantView) {
        match view {
            ParticipantView::Start { instructions } => {
                if !instructions.is_empty() {
                    println!("{}\n", instructions);
                }
                println!("Press enter to start.");
            }
            ParticipantView::Conversation(conversation) => {
                if self.exchange != Some(conversation.exchange_id) {
                    self.exchange = Some(conversation.exchange_id);
                    self.shown = 0;
                    self.notice_shown = false;
                    println!(
                        "\n== {} ({}/{}) ==",
                        conversation.exchange_name, conversation.position, conversation.total
                    );
                }
                for message in conversation.thread.iter().skip(self.shown) {
                    if message.is_from_assistant() {
                        println!("{}: {}", message.sender().name, message.content());
                    }
                }
                self.shown = conversation.thread.len();

                if let (Some(notice), false) = (&conversation.completion_notice, self.notice_shown) {
                    self.notice_shown = true;
                    if !notice.is_empty() {
                        println!("* {}", notice);
                    }
                }
                if conversation.can_dismiss {
                    println!("(type /done to continue)");
                }
            }
            ParticipantView::Finished { end_text } => {
                println!("\n{}", end_text);
            }
        }
    }
}

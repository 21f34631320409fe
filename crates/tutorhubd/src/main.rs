//! tutorhubd - The tutorhub background service
//!
//! This is the main entry point for the tutorhubd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Lifecycle engine
//! - IPC server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tutorhub_api::{
    Command, ErrorCode, ErrorInfo, Event, EventPayload, Request, Response, ResponsePayload,
};
use tutorhub_config::load_config;
use tutorhub_core::LifecycleEngine;
use tutorhub_ipc::{IpcServer, ServerMessage};
use tutorhub_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use tutorhub_util::{default_config_path, ClientId, RateLimiter, TutorHubError};

/// tutorhubd - Mentorship request and session lifecycle service
#[derive(Parser, Debug)]
#[command(name = "tutorhubd")]
#[command(about = "Mentorship request and session lifecycle service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/tutorhub/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set TUTORHUB_SOCKET env var)
    #[arg(short, long, env = "TUTORHUB_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set TUTORHUB_DATA_DIR env var)
    #[arg(short, long, env = "TUTORHUB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: Arc<LifecycleEngine>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let mut settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            claim_policy = ?settings.claim_policy,
            "Configuration loaded"
        );

        // Command-line overrides win over config values
        if let Some(socket) = &args.socket {
            settings.service.socket_path = socket.clone();
        }
        if let Some(data_dir) = &args.data_dir {
            settings.service.data_dir = data_dir.clone();
        }

        let socket_path = settings.service.socket_path.clone();
        let data_dir = settings.service.data_dir.clone();

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("tutorhubd.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Log service start
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        // Initialize lifecycle engine
        let engine = Arc::new(LifecycleEngine::new(settings, store.clone()));

        // Initialize IPC server
        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        // Rate limiter: 30 requests per second per client
        let rate_limiter = RateLimiter::new(30, Duration::from_secs(1));

        Ok(Self {
            engine,
            ipc: Arc::new(ipc),
            store,
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
        })
    }

    async fn run(self) -> Result<()> {
        let ipc_ref = self.ipc.clone();
        let mut ipc_messages = ipc_ref
            .take_message_receiver()
            .await
            .expect("Message receiver should be available");

        let engine = self.engine.clone();
        let store = self.store.clone();
        let rate_limiter = self.rate_limiter.clone();

        // Spawn IPC accept task
        let ipc_accept = ipc_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        // Periodic cleanup of stale rate limiter entries
        let mut cleanup_timer = tokio::time::interval(Duration::from_secs(60));

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                _ = cleanup_timer.tick() => {
                    let mut limiter = rate_limiter.lock().await;
                    limiter.cleanup(Duration::from_secs(600));
                }

                // IPC messages
                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(&engine, &ipc_ref, &store, &rate_limiter, msg).await;
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down tutorhubd");

        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));

        if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            tracing::warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_ipc_message(
        engine: &Arc<LifecycleEngine>,
        ipc: &Arc<IpcServer>,
        store: &Arc<dyn Store>,
        rate_limiter: &Arc<Mutex<RateLimiter>>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                // Rate limiting
                {
                    let mut limiter = rate_limiter.lock().await;
                    if !limiter.check(&client_id) {
                        let response = Response::error(
                            request.request_id,
                            ErrorInfo::new(ErrorCode::RateLimited, "Too many requests"),
                        );
                        let _ = ipc.send_response(&client_id, response).await;
                        return;
                    }
                }

                let Request {
                    request_id,
                    command,
                    ..
                } = request;

                let (result, event) = Self::handle_command(engine.as_ref(), &client_id, command);

                let response = match result {
                    Ok(payload) => Response::success(request_id, payload),
                    Err(e) => Response::error(request_id, error_info(&e)),
                };

                let _ = ipc.send_response(&client_id, response).await;

                // Broadcast only after the caller got its response
                if let Some(payload) = event {
                    ipc.broadcast_event(Event::new(payload));
                }
            }

            ServerMessage::ClientConnected { client_id } => {
                info!(client_id = %client_id, "Client connected");

                let _ = store.append_audit(AuditEvent::new(AuditEventType::ClientConnected {
                    client_id: client_id.to_string(),
                }));
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");

                let _ = store.append_audit(AuditEvent::new(AuditEventType::ClientDisconnected {
                    client_id: client_id.to_string(),
                }));

                // Clean up rate limiter
                let mut limiter = rate_limiter.lock().await;
                limiter.remove_client(&client_id);
            }
        }
    }

    /// Dispatch a command to the engine.
    ///
    /// Returns the response payload (or error) plus an event to broadcast
    /// when the operation changed state.
    fn handle_command(
        engine: &LifecycleEngine,
        client_id: &ClientId,
        command: Command,
    ) -> (
        tutorhub_util::Result<ResponsePayload>,
        Option<EventPayload>,
    ) {
        let now = tutorhub_util::now();

        match command {
            Command::CreateRequest {
                actor,
                subject,
                message,
            } => match engine.create_request(&actor, &subject, &message, now) {
                Ok(request) => {
                    let event = EventPayload::RequestCreated {
                        request: request.clone(),
                    };
                    (Ok(ResponsePayload::Request(request)), Some(event))
                }
                Err(e) => (Err(e), None),
            },

            Command::AcceptRequest {
                actor,
                request_id,
                overrides,
            } => match engine.accept_request(&request_id, &actor, &overrides, now) {
                Ok(session) => {
                    let event = EventPayload::RequestAccepted {
                        request_id,
                        session: session.clone(),
                    };
                    (Ok(ResponsePayload::Session(session)), Some(event))
                }
                Err(e) => (Err(e), None),
            },

            Command::DeclineRequest { actor, request_id } => {
                match engine.decline_request(&request_id, &actor) {
                    Ok(request) => (
                        Ok(ResponsePayload::Request(request)),
                        Some(EventPayload::RequestDeclined { request_id }),
                    ),
                    Err(e) => (Err(e), None),
                }
            }

            Command::ListRequests { actor, status } => (
                engine
                    .list_requests(&actor, status)
                    .map(ResponsePayload::Requests),
                None,
            ),

            Command::ListSessions { user_id } => (
                engine
                    .sessions_for_user(&user_id)
                    .map(ResponsePayload::Sessions),
                None,
            ),

            Command::ScheduleSession { actor, session } => {
                match engine.schedule_session(&actor, &session) {
                    Ok(session) => {
                        let event = EventPayload::SessionScheduled {
                            session: session.clone(),
                        };
                        (Ok(ResponsePayload::Session(session)), Some(event))
                    }
                    Err(e) => (Err(e), None),
                }
            }

            Command::UpdateSessionStatus {
                actor,
                session_id,
                status,
            } => match engine.update_session_status(&session_id, status, &actor) {
                Ok(change) => {
                    let event = EventPayload::SessionStatusChanged {
                        session_id,
                        from: change.from,
                        to: change.session.status,
                    };
                    (Ok(ResponsePayload::Session(change.session)), Some(event))
                }
                Err(e) => (Err(e), None),
            },

            Command::GetSummary { actor } => (
                engine.summary_for(&actor).map(ResponsePayload::Summary),
                None,
            ),

            Command::GetHealth => (Ok(ResponsePayload::Health(engine.health())), None),

            Command::SubscribeEvents => (
                Ok(ResponsePayload::Subscribed {
                    client_id: client_id.clone(),
                }),
                None,
            ),

            Command::UnsubscribeEvents => (Ok(ResponsePayload::Unsubscribed), None),

            Command::Ping => (Ok(ResponsePayload::Pong), None),
        }
    }
}

/// Map an engine error to its protocol representation
fn error_info(e: &TutorHubError) -> ErrorInfo {
    let code = match e {
        TutorHubError::RequestNotFound(_) | TutorHubError::SessionNotFound(_) => {
            ErrorCode::NotFound
        }
        TutorHubError::InvalidTransition(_) => ErrorCode::InvalidTransition,
        TutorHubError::ValidationError(_) => ErrorCode::ValidationFailed,
        TutorHubError::PermissionDenied(_) => ErrorCode::PermissionDenied,
        TutorHubError::RateLimited => ErrorCode::RateLimited,
        TutorHubError::ConfigError(_)
        | TutorHubError::StoreError(_)
        | TutorHubError::IpcError(_)
        | TutorHubError::Internal(_) => ErrorCode::InternalError,
    };

    ErrorInfo::new(code, e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "tutorhubd starting");

    // Create and run the service
    let service = Service::new(&args).await?;
    service.run().await
}

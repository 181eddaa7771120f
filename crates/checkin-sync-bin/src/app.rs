//! Command implementations.

use crate::{probe, CheckinArgs, EnqueueCommand};
use checkin_config_and_utils::{Config, Paths};
use checkin_local_store::SqliteKeyValueStore;
use checkin_outbox::{
    classify_message, Checkin, ConnectivityBridge, ConnectivityMonitor, OperationKind, QueueStore,
    RemoteCheckinStore, RemoteProcessor, SyncEngine,
};
use checkin_supabase_remote::SupabaseCheckinStore;
use std::error::Error;
use std::sync::Arc;
use tracing::info;

type CommandResult = Result<(), Box<dyn Error>>;

/// Everything a command needs, wired from configuration.
pub struct AppContext {
    pub config: Config,
    pub engine: SyncEngine,
    pub remote: Arc<SupabaseCheckinStore>,
}

impl AppContext {
    pub fn open(
        config: Config,
        paths: Paths,
        access_token: Option<String>,
    ) -> Result<Self, Box<dyn Error>> {
        paths.ensure_dirs()?;
        let store = Arc::new(SqliteKeyValueStore::open(&paths.database_file())?);
        let queue = QueueStore::new(store, config.queue_key.clone());

        let remote = Arc::new(SupabaseCheckinStore::new(
            config.supabase_url()?.as_str(),
            config.supabase_anon_key.clone(),
            access_token,
            config.request_timeout(),
        )?);

        Ok(Self {
            config,
            engine: SyncEngine::new(queue),
            remote,
        })
    }

    fn queue(&self) -> &QueueStore {
        self.engine.queue()
    }

    fn processor(&self) -> Arc<RemoteProcessor> {
        Arc::new(RemoteProcessor::new(self.remote.clone()))
    }
}

pub fn status(ctx: &AppContext) -> CommandResult {
    let operations = ctx.queue().read_all();
    let report = serde_json::json!({
        "queue_key": ctx.queue().key(),
        "queued": operations.len(),
        "operations": operations,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn enqueue(ctx: &AppContext, command: EnqueueCommand) -> CommandResult {
    let kind = match command {
        EnqueueCommand::Create(args) => OperationKind::Create {
            payload: checkin_from_args(args)?,
        },
        EnqueueCommand::Update { target_id, checkin } => OperationKind::Update {
            target_id,
            payload: checkin_from_args(checkin)?,
        },
        EnqueueCommand::Delete { target_id } => OperationKind::Delete { target_id },
    };

    let op = ctx
        .queue()
        .enqueue(kind)
        .ok_or("failed to persist the operation, see the log for details")?;
    println!("{}", serde_json::to_string_pretty(&op)?);
    Ok(())
}

pub async fn flush(ctx: &AppContext) -> CommandResult {
    let outcome = ctx.engine.flush(ctx.processor()).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub fn classify(message: &str) -> CommandResult {
    let kind = classify_message(message);
    let report = serde_json::json!({
        "kind": kind,
        "retryable": kind.is_retryable(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Run the connectivity bridge with a reachability probe until Ctrl-C.
pub async fn run(ctx: &AppContext) -> CommandResult {
    let monitor = ConnectivityMonitor::new(ctx.remote.ping().await);
    let handle = ConnectivityBridge::new(
        ctx.engine.clone(),
        ctx.processor(),
        Arc::new(monitor.clone()),
    )
    .start();

    let probe = tokio::spawn(probe::run(
        ctx.remote.clone(),
        monitor,
        ctx.config.probe_interval(),
    ));

    info!(
        queued = ctx.queue().len(),
        probe_interval_secs = ctx.config.probe_interval().as_secs(),
        "checkin-sync running"
    );

    let mut outcomes = handle.outcomes();
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Shutdown requested");
                break;
            }
            changed = outcomes.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(outcome) = *outcomes.borrow_and_update() {
                    println!("{}", serde_json::to_string(&outcome)?);
                }
            }
        }
    }

    probe.abort();
    handle.shutdown().await;
    Ok(())
}

fn checkin_from_args(args: CheckinArgs) -> Result<Checkin, Box<dyn Error>> {
    let checkin = Checkin {
        thoughts: args.thoughts,
        emotions: args.emotions,
        body_sensations: args.body_sensations,
        energy_level: args.energy,
        behavior: args.behavior,
        note: args.note,
        created_at: chrono::Utc::now(),
    };
    checkin.validate()?;
    Ok(checkin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn context(dir: &std::path::Path) -> AppContext {
        let paths = Paths::with_base_dir(dir.to_path_buf());
        AppContext::open(Config::default(), paths, None).unwrap()
    }

    fn args(energy: u8) -> CheckinArgs {
        CheckinArgs {
            thoughts: "restless".to_string(),
            emotions: vec!["anxious".to_string()],
            body_sensations: Vec::new(),
            energy,
            behavior: String::new(),
            note: None,
        }
    }

    #[test]
    fn test_enqueue_persists_across_contexts() {
        let dir = tempdir().unwrap();

        enqueue(&context(dir.path()), EnqueueCommand::Create(args(3))).unwrap();
        enqueue(
            &context(dir.path()),
            EnqueueCommand::Delete {
                target_id: "c-9".to_string(),
            },
        )
        .unwrap();

        let ops = context(dir.path()).queue().read_all();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].label(), "create");
        assert_eq!(ops[1].target_id(), Some("c-9"));
    }

    #[test]
    fn test_enqueue_rejects_invalid_checkin() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        assert!(enqueue(&ctx, EnqueueCommand::Create(args(12))).is_err());
        assert!(ctx.queue().is_empty());
    }

    #[tokio::test]
    async fn test_flush_signed_out_drops_operations() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        enqueue(&ctx, EnqueueCommand::Create(args(5))).unwrap();

        let outcome = ctx.engine.flush(ctx.processor()).await;

        assert_eq!(outcome.processed, 1);
        assert!(ctx.queue().is_empty());
    }
}

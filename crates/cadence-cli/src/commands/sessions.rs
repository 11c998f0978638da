use clap::Subcommand;
use cadence_core::Database;

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List recorded sessions as JSON, newest first
    List {
        /// Maximum number of sessions to print
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Only sessions attributed to this task
        #[arg(long)]
        task: Option<String>,
    },
}

pub fn run(action: SessionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionsAction::List { limit, task } => {
            let sessions = match task {
                Some(task_id) => {
                    let mut sessions = db.sessions_for_task(&task_id)?;
                    sessions.reverse();
                    sessions.truncate(limit);
                    sessions
                }
                None => db.recent_sessions(limit)?,
            };
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}

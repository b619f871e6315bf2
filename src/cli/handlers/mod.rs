use std::fs;
use std::io::Read;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, ConfigStore};
use crate::io::lock::FileLock;
use crate::io::paths::DataDir;
use crate::io::task_store::{JsonFile, TaskStore};
use crate::io::tasks_io;
use crate::ops::task_ops;
use crate::parse::{TaskParser, segmenter_for};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let data_dir = DataDir::resolve(cli.data_dir.as_deref());

    match cli.command {
        None => crate::tui::run(&data_dir),
        Some(cmd) => match cmd {
            // Read commands
            Commands::List => cmd_list(&data_dir, json),
            Commands::Status => cmd_status(&data_dir, json),

            // Write commands
            Commands::Paste(args) => cmd_paste(&data_dir, args, json),
            Commands::Check(args) => cmd_set_completion(&data_dir, args, true, json),
            Commands::Uncheck(args) => cmd_set_completion(&data_dir, args, false, json),

            Commands::Config(cmd) => match cmd.action {
                ConfigAction::Get { key } => cmd_config_get(&data_dir, &key, json),
                ConfigAction::Set { key, value } => cmd_config_set(&data_dir, &key, &value),
                ConfigAction::Path => {
                    println!("{}", data_dir.config_path().display());
                    Ok(())
                }
            },
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store(data_dir: &DataDir) -> TaskStore {
    TaskStore::open(JsonFile::new(data_dir.tasks_path()))
}

/// A mutation that only reached memory is lost when the CLI exits, so
/// report it as a failure.
fn ensure_saved(store: &TaskStore) -> Result<(), Box<dyn std::error::Error>> {
    match store.last_save_error() {
        Some(err) => Err(format!("tasks were not saved: {}", err).into()),
        None => Ok(()),
    }
}

fn read_input(args: &PasteArgs) -> Result<String, Box<dyn std::error::Error>> {
    match &args.file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {}", path.display(), e).into()),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(data_dir: &DataDir, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir);
    if json {
        println!("{}", tasks_io::serialize_document(store.tasks())?);
    } else {
        println!("{}", format_task_list(store.tasks()));
    }
    Ok(())
}

fn cmd_status(data_dir: &DataDir, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data_dir);
    let stats = task_ops::checklist_stats(store.tasks());
    if json {
        let out = StatusJson {
            stats,
            durable: store.is_durable(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", format_status(&stats, store.is_durable()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_paste(
    data_dir: &DataDir,
    args: PasteArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(&args)?;
    if text.trim().is_empty() {
        return Err("nothing to paste: input is empty".into());
    }

    let config = ConfigStore::load(&data_dir.config_path())?;
    let parser = TaskParser::new(segmenter_for(config.config().parser.segmenter));
    let tasks = parser.parse(&text);

    let _lock = FileLock::acquire_default(data_dir.root())?;
    let mut store = open_store(data_dir);
    store.replace_all(tasks);
    ensure_saved(&store)?;

    if json {
        let out = PasteJson {
            tasks: store.len(),
            steps: store.tasks().iter().map(|t| t.steps.len()).sum(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", format_summary(store.tasks()));
    }
    Ok(())
}

fn cmd_set_completion(
    data_dir: &DataDir,
    args: CheckArgs,
    completed: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(data_dir.root())?;
    let mut store = open_store(data_dir);

    let task = task_ops::resolve_task(store.tasks(), &args.task)?;
    let task_id = task.id.clone();
    let step_id = match &args.step {
        Some(needle) => Some(task_ops::resolve_step(task, needle)?.id.clone()),
        None => None,
    };

    let updated = match &step_id {
        Some(step_id) => store.update_step_completion(&task_id, step_id, completed),
        None => store.update_task_completion(&task_id, completed),
    };
    if !updated {
        return Err(format!("task not found: {}", args.task).into());
    }
    ensure_saved(&store)?;

    if json {
        let out = CheckJson {
            task_id: &task_id,
            step_id: step_id.as_deref(),
            completed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if let Some(task) = task_ops::find_task(store.tasks(), &task_id) {
        println!("{}", format_task_tree(task).join("\n"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_get(
    data_dir: &DataDir,
    key: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigStore::load(&data_dir.config_path())?;
    let value = config
        .get(key)
        .ok_or_else(|| format!("config key not found: {}", key))?;
    match value {
        serde_json::Value::String(s) if !json => println!("{}", s),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn cmd_config_set(
    data_dir: &DataDir,
    key: &str,
    raw: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(data_dir.root())?;
    let mut config = ConfigStore::load(&data_dir.config_path())?;
    let value = config_io::parse_cli_value(raw);
    config.set(key, value.clone())?;
    println!("{} = {}", key, value);
    Ok(())
}

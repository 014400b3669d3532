use std::io::{self, BufRead, Write};

use anyhow::{Context, anyhow};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::DataStore;
use crate::datetime::parse_due_expr;
use crate::filter::{ViewCounts, visible};
use crate::remote::{NewTaskBody, RemoteStore, TaskPatch};
use crate::render::Renderer;
use crate::store::AppState;
use crate::task::{ActiveView, SmartView};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "list", "view", "done", "star", "myday", "assign", "due", "delete", "lists",
        "newlist", "rmlist", "confirm", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, remote, _cfg, renderer, inv))]
pub fn dispatch(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    _cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();

    debug!(
        command = %inv.command,
        args = ?inv.command_args,
        remote = remote.is_some(),
        "dispatching command"
    );

    match inv.command.as_str() {
        "add" => cmd_add(store, remote, &inv.command_args),
        "list" => cmd_list(store, remote, renderer, &inv.command_args, today),
        "view" => cmd_view(store, remote, renderer, &inv.command_args, today),
        "done" => cmd_done(store, remote, &inv.command_args),
        "star" => cmd_star(store, remote, &inv.command_args),
        "myday" => cmd_myday(store, remote, &inv.command_args),
        "assign" => cmd_assign(store, remote, &inv.command_args),
        "due" => cmd_due(store, remote, &inv.command_args, today),
        "delete" => cmd_delete(store, remote, &inv.command_args),
        "lists" => cmd_lists(store, remote, renderer),
        "newlist" => cmd_newlist(store, remote, &inv.command_args),
        "rmlist" => cmd_rmlist(store, remote, &inv.command_args),
        "confirm" => cmd_confirm(store, remote, &inv.command_args),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Loads the full application state from whichever backend is
/// configured. The remote backend re-fetches everything on every
/// invocation, so each action works against fresh server state.
fn load_state(store: &DataStore, remote: Option<&RemoteStore>) -> anyhow::Result<AppState> {
    let active_view = store.load_active_view()?;

    match remote {
        Some(remote) => {
            let (lists, tasks) = remote.load_data()?;
            let settings = store.load_settings()?;
            Ok(AppState {
                tasks,
                lists,
                settings,
                active_view,
            })
        }
        None => {
            let data = store.load_state()?;
            let mut state = AppState::from_data(data, active_view);
            if state.ensure_default_list() {
                store.save_state(&state.to_data())?;
            }
            Ok(state)
        }
    }
}

/// Commits local-variant state: the blob and the view selection.
fn persist_local(store: &DataStore, state: &AppState) -> anyhow::Result<()> {
    store.save_state(&state.to_data())?;
    store.save_active_view(state.active_view)?;
    Ok(())
}

fn parse_task_id(args: &[String]) -> anyhow::Result<u64> {
    let raw = args.first().ok_or_else(|| anyhow!("missing task id"))?;
    raw.parse::<u64>()
        .with_context(|| format!("invalid task id '{raw}'"))
}

fn view_title(state: &AppState) -> String {
    match state.active_view {
        ActiveView::Smart(view) => view.title().to_string(),
        ActiveView::List(id) => state
            .find_list(id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|_| "Tasks".to_string()),
    }
}

/// The two-outcome gate in front of destructive actions. Only an
/// explicit yes proceeds; anything else, including end-of-input, is a
/// decline.
pub fn read_confirmation<R: BufRead>(reader: &mut R, item: &str) -> anyhow::Result<bool> {
    print!("Delete \"{item}\"? (y/N) ");
    io::stdout().flush()?;

    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn confirm_or_skip(state: &AppState, item: &str) -> anyhow::Result<bool> {
    if !state.settings.confirm_delete {
        return Ok(true);
    }
    let stdin = io::stdin();
    read_confirmation(&mut stdin.lock(), item)
}

#[instrument(skip(store, remote, args))]
fn cmd_add(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command add");

    let text = args.join(" ");
    if text.trim().is_empty() {
        return Err(anyhow!("task text is empty"));
    }

    let mut state = load_state(store, remote)?;

    // Preconditions are checked against in-memory state before any
    // request goes out; no request, no local commit.
    let task = state.add_task(&text)?;

    match remote {
        Some(remote) => {
            let created = remote.create_task(&NewTaskBody {
                text: &task.text,
                list_id: task.list_id,
                important: task.important,
                my_day: task.my_day,
            })?;
            println!("Created task {}.", created.id);
        }
        None => {
            persist_local(store, &state)?;
            println!("Created task {}.", task.id);
        }
    }
    Ok(())
}

#[instrument(skip(store, remote, renderer, args, today))]
fn cmd_list(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command list");

    let state = load_state(store, remote)?;
    let query = args.join(" ");
    let shown = visible(&state.tasks, &state.active_view, &query);

    println!("{}", view_title(&state));
    renderer.print_view(&shown, &state.lists, &state.active_view, &query, today)
}

#[instrument(skip(store, remote, renderer, args, today))]
fn cmd_view(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command view");

    if args.is_empty() {
        return Err(anyhow!(
            "missing view: my-day, important, planned, assigned, all, or a list"
        ));
    }

    let mut state = load_state(store, remote)?;
    let token = args.join(" ");
    state.active_view = match SmartView::from_name(&token) {
        Some(view) => ActiveView::Smart(view),
        None => ActiveView::List(state.resolve_list(&token)?.id),
    };
    store.save_active_view(state.active_view)?;

    let shown = visible(&state.tasks, &state.active_view, "");
    println!("{}", view_title(&state));
    renderer.print_view(&shown, &state.lists, &state.active_view, "", today)
}

#[instrument(skip(store, remote, args))]
fn cmd_done(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command done");

    let id = parse_task_id(args)?;
    let mut state = load_state(store, remote)?;
    let completed = state.toggle_completed(id)?.completed;

    match remote {
        Some(remote) => {
            remote.update_task(id, &TaskPatch::completed(completed))?;
        }
        None => persist_local(store, &state)?,
    }

    if completed {
        println!("Completed task {id}.");
    } else {
        println!("Reopened task {id}.");
    }
    Ok(())
}

#[instrument(skip(store, remote, args))]
fn cmd_star(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command star");

    let id = parse_task_id(args)?;
    let mut state = load_state(store, remote)?;
    let important = state.toggle_important(id)?.important;

    match remote {
        Some(remote) => {
            remote.update_task(id, &TaskPatch::important(important))?;
        }
        None => persist_local(store, &state)?,
    }

    if important {
        println!("Starred task {id}.");
    } else {
        println!("Unstarred task {id}.");
    }
    Ok(())
}

#[instrument(skip(store, remote, args))]
fn cmd_myday(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command myday");

    let id = parse_task_id(args)?;
    let mut state = load_state(store, remote)?;
    let my_day = state.toggle_my_day(id)?.my_day;

    match remote {
        Some(remote) => {
            remote.update_task(id, &TaskPatch::my_day(my_day))?;
        }
        None => persist_local(store, &state)?,
    }

    if my_day {
        println!("Added task {id} to My Day.");
    } else {
        println!("Removed task {id} from My Day.");
    }
    Ok(())
}

#[instrument(skip(store, remote, args))]
fn cmd_assign(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command assign");

    let id = parse_task_id(args)?;
    let mut state = load_state(store, remote)?;
    let assigned = state.toggle_assigned(id)?.assigned_to.clone();

    match remote {
        Some(remote) => {
            remote.update_task(id, &TaskPatch::assigned_to(assigned.clone()))?;
        }
        None => persist_local(store, &state)?,
    }

    if assigned.is_some() {
        println!("Assigned task {id} to you.");
    } else {
        println!("Unassigned task {id}.");
    }
    Ok(())
}

#[instrument(skip(store, remote, args, today))]
fn cmd_due(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command due");

    let id = parse_task_id(args)?;
    let expr = args
        .get(1)
        .ok_or_else(|| anyhow!("missing due date, expected YYYY-MM-DD, today, tomorrow or +Nd"))?;
    let date = parse_due_expr(expr, today)?;

    let mut state = load_state(store, remote)?;
    state.set_due_date(id, date, today)?;

    match remote {
        Some(remote) => {
            remote.update_task(id, &TaskPatch::due_date(date))?;
        }
        None => persist_local(store, &state)?,
    }

    println!("Task {id} due {date}.");
    Ok(())
}

#[instrument(skip(store, remote, args))]
fn cmd_delete(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command delete");

    let id = parse_task_id(args)?;
    let mut state = load_state(store, remote)?;
    let text = state.find_task(id)?.text.clone();

    if !confirm_or_skip(&state, &text)? {
        info!(id, "deletion declined");
        println!("Nothing deleted.");
        return Ok(());
    }

    state.remove_task(id)?;
    match remote {
        Some(remote) => remote.delete_task(id)?,
        None => persist_local(store, &state)?,
    }

    println!("Deleted task {id}.");
    Ok(())
}

#[instrument(skip(store, remote, renderer))]
fn cmd_lists(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    info!("command lists");

    let state = load_state(store, remote)?;
    let counts = ViewCounts::tally(&state.tasks);
    renderer.print_sidebar(&state.lists, &counts, &state.active_view)
}

#[instrument(skip(store, remote, args))]
fn cmd_newlist(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command newlist");

    let name = args.join(" ");
    if name.trim().is_empty() {
        return Err(anyhow!("list name is empty"));
    }

    let mut state = load_state(store, remote)?;

    // Validates the name against current state and switches the active
    // view; the remote id is only known after the service replies.
    let list = state.add_list(&name)?;

    match remote {
        Some(remote) => {
            let created = remote.create_list(&list.name)?;
            store.save_active_view(ActiveView::List(created.id))?;
            println!("Created list '{}' ({}).", created.name, created.id);
        }
        None => {
            persist_local(store, &state)?;
            println!("Created list '{}' ({}).", list.name, list.id);
        }
    }
    Ok(())
}

#[instrument(skip(store, remote, args))]
fn cmd_rmlist(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command rmlist");

    if args.is_empty() {
        return Err(anyhow!("missing list name or id"));
    }

    let mut state = load_state(store, remote)?;
    let token = args.join(" ");
    let target = state.resolve_list(&token)?.clone();

    if !confirm_or_skip(&state, &target.name)? {
        info!(id = target.id, "list deletion declined");
        println!("Nothing deleted.");
        return Ok(());
    }

    // Enforces the default-list guard and cascades locally; the server
    // cascades on its side in the remote variant.
    let removed = state.remove_list(target.id)?;

    match remote {
        Some(remote) => {
            remote.delete_list(removed.id)?;
            store.save_active_view(state.active_view)?;
        }
        None => persist_local(store, &state)?,
    }

    println!("Deleted list '{}'.", removed.name);
    Ok(())
}

#[instrument(skip(store, remote, args))]
fn cmd_confirm(
    store: &DataStore,
    remote: Option<&RemoteStore>,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command confirm");

    let raw = args
        .first()
        .ok_or_else(|| anyhow!("expected 'on' or 'off'"))?;
    let value = match raw.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => true,
        "off" | "no" | "false" | "0" => false,
        other => return Err(anyhow!("expected 'on' or 'off', got '{other}'")),
    };

    match remote {
        Some(_) => {
            // Settings never touch the service; they live in the
            // dedicated client-side file.
            let mut settings = store.load_settings()?;
            settings.confirm_delete = value;
            store.save_settings(&settings)?;
        }
        None => {
            let mut state = load_state(store, remote)?;
            state.set_confirm_delete(value);
            persist_local(store, &state)?;
        }
    }

    if value {
        println!("Delete confirmation on.");
    } else {
        println!("Delete confirmation off.");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "usage: daylist [--config <rc>] [--data <dir>] [--rc KEY=VALUE] <command> [args]

commands:
  add <text...>          add a task to the active view
  list [query...]        show the active view, optionally searched
  view <name|list>       switch view: my-day, important, planned,
                         assigned, all, or a list name/id
  done <id>              toggle a task's completion
  star <id>              toggle a task's importance
  myday <id>             toggle a task's My Day membership
  assign <id>            toggle assignment to yourself
  due <id> <date>        set a due date (YYYY-MM-DD, today, tomorrow, +Nd)
  delete <id>            delete a task
  lists                  show smart views and lists with open counts
  newlist <name...>      create a list and switch to it
  rmlist <name|id>       delete a list and its tasks
  confirm on|off         toggle the delete confirmation prompt
  version                print the version"
    );
    Ok(())
}

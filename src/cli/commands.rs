//! Command dispatch
//!
//! Every outline command opens one editing session on the selected key, applies a
//! single operation and lets the session persist it.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{EditorEvent, EditorSession, ImportMode};
use crate::application::{ApplicationError, StorageKey};
use crate::cli::args::{AddAt, Cli, Commands, ConfigCommands, DropArgs, ZoneArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{
    Attachment, DropAction, DropOutcome, DropRejection, DropTarget, LessonType, NodeType,
    TreePath,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        None => Ok(()),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(_) => {
            let settings = Settings::load(cli.store.as_deref())?;
            debug!("settings: {:?}", settings);
            let container = ServiceContainer::new(settings, cli.yes);
            execute_with(&container, cli)
        }
    }
}

/// Run an outline command against an already wired container.
pub fn execute_with(container: &ServiceContainer, cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    if let Commands::Keys = command {
        return cmd_keys(container);
    }

    let key = cli.context.storage_key()?;
    let mut session = container.open_session(key);

    match command {
        Commands::Show {
            collapse,
            collapse_all,
            flat,
            json,
        } => cmd_show(&mut session, collapse, *collapse_all, *flat, *json),
        Commands::Add { path, title, at } => cmd_add(&mut session, path, title.as_deref(), *at),
        Commands::Rename { path, title } => cmd_rename(&mut session, path, title),
        Commands::Delete { path } => cmd_delete(&mut session, path),
        Commands::Duplicate { path } => cmd_duplicate(&mut session, path),
        Commands::Move { drop } => cmd_move(&mut session, drop),
        Commands::Preview { drop } => cmd_preview(&mut session, drop),
        Commands::Lesson {
            path,
            duration,
            lesson_type,
            content,
            attach,
            clear_attachments,
        } => cmd_lesson(
            &mut session,
            path,
            LessonEdit {
                duration: *duration,
                lesson_type: lesson_type.as_deref(),
                content: content.as_deref(),
                attach,
                clear_attachments: *clear_attachments,
            },
        ),
        Commands::Import {
            from_course,
            key,
            replace,
        } => cmd_import(&mut session, from_course.as_deref(), key.as_deref(), *replace),
        Commands::Select => cmd_select(container, &mut session),
        Commands::Stats => cmd_stats(&session),
        Commands::Keys | Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn parse_path(raw: &str) -> CliResult<TreePath> {
    Ok(raw.parse::<TreePath>()?)
}

/// Parse `raw` and make sure a node lives there.
fn existing_path(session: &EditorSession, raw: &str) -> CliResult<TreePath> {
    let path = parse_path(raw)?;
    if session.outline().get(&path).is_none() {
        return Err(ApplicationError::NodeNotFound(path.to_string()).into());
    }
    Ok(path)
}

fn describe_node(session: &EditorSession, path: &TreePath) -> String {
    match session.outline().get(path) {
        Some(node) => format!("{} \"{}\" at {}", node.node_type, node.title, path),
        None => path.to_string(),
    }
}

fn log_events(session: &mut EditorSession) {
    for event in session.drain_events() {
        match event {
            EditorEvent::NodeSelected { id } => debug!("selected {}", id),
            EditorEvent::OpenLessonEditor { id } => debug!("lesson editor for {}", id),
        }
    }
}

// ============================================================
// show / stats / keys
// ============================================================

#[instrument(level = "debug", skip(session))]
fn cmd_show(
    session: &mut EditorSession,
    collapse: &[String],
    collapse_all: bool,
    flat: bool,
    json: bool,
) -> CliResult<()> {
    if json {
        let rendered = serde_json::to_string_pretty(&session.outline().to_nodes()).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialise outline".to_string(),
                source: Box::new(e),
            }
        })?;
        output::info(&rendered);
        return Ok(());
    }

    if collapse_all {
        session.collapse_all();
    }
    for raw in collapse.iter().unique() {
        let path = parse_path(raw)?;
        if session.toggle_collapse(&path).is_none() {
            output::warning(&format!("no node at {}", path));
        }
    }

    if !flat {
        output::info(&session.render());
        return Ok(());
    }
    for row in session.visible_rows() {
        let marker = match (row.child_count, row.collapsed) {
            (0, _) => "·",
            (_, true) => "▸",
            (_, false) => "▾",
        };
        output::info(&format!(
            "{}{} [{}] {}  ({})",
            "  ".repeat(row.depth),
            marker,
            row.node_type,
            row.title,
            row.path
        ));
    }
    Ok(())
}

fn format_minutes(total: u64) -> String {
    match (total / 60, total % 60) {
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {:02}m", h, m),
    }
}

fn cmd_stats(session: &EditorSession) -> CliResult<()> {
    let stats = session.outline().stats();
    output::header(session.key());
    for kind in session.outline().variant().ladder() {
        let count = stats.counts.get(kind).copied().unwrap_or(0);
        output::field(kind.as_str(), &count);
    }
    output::field("depth", &(stats.max_depth + usize::from(!session.outline().is_empty())));
    if session.outline().variant().ladder().contains(&NodeType::Lesson) {
        output::field("duration", &format_minutes(stats.total_minutes));
    }
    Ok(())
}

fn cmd_keys(container: &ServiceContainer) -> CliResult<()> {
    let keys = container.repository().keys()?;
    if keys.is_empty() {
        output::detail(&format!(
            "no outlines stored in {}",
            container.settings.store_dir.display()
        ));
    }
    for key in keys {
        output::info(&key);
    }
    Ok(())
}

// ============================================================
// explicit edits
// ============================================================

#[instrument(level = "debug", skip(session))]
fn cmd_add(session: &mut EditorSession, raw: &str, title: Option<&str>, at: AddAt) -> CliResult<()> {
    let path = parse_path(raw)?;
    let added = match at {
        AddAt::Child => session.add(&path, title),
        AddAt::Before | AddAt::After => session.add_relative(&path, at.into(), title),
    };
    match added {
        Some(new_path) => {
            output::action("Added", &describe_node(session, &new_path));
            Ok(())
        }
        None => Err(CliError::NoChange(format!("nothing added at {}", path))),
    }
}

fn cmd_rename(session: &mut EditorSession, raw: &str, title: &str) -> CliResult<()> {
    let path = existing_path(session, raw)?;
    if !session.rename(&path, title) {
        return Err(CliError::NoChange("title must not be blank".to_string()));
    }
    output::action("Renamed", &describe_node(session, &path));
    Ok(())
}

fn cmd_delete(session: &mut EditorSession, raw: &str) -> CliResult<()> {
    let path = existing_path(session, raw)?;
    match session.delete(&path) {
        Some(removed) => {
            output::action(
                "Deleted",
                &format!(
                    "{} \"{}\" ({} nodes)",
                    removed.node_type,
                    removed.title,
                    removed.subtree_len()
                ),
            );
            Ok(())
        }
        None => Err(CliError::NoChange("delete cancelled".to_string())),
    }
}

fn cmd_duplicate(session: &mut EditorSession, raw: &str) -> CliResult<()> {
    let path = existing_path(session, raw)?;
    match session.duplicate(&path) {
        Some(copy) => {
            output::action("Duplicated", &describe_node(session, &copy));
            Ok(())
        }
        None => Err(CliError::NoChange(format!("cannot duplicate {}", path))),
    }
}

struct LessonEdit<'a> {
    duration: Option<u32>,
    lesson_type: Option<&'a str>,
    content: Option<&'a str>,
    attach: &'a [String],
    clear_attachments: bool,
}

impl LessonEdit<'_> {
    fn is_empty(&self) -> bool {
        self.duration.is_none()
            && self.lesson_type.is_none()
            && self.content.is_none()
            && self.attach.is_empty()
            && !self.clear_attachments
    }
}

#[instrument(level = "debug", skip(session, edit))]
fn cmd_lesson(session: &mut EditorSession, raw: &str, edit: LessonEdit<'_>) -> CliResult<()> {
    let path = existing_path(session, raw)?;

    if edit.is_empty() {
        if !session.open_lesson(&path) {
            return Err(CliError::NoChange(format!(
                "{} is not a lesson",
                describe_node(session, &path)
            )));
        }
        log_events(session);
        print_lesson(session, &path);
        return Ok(());
    }

    let Some(node) = session.outline().get(&path) else {
        return Err(ApplicationError::NodeNotFound(path.to_string()).into());
    };
    let mut details = node.lesson.clone();
    if let Some(minutes) = edit.duration {
        details.duration = Some(minutes);
    }
    if let Some(raw_type) = edit.lesson_type {
        details.lesson_type = Some(raw_type.parse::<LessonType>()?);
    }
    if let Some(content) = edit.content {
        details.content = Some(content.to_string());
    }
    if edit.clear_attachments {
        details.attachments.clear();
    }
    for raw_attachment in edit.attach {
        details.attachments.push(raw_attachment.parse::<Attachment>()?);
    }

    if !session.update_lesson(&path, details) {
        return Err(CliError::NoChange(format!(
            "{} is not a lesson",
            describe_node(session, &path)
        )));
    }
    output::action("Updated", &describe_node(session, &path));
    Ok(())
}

fn print_lesson(session: &EditorSession, path: &TreePath) {
    let Some(node) = session.outline().get(path) else {
        return;
    };
    output::header(&node.title);
    output::field("path", path);
    output::field("id", &node.id);
    let lesson = &node.lesson;
    if let Some(kind) = lesson.lesson_type {
        output::field("type", &kind);
    }
    if let Some(minutes) = lesson.duration {
        output::field("duration", &format_minutes(u64::from(minutes)));
    }
    if let Some(content) = &lesson.content {
        output::field("content", content);
    }
    for attachment in &lesson.attachments {
        output::field("attachment", &format!("{} <{}>", attachment.name, attachment.url));
    }
}

// ============================================================
// drag and drop
// ============================================================

fn drop_target(args: &DropArgs) -> CliResult<DropTarget> {
    if args.zone == ZoneArg::Root {
        return Ok(DropTarget::root());
    }
    let path = parse_path(&args.target)?;
    Ok(DropTarget::new(path, args.zone.into()).at(args.offset, 0.0))
}

fn begin(session: &mut EditorSession, args: &DropArgs) -> CliResult<(TreePath, DropTarget)> {
    let drag = parse_path(&args.drag)?;
    let target = drop_target(args)?;
    if !session.begin_drag(&drag) {
        return Err(ApplicationError::NodeNotFound(drag.to_string()).into());
    }
    Ok((drag, target))
}

fn action_label(action: DropAction) -> &'static str {
    match action {
        DropAction::Nest => "nest inside",
        DropAction::Before => "insert before",
        DropAction::After => "insert after",
        DropAction::Root => "new top-level section",
    }
}

fn rejection_message(rejection: DropRejection) -> &'static str {
    match rejection {
        DropRejection::NoActiveDrag => "no drag in progress",
        DropRejection::SourceGone => "dragged node no longer exists",
        DropRejection::TargetGone => "no node at the drop target",
        DropRejection::IntoOwnSubtree => "cannot drop a node into itself",
        DropRejection::RootZoneUnavailable => "this outline has no top-level drop zone",
        DropRejection::TooDeep => "the moved outline would nest too deep",
        DropRejection::Refused => "move refused",
    }
}

#[instrument(level = "debug", skip(session))]
fn cmd_move(session: &mut EditorSession, args: &DropArgs) -> CliResult<()> {
    let (drag, target) = begin(session, args)?;
    let before = describe_node(session, &drag);
    match session.drop(&target) {
        DropOutcome::Moved(to) => {
            let kind = session
                .outline()
                .get(&to)
                .map(|n| n.node_type.to_string())
                .unwrap_or_default();
            output::action("Moved", &format!("{} -> {} (now {})", before, to, kind));
            Ok(())
        }
        DropOutcome::Rejected(rejection) => {
            Err(CliError::NoChange(rejection_message(rejection).to_string()))
        }
    }
}

fn cmd_preview(session: &mut EditorSession, args: &DropArgs) -> CliResult<()> {
    let (drag, target) = begin(session, args)?;
    let preview = session.hover(&target);
    session.cancel_drag();
    match preview {
        Ok(preview) => {
            output::info(&format!(
                "{}: {} -> depth {}, becomes {}",
                drag,
                action_label(preview.action),
                preview.depth,
                preview.resulting_type
            ));
            Ok(())
        }
        Err(rejection) => Err(CliError::NoChange(rejection_message(rejection).to_string())),
    }
}

// ============================================================
// import / select
// ============================================================

fn cmd_import(
    session: &mut EditorSession,
    from_course: Option<&str>,
    key: Option<&str>,
    replace: bool,
) -> CliResult<()> {
    let source = match (from_course, key) {
        (Some(course), _) => StorageKey::curriculum(course),
        (None, Some(raw)) => raw.parse::<StorageKey>()?,
        (None, None) => {
            return Err(CliError::Usage(
                "name the source with --from-course or --key".to_string(),
            ))
        }
    };
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };
    let count = session.import_from(&source, mode)?;
    output::action(
        "Imported",
        &format!("{} top-level nodes from {}", count, source),
    );
    Ok(())
}

fn cmd_select(container: &ServiceContainer, session: &mut EditorSession) -> CliResult<()> {
    let items: Vec<SelectionItem> = session
        .outline()
        .walk()
        .map(|(path, depth, node)| SelectionItem {
            display: format!(
                "{}[{}] {}  {}",
                "  ".repeat(depth),
                node.node_type,
                node.title,
                path
            ),
            value: path.to_string(),
        })
        .collect();

    let Some(choice) = container.selector.select_one(&items, "node> ")? else {
        return Ok(());
    };
    let path = parse_path(&choice.value)?;
    session.select(&path);
    log_events(session);
    output::info(&choice.value);
    Ok(())
}

// ============================================================
// config / completion
// ============================================================

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    let settings = Settings::load(cli.store.as_deref())?;
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            let mark = |exists: bool| if exists { "" } else { " (missing)" };
            match global_config_path() {
                Some(global) => output::field(
                    "global",
                    &format!("{}{}", global.display(), mark(global.exists())),
                ),
                None => output::field("global", "unavailable"),
            }
            let local = local_config_path(&settings.store_dir);
            output::field(
                "local",
                &format!("{}{}", local.display(), mark(local.exists())),
            );
            output::field("store", &settings.store_dir.display());
        }
    }
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

//! CLI interface for cognosys

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::watch;

use crate::catalog::{ResourceCatalog, ResourceFilter};
use crate::config::Config;
use crate::explorer::{TopicExplorer, ROOT_TOPICS};
use crate::provider::{ContentService, Generated};
use crate::session::{LessonSession, LoadState};
use crate::store::{FileStorage, ProgressionStore};
use crate::types::{Difficulty, LearningPath, ModuleContent, ModuleStatus};

#[derive(Parser)]
#[command(name = "cognosys")]
#[command(about = "Adaptive learning paths with generated lessons, quizzes and XP", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show your profile and path progress (default when no command given)
    Profile,
    /// Create, inspect or abandon the active learning path
    Path {
        #[command(subcommand)]
        command: PathCommands,
    },
    /// Open a module: read the lesson, take the quiz, submit the assignment
    Lesson {
        /// Module number (1-based)
        index: usize,
    },
    /// Mark a module completed without opening it
    Complete {
        /// Module number (1-based)
        index: usize,
    },
    /// Explore a topic tree, optionally starting from a topic
    Explore {
        topic: Option<String>,
    },
    /// Browse the resource library
    Resources {
        /// All, Saved, Book, Course, Paper or Tool
        #[arg(short, long, default_value = "All")]
        filter: ResourceFilter,
        /// Match against titles and tags
        #[arg(short, long, default_value = "")]
        query: String,
        /// Ask the provider for more resources on the query first
        #[arg(long)]
        ask_ai: bool,
    },
    /// Toggle a bookmark on a resource
    Bookmark {
        /// Resource id
        id: String,
    },
    /// Configure cognosys
    Config {
        /// Set the provider API key
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored API key
        #[arg(long, conflicts_with = "set_api_key")]
        clear_api_key: bool,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set the generation model
        #[arg(long)]
        set_model: Option<String>,
        /// Force offline content (true/false)
        #[arg(long)]
        offline: Option<bool>,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum PathCommands {
    /// Generate a new learning path
    Create {
        /// What to learn
        topic: String,
        /// Beginner, Intermediate or Advanced
        #[arg(short, long, default_value = "Beginner")]
        difficulty: Difficulty,
        /// Preferred tools or libraries
        #[arg(short, long)]
        stack: Option<String>,
        /// Replace an existing path
        #[arg(long)]
        force: bool,
    },
    /// Show modules and progress
    Show,
    /// Abandon the active path
    Abandon {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Everything a command needs: config, the progress store and the provider
struct App {
    config: Config,
    store: ProgressionStore,
    service: ContentService,
}

impl App {
    fn open() -> Result<Self> {
        let config = Config::load()?;
        let dir = config.storage_dir()?;
        let storage = FileStorage::new(&dir)
            .with_context(|| format!("Failed to open progress storage at {}", dir.display()))?;
        let store = ProgressionStore::init(Box::new(storage))
            .with_completion_bonus(config.session.completion_bonus_xp);
        for slot in store.malformed_slots() {
            eprintln!("Warning: stored {} was unreadable and has been reset.", slot);
        }
        let service = ContentService::from_config(&config);
        Ok(Self { config, store, service })
    }

    fn close(mut self) -> Result<()> {
        self.store.teardown().context("Failed to save progress")
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { set_api_key, clear_api_key, show, set_model, offline, reset }) => {
            configure(set_api_key, clear_api_key, show, set_model, offline, reset)
        }
        command => run_with_progress(command).await,
    }
}

fn configure(
    set_api_key: Option<String>,
    clear_api_key: bool,
    show: bool,
    set_model: Option<String>,
    offline: Option<bool>,
    reset: bool,
) -> Result<()> {
    if let Some(key) = set_api_key {
        crate::config::set_api_key(&key)?;
    } else if clear_api_key {
        crate::config::clear_api_key()?;
    } else if let Some(model) = set_model {
        crate::config::set_model(&model)?;
    } else if let Some(enabled) = offline {
        crate::config::set_offline(enabled)?;
    } else if reset {
        crate::config::reset_config()?;
    } else if show {
        crate::config::show_config()?;
    } else {
        println!("Configuration options:");
        println!("  --set-api-key <key>      Set the provider API key");
        println!("  --clear-api-key          Remove the stored API key");
        println!("  --set-model <id>         Set the generation model");
        println!("  --offline <true|false>   Force offline content");
        println!("  --reset                  Reset configuration to defaults");
        println!("  --show                   Display current configuration");
    }
    Ok(())
}

async fn run_with_progress(command: Option<Commands>) -> Result<()> {
    let mut app = App::open()?;
    if !app.service.is_online() {
        println!("(offline mode: lessons use placeholder content)");
    }

    match command {
        None | Some(Commands::Profile) => show_profile(&app),
        Some(Commands::Path { command }) => match command {
            PathCommands::Create { topic, difficulty, stack, force } => {
                create_path(&mut app, &topic, difficulty, stack.as_deref(), force).await?
            }
            PathCommands::Show => show_path(&app)?,
            PathCommands::Abandon { yes } => abandon_path(&mut app, yes)?,
        },
        Some(Commands::Lesson { index }) => run_lesson(&mut app, module_index(index)?).await?,
        Some(Commands::Complete { index }) => complete(&mut app, module_index(index)?)?,
        Some(Commands::Explore { topic }) => explore(&mut app, topic).await?,
        Some(Commands::Resources { filter, query, ask_ai }) => {
            resources(&mut app, filter, &query, ask_ai).await?
        }
        Some(Commands::Bookmark { id }) => bookmark(&mut app, &id)?,
        Some(Commands::Config { .. }) => {}
    }

    app.close()
}

fn module_index(number: usize) -> Result<usize> {
    if number == 0 {
        bail!("Modules are numbered from 1");
    }
    Ok(number - 1)
}

fn active_path(app: &App) -> Result<&LearningPath> {
    app.store
        .active_path()
        .context("No active learning path. Create one with `cognosys path create <topic>`.")
}

fn show_profile(app: &App) {
    let profile = app.store.profile();
    println!("{} - {}", profile.name, profile.role);
    println!("  XP:      {}", profile.xp);
    println!("  Streak:  {} days", profile.streak);
    if !profile.interests.is_empty() {
        println!("  Interests: {}", profile.interests.join(", "));
    }

    match app.store.active_path() {
        Some(path) => {
            let progress = path.progress();
            println!();
            println!("Current path: {} ({})", path.topic, path.difficulty);
            println!("  {}% complete ({}/{} modules)", progress.percent, progress.completed, progress.total);
            match progress.next_up {
                Some(title) => println!("  Next up: {}", title),
                None => println!("  Path complete!"),
            }
        }
        None => println!("\nNo active path. Start one with `cognosys path create <topic>`."),
    }
    println!("\nBookmarks: {}", app.store.bookmarks().len());
}

async fn create_path(
    app: &mut App,
    topic: &str,
    difficulty: Difficulty,
    stack: Option<&str>,
    force: bool,
) -> Result<()> {
    if let Some(existing) = app.store.active_path() {
        if !force {
            bail!(
                "A path for '{}' is already active. Abandon it first or pass --force.",
                existing.topic
            );
        }
    }

    let pb = spinner(&format!("Designing a {} path for {}...", difficulty, topic));
    let generated = app.service.generate_learning_path(topic, difficulty, stack).await;
    pb.finish_and_clear();

    match generated {
        Generated::Ready(path) => {
            app.store.create_path(path);
            show_path(app)
        }
        Generated::Unavailable(reason) => {
            eprintln!("Could not generate a learning path: {}", reason);
            eprintln!("Run the same command again to retry.");
            Ok(())
        }
    }
}

fn show_path(app: &App) -> Result<()> {
    let path = active_path(app)?;
    println!("{} ({})", path.topic, path.difficulty);
    if let Some(stack) = &path.tech_stack {
        println!("Stack: {}", stack);
    }
    println!();
    for (i, module) in path.modules.iter().enumerate() {
        let marker = match module.effective_status() {
            ModuleStatus::Completed => "[x]",
            ModuleStatus::Active => "[>]",
            ModuleStatus::Locked => "[ ]",
        };
        println!("{} {}. {} ({:.1}h)", marker, i + 1, module.title, module.estimated_hours);
        println!("      {}", module.description);
    }
    let progress = path.progress();
    println!("\n{}% complete", progress.percent);
    Ok(())
}

fn abandon_path(app: &mut App, yes: bool) -> Result<()> {
    let topic = active_path(app)?.topic.clone();
    if !yes && !confirm(&format!("Abandon the '{}' path? Lesson progress will be lost.", topic))? {
        println!("Cancelled.");
        return Ok(());
    }
    app.store.set_path(None);
    println!("Path abandoned.");
    Ok(())
}

fn complete(app: &mut App, index: usize) -> Result<()> {
    let module = active_path(app)?
        .modules
        .get(index)
        .with_context(|| format!("No module {}", index + 1))?;
    if module.is_locked() {
        bail!("Module {} is locked. Complete the previous module first.", index + 1);
    }
    report_completion(app.store.update_module_status(index, ModuleStatus::Completed));
    Ok(())
}

fn report_completion(change: Option<crate::store::StatusChange>) {
    let Some(change) = change else {
        return;
    };
    if change.xp_awarded > 0 {
        println!("Module completed! +{} XP", change.xp_awarded);
    } else {
        println!("Module was already completed.");
    }
    if let Some(next) = change.unlocked {
        println!("Module {} unlocked.", next + 1);
    }
}

async fn run_lesson(app: &mut App, index: usize) -> Result<()> {
    let module = active_path(app)?
        .modules
        .get(index)
        .with_context(|| format!("No module {}", index + 1))?;
    if module.is_locked() {
        bail!("Module {} is locked. Complete the previous module first.", index + 1);
    }

    let mut session = LessonSession::from_config(&app.config.session);
    let mut ticket = session.begin_open(&app.store, index);
    loop {
        if let Some(pending) = ticket.take() {
            let pb = caption_spinner(session.captions());
            let content = app
                .service
                .generate_module_content(
                    &pending.topic,
                    &pending.module_title,
                    pending.difficulty,
                    pending.tech_stack.as_deref(),
                )
                .await;
            session.finish_open(&mut app.store, pending, content);
            pb.finish_and_clear();
        }

        match session.load_state() {
            LoadState::Ready => break,
            LoadState::Failed(message) => {
                eprintln!("{}", message);
                if !confirm("Retry?")? {
                    return Ok(());
                }
                ticket = session.begin_retry(&app.store);
                if ticket.is_none() {
                    eprintln!("This lesson can no longer be loaded. Check `cognosys path show`.");
                    return Ok(());
                }
            }
            LoadState::Idle | LoadState::Loading { .. } => return Ok(()),
        }
    }

    let Some(content) = session.content(&app.store).cloned() else {
        return Ok(());
    };
    print_lesson(&content);

    if !content.quizzes.is_empty() {
        println!("\n== Knowledge check ==");
        for (q, quiz) in content.quizzes.iter().enumerate() {
            println!("\n{}. {}", q + 1, quiz.question);
            for (o, option) in quiz.options.iter().enumerate() {
                println!("   {}) {}", o + 1, option);
            }
            let answer = prompt("Your answer (number, blank to skip): ")?;
            if let Ok(choice) = answer.trim().parse::<usize>() {
                if choice == 0 || !session.select_answer(&app.store, q, choice - 1) {
                    println!("   (no such option, skipped)");
                }
            }
        }

        if let Some(outcome) = session.submit_quiz(&app.store) {
            println!();
            for (q, quiz) in content.quizzes.iter().enumerate() {
                let selected = session.quiz().selection(q);
                let verdict = if selected == Some(quiz.correct_answer) { "correct" } else { "incorrect" };
                println!("{}. {}: {}", q + 1, verdict, quiz.explanation);
            }
            println!("\nScore: {}/{}", outcome.score, outcome.total);
            if outcome.perfect {
                println!("Perfect score!");
            }
        }
    }

    if let Some(assignment) = &content.assignment {
        println!("\n== Assignment: {} ({}) ==", assignment.title, assignment.difficulty);
        println!("{}", assignment.description);
        for requirement in &assignment.requirements {
            println!("  - {}", requirement);
        }
        println!("\nEnter your solution, finishing with an empty line (leave empty to skip):");
        session.set_submission(read_block()?);

        let pb = spinner("Reviewing your submission...");
        let feedback = session.submit_assignment(&app.store, &app.service).await.cloned();
        pb.finish_and_clear();

        if let Some(feedback) = feedback {
            println!("\nReview: {}", feedback.status);
            println!("{}", feedback.feedback);
            for strength in &feedback.strengths {
                println!("  + {}", strength);
            }
            for improvement in &feedback.improvements {
                println!("  - {}", improvement);
            }
        }
    }

    if confirm("\nMark this module complete?")? {
        report_completion(session.complete_module(&mut app.store));
    } else {
        session.close();
    }
    Ok(())
}

fn print_lesson(content: &ModuleContent) {
    println!("\n{}", content.overview);
    for section in &content.sections {
        println!("\n== {} ==\n{}", section.title, section.content);
    }
    if let Some(example) = &content.code_example {
        println!("\n== Example ({}) ==", example.language);
        println!("{}", example.code);
        println!("\n{}", example.explanation);
    }
}

async fn explore(app: &mut App, topic: Option<String>) -> Result<()> {
    let mut explorer = TopicExplorer::new();

    let first = match topic {
        Some(topic) => topic,
        None => {
            println!("Where would you like to start?");
            for (i, root) in ROOT_TOPICS.iter().enumerate() {
                println!("  {}. {}", i + 1, root);
            }
            let choice = prompt("Topic (number or name, blank to quit): ")?;
            match pick(&choice, &ROOT_TOPICS.map(String::from)) {
                Some(topic) => topic,
                None => return Ok(()),
            }
        }
    };
    let mut pending = Some(first);

    loop {
        if let Some(name) = pending.take() {
            let pb = spinner(&format!("Exploring {}...", name));
            let mut loaded = explorer.explore(&app.service, &name).await;
            pb.finish_and_clear();

            while !loaded {
                eprintln!("{}", explorer.error().unwrap_or("Topic unavailable."));
                if !confirm("Retry?")? {
                    break;
                }
                loaded = explorer.retry(&app.service).await;
            }
        }

        let Some(node) = explorer.current() else {
            return Ok(());
        };
        let trail: Vec<&str> = explorer.history().iter().map(|n| n.name.as_str()).collect();
        if !trail.is_empty() {
            println!("\n{} > {}", trail.join(" > "), node.name);
        }
        println!("\n{}\n{}", node.name, node.description);
        println!("\nSubtopics:");
        for (i, sub) in node.subtopics.iter().enumerate() {
            println!("  {}. {}", i + 1, sub);
        }
        println!("Related: {}", node.related_fields.join(", "));
        let subtopics = node.subtopics.clone();

        let choice = prompt("\nSubtopic number or name, b<N> to go back, p to build a path, blank to quit: ")?;
        let choice = choice.trim();
        if choice.is_empty() {
            return Ok(());
        }
        if choice.eq_ignore_ascii_case("p") {
            let Some(seed) = explorer.path_seed().map(str::to_string) else {
                return Ok(());
            };
            return create_path(app, &seed, Difficulty::Beginner, None, false).await;
        }
        if let Some(n) = choice.strip_prefix('b').and_then(|n| n.parse::<usize>().ok()) {
            if n == 0 || !explorer.back_to(n - 1) {
                println!("No such breadcrumb.");
            }
            continue;
        }
        pending = pick(choice, &subtopics);
        if pending.is_none() {
            return Ok(());
        }
    }
}

/// A numbered choice from `options`, or free text as-is
fn pick(choice: &str, options: &[String]) -> Option<String> {
    let choice = choice.trim();
    if choice.is_empty() {
        return None;
    }
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 && n <= options.len() => Some(options[n - 1].clone()),
        _ => Some(choice.to_string()),
    }
}

async fn resources(app: &mut App, filter: ResourceFilter, query: &str, ask_ai: bool) -> Result<()> {
    let mut catalog = ResourceCatalog::with_seed();
    if ask_ai {
        if query.trim().is_empty() {
            bail!("--ask-ai needs a --query to search for");
        }
        let pb = spinner(&format!("Searching for {} resources...", query));
        let added = catalog.ask_ai(&app.service, query).await;
        pb.finish_and_clear();
        println!("Found {} new resources.\n", added);
    }

    let found = catalog.filter(query, filter, app.store.bookmarks());
    if found.is_empty() {
        println!("No resources match.");
        return Ok(());
    }
    for resource in found {
        let saved = if app.store.is_bookmarked(&resource.id) { "*" } else { " " };
        println!("{} [{}] {} - {} ({})", saved, resource.id, resource.title, resource.author, resource.resource_type);
        println!("      {}", resource.description);
        println!("      {}  [{}]", resource.url, resource.tags.join(", "));
    }

    // Generated resources only live for this command, so offer to save them now
    if ask_ai {
        let ids = prompt("\nToggle bookmarks (ids separated by spaces, blank to skip): ")?;
        for id in ids.split_whitespace() {
            match toggle_bookmark(&mut app.store, &catalog, id) {
                Some((title, true)) => println!("Saved '{}'.", title),
                Some((title, false)) => println!("Removed '{}' from saved resources.", title),
                None => eprintln!("No resource with id '{}'", id),
            }
        }
    }
    Ok(())
}

/// Toggle the bookmark on resource `id`. Returns its title and whether it is
/// saved afterwards, or `None` for an unknown id.
fn toggle_bookmark(
    store: &mut ProgressionStore,
    catalog: &ResourceCatalog,
    id: &str,
) -> Option<(String, bool)> {
    let resource = catalog.resolve(id, store.bookmarks())?.clone();
    let saved = store.toggle_bookmark(&resource);
    Some((resource.title, saved))
}

fn bookmark(app: &mut App, id: &str) -> Result<()> {
    let catalog = ResourceCatalog::with_seed();
    let (title, saved) = toggle_bookmark(&mut app.store, &catalog, id)
        .with_context(|| format!("No resource with id '{}'", id))?;

    if saved {
        println!("Saved '{}'.", title);
    } else {
        println!("Removed '{}' from saved resources.", title);
    }
    Ok(())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("  {spinner:.dim} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Create an animated spinner with a fixed message
fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Spinner that follows the lesson loading captions until the ticker stops
fn caption_spinner(captions: Option<watch::Receiver<String>>) -> ProgressBar {
    let Some(mut rx) = captions else {
        return spinner("Loading lesson...");
    };
    let pb = spinner(&rx.borrow().clone());
    let follower = pb.clone();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let caption = rx.borrow().clone();
            follower.set_message(caption);
        }
    });
    pb
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Lines until an empty line or end of input
fn read_block() -> Result<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            break;
        }
        lines.push(line.to_string());
    }
    Ok(lines.join("\n"))
}

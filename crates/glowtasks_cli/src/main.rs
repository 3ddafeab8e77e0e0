//! Interactive GlowTasks shell.
//!
//! # Responsibility
//! - Wire configuration, logging and the core client together.
//! - Forward cooldown ticks to the auth flow while waiting for input.
//! - Render flow and store state as plain text.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glowtasks_core::{
    init_logging, AuthMode, ClientConfig, ClientContext, EntryMode, TaskField, TaskFilter, Task,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about = "Interactive GlowTasks client", long_about = None)]
struct Cli {
    /// Base URL of the task service
    #[arg(long, env = "GLOWTASKS_API_URL")]
    api_url: Option<String>,

    /// Directory for the session database and logs
    #[arg(long, env = "GLOWTASKS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "GLOWTASKS_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(api_url) = self.api_url {
            config.api_base_url = api_url;
        }
        if let Some(data_dir) = self.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        config
    }
}

/// One line typed at the prompt.
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Switch to login|register|forgot
    Mode { mode: String },
    /// Sign in with username or email
    Login { identifier: String, password: String },
    /// Create an account; an OTP is emailed
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Submit the registration OTP
    Verify { otp: String },
    /// Ask for a new OTP once the cooldown is over
    Resend,
    /// Request a password reset OTP
    Forgot { email: String },
    /// Reset the password with the emailed OTP
    Reset { otp: String, new_password: String },
    /// Show auth mode, cooldown and counts
    Status,
    /// List tasks: all|done|todo
    Tasks {
        #[arg(default_value = "all")]
        filter: String,
    },
    /// Add a task: `add <title words> [--desc <words>]`
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long, short, num_args = 1..)]
        desc: Vec<String>,
    },
    /// Flip a task between done and todo
    Toggle { id: String },
    /// Change the title or description of a task
    Edit {
        id: String,
        field: String,
        #[arg(trailing_var_arg = true)]
        value: Vec<String>,
    },
    /// Move a task to the trash
    Rm { id: String },
    /// Move a task to the position of another one (local only)
    Move { dragged: String, target: String },
    /// List trashed tasks
    Trash,
    /// Select or unselect a trashed task
    Select { id: String },
    /// Restore every selected trashed task
    Restore,
    /// Show the profile
    Profile,
    /// Change the username
    Rename { username: String },
    /// Set the profile photo reference, or remove it when omitted
    Photo { image: Option<String> },
    /// Switch between light and dark
    Theme,
    /// Sign out
    Logout,
    /// Leave the shell
    Quit,
}

enum Next {
    Continue,
    Quit,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config();
    init_logging(&config.log_level, &config.log_dir()).context("failed to start logging")?;
    let (client, mut ticks) = ClientContext::connect(&config).context("failed to start client")?;
    log::info!("event=cli_start module=cli status=ok");

    println!("GlowTasks {} at {}", glowtasks_core::core_version(), config.api_base_url);
    if client.auth.is_authenticated() {
        refresh(&client).await;
    }
    print_prompt(&client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                if line.trim().is_empty() {
                    print_prompt(&client);
                    continue;
                }
                match ShellLine::try_parse_from(line.split_whitespace()) {
                    Ok(parsed) => {
                        if let Next::Quit = run(&client, parsed.command).await? {
                            break;
                        }
                    }
                    Err(err) => println!("{err}"),
                }
                print_prompt(&client);
            }
            Some(tick) = ticks.recv() => client.auth.on_tick(tick),
        }
    }

    log::info!("event=cli_exit module=cli status=ok");
    Ok(())
}

async fn run(client: &ClientContext, command: Command) -> Result<Next> {
    match command {
        Command::Mode { mode } => match mode.parse::<EntryMode>() {
            Ok(mode) => {
                if client.auth.switch_mode(mode).is_err() {
                    println!("Log out first");
                }
            }
            Err(err) => println!("{err}"),
        },
        Command::Login {
            identifier,
            password,
        } => {
            let outcome = client.auth.submit_login(&identifier, &password).await;
            after_auth(client, outcome.is_ok()).await;
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let _ = client
                .auth
                .submit_register(&username, &email, &password)
                .await;
            print_flow_messages(client);
        }
        Command::Verify { otp } => {
            let outcome = client.auth.submit_otp(&otp).await;
            after_auth(client, outcome.is_ok()).await;
        }
        Command::Resend => {
            let _ = client.auth.resend_otp().await;
            print_flow_messages(client);
        }
        Command::Forgot { email } => {
            let _ = client.auth.submit_forgot(&email).await;
            print_flow_messages(client);
        }
        Command::Reset { otp, new_password } => {
            let outcome = client.auth.submit_reset(&otp, &new_password).await;
            after_auth(client, outcome.is_ok()).await;
        }
        Command::Status => print_status(client),
        Command::Tasks { filter } => match filter.parse::<TaskFilter>() {
            Ok(filter) => print_tasks(&client.tasks.filtered(filter)),
            Err(err) => println!("{err}"),
        },
        Command::Add { title, desc } => {
            let added = client.tasks.add(&title.join(" "), &desc.join(" ")).await;
            if let Ok(Some(task)) = added {
                println!("added [{}] {}", task.id, task.title);
            }
            print_store_error(client.tasks.last_error());
        }
        Command::Toggle { id } => {
            if let Some(id) = task_id(client, &id) {
                let _ = client.tasks.toggle(&id).await;
                print_store_error(client.tasks.last_error());
            }
        }
        Command::Edit { id, field, value } => {
            let field = match field.parse::<TaskField>() {
                Ok(field) => field,
                Err(err) => {
                    println!("{err}");
                    return Ok(Next::Continue);
                }
            };
            if let Some(id) = task_id(client, &id) {
                let _ = client.tasks.update(&id, field, &value.join(" ")).await;
                print_store_error(client.tasks.last_error());
            }
        }
        Command::Rm { id } => {
            if let Some(id) = task_id(client, &id) {
                let _ = client.tasks.delete(&id).await;
                print_store_error(client.tasks.last_error());
            }
        }
        Command::Move { dragged, target } => {
            if let (Some(dragged), Some(target)) = (task_id(client, &dragged), task_id(client, &target)) {
                client.tasks.reorder(&dragged, &target);
                print_tasks(&client.tasks.tasks());
            }
        }
        Command::Trash => {
            let _ = client.trash.load().await;
            print_store_error(client.trash.last_error());
            print_trash(client);
        }
        Command::Select { id } => match client.trash.find_id(&id) {
            Some(id) => {
                let selected = client.trash.toggle_selection(&id);
                println!("{} {id}", if selected { "selected" } else { "unselected" });
            }
            None => println!("no trashed task `{id}`; run `trash` first"),
        },
        Command::Restore => {
            match client.trash.restore_selected(&client.tasks).await {
                Ok(0) => println!("nothing selected"),
                Ok(count) => println!("restored {count}"),
                Err(_) => {}
            }
            print_store_error(client.trash.last_error());
        }
        Command::Profile => {
            if let Ok(principal) = client.profile.load().await {
                println!("username: {}", principal.username);
                println!("email:    {}", principal.email);
                println!(
                    "photo:    {}",
                    if principal.profile_image.is_some() { "set" } else { "none" }
                );
                if let Some(created_at) = principal.created_at {
                    println!("joined:   {}", created_at.format("%Y-%m-%d"));
                }
            }
            print_store_error(client.profile.last_error());
        }
        Command::Rename { username } => {
            let image = current_photo(client).await;
            if client.profile.update(&username, image).await.is_ok() {
                println!("renamed to {username}");
            }
            print_store_error(client.profile.last_error());
        }
        Command::Photo { image } => {
            let username = client.session.identity().unwrap_or_default();
            let _ = client.profile.update(&username, image).await;
            print_store_error(client.profile.last_error());
        }
        Command::Theme => {
            let theme = client.session.toggle_theme().context("failed to save theme")?;
            println!("theme: {}", theme.as_str());
        }
        Command::Logout => {
            if client.logout().is_err() {
                println!("Not signed in");
            }
        }
        Command::Quit => return Ok(Next::Quit),
    }
    Ok(Next::Continue)
}

async fn after_auth(client: &ClientContext, signed_in: bool) {
    print_flow_messages(client);
    if signed_in {
        refresh(client).await;
    }
}

async fn refresh(client: &ClientContext) {
    if client.tasks.load().await.is_ok() {
        print_tasks(&client.tasks.tasks());
    }
    print_store_error(client.tasks.last_error());
}

/// Keeps the current photo when only the name changes.
async fn current_photo(client: &ClientContext) -> Option<String> {
    match client.profile.profile() {
        Some(principal) => principal.profile_image,
        None => client
            .profile
            .load()
            .await
            .ok()
            .and_then(|principal| principal.profile_image),
    }
}

fn task_id(client: &ClientContext, label: &str) -> Option<glowtasks_core::TaskId> {
    let id = client.tasks.find_id(label);
    if id.is_none() {
        println!("no task `{label}`; run `tasks` to see ids");
    }
    id
}

fn print_prompt(client: &ClientContext) {
    let label = match client.auth.mode() {
        AuthMode::Authenticated => client.session.identity().unwrap_or_default(),
        mode => mode.to_string(),
    };
    let cooldown = client.auth.cooldown_seconds();
    if cooldown > 0 {
        println!("[{label} | resend in {cooldown}s]");
    } else {
        println!("[{label}]");
    }
}

fn print_flow_messages(client: &ClientContext) {
    let messages = client.auth.messages();
    if let Some(info) = messages.info {
        println!("{info}");
    }
    if let Some(error) = messages.error {
        println!("error: {error}");
    }
}

fn print_store_error(error: Option<String>) {
    if let Some(error) = error {
        println!("error: {error}");
    }
}

fn print_status(client: &ClientContext) {
    println!("mode:     {}", client.auth.mode());
    if let Some(email) = client.auth.state().pending_email() {
        println!("email:    {email}");
    }
    println!("cooldown: {}s", client.auth.cooldown_seconds());
    println!("theme:    {}", client.session.theme().as_str());
    if client.auth.is_authenticated() {
        println!(
            "tasks:    {} total, {} done, {} todo",
            client.tasks.len(),
            client.tasks.completed_count(),
            client.tasks.pending_count()
        );
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        println!(
            "[{mark}] {:>4}  {}  ({})",
            task.id.to_string(),
            task.title,
            task.created_at.format("%Y-%m-%d")
        );
        if !task.description.is_empty() {
            println!("           {}", task.description);
        }
    }
}

fn print_trash(client: &ClientContext) {
    let items = client.trash.items();
    if items.is_empty() {
        println!("trash is empty");
        return;
    }
    for item in items {
        let mark = if client.trash.is_selected(item.id()) { "*" } else { " " };
        println!(
            "{mark} {:>4}  {}  (purged after {})",
            item.id().to_string(),
            item.task.title,
            item.expires_at().format("%Y-%m-%d %H:%M")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, ShellLine};
    use clap::Parser;

    fn parse(line: &str) -> Command {
        ShellLine::try_parse_from(line.split_whitespace())
            .unwrap()
            .command
    }

    #[test]
    fn add_takes_an_optional_description() {
        let Command::Add { title, desc } = parse("add buy oat milk --desc two liters") else {
            panic!("expected add");
        };
        assert_eq!(title.join(" "), "buy oat milk");
        assert_eq!(desc.join(" "), "two liters");

        let Command::Add { title, desc } = parse("add call mum") else {
            panic!("expected add");
        };
        assert_eq!(title.join(" "), "call mum");
        assert!(desc.is_empty());
    }

    #[test]
    fn add_without_title_is_rejected() {
        assert!(ShellLine::try_parse_from("add --desc only".split_whitespace()).is_err());
    }
}

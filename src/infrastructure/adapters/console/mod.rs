//! Console adapter - Several simulated users sharing one terminal

use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::{AuthError, CommandError, DeliveryError};
use crate::application::messaging::{Input, InputParser};
use crate::application::services::{ChatService, CommandService, SendTarget};
use crate::domain::entities::{Command, MessageEnvelope};
use crate::domain::traits::SessionEndpoint;

/// Prints envelopes delivered to one user's session
pub struct ConsoleEndpoint {
    owner: String,
}

impl ConsoleEndpoint {
    pub fn new(owner: impl Into<String>) -> Self {
        Self { owner: owner.into() }
    }
}

#[async_trait]
impl SessionEndpoint for ConsoleEndpoint {
    async fn deliver(&self, envelope: &MessageEnvelope) -> Result<(), DeliveryError> {
        println!("[{} {}] {}", self.owner, envelope.timestamp().format("%H:%M:%S"), envelope);
        Ok(())
    }
}

/// What to do after a console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineResult {
    Reply(String),
    Quit,
    Nothing,
}

type ActiveUser = Arc<Mutex<Option<String>>>;

fn active_user(active: &ActiveUser) -> Option<String> {
    active.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn set_active_user(active: &ActiveUser, user: Option<String>) {
    *active.lock().unwrap_or_else(PoisonError::into_inner) = user;
}

/// Console chat surface driving a [`ChatService`]
pub struct ConsoleAdapter {
    service: ChatService,
    commands: CommandService,
    parser: InputParser,
    active: ActiveUser,
}

impl ConsoleAdapter {
    pub fn new(service: ChatService, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let active: ActiveUser = Arc::new(Mutex::new(None));

        let mut commands = CommandService::new(prefix.clone());
        commands.register_defaults();
        register_session_commands(&mut commands, &service, &active);

        Self {
            service,
            commands,
            parser: InputParser::new(prefix),
            active,
        }
    }

    /// Username that plain lines are sent as
    pub fn active_user(&self) -> Option<String> {
        active_user(&self.active)
    }

    pub fn prompt(&self) -> String {
        match self.active_user() {
            Some(user) => format!("{}> ", user),
            None => "> ".to_string(),
        }
    }

    pub fn handle_line(&self, line: &str) -> LineResult {
        match self.parser.parse(line) {
            Input::Empty => LineResult::Nothing,
            Input::Command { name, .. } if name == "quit" || name == "exit" => LineResult::Quit,
            Input::Command { name, args } => match self.commands.handle(&name, &args) {
                Ok(reply) => LineResult::Reply(reply),
                Err(e) => LineResult::Reply(format!("Error: {}", e)),
            },
            Input::Broadcast { body } => self.send(SendTarget::Everyone, &body),
            Input::Private { recipient, body } => self.send(SendTarget::User(recipient), &body),
        }
    }

    fn send(&self, target: SendTarget, body: &str) -> LineResult {
        let Some(sender) = self.active_user() else {
            return LineResult::Reply(format!("Log in first: {}login <user> <password>", self.parser.prefix()));
        };

        match self.service.send(&sender, target, body) {
            Ok(()) => LineResult::Nothing,
            Err(e) => LineResult::Reply(format!("Error: {}", e)),
        }
    }

    /// Read lines from stdin until `/quit` or end of input
    pub async fn run(&self) {
        tracing::info!("Console chat started");
        println!("{}", self.commands.get_help(None));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", self.prompt());
            let _ = std::io::stdout().flush();

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            };

            match self.handle_line(&line) {
                LineResult::Reply(text) => println!("{}", text),
                LineResult::Quit => break,
                LineResult::Nothing => {}
            }
        }

        for user in self.service.online_users() {
            self.service.close_session(&user);
        }
    }
}

fn expect_args<'a>(args: &'a [String], count: usize, usage: &str) -> Result<&'a [String], CommandError> {
    if args.len() < count {
        return Err(CommandError::InvalidArgs(format!("usage: {}", usage)));
    }
    Ok(&args[..count])
}

fn register_session_commands(commands: &mut CommandService, service: &ChatService, active: &ActiveUser) {
    let svc = service.clone();
    commands.register(Command::new("register")
        .with_description("Create an account")
        .with_usage("register <user> <password>")
        .with_handler(move |args| {
            let args = expect_args(args, 2, "register <user> <password>")?;
            svc.register_account(&args[0], &args[1])?;
            Ok("Registration successful".to_string())
        }));

    let svc = service.clone();
    let current = active.clone();
    commands.register(Command::new("login")
        .with_description("Open a chat session and make it active")
        .with_usage("login <user> <password>")
        .with_handler(move |args| {
            let args = expect_args(args, 2, "login <user> <password>")?;
            let user = &args[0];
            let opened = svc.open_session(user, &args[1], Arc::new(ConsoleEndpoint::new(user.clone())))?;
            set_active_user(&current, Some(user.clone()));
            if opened {
                Ok(format!("Welcome {}", user))
            } else {
                Ok(format!("{} already has an open session, switched to it", user))
            }
        }));

    let svc = service.clone();
    let current = active.clone();
    commands.register(Command::new("switch")
        .with_description("Type as another logged-in user")
        .with_usage("switch <user>")
        .with_handler(move |args| {
            let args = expect_args(args, 1, "switch <user>")?;
            let user = &args[0];
            if !svc.has_session(user) {
                return Err(AuthError::NoActiveSession(user.clone()).into());
            }
            set_active_user(&current, Some(user.clone()));
            Ok(format!("Now typing as {}", user))
        }));

    let svc = service.clone();
    let current = active.clone();
    commands.register(Command::new("logout")
        .with_description("Close a chat session")
        .with_usage("logout [user]")
        .with_handler(move |args| {
            let active = active_user(&current);
            let user = args.first().cloned().or_else(|| active.clone())
                .ok_or_else(|| CommandError::InvalidArgs("usage: logout [user]".to_string()))?;

            if !svc.close_session(&user) {
                return Err(AuthError::NoActiveSession(user).into());
            }
            if active.as_deref() == Some(user.as_str()) {
                set_active_user(&current, None);
            }
            Ok(format!("{} logged out", user))
        }));

    let svc = service.clone();
    commands.register(Command::new("who")
        .with_description("List users with an open session")
        .with_aliases(vec!["online".to_string()])
        .with_handler(move |_| {
            let online = svc.online_users();
            if online.is_empty() {
                return Ok("Nobody is online".to_string());
            }
            Ok(format!("Online: {}", online.join(", ")))
        }));

    let svc = service.clone();
    let current = active.clone();
    commands.register(Command::new("users")
        .with_description("List who the active user can message")
        .with_handler(move |_| {
            let user = active_user(&current)
                .ok_or_else(|| CommandError::ExecutionFailed("no active user".to_string()))?;
            let contacts = svc.contacts(&user);
            Ok(format!("Send to: Everyone{}", contacts.iter().map(|c| format!(", {}", c)).collect::<String>()))
        }));
}

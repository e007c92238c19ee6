use labadain_client::commands::login::{Credentials, ProfileUpdate};
use labadain_client::entities::chat::ChatId;
use labadain_client::entities::message::{Message, Role};
use labadain_client::entities::user::User;
use labadain_client::suggestions::{suggestions, SUGGESTIONS};
use labadain_client::{logging, Attachment, Client, Config, Conversation, Error, Outcome, StopHandle};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

const CLI_REVEAL_MS: u64 = 15;

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Send(&'a str),
    New,
    Chats,
    Open(usize),
    Delete(usize),
    Attach(&'a str),
    Suggest(Option<usize>),
    Rename(&'a str),
    DeleteAccount,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line);
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg.parse::<usize>()) {
            ("new", _) => Command::New,
            ("chats", _) => Command::Chats,
            ("open", Ok(n)) if n > 0 => Command::Open(n),
            ("delete", Ok(n)) if n > 0 => Command::Delete(n),
            ("attach", _) if !arg.is_empty() => Command::Attach(arg),
            ("suggest", Ok(n)) if n > 0 => Command::Suggest(Some(n)),
            ("suggest", _) if arg.is_empty() => Command::Suggest(None),
            ("rename", _) if !arg.is_empty() => Command::Rename(arg),
            ("delete-account", _) => Command::DeleteAccount,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Unknown(line),
        }
    }
}

/// Prints the growing assistant reply without repeating what is already on screen.
#[derive(Default)]
struct Printer {
    printed: usize,
}

impl Printer {
    fn update(&mut self, messages: &[Message]) {
        let Some(reply) = messages.last().filter(|m| m.role == Role::Assistant) else {
            return;
        };
        if let Some(rest) = reply.content.get(self.printed..) {
            if !rest.is_empty() {
                print!("{rest}");
                let _ = std::io::stdout().flush();
                self.printed = reply.content.len();
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init("labadain_client=info");
    if let Err(err) = run().await {
        eprintln!("{}", err.user_message());
        std::process::exit(1);
    }
}

fn config_path() -> PathBuf {
    std::env::var_os("LABADAIN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("labadain.toml"))
}

fn load_config(path: &Path) -> Result<Config, Error> {
    let mut config = Config::load(path)?;
    if !path.exists() {
        config.reveal_delay_ms = CLI_REVEAL_MS;
    }
    Ok(config.with_env())
}

async fn run() -> Result<(), Error> {
    let config = load_config(&config_path())?;
    info!("Using backend {}", config.api_base);
    let client = Client::new(config.clone());
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mut user = login(&client, &mut input).await?;
    println!("Bem-vindu, {}!", user.name);
    print_suggestions();
    let chats = match client.list_chats(user.id).await {
        Ok(chats) => chats,
        Err(err) => {
            warn!("Could not load chat history: {err}");
            Vec::new()
        }
    };
    let mut conversation = Conversation::new(user.id, &config).with_history(chats);
    let mut attachment: Option<Attachment> = None;

    while let Some(line) = prompt(&mut input, "> ").await? {
        match Command::parse(&line) {
            Command::Send("") => {}
            Command::Send(text) => {
                let file = attachment.take();
                if let Err(err) = ask(&client, &mut conversation, text, file).await {
                    eprintln!("{}", err.user_message());
                }
            }
            Command::New => {
                conversation.start_new_chat();
                println!("Chat foun.");
            }
            Command::Chats => print_chats(&conversation),
            Command::Open(n) => match chat_at(&conversation, n) {
                Some(id) => {
                    conversation.load_chat(&id);
                    for message in conversation.messages() {
                        println!("[{:?}] {}", message.role, message.content);
                    }
                }
                None => eprintln!("No chat {n}"),
            },
            Command::Delete(n) => match chat_at(&conversation, n) {
                Some(id) => match client.delete_chat(user.id, &id).await {
                    Ok(()) => conversation.forget_chat(&id),
                    Err(err) => eprintln!("{}", err.user_message()),
                },
                None => eprintln!("No chat {n}"),
            },
            Command::Attach(path) => {
                match Attachment::read(Path::new(path))
                    .and_then(|file| file.check(config.max_upload_bytes).map(|_| file))
                {
                    Ok(file) => {
                        println!("Attached {} ({} bytes)", file.file_name, file.size());
                        attachment = Some(file);
                    }
                    Err(err) => eprintln!("{}", err.user_message()),
                }
            }
            Command::Suggest(None) => print_suggestions(),
            Command::Suggest(Some(n)) => match SUGGESTIONS.get(n - 1) {
                Some(text) if conversation.messages().is_empty() => {
                    println!("> {text}");
                    let file = attachment.take();
                    if let Err(err) = ask(&client, &mut conversation, text, file).await {
                        eprintln!("{}", err.user_message());
                    }
                }
                Some(_) => eprintln!("Suggestions are for a new chat. Try /new first."),
                None => eprintln!("No suggestion {n}"),
            },
            Command::Rename(name) => {
                let update = ProfileUpdate {
                    name: Some(name.to_string()),
                    avatar_url: None,
                };
                match client.update_profile(&user, &update).await {
                    Ok(updated) => {
                        println!("Naran foun: {}", updated.name);
                        user = updated;
                    }
                    Err(err) => eprintln!("{}", err.user_message()),
                }
            }
            Command::DeleteAccount => {
                let answer = prompt(&mut input, "Hamoos ita-nia konta? (sin/lae) ").await?;
                if !confirmed(answer.as_deref()) {
                    continue;
                }
                match client.delete_account(&user).await {
                    Ok(()) => {
                        println!("Konta hamoos tiha ona.");
                        break;
                    }
                    Err(err) => eprintln!("{}", err.user_message()),
                }
            }
            Command::Quit => break,
            Command::Unknown(line) => eprintln!(
                "Unknown command {line}. Try /new /chats /open N /delete N /attach PATH \
                 /suggest [N] /rename NAME /delete-account /quit"
            ),
        }
    }
    Ok(())
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>, Error> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

async fn login(client: &Client, input: &mut Input) -> Result<User, Error> {
    let email = match std::env::var("LABADAIN_EMAIL") {
        Ok(email) => email,
        Err(_) => prompt(input, "Email: ").await?.unwrap_or_default(),
    };
    let password = match std::env::var("LABADAIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => prompt(input, "Password: ").await?.unwrap_or_default(),
    };
    client.login(&Credentials::new(&email, &password, None)).await
}

fn print_chats(conversation: &Conversation) {
    let chats = conversation.history().chats();
    if chats.is_empty() {
        println!("La iha chat.");
    }
    for (i, chat) in chats.iter().enumerate() {
        let marker = if conversation.chat_id() == Some(&chat.id) { "*" } else { " " };
        println!(
            "{marker}{:>3}. {} ({})",
            i + 1,
            chat.title,
            chat.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_suggestions() {
    for (i, text) in suggestions("").iter().enumerate() {
        println!("{:>3}. {text}", i + 1);
    }
}

fn confirmed(answer: Option<&str>) -> bool {
    matches!(
        answer.map(|a| a.trim().to_lowercase()).as_deref(),
        Some("sin" | "yes" | "y")
    )
}

fn chat_at(conversation: &Conversation, n: usize) -> Option<ChatId> {
    let chats = conversation.history().chats();
    chats.get(n.checked_sub(1)?).map(|chat| chat.id.clone())
}

/// Sends one message, printing the reply as it arrives. Ctrl-C stops the reply.
async fn ask(
    client: &Client,
    conversation: &mut Conversation,
    text: &str,
    attachment: Option<Attachment>,
) -> Result<(), Error> {
    let stop = StopHandle::new();
    let watcher = stop.clone();
    let mut rx = conversation.subscribe();
    rx.borrow_and_update();
    let mut printer = Printer::default();

    let turn = {
        let send = conversation.send(client, text, attachment, stop);
        tokio::pin!(send);
        loop {
            tokio::select! {
                turn = &mut send => break turn?,
                changed = rx.changed() => {
                    if changed.is_ok() {
                        printer.update(&rx.borrow_and_update());
                    }
                }
                _ = tokio::signal::ctrl_c(), if !watcher.is_stopped() => watcher.stop(),
            }
        }
    };

    printer.update(&conversation.messages());
    match &turn.outcome {
        Outcome::Completed(_) => println!(),
        Outcome::Cancelled(_) => println!(" [stopped]"),
        Outcome::Failed(err) => eprintln!("{}", err.user_message()),
    }
    if turn.outcome.keeps_reply() && turn.saved.is_none() {
        eprintln!("(chat not saved)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("  Ola! "), Command::Send("Ola!"));
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("/open 2"), Command::Open(2));
        assert_eq!(Command::parse("/open 0"), Command::Unknown("/open 0"));
        assert_eq!(Command::parse("/delete x"), Command::Unknown("/delete x"));
        assert_eq!(
            Command::parse("/attach ~/relatoriu final.pdf"),
            Command::Attach("~/relatoriu final.pdf")
        );
        assert_eq!(Command::parse("/attach"), Command::Unknown("/attach"));
        assert_eq!(Command::parse("/exit"), Command::Quit);
    }

    #[test]
    fn parse_account_and_suggestion_commands() {
        assert_eq!(Command::parse("/suggest"), Command::Suggest(None));
        assert_eq!(Command::parse("/suggest 3"), Command::Suggest(Some(3)));
        assert_eq!(Command::parse("/suggest x"), Command::Unknown("/suggest x"));
        assert_eq!(Command::parse("/rename  Maria Soares "), Command::Rename("Maria Soares"));
        assert_eq!(Command::parse("/rename"), Command::Unknown("/rename"));
        assert_eq!(Command::parse("/delete-account"), Command::DeleteAccount);
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(confirmed(Some(" Sin\n")));
        assert!(confirmed(Some("yes")));
        assert!(!confirmed(Some("")));
        assert!(!confirmed(Some("lae")));
        assert!(!confirmed(None));
    }

    #[test]
    fn printer_prints_only_new_text() {
        let mut printer = Printer::default();
        printer.update(&[Message::user("hi"), Message::assistant("He", true)]);
        assert_eq!(printer.printed, 2);
        printer.update(&[Message::user("hi"), Message::assistant("Hello", true)]);
        assert_eq!(printer.printed, 5);
        printer.update(&[Message::user("hi")]);
        assert_eq!(printer.printed, 5);
    }
}

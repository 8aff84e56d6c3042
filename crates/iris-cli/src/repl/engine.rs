use anyhow::Result;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::io::Write;
use std::path::Path;

use crate::session::{Session, TurnResult};

#[derive(Debug, PartialEq, Eq)]
enum ImageCommand<'a> {
    List,
    Clear,
    /// 1-based position as shown by the list
    Remove(usize),
    Attach(&'a str),
    Invalid,
}

impl<'a> ImageCommand<'a> {
    fn parse(arg: &'a str) -> Self {
        match arg.split_once(char::is_whitespace).unwrap_or((arg, "")) {
            ("", _) | ("list", "") => ImageCommand::List,
            ("clear", "") => ImageCommand::Clear,
            ("rm", index) => match index.trim().parse::<usize>() {
                Ok(n) if n > 0 => ImageCommand::Remove(n),
                _ => ImageCommand::Invalid,
            },
            _ => ImageCommand::Attach(arg),
        }
    }
}

pub struct Repl {
    editor: DefaultEditor,
    session: Session,
}

impl Repl {
    pub fn new(session: Session) -> Result<Self> {
        let config = Config::builder().history_ignore_space(true).build();
        let editor = DefaultEditor::with_config(config)?;
        Ok(Self { editor, session })
    }

    pub async fn run(&mut self) -> Result<()> {
        println!(
            "{}",
            style(format!("\nIris ({})", self.session.kind().name()))
                .bold()
                .cyan()
        );
        println!(
            "Type {} to exit, {} for help\n",
            style("/exit").dim(),
            style("/help").dim()
        );

        loop {
            let prompt = match self.session.pending_images().len() {
                0 => "you> ".to_string(),
                n => format!("you [{} image(s)]> ", n),
            };
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    self.editor.add_history_entry(line.as_str())?;

                    if let Some(command) = line.trim().strip_prefix('/') {
                        if !self.handle_command(command)? {
                            break;
                        }
                    } else {
                        self.handle_message(&line).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Use /exit to quit");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_message(&mut self, input: &str) {
        let result = self
            .session
            .run_turn(input, |piece| {
                print!("{}", piece);
                let _ = std::io::stdout().flush();
            })
            .await;

        match result {
            Ok(TurnResult::Skipped) => {}
            Ok(TurnResult::Completed(_)) => println!("\n"),
            Ok(TurnResult::Failed(message)) => {
                println!();
                eprintln!("{} {}\n", style("Error:").red().bold(), message);
            }
            Ok(TurnResult::Interrupted) => {
                println!();
                eprintln!("{}\n", style("Interrupted; the turn was discarded").yellow());
            }
            Err(e) => eprintln!("{} {:#}\n", style("Error:").red().bold(), e),
        }
    }

    /// Returns false when the loop should stop
    fn handle_command(&mut self, command: &str) -> Result<bool> {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "exit" | "quit" => return Ok(false),
            "help" => self.show_help(),
            "clear" => {
                self.session.clear()?;
                self.editor.clear_screen()?;
            }
            "image" => self.handle_image(arg),
            _ => println!("Unknown command: /{}", name),
        }
        Ok(true)
    }

    fn handle_image(&mut self, arg: &str) {
        match ImageCommand::parse(arg) {
            ImageCommand::List => self.list_images(),
            ImageCommand::Clear => {
                self.session.clear_images();
                println!("{}", style("Removed all pending images").green());
            }
            ImageCommand::Remove(n) => match self.session.remove_image(n - 1) {
                Some(image) => println!("{} {}", style("Removed").green(), image.path.display()),
                None => println!("No pending image #{}", n),
            },
            ImageCommand::Attach(path) => match self.session.attach_image(Path::new(path)) {
                Ok(()) => println!("{} {}", style("Attached").green(), path),
                Err(e) => eprintln!("{} {:#}", style("Error:").red().bold(), e),
            },
            ImageCommand::Invalid => println!("Usage: /image rm <number>"),
        }
    }

    fn list_images(&self) {
        let images = self.session.pending_images();
        if images.is_empty() {
            println!("No pending images");
            return;
        }
        for (i, image) in images.iter().enumerate() {
            println!("  {}. {}", i + 1, image.path.display());
        }
    }

    fn show_help(&self) {
        println!("\n{}", style("Available Commands:").bold());
        println!("  /image <path> - Attach an image to the next message");
        println!("  /image        - List pending images");
        println!("  /image rm <n> - Remove pending image number n");
        println!("  /image clear  - Remove all pending images");
        println!("  /clear        - Start a new conversation");
        println!("  /help         - Show this help message");
        println!("  /exit         - Exit the REPL\n");
    }
}

use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use revsh::logging;
use revsh::{Backend, ErrorKind, Outcome, Shell, ShellConfig, ShellError};

#[derive(Parser)]
#[command(name = "revsh")]
#[command(about = "A file shell where mv, cp, rm and mkdir can be undone")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Filesystem to operate on
    #[arg(long = "backend", value_enum)]
    backend: Option<Backend>,

    /// Starting directory
    #[arg(long = "cwd")]
    cwd: Option<String>,

    /// Home directory used for `~` and bare `cd`
    #[arg(long = "home")]
    home: Option<String>,

    /// User name shown by `whoami` and the prompt
    #[arg(long = "user")]
    user: Option<String>,

    /// Where removed and overwritten objects are kept
    #[arg(long = "trash-dir")]
    trash_dir: Option<String>,

    /// Keep the undo ledger in this JSON file
    #[arg(long = "ledger")]
    ledger: Option<PathBuf>,

    /// Keep the command history in this file
    #[arg(long = "history")]
    history: Option<PathBuf>,

    /// Run one command line and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Emit logs as JSON
    #[arg(long = "json-logs")]
    json_logs: bool,

    /// Never ask for confirmation
    #[arg(short = 'y', long = "yes")]
    yes: bool,
}

impl Cli {
    fn overrides(&self) -> ShellConfig {
        ShellConfig {
            backend: self.backend,
            cwd: self.cwd.clone(),
            home: self.home.clone(),
            user: self.user.clone(),
            trash_dir: self.trash_dir.clone(),
            ledger: self.ledger.clone(),
            history: self.history.clone(),
            assume_yes: self.yes.then_some(true),
            log_level: None,
            json_logs: self.json_logs.then_some(true),
        }
    }
}

fn exit_code(err: &ShellError) -> i32 {
    match err.kind() {
        ErrorKind::Domain => 1,
        ErrorKind::Validation => 2,
        ErrorKind::Fatal => 3,
    }
}

fn print_output(text: &str) {
    if text.is_empty() {
        return;
    }
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => match ShellConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("revsh: {}", e);
                std::process::exit(2);
            }
        },
        None => ShellConfig::default(),
    };
    let config = file_config.merge(cli.overrides());

    match config.logging() {
        Ok(logging_config) => logging::init(logging_config),
        Err(e) => {
            eprintln!("revsh: {}", e);
            std::process::exit(2);
        }
    }

    // A scripted (non-tty) stdin cannot answer prompts.
    let interactive = io::stdin().is_terminal();
    let config = if cli.command.is_none() && !interactive {
        ShellConfig {
            assume_yes: Some(true),
            ..Default::default()
        }
        .merge(config)
    } else {
        config
    };

    let options = match config.into_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("revsh: {}", e);
            std::process::exit(2);
        }
    };
    let mut shell = Shell::new(options).await;

    if let Some(line) = cli.command {
        match shell.run_line(&line).await {
            Ok(Outcome::Output(out)) => print_output(&out),
            Ok(Outcome::Exit) => {}
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(exit_code(&e));
            }
        }
        return;
    }

    let mut last_status = 0;
    loop {
        if interactive {
            print!("{}", shell.prompt_string());
            if io::stdout().flush().is_err() {
                break;
            }
        }
        let mut line = String::new();
        let read = io::stdin().read_line(&mut line);
        match read {
            Ok(0) => {
                if interactive {
                    println!();
                }
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("revsh: {}", e);
                last_status = 3;
                break;
            }
        }
        match shell.run_line(&line).await {
            Ok(Outcome::Output(out)) => {
                print_output(&out);
                last_status = 0;
            }
            Ok(Outcome::Exit) => break,
            Err(e) => {
                eprintln!("{}", e);
                last_status = exit_code(&e);
            }
        }
    }
    std::process::exit(last_status);
}

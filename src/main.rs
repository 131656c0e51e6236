use argh::FromArgs;
use crabsh::Interpreter;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(FromArgs)]
/// A small interactive UNIX shell.
struct ShellArgs {
    /// print the version and exit
    #[argh(switch)]
    version: bool,

    /// do not load or save command history
    #[argh(switch)]
    no_history: bool,
}

fn main() {
    let args: ShellArgs = argh::from_env();
    if args.version {
        println!("crabsh {VERSION}");
        return;
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| "/".to_string());
    let _ = std::env::set_current_dir(&home);

    let history = if args.no_history {
        None
    } else if home == "/" {
        eprintln!("warning: could not fetch home directory, disabling history.");
        None
    } else {
        Some(PathBuf::from(&home).join(".crabsh_history"))
    };

    let mut shell = Interpreter::new();
    match shell.repl(history.as_deref()) {
        Ok(code) => {
            println!("bye!");
            process::exit(code);
        }
        Err(e) => {
            eprintln!("crabsh: {e}");
            process::exit(1);
        }
    }
}

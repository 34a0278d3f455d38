use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use shenzhen_solver::{
    action::format_actions,
    board::Board,
    solver::{MAX_ITERATIONS, Solution, SolveResult, Solver},
};
use std::io::{IsTerminal, Read, Write, stderr, stdin};
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more (-v for info, -vv for debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the game
    Solve {
        /// Max search iterations before giving up
        #[arg(long, default_value_t = MAX_ITERATIONS, value_name = "NUM")]
        max_iterations: usize,
        /// Deal a pseudo-random board instead of loading one
        #[arg(long, value_name = "SEED", conflicts_with = "file")]
        seed: Option<u32>,
        /// Preview the board without solving
        #[arg(short, long)]
        preview: bool,
        /// Path to a board file; read from stdin when omitted
        file: Option<PathBuf>,
    },
    /// Solve the game and play it on screen
    #[cfg(feature = "autoplay")]
    Play {
        /// Max search iterations before giving up
        #[arg(long, default_value_t = MAX_ITERATIONS, value_name = "NUM")]
        max_iterations: usize,
        /// Game window as LEFT,TOP,WIDTH,HEIGHT
        #[arg(short, long, default_value = "0,0,1920,1080", value_name = "RECT")]
        window: String,
        /// Extra delay between moves in milliseconds
        #[arg(short, long, default_value_t = 100, value_name = "MS")]
        interval: u64,
        /// Path to a board file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            max_iterations,
            seed,
            preview,
            file,
        } => {
            let board = load_board(file, seed)?;
            if preview {
                println!("{}", board.pretty_print());
                return Ok(());
            }
            if let Some(solution) = do_solve(board, max_iterations, cli.verbose == 0)? {
                println!("{}", format_actions(&solution.actions()));
            }
        }
        #[cfg(feature = "autoplay")]
        Commands::Play {
            max_iterations,
            window,
            interval,
            file,
        } => {
            use shenzhen_solver::autoplay::{Rect, Window, autoplay};

            let window = Window::new(Rect::parse(&window)?);
            let board = load_board(Some(file), None)?;
            if let Some(solution) = do_solve(board, max_iterations, cli.verbose == 0)? {
                autoplay(&solution, &window, interval)?;
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_target(false)
        .init();
}

fn load_board(file: Option<PathBuf>, seed: Option<u32>) -> Result<Board> {
    let board = if let Some(file) = file {
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read '{}'", file.display()))?;
        Board::parse(&content).context("Failed to parse board")?
    } else if let Some(seed) = seed {
        Board::new_from_seed(seed)
    } else if !stdin().is_terminal() {
        let mut content = String::new();
        stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        Board::parse(&content).context("Failed to parse board")?
    } else {
        bail!("No board `file` or `--seed` provided.");
    };
    Ok(board)
}

fn do_solve(board: Board, max_iterations: usize, spinner: bool) -> Result<Option<Solution>> {
    let state = board.pretty_print();
    let solver = Solver::new().max_iterations(max_iterations);
    let SolveResult {
        solution,
        iterations,
        states,
        elapsed,
    } = if spinner {
        with_spinner("Solving the game...", move || solver.solve(board))?
    } else {
        solver.solve(board)?
    };
    let elapsed = format_elapsed(elapsed);

    let Some(solution) = solution else {
        println!(
            "✗ No solution found. Iterations: {iterations}, Elapsed: {elapsed}, States: {states}"
        );
        return Ok(None);
    };
    let steps = solution.steps.len();
    println!(
        r#"✓ Solved the game. Steps: {steps}, Elapsed: {elapsed}, Iterations: {iterations}, States: {states}

===== STATE =====
{state}

===== STEPS ====="#
    );
    Ok(Some(solution))
}

fn with_spinner<T, F: FnOnce() -> T>(message: &str, f: F) -> T {
    if stderr().is_terminal() {
        let spinning = Arc::new(AtomicBool::new(true));
        let spinning_clone = Arc::clone(&spinning);
        let message = message.to_string();

        let handle = std::thread::spawn(move || {
            let spinner_chars = ['|', '/', '-', '\\'];
            let mut i = 0;
            // Solver logs share stderr, so the lock is held per frame only.
            let print = |text: &str| {
                let mut handle = stderr().lock();
                let _ = write!(handle, "{text}");
                let _ = handle.flush();
            };

            print("\x1b[?25l"); // hide cursor

            while spinning_clone.load(Ordering::Relaxed) {
                let spinner_char = spinner_chars[i % spinner_chars.len()];
                print(&format!("\r{spinner_char} {message}"));
                std::thread::sleep(Duration::from_millis(100));
                i += 1;
            }

            print("\r\x1b[2K\r\x1b[?25h"); // clear line and show cursor
        });

        let result = f();
        spinning.store(false, Ordering::Relaxed);
        let _ = handle.join();
        result
    } else {
        f()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 90 {
        let ms = elapsed.subsec_millis();
        format!("{secs}.{ms:03}s")
    } else {
        let minutes = secs / 60;
        let secs = secs % 60;
        format!("{minutes}m {secs}s")
    }
}

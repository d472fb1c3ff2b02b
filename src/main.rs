use std::fs;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sigil::compiler::{sanitize_name, Compiler};
use sigil::error::CompilerError;
use sigil::printer::print_program;

/// sigil compiles programs written in a small sigil-typed BASIC dialect to
/// CIL assembly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file to compile.
    file: PathBuf,

    /// Where to write the IL text. Defaults to `<name>.il`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Assembly name. Defaults to the source file name without extension.
    #[arg(long)]
    name: Option<String>,

    /// Print the token stream before compiling.
    #[arg(long)]
    tokens: bool,

    /// Print the parsed program before compiling.
    #[arg(long)]
    ast: bool,

    /// Run ilasm on the output and remove the IL file if it succeeds.
    #[arg(long)]
    assemble: bool,

    /// The ilasm executable to run.
    #[arg(long, default_value = "ilasm")]
    ilasm: PathBuf,
}

fn program_name(args: &Args) -> String {
    let name = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string())
    });
    sanitize_name(&name)
}

fn compile(args: &Args, source: &str, name: &str) -> Result<String, CompilerError> {
    let tokens = sigil::tokenize(source)?;
    if args.tokens {
        for token in &tokens {
            println!("{}", token);
        }
    }

    let mut compiler = Compiler::new(name)?;
    let program = compiler.parse(&tokens)?;
    if args.ast {
        print!("{}", print_program(&program));
    }
    compiler.compile(&program)?;
    compiler.code()
}

fn assemble(ilasm: &Path, il_path: &Path) -> Result<(), String> {
    info!(ilasm = %ilasm.display(), file = %il_path.display(), "assembling");
    let status = Command::new(ilasm)
        .arg(il_path)
        .status()
        .map_err(|e| format!("Failed to run '{}': {}", ilasm.display(), e))?;
    if !status.success() {
        return Err(format!("'{}' failed with {}", ilasm.display(), status));
    }
    fs::remove_file(il_path)
        .map_err(|e| format!("Failed to remove '{}': {}", il_path.display(), e))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = fs::read_to_string(&args.file).unwrap_or_else(|e| {
        eprintln!("Cannot open file '{}': {}", args.file.display(), e);
        exit(1);
    });

    let name = program_name(&args);
    let code = compile(&args, &source, &name).unwrap_or_else(|e| {
        eprintln!("{e}");
        exit(if e.is_internal() { 2 } else { 1 });
    });

    let il_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.il", name)));
    if let Err(e) = fs::write(&il_path, code) {
        eprintln!("Cannot write '{}': {}", il_path.display(), e);
        exit(1);
    }
    debug!(file = %il_path.display(), "wrote IL");

    if args.assemble {
        if let Err(message) = assemble(&args.ilasm, &il_path) {
            eprintln!("{message}");
            exit(1);
        }
    }
}

use std::io::{self, Write};
use std::path::PathBuf;
use std::{env, fs};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use gitrs::object::{Blob, GitrsObject, Object, ObjectType};
use gitrs::{Repository, Sha, hash, tree_builder, tree_walk};

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a gitrs repository
    ///
    /// The path defaults to the directory the gitrs init command is invoked in
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Computes the object name of a file as a blob, optionally storing it
    HashObject {
        /// Store the blob in the object database
        #[arg(short, long)]
        write: bool,
        file: PathBuf,
    },
    /// Prints the raw contents of an object (uncompressed and without the gitrs header) to the
    /// stdout
    CatFile {
        #[arg(value_parser)]
        object_type: ObjectType,
        hash: String,
    },
    /// Stores a directory as a tree and prints its object name
    ///
    /// The path defaults to the root of the repository's worktree
    WriteTree { path: Option<PathBuf> },
    /// Lists the contents of a tree object
    LsTree {
        /// Recurse into subtrees
        #[arg(short, long)]
        recursive: bool,
        hash: String,
    },
}

/// A light-weight git clone written in Rust
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Gitrs {
    /// Run as if gitrs was started in <path>
    #[arg(short = 'C', global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let gitrs = Gitrs::parse();
    let base = match gitrs.dir {
        Some(dir) => dir,
        None => env::current_dir().context("Could not determine the current directory")?,
    };

    let mut stdout = io::stdout().lock();
    match gitrs.cmd {
        Command::Init { path } => {
            let repository = Repository::init(&base.join(path))
                .context("An error occurred initializing gitrs repository")?;
            writeln!(
                stdout,
                "Initialized empty gitrs repository in {}",
                repository.gitdir.display()
            )?;
        }
        Command::HashObject { write, file } => {
            let file = base.join(file);
            let blob = Blob::new(
                fs::read(&file).with_context(|| format!("Could not read {}", file.display()))?,
            );
            let sha = if write {
                let repository =
                    Repository::find(&base).context("Not inside a gitrs repository")?;
                repository.store().write(&blob)?
            } else {
                hash::digest(&blob.serialize())
            };
            writeln!(stdout, "{}", sha)?;
        }
        Command::CatFile { object_type, hash } => {
            let repository = Repository::find(&base).context("Not inside a gitrs repository")?;
            let sha = parse_sha(&hash)?;
            let obj = repository.store().read(&sha)?;
            if obj.get_type() != object_type {
                bail!(
                    "Object {} is a {}, not a {}",
                    sha,
                    obj.get_type(),
                    object_type
                );
            }

            match obj {
                GitrsObject::BlobObject(blob) => stdout.write_all(blob.content())?,
                GitrsObject::TreeObject(tree) => write!(stdout, "{}", tree)?,
            }
        }
        Command::WriteTree { path } => {
            let repository = Repository::find(&base).context("Not inside a gitrs repository")?;
            let root = match path {
                Some(path) => base.join(path),
                None => repository.worktree.clone(),
            };
            let root = fs::canonicalize(&root)
                .with_context(|| format!("Could not resolve {}", root.display()))?;

            let sha = tree_builder::build(repository.store(), &root, &repository.default_ignores())
                .with_context(|| format!("Could not write tree for {}", root.display()))?;
            writeln!(stdout, "{}", sha)?;
        }
        Command::LsTree { recursive, hash } => {
            let repository = Repository::find(&base).context("Not inside a gitrs repository")?;
            let sha = parse_sha(&hash)?;
            for record in tree_walk::list(repository.store(), &sha, "", recursive) {
                writeln!(stdout, "{}", record?)?;
            }
        }
    };

    Ok(())
}

fn parse_sha(raw: &str) -> anyhow::Result<Sha> {
    raw.parse()
        .with_context(|| format!("Not a valid object name: {}", raw))
}

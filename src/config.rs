//! Command-line and environment configuration for the `lisperer` binary.

use std::path::{Path, PathBuf};

use crate::error::{LangError, LangResult};

/// Environment variable naming the prelude loaded before anything else.
pub const PRELUDE_ENV: &str = "LISPERER_PRELUDE";
pub const DEFAULT_PRELUDE: &str = "stlib.lspy";
pub const SOURCE_EXTENSION: &str = "lspy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prelude {
    /// The fallback library in the working directory. Skipped when absent.
    Default(PathBuf),
    /// Named on the command line or in the environment. Failures are reported.
    Explicit(PathBuf),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Run(Config),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prelude: Prelude,
    pub paths: Vec<PathBuf>,
    pub interactive: bool,
}

impl Config {
    /// Reads the process arguments and `LISPERER_PRELUDE`.
    pub fn from_env() -> LangResult<Command> {
        Self::parse(
            std::env::args().skip(1),
            std::env::var(PRELUDE_ENV).ok().filter(|p| !p.is_empty()),
        )
    }

    pub fn parse<I, S>(args: I, prelude_env: Option<String>) -> LangResult<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into).peekable();

        match args.peek().map(String::as_str) {
            Some("help" | "--help" | "-h") => return Ok(Command::Help),
            Some("version" | "--version" | "-v") => return Ok(Command::Version),
            _ => {}
        }

        let mut prelude = None;
        let mut no_prelude = false;
        let mut interactive = false;
        let mut paths = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--prelude" => match args.next() {
                    Some(path) => prelude = Some(PathBuf::from(path)),
                    None => {
                        return Err(LangError::Config(
                            "'--prelude' requires a file argument".to_string(),
                        ))
                    }
                },
                "--no-prelude" => no_prelude = true,
                "--interactive" | "-i" => interactive = true,
                flag if flag.starts_with("--") => {
                    return Err(LangError::Config(format!("Unknown option '{}'", flag)))
                }
                _ => paths.push(PathBuf::from(arg)),
            }
        }

        let prelude = match (prelude, no_prelude) {
            (Some(_), true) => {
                return Err(LangError::Config(
                    "'--prelude' and '--no-prelude' cannot be combined".to_string(),
                ))
            }
            (Some(path), false) => Prelude::Explicit(path),
            (None, true) => Prelude::Disabled,
            (None, false) => match prelude_env {
                Some(path) => Prelude::Explicit(PathBuf::from(path)),
                None => Prelude::Default(PathBuf::from(DEFAULT_PRELUDE)),
            },
        };

        Ok(Command::Run(Config {
            prelude,
            paths,
            interactive,
        }))
    }

    /// The interactive loop runs when asked for or when there is nothing to load.
    pub fn runs_interactive(&self) -> bool {
        self.interactive || self.paths.is_empty()
    }

    /// Every file to load, in order. Directories contribute their source
    /// files sorted by path.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .flat_map(|path| {
                if path.is_dir() {
                    sources_in(path)
                } else {
                    vec![path.clone()]
                }
            })
            .collect()
    }
}

fn sources_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some(SOURCE_EXTENSION))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn run_config(args: &[&str], prelude_env: Option<&str>) -> LangResult<Config> {
        match Config::parse(args.iter().copied(), prelude_env.map(String::from))? {
            Command::Run(config) => Ok(config),
            other => panic!("expected run command, got {:?}", other),
        }
    }

    #[test]
    fn no_arguments_means_default_prelude_and_repl() -> LangResult<()> {
        let config = run_config(&[], None)?;
        assert_eq!(config.prelude, Prelude::Default(PathBuf::from("stlib.lspy")));
        assert!(config.paths.is_empty());
        assert!(config.runs_interactive());
        Ok(())
    }

    #[test]
    fn help_and_version() -> LangResult<()> {
        assert_eq!(Config::parse(["--help"], None)?, Command::Help);
        assert_eq!(Config::parse(["help"], None)?, Command::Help);
        assert_eq!(Config::parse(["-v"], None)?, Command::Version);
        Ok(())
    }

    #[test]
    fn paths_disable_the_repl_unless_asked() -> LangResult<()> {
        let config = run_config(&["a.lspy", "b.lspy"], None)?;
        assert_eq!(
            config.paths,
            vec![PathBuf::from("a.lspy"), PathBuf::from("b.lspy")]
        );
        assert!(!config.runs_interactive());

        let config = run_config(&["a.lspy", "--interactive"], None)?;
        assert!(config.runs_interactive());
        Ok(())
    }

    #[test]
    fn prelude_selection() -> LangResult<()> {
        assert_eq!(
            run_config(&["--prelude", "lib.lspy"], Some("env.lspy"))?.prelude,
            Prelude::Explicit(PathBuf::from("lib.lspy"))
        );
        assert_eq!(
            run_config(&[], Some("env.lspy"))?.prelude,
            Prelude::Explicit(PathBuf::from("env.lspy"))
        );
        assert_eq!(
            run_config(&["--no-prelude"], Some("env.lspy"))?.prelude,
            Prelude::Disabled
        );
        Ok(())
    }

    #[test]
    fn invalid_arguments_are_config_errors() {
        for args in [
            &["--prelude"][..],
            &["--prelude", "a", "--no-prelude"][..],
            &["--verbose"][..],
        ] {
            assert!(matches!(
                Config::parse(args.iter().copied(), None),
                Err(LangError::Config(_))
            ));
        }
    }

    #[test]
    fn directories_expand_to_sorted_source_files() -> LangResult<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("nested"))?;
        fs::write(dir.path().join("b.lspy"), "")?;
        fs::write(dir.path().join("a.lspy"), "")?;
        fs::write(dir.path().join("notes.txt"), "")?;
        fs::write(dir.path().join("nested").join("c.lspy"), "")?;

        let config = Config {
            prelude: Prelude::Disabled,
            paths: vec![PathBuf::from("first.lspy"), dir.path().to_path_buf()],
            interactive: false,
        };
        assert_eq!(
            config.sources(),
            vec![
                PathBuf::from("first.lspy"),
                dir.path().join("a.lspy"),
                dir.path().join("b.lspy"),
                dir.path().join("nested").join("c.lspy"),
            ]
        );
        Ok(())
    }
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::SandboxConfig;
use crate::constants::EXECUTABLE_FILE_NAME;
use crate::core::domain::Language;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Command lines of every supported language.
#[derive(Clone, Debug)]
pub struct Toolchain {
    gnucpp_path: PathBuf,
    python_path: PathBuf,
    node_path: PathBuf,
}

impl Toolchain {
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            gnucpp_path: config.gnucpp_path.clone(),
            python_path: config.python_path.clone(),
            node_path: config.node_path.clone(),
        }
    }

    /// The step run before execution: compilation for C++, a syntax check
    /// for the interpreted languages.
    pub fn compile_command(&self, language: Language, workspace: &Path) -> CommandLine {
        let source = workspace.join(language.source_file_name());
        match language {
            Language::GnuCpp => CommandLine::new(&self.gnucpp_path)
                .arg("-std=c++17")
                .arg("-O2")
                .arg("-o")
                .arg(workspace.join(EXECUTABLE_FILE_NAME))
                .arg(source),
            Language::Python => CommandLine::new(&self.python_path)
                .arg("-m")
                .arg("py_compile")
                .arg(source),
            Language::JavaScript => CommandLine::new(&self.node_path).arg("--check").arg(source),
        }
    }

    pub fn run_command(&self, language: Language, workspace: &Path) -> CommandLine {
        match language {
            Language::GnuCpp => CommandLine::new(workspace.join(EXECUTABLE_FILE_NAME)),
            Language::Python => CommandLine::new(&self.python_path)
                .arg(workspace.join(language.source_file_name())),
            Language::JavaScript => {
                CommandLine::new(&self.node_path).arg(workspace.join(language.source_file_name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> Toolchain {
        Toolchain::from_config(&SandboxConfig {
            gnucpp_path: "/opt/gcc/bin/g++".into(),
            ..SandboxConfig::default()
        })
    }

    #[test]
    fn test_cpp_compiles_into_workspace() {
        let ws = Path::new("/tmp/run_1");
        let cmd = toolchain().compile_command(Language::GnuCpp, ws);

        assert_eq!(cmd.program, PathBuf::from("/opt/gcc/bin/g++"));
        assert!(cmd.args.contains(&OsString::from("/tmp/run_1/main.out")));
        assert_eq!(cmd.args.last(), Some(&OsString::from("/tmp/run_1/main.cpp")));

        let run = toolchain().run_command(Language::GnuCpp, ws);
        assert_eq!(run.program, PathBuf::from("/tmp/run_1/main.out"));
        assert!(run.args.is_empty());
    }

    #[test]
    fn test_interpreted_languages_run_source() {
        let ws = Path::new("/tmp/run_2");

        let check = toolchain().compile_command(Language::Python, ws);
        assert_eq!(check.args[..2], [OsString::from("-m"), OsString::from("py_compile")]);

        let run = toolchain().run_command(Language::Python, ws);
        assert_eq!(run.program, PathBuf::from("python3"));
        assert_eq!(run.args, vec![OsString::from("/tmp/run_2/main.py")]);

        let run = toolchain().run_command(Language::JavaScript, ws);
        assert_eq!(run.program, PathBuf::from("node"));
        assert_eq!(run.args, vec![OsString::from("/tmp/run_2/main.js")]);
    }
}

//! Built-in behavioral suite for a small interactive shell.
//!
//! Covers command lookup, the `type`, `pwd` and `history` builtins, I/O
//! redirection, pipelines and tab completion.

use std::path::Path;

use super::{Fixtures, Scenario, Step};
use crate::config::ProbeConfig;
use crate::error::Result;

/// File seeded for the file-completion step.
pub const AUTOCOMPLETE_FILE: &str = "tempfile_test_autocomplete.txt";

const OUT_FILE: &str = "out.txt";
const ERR_FILE: &str = "err.txt";
const HIST_FILE: &str = "hist.txt";

/// The shell suite, running `config.shell` in `work_dir`.
pub fn shell_suite(config: &ProbeConfig, work_dir: &Path) -> Result<Scenario> {
    let fixtures = Fixtures::new(work_dir)
        .seed(AUTOCOMPLETE_FILE, "test file content\n")
        .artifact(OUT_FILE)
        .artifact(ERR_FILE)
        .artifact(HIST_FILE);

    let completion_prefix = AUTOCOMPLETE_FILE.trim_end_matches(".txt");

    let steps = vec![
        Step::command("invalid command", "invalidcommand", "not found"),
        Step::command("type builtin", "type echo", "shell builtin"),
        Step::command("type executable", "type ls", "is /"),
        Step::command("pwd", "pwd", work_dir.display().to_string()),
        Step::new("stdout redirect")
            .line(format!("echo \"redirected\" > \"{OUT_FILE}\""))
            .expect_file(OUT_FILE, "redirected"),
        Step::command("cat redirected file", format!("cat {OUT_FILE}"), "redirected"),
        Step::new("stderr redirect")
            .line(format!("ls notfoundfile 2> \"{ERR_FILE}\""))
            .expect_file(ERR_FILE, "No such file"),
        Step::command("pipeline", "echo one | grep on | grep e", "one"),
        Step::command("stdin redirect", format!("cat < {OUT_FILE}"), "redirected"),
        Step::command("history", "history", "history"),
        Step::new("history write")
            .line(format!("history -w \"{HIST_FILE}\""))
            .expect_file(HIST_FILE, "history"),
        Step::new("history read").line(format!("history -r \"{HIST_FILE}\"")),
        Step::command("history roundtrip", "history", "history"),
        Step::new("complete builtin")
            .clear_line()
            .text("ec")
            .tab()
            .tab()
            .line("")
            .expect_contains("echo"),
        Step::new("complete executable")
            .clear_line()
            .text("ls")
            .tab()
            .tab()
            .line("")
            .expect_contains("ls"),
        Step::new("complete file")
            .clear_line()
            .text(format!("cat {completion_prefix}"))
            .tab()
            .tab()
            .line("")
            .expect_contains(AUTOCOMPLETE_FILE),
    ];

    Ok(Scenario::new("shell", config.session_config(work_dir))
        .prompt(config.prompt_pattern()?)
        .steps(steps)
        .fixtures(fixtures)
        .exit_command(&config.exit_command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Check;

    #[test]
    fn suite_layout() {
        let config = ProbeConfig::default();
        let scenario = shell_suite(&config, Path::new("/work")).unwrap();

        assert_eq!(scenario.steps.len(), 16);
        assert_eq!(scenario.prompt.as_str(), r"\$");
        assert!(Path::new(&scenario.session.program).is_absolute());
        assert!(scenario.session.program.ends_with("build/shell"));
        assert_eq!(scenario.session.timeout.expect.as_secs(), 3);
        assert_eq!(scenario.exit_command, "exit");

        let pwd = scenario.steps.iter().find(|s| s.label == "pwd").unwrap();
        assert_eq!(pwd.check.expected(), "/work");
    }

    #[test]
    fn completion_steps_flush_the_line_first() {
        let scenario = shell_suite(&ProbeConfig::default(), Path::new("/work")).unwrap();
        let completions: Vec<_> = scenario
            .steps
            .iter()
            .filter(|s| s.label.starts_with("complete"))
            .collect();

        assert_eq!(completions.len(), 3);
        assert!(completions.iter().all(|s| s.clear_line && s.inputs.len() == 4));
        assert_eq!(completions[2].check.expected(), AUTOCOMPLETE_FILE);
    }

    #[test]
    fn fixtures_cover_seed_and_artifacts() {
        let scenario = shell_suite(&ProbeConfig::default(), Path::new("/work")).unwrap();
        let paths: Vec<_> = scenario.fixtures.paths().collect();

        assert_eq!(paths.len(), 4);
        assert!(paths.contains(&Path::new("/work").join(AUTOCOMPLETE_FILE)));
        assert!(paths.contains(&Path::new("/work").join("hist.txt")));
        assert!(matches!(
            scenario.steps.iter().find(|s| s.label == "stderr redirect").unwrap().check,
            Check::FileContains { .. }
        ));
    }
}

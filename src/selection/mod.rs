//! Interactive selection of upgrades
//!
//! Upgradable dependencies are shown grouped under their scope label and
//! the operator picks any subset. Choosing nothing is a valid answer.

use crate::domain::{EnvironmentTag, Scope, UpgradePair, Version};
use crate::error::AppError;
use colored::Colorize;
use std::fmt;
use std::io::{self, BufRead, Write};

/// One selectable upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    /// Constraint currently declared
    pub constraint: String,
    pub new_version: Version,
    pub environment: Option<EnvironmentTag>,
    pub scope: Scope,
}

impl Choice {
    pub fn from_pair(pair: &UpgradePair, scope: Scope) -> Self {
        let dependency = pair.dependency();
        Self {
            name: dependency.name.clone(),
            constraint: dependency.pretty_constraint().to_string(),
            new_version: pair.candidate().version.clone(),
            environment: dependency.environment.clone(),
            scope,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ❯ {}", self.name, self.constraint, self.new_version)?;
        if let Some(ref environment) = self.environment {
            write!(f, " ({})", environment)?;
        }
        Ok(())
    }
}

/// Choices of one scope, shown under the scope label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSection {
    pub scope: Scope,
    pub choices: Vec<Choice>,
}

impl ChoiceSection {
    pub fn new(scope: Scope, pairs: &[UpgradePair]) -> Self {
        Self {
            scope,
            choices: pairs.iter().map(|pair| Choice::from_pair(pair, scope)).collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.scope.label()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Multi-select over grouped choices
pub trait Selector {
    /// Returns the approved choices; empty means nothing was selected
    fn select(&mut self, sections: &[ChoiceSection]) -> Result<Vec<Choice>, AppError>;
}

impl<S: Selector + ?Sized> Selector for Box<S> {
    fn select(&mut self, sections: &[ChoiceSection]) -> Result<Vec<Choice>, AppError> {
        (**self).select(sections)
    }
}

/// Selects every choice without asking (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Selector for AcceptAll {
    fn select(&mut self, sections: &[ChoiceSection]) -> Result<Vec<Choice>, AppError> {
        Ok(sections
            .iter()
            .flat_map(|section| section.choices.iter().cloned())
            .collect())
    }
}

/// Parsed operator answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Cancel,
    All,
    /// Zero-based indices, ascending and unique
    Indices(Vec<usize>),
}

/// Parse `1,3-4`, `a`/`all`, or an empty/`q` cancel for `total` choices
pub fn parse_answer(input: &str, total: usize) -> Result<Answer, String> {
    let answer = input.trim().to_lowercase();
    match answer.as_str() {
        "" | "q" | "quit" => return Ok(Answer::Cancel),
        "a" | "all" => return Ok(Answer::All),
        _ => {}
    }

    let index = |token: &str| -> Result<usize, String> {
        let n: usize = token
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", token.trim()))?;
        if n == 0 || n > total {
            return Err(format!("{} is out of range 1-{}", n, total));
        }
        Ok(n - 1)
    };

    let mut selected = Vec::new();
    for token in answer.split([',', ' ']).filter(|t| !t.trim().is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (index(start)?, index(end)?);
                if start > end {
                    return Err(format!("range '{}' is reversed", token));
                }
                selected.extend(start..=end);
            }
            None => selected.push(index(token)?),
        }
    }

    selected.sort_unstable();
    selected.dedup();
    Ok(Answer::Indices(selected))
}

/// Numbered prompt on a terminal
pub struct TerminalSelector<R, W> {
    input: R,
    output: W,
}

impl TerminalSelector<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr and read answers from stdin
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn render(&mut self, sections: &[ChoiceSection]) -> io::Result<usize> {
        let mut number = 0;
        for section in sections.iter().filter(|s| !s.is_empty()) {
            writeln!(self.output, "\n{}", section.label().cyan().bold())?;
            for choice in &section.choices {
                number += 1;
                let mut line = format!(
                    "  {:>3}) {} {} ❯ {}",
                    number,
                    choice.name.bold(),
                    choice.constraint.dimmed(),
                    choice.new_version.text().green()
                );
                if let Some(ref environment) = choice.environment {
                    line.push_str(&format!(" ({})", environment));
                }
                writeln!(self.output, "{}", line)?;
            }
        }
        Ok(number)
    }
}

impl<R: BufRead, W: Write> Selector for TerminalSelector<R, W> {
    fn select(&mut self, sections: &[ChoiceSection]) -> Result<Vec<Choice>, AppError> {
        let all: Vec<&Choice> = sections.iter().flat_map(|s| s.choices.iter()).collect();
        let total = self.render(sections)?;

        loop {
            write!(
                self.output,
                "\n{} {} ",
                "Choose packages to upgrade".bold(),
                "(e.g. 1,3-4, a = all, Enter = none):".dimmed()
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // End of input
                writeln!(self.output)?;
                return Ok(Vec::new());
            }

            match parse_answer(&line, total) {
                Ok(Answer::Cancel) => return Ok(Vec::new()),
                Ok(Answer::All) => return Ok(all.into_iter().cloned().collect()),
                Ok(Answer::Indices(indices)) => {
                    return Ok(indices.into_iter().map(|i| all[i].clone()).collect())
                }
                Err(message) => writeln!(self.output, "{}", message.red())?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn choice(name: &str, scope: Scope) -> Choice {
        Choice {
            name: name.to_string(),
            constraint: "^1.0".to_string(),
            new_version: Version::parse("2.0.0").unwrap(),
            environment: None,
            scope,
        }
    }

    fn sections() -> Vec<ChoiceSection> {
        vec![
            ChoiceSection {
                scope: Scope::Runtime,
                choices: vec![choice("requests", Scope::Runtime), choice("flask", Scope::Runtime)],
            },
            ChoiceSection {
                scope: Scope::Development,
                choices: vec![choice("pytest", Scope::Development)],
            },
        ]
    }

    fn run(input: &str) -> (Vec<String>, String) {
        let mut output = Vec::new();
        let picked = {
            let mut selector = TerminalSelector::new(Cursor::new(input.to_string()), &mut output);
            selector.select(&sections()).unwrap()
        };
        (
            picked.into_iter().map(|c| c.name).collect(),
            String::from_utf8(output).unwrap(),
        )
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("", 3), Ok(Answer::Cancel));
        assert_eq!(parse_answer(" q\n", 3), Ok(Answer::Cancel));
        assert_eq!(parse_answer("ALL", 3), Ok(Answer::All));
        assert_eq!(parse_answer("3,1", 3), Ok(Answer::Indices(vec![0, 2])));
        assert_eq!(parse_answer("1-3 2", 3), Ok(Answer::Indices(vec![0, 1, 2])));
    }

    #[test]
    fn test_parse_answer_errors() {
        assert!(parse_answer("0", 3).is_err());
        assert!(parse_answer("4", 3).is_err());
        assert!(parse_answer("3-1", 3).is_err());
        assert!(parse_answer("x", 3).is_err());
    }

    #[test]
    fn test_terminal_selector_picks_across_sections() {
        let (picked, output) = run("1,3\n");
        assert_eq!(picked, vec!["requests", "pytest"]);
        assert!(output.contains("dependencies"));
        assert!(output.contains("devDependencies"));
        assert!(output.contains("Choose packages to upgrade"));
    }

    #[test]
    fn test_terminal_selector_reprompts_on_invalid_answer() {
        let (picked, output) = run("9\n2\n");
        assert_eq!(picked, vec!["flask"]);
        assert!(output.contains("out of range"));
    }

    #[test]
    fn test_terminal_selector_cancel_and_eof() {
        assert!(run("\n").0.is_empty());
        assert!(run("").0.is_empty());
    }

    #[test]
    fn test_terminal_selector_hides_empty_sections() {
        let mut output = Vec::new();
        let sections = vec![
            ChoiceSection {
                scope: Scope::Runtime,
                choices: vec![],
            },
            ChoiceSection {
                scope: Scope::Development,
                choices: vec![choice("pytest", Scope::Development)],
            },
        ];
        let picked = TerminalSelector::new(Cursor::new("a\n"), &mut output)
            .select(&sections)
            .unwrap();
        assert_eq!(picked.len(), 1);
        let output = String::from_utf8(output).unwrap();
        assert!(!output.contains("dependencies"));
    }

    #[test]
    fn test_accept_all() {
        let picked = AcceptAll.select(&sections()).unwrap();
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[2].scope, Scope::Development);
    }

    #[test]
    fn test_choice_display() {
        let mut choice = choice("foo", Scope::Runtime);
        choice.environment = Some(EnvironmentTag::python("^3.5"));
        assert_eq!(choice.to_string(), "foo ^1.0 ❯ 2.0.0 (python ^3.5)");
    }
}

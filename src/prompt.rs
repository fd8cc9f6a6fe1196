//! Selector implementations: a line-based interactive prompt and a preset
//! answer set built from command-line flags.

use crate::entry::DirectoryEntry;
use crate::error::{ShareError, ShareResult};
use crate::filter::FilterMode;
use crate::pipeline::{Selector, validate_folder_name};
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Asks the operator each question on `output` and reads answers from `input`.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl PromptSelector<io::StdinLock<'static>, io::Stdout> {
    /// A prompt on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> ShareResult<String> {
        write!(self.output, "{}", question).map_err(prompt_error)?;
        self.output.flush().map_err(prompt_error)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(prompt_error)?;
        if read == 0 {
            return Err(prompt_error(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            )));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, line: &str) -> ShareResult<()> {
        writeln!(self.output, "{}", line).map_err(prompt_error)
    }

    /// Asks until the answer is a number between 1 and `count`.
    fn choose(&mut self, question: &str, count: usize) -> ShareResult<usize> {
        loop {
            let answer = self.ask(question)?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
                _ => self.say(&format!("Please enter a number from 1 to {}.", count))?,
            }
        }
    }
}

impl<R: BufRead, W: Write> Selector for PromptSelector<R, W> {
    fn folder_name(&mut self, default: &str) -> ShareResult<String> {
        loop {
            let answer = self.ask(&format!(
                "Enter a name for the shared folder [{}]: ",
                default
            ))?;
            let name = if answer.is_empty() {
                default
            } else {
                answer.as_str()
            };
            match validate_folder_name(name) {
                Ok(name) => return Ok(name),
                Err(e) => self.say(&e.to_string())?,
            }
        }
    }

    fn filter_mode(&mut self, extensions: &[String]) -> ShareResult<FilterMode> {
        let modes = FilterMode::offered(extensions);
        self.say("How would you like to filter the items?")?;
        for (i, label) in modes.iter().enumerate() {
            self.say(&format!("  {}) {}", i + 1, label))?;
        }

        match self.choose("Choice: ", modes.len())? {
            0 => Ok(FilterMode::All),
            1 => Ok(FilterMode::Directories),
            _ => {
                self.say("Select file extension to filter by:")?;
                for (i, ext) in extensions.iter().enumerate() {
                    self.say(&format!("  {}) {}", i + 1, ext))?;
                }
                let index = self.choose("Extension: ", extensions.len())?;
                Ok(FilterMode::Extension(extensions[index].clone()))
            }
        }
    }

    fn select(
        &mut self,
        candidates: &[DirectoryEntry],
        folder_name: &str,
        source_dir: &Path,
    ) -> ShareResult<Vec<String>> {
        self.say(&format!(
            "Select files and folders to move to {} ({}):",
            folder_name,
            source_dir.display()
        ))?;
        for (i, entry) in candidates.iter().enumerate() {
            self.say(&format!("  {}) {} ({})", i + 1, entry.name, entry.type_label()))?;
        }

        loop {
            let answer = self.ask("Items (e.g. 1,3-5 or 'all'; empty for none): ")?;
            match parse_selection(&answer, candidates.len()) {
                Ok(indices) => {
                    return Ok(indices
                        .into_iter()
                        .map(|i| candidates[i].name.clone())
                        .collect());
                }
                Err(reason) => self.say(&reason)?,
            }
        }
    }
}

fn prompt_error(source: io::Error) -> ShareError {
    ShareError::Prompt { source }
}

/// Parses a checkbox-style answer into zero-based indices, in listing order.
///
/// Accepts comma- or space-separated numbers and inclusive ranges (`2-4`),
/// `all` or `*` for everything, and an empty answer for nothing.
pub fn parse_selection(answer: &str, count: usize) -> Result<Vec<usize>, String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(Vec::new());
    }
    if answer.eq_ignore_ascii_case("all") || answer == "*" {
        return Ok((0..count).collect());
    }

    let mut picked = BTreeSet::new();
    for token in answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_index(start, count)?, parse_index(end, count)?),
            None => {
                let n = parse_index(token, count)?;
                (n, n)
            }
        };
        if start > end {
            return Err(format!("Range '{}' runs backwards.", token));
        }
        picked.extend(start..=end);
    }

    Ok(picked.into_iter().collect())
}

fn parse_index(token: &str, count: usize) -> Result<usize, String> {
    match token.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => Err(format!(
            "'{}' is not a number from 1 to {}.",
            token.trim(),
            count
        )),
    }
}

/// Answers every question from values fixed up front.
#[derive(Debug, Clone)]
pub struct PresetSelector {
    /// `None` keeps the default folder name.
    pub folder_name: Option<String>,
    pub mode: FilterMode,
    pub names: Vec<String>,
}

impl PresetSelector {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            folder_name: None,
            mode: FilterMode::All,
            names,
        }
    }

    pub fn with_folder_name(mut self, name: impl Into<String>) -> Self {
        self.folder_name = Some(name.into());
        self
    }

    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Selector for PresetSelector {
    fn folder_name(&mut self, default: &str) -> ShareResult<String> {
        Ok(self
            .folder_name
            .clone()
            .unwrap_or_else(|| default.to_string()))
    }

    fn filter_mode(&mut self, _extensions: &[String]) -> ShareResult<FilterMode> {
        Ok(self.mode.clone())
    }

    fn select(
        &mut self,
        _candidates: &[DirectoryEntry],
        _folder_name: &str,
        _source_dir: &Path,
    ) -> ShareResult<Vec<String>> {
        Ok(self.names.clone())
    }
}

use std::io::{self, Write};

use anyhow::Result;

/// Question/answer seam for the wizard, so every flow can be driven by
/// scripted answers in tests.
pub trait Prompter {
    /// Shows the question and returns the trimmed answer line.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Terminal prompter over stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

/// Yes/no question where an empty answer means yes.
pub fn confirm<P: Prompter + ?Sized>(prompter: &mut P, question: &str) -> Result<bool> {
    let answer = prompter.ask(question)?.to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

/// Parses a 1-based menu choice into a 0-based index.
pub fn parse_index(answer: &str, count: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => Some(n - 1),
        _ => None,
    }
}

/// Feeds pre-baked answers to wizard flows under test.
#[cfg(test)]
pub(crate) struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exhausted(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer left for: {question}"))
    }
}

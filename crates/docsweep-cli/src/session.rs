//! Interactive command loop
//!
//! Reads one command per line, drives the controller, and prints the
//! resulting state. Deletes always ask for confirmation first.

use crate::render;
use docsweep_core::{Invocation, Rejection, SearchRequest, SweepController, TypeChoice};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Commands:
  search <term>    search the current type for <term>
  type <name|all>  set the type to search
  query <groq>     run a custom query as-is
  toggle <n>...    select or deselect rows by number
  all              select every row
  none             clear the selection
  delete           delete the selection (asks first)
  list             show the results again
  types            show the searchable types
  help             show this help
  quit             leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Type(TypeChoice),
    Query(String),
    Toggle(Vec<usize>),
    All,
    ClearSelection,
    Delete,
    List,
    Types,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; a blank line yields `Ok(None)`
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "type" | "t" => Command::Type(TypeChoice::parse(rest)),
            "query" | "q" => {
                if rest.is_empty() {
                    return Err("Usage: query <groq>".to_string());
                }
                Command::Query(rest.to_string())
            }
            "toggle" | "x" => {
                let rows = rest
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<usize>()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| format!("Not a row number: {}", s))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if rows.is_empty() {
                    return Err("Usage: toggle <n>...".to_string());
                }
                Command::Toggle(rows)
            }
            "all" => Command::All,
            "none" => Command::ClearSelection,
            "delete" => Command::Delete,
            "list" | "ls" => Command::List,
            "types" => Command::Types,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command: {} (try `help`)", other)),
        };
        Ok(Some(command))
    }
}

/// Ask a yes/no question; anything but `y`/`yes` is a no
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<bool> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub struct Session<'a, R, W> {
    controller: &'a SweepController,
    input: R,
    output: W,
    doc_type: TypeChoice,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(controller: &'a SweepController, input: R, output: W) -> Self {
        Self {
            controller,
            input,
            output,
            doc_type: TypeChoice::All,
        }
    }

    pub async fn run(mut self) -> io::Result<()> {
        let types = self.controller.load_types().await;
        self.print_status().await?;
        writeln!(
            self.output,
            "{} searchable type(s). Type `help` for commands.",
            types.len()
        )?;

        loop {
            write!(self.output, "docsweep> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    writeln!(self.output, "{}", message)?;
                    continue;
                }
            };

            if !self.execute(command).await? {
                break;
            }
        }
        Ok(())
    }

    /// Run one command; returns false when the session should end
    async fn execute(&mut self, command: Command) -> io::Result<bool> {
        match command {
            Command::Search(term) => {
                let request = SearchRequest::term(self.doc_type.clone(), term);
                self.search(request).await?;
            }
            Command::Query(query) => self.search(SearchRequest::custom(query)).await?,
            Command::Type(choice) => {
                match &choice {
                    TypeChoice::All => writeln!(self.output, "Searching all types")?,
                    TypeChoice::Specific(t) => writeln!(self.output, "Searching type {}", t)?,
                }
                self.doc_type = choice;
            }
            Command::Toggle(rows) => {
                let state = self.controller.snapshot().await;
                for n in rows {
                    match state.results().get(n - 1) {
                        Some(row) => {
                            self.controller.toggle(&row.id).await;
                        }
                        None => writeln!(self.output, "No row {}", n)?,
                    }
                }
                self.print_results().await?;
            }
            Command::All => {
                let count = self.controller.select_all().await;
                writeln!(self.output, "{} selected", count)?;
            }
            Command::ClearSelection => {
                self.controller.clear_selection().await;
                writeln!(self.output, "Selection cleared")?;
            }
            Command::Delete => self.delete().await?,
            Command::List => {
                self.print_results().await?;
                self.print_status().await?;
            }
            Command::Types => {
                let state = self.controller.snapshot().await;
                write!(self.output, "{}", render::types(state.known_types()))?;
            }
            Command::Help => write!(self.output, "{}", HELP)?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn search(&mut self, request: SearchRequest) -> io::Result<()> {
        match self.controller.search(&request).await {
            Invocation::Completed(_) => {
                self.print_results().await?;
                self.print_status().await
            }
            Invocation::Rejected(rejection) => {
                writeln!(self.output, "{}", render::rejection(rejection))
            }
            Invocation::Failed => self.print_status().await,
        }
    }

    async fn delete(&mut self) -> io::Result<()> {
        let Some(plan) = self.controller.pending_delete().await else {
            return writeln!(self.output, "{}", render::rejection(Rejection::NothingSelected));
        };

        let prompt = render::confirm_prompt(&plan);
        if !confirm(&mut self.input, &mut self.output, &prompt)? {
            return writeln!(self.output, "Cancelled");
        }

        match self.controller.delete_selected().await {
            Invocation::Completed(outcome) => {
                write!(self.output, "{}", render::outcome(&outcome, plan.preview))?;
                self.print_status().await
            }
            Invocation::Rejected(rejection) => {
                writeln!(self.output, "{}", render::rejection(rejection))
            }
            Invocation::Failed => self.print_status().await,
        }
    }

    async fn print_results(&mut self) -> io::Result<()> {
        let state = self.controller.snapshot().await;
        write!(self.output, "{}", render::results(&state))
    }

    async fn print_status(&mut self) -> io::Result<()> {
        let state = self.controller.snapshot().await;
        if let Some(line) = render::status(&state) {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }
}

//! Interactive catalog search
//!
//! Plain lines are search terms and go through the debouncer, so typing
//! several lines in quick succession issues one search. Commands start
//! with `:`. Fetches run on spawned tasks; the listing drops results of
//! superseded queries, so the REPL never waits on the network.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use coursectl_core::{debounce, CourseConfig, ListState, PaginatedSearchList, Query};
use coursectl_lms::{CatalogSource, Course, LO_TYPES};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{build_query, catalog, TypeFilter};
use crate::render::{card_lines, status_line, write_text};

const HELP: &str = "\
Type a search term and press enter (blank line lists everything).
  :more         load the next page
  :type a,b     restrict to learning object types (no args: all types)
  :help         show this help
  :quit         exit";

#[derive(Args, Debug)]
pub struct InteractiveArgs {
    /// Initial search term
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    #[command(flatten)]
    pub types: TypeFilter,
}

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Search(String),
    More,
    Types(Vec<String>),
    Help,
    Quit,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Input::Search(line.to_string());
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .unwrap_or((command, ""));
        match name {
            "more" | "m" => Input::More,
            "type" | "t" => Input::Types(
                rest.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            "help" | "h" | "?" => Input::Help,
            "quit" | "q" | "exit" => Input::Quit,
            other => Input::Unknown(other.to_string()),
        }
    }
}

type CatalogList = Arc<PaginatedSearchList<CatalogSource>>;

fn spawn_query(list: &CatalogList, query: Query) -> JoinHandle<()> {
    let list = Arc::clone(list);
    tokio::spawn(async move {
        let outcome = list.set_query(query).await;
        debug!(?outcome, "Query settled");
    })
}

fn spawn_load_more(list: &CatalogList) -> JoinHandle<()> {
    let list = Arc::clone(list);
    tokio::spawn(async move {
        let outcome = list.load_more().await;
        debug!(?outcome, "Load more settled");
    })
}

/// Fetches issued from the prompt that may still be running
#[derive(Default)]
struct InFlight {
    handles: Vec<JoinHandle<()>>,
}

impl InFlight {
    fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    async fn settle(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                debug!(error = %e, "Fetch task ended abnormally");
            }
        }
    }
}

/// Why the prompt loop stopped
enum Exit {
    Quit,
    EndOfInput,
}

/// Prints the listing as it changes: the full list for a new result set,
/// only the new cards after a page is appended.
async fn render_updates(mut updates: watch::Receiver<ListState<Course>>) {
    let mut shown_query: Option<Query> = None;
    let mut shown = 0usize;

    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        let mut out = std::io::stdout().lock();

        if state.is_loading {
            let _ = writeln!(out, "{}", status_line(&state));
            continue;
        }

        let same_set = shown_query.as_ref() == Some(&state.query) && state.items.len() >= shown;
        let result = if same_set {
            write_new_cards(&mut out, &state, shown)
        } else {
            write_text(&mut out, &state)
        };
        if let Err(e) = result {
            debug!(error = %e, "Failed to render listing");
        }

        shown_query = Some(state.query.clone());
        shown = state.items.len();
    }
}

fn write_new_cards(
    out: &mut impl Write,
    state: &ListState<Course>,
    shown: usize,
) -> Result<()> {
    for course in &state.items[shown..] {
        for line in card_lines(course) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", status_line(state))?;
    Ok(())
}

pub async fn run_interactive(args: InteractiveArgs, config: &CourseConfig) -> Result<()> {
    let list = Arc::new(PaginatedSearchList::new(catalog(config)?));
    let render = tokio::spawn(render_updates(list.subscribe()));
    let (debouncer, mut debounced) = debounce::<String>(config.browse.debounce());
    let mut in_flight = InFlight::default();

    let mut term = args.query.unwrap_or_default();
    let mut types = args.types.types;

    println!("{}\n", HELP);
    in_flight.push(spawn_query(&list, build_query(&term, &types)));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let exit = loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break Exit::EndOfInput };
                match Input::parse(&line) {
                    Input::Search(text) => {
                        debouncer.push(text);
                    }
                    Input::More => in_flight.push(spawn_load_more(&list)),
                    Input::Types(selected) => {
                        let unknown: Vec<&String> = selected
                            .iter()
                            .filter(|t| !LO_TYPES.contains(&t.as_str()))
                            .collect();
                        if !unknown.is_empty() {
                            println!("Unknown types {:?}; expected one of {}", unknown, LO_TYPES.join(", "));
                            continue;
                        }
                        types = selected;
                        in_flight.push(spawn_query(&list, build_query(&term, &types)));
                    }
                    Input::Help => println!("{}", HELP),
                    Input::Quit => break Exit::Quit,
                    Input::Unknown(name) => println!("Unknown command :{} (try :help)", name),
                }
            }
            Some(settled) = debounced.next() => {
                term = settled;
                in_flight.push(spawn_query(&list, build_query(&term, &types)));
            }
        }
    };

    if let Exit::Quit = exit {
        render.abort();
        return Ok(());
    }

    // At end of input the pending term is still searched; the renderer
    // stops only after every fetch has landed.
    drop(debouncer);
    if let Some(settled) = debounced.next().await {
        in_flight.push(spawn_query(&list, build_query(&settled, &types)));
    }
    in_flight.settle().await;
    drop(list);
    if let Err(e) = render.await {
        debug!(error = %e, "Renderer ended abnormally");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_searches() {
        assert_eq!(Input::parse("  rust basics \n"), Input::Search("rust basics".into()));
        assert_eq!(Input::parse(""), Input::Search(String::new()));
    }

    #[test]
    fn commands() {
        assert_eq!(Input::parse(":more"), Input::More);
        assert_eq!(Input::parse(":q"), Input::Quit);
        assert_eq!(Input::parse(":help"), Input::Help);
        assert_eq!(Input::parse(":frobnicate"), Input::Unknown("frobnicate".into()));
    }

    #[test]
    fn type_command_splits_on_commas() {
        assert_eq!(
            Input::parse(":type course, jobAid,"),
            Input::Types(vec!["course".into(), "jobAid".into()])
        );
        assert_eq!(Input::parse(":type"), Input::Types(Vec::new()));
    }
}

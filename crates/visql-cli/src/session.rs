use crate::cli::SessionArgs;
use crate::config::ProjectConfig;
use crate::output::{
    print_header, print_info, print_notification, print_sql, print_success, print_warning,
};
use std::io::{BufRead, Write};
use visql::{
    BuildError, BuilderState, Direction, JoinSide, JoinType, Operator, QueryAssembler, RowKind,
    SchemaCatalog,
};

/// One line of session input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add(RowKind),
    Table { row: usize, table: Option<String> },
    Columns { row: usize, columns: Vec<String> },
    JoinEndpoint { row: usize, side: JoinSide, column: Option<String> },
    JoinType { row: usize, join_type: Option<JoinType> },
    WhereColumn { row: usize, column: Option<String> },
    WhereOperator { row: usize, operator: Operator },
    WhereValue { row: usize, value: String },
    GroupBy(Option<String>),
    OrderBy(Option<String>),
    Direction(Direction),
    Limit(Option<u64>),
    Offset(Option<u64>),
    Options,
    Show,
    Generate,
    Reset,
    Help,
    Quit,
}

const SESSION_HELP: &str = "\
  add table|join|where                 append a row
  table <row> <name|->                 pick or clear a row's table
  columns <row> <c1,c2,..|->           pick the row's columns
  join <row> left|right <t.c|->        set a join endpoint
  join-type <row> <INNER|LEFT|RIGHT|FULL|->
  where <row> column <t.c|->
  where <row> op <OPERATOR>            = != > < >= <= IS NULL, IS NOT NULL
  where <row> value <text>
  group <t.c|->
  order <t.c|->
  direction ASC|DESC
  limit <n|->
  offset <n|->
  options | show | generate | reset | help | quit";

/// `-` clears a field.
fn optional(token: &str) -> Option<String> {
    (token != "-").then(|| token.to_string())
}

fn optional_number(token: &str) -> anyhow::Result<Option<u64>> {
    if token == "-" {
        return Ok(None);
    }
    token
        .parse()
        .map(Some)
        .map_err(|_| anyhow::anyhow!("expected a non-negative number or '-', got {token}"))
}

fn row_index(token: Option<&str>) -> anyhow::Result<usize> {
    let Some(token) = token else {
        anyhow::bail!("missing row number");
    };
    token
        .parse()
        .map_err(|_| anyhow::anyhow!("row must be a number, got {token}"))
}

/// Parse one input line; blank lines yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Action>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut words = rest.split_whitespace();

    let action = match head {
        "add" => match rest {
            "table" => Action::Add(RowKind::Table),
            "join" => Action::Add(RowKind::Join),
            "where" => Action::Add(RowKind::Where),
            other => anyhow::bail!("add expects table, join or where (got {other:?})"),
        },
        "table" => {
            let row = row_index(words.next())?;
            let Some(name) = words.next() else {
                anyhow::bail!("table expects a table name or '-'");
            };
            Action::Table {
                row,
                table: optional(name),
            }
        }
        "columns" => {
            let row = row_index(words.next())?;
            let list = words.collect::<Vec<_>>().join("");
            let columns = match list.as_str() {
                "" | "-" => Vec::new(),
                list => list
                    .split(',')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
            Action::Columns { row, columns }
        }
        "join" => {
            let row = row_index(words.next())?;
            let side = match words.next() {
                Some("left") => JoinSide::Left,
                Some("right") => JoinSide::Right,
                _ => anyhow::bail!("join expects left or right"),
            };
            let Some(column) = words.next() else {
                anyhow::bail!("join expects table.column or '-'");
            };
            Action::JoinEndpoint {
                row,
                side,
                column: optional(column),
            }
        }
        "join-type" => {
            let row = row_index(words.next())?;
            let join_type = match words.next() {
                Some("-") => None,
                Some(t) => Some(t.parse::<JoinType>().map_err(anyhow::Error::msg)?),
                None => anyhow::bail!("join-type expects INNER, LEFT, RIGHT, FULL or '-'"),
            };
            Action::JoinType { row, join_type }
        }
        "where" => {
            let (row, rest) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let row = row_index(Some(row))?;
            let (field, tail) = rest
                .trim_start()
                .split_once(char::is_whitespace)
                .unwrap_or((rest.trim_start(), ""));
            // The value is taken as typed; only the separator after `value` is dropped.
            let tail = tail.trim_start();
            match field {
                "column" => Action::WhereColumn {
                    row,
                    column: optional(single(tail, "where column")?),
                },
                "op" => Action::WhereOperator {
                    row,
                    operator: tail.parse().map_err(anyhow::Error::msg)?,
                },
                "value" => Action::WhereValue {
                    row,
                    value: tail.to_string(),
                },
                _ => anyhow::bail!("where expects column, op or value"),
            }
        }
        "group" => Action::GroupBy(optional(single(rest, "group")?)),
        "order" => Action::OrderBy(optional(single(rest, "order")?)),
        "direction" => Action::Direction(rest.parse().map_err(anyhow::Error::msg)?),
        "limit" => Action::Limit(optional_number(single(rest, "limit")?)?),
        "offset" => Action::Offset(optional_number(single(rest, "offset")?)?),
        "options" => Action::Options,
        "show" => Action::Show,
        "generate" => Action::Generate,
        "reset" => Action::Reset,
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => anyhow::bail!("unknown action: {other} (type `help`)"),
    };

    Ok(Some(action))
}

fn single<'a>(rest: &'a str, action: &str) -> anyhow::Result<&'a str> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        anyhow::bail!("{action} expects exactly one argument");
    }
    Ok(rest)
}

/// Apply a state-changing action. Read-only actions return the state as is.
fn apply(
    catalog: &SchemaCatalog,
    state: &BuilderState,
    action: &Action,
) -> Result<BuilderState, BuildError> {
    match action {
        Action::Add(RowKind::Table) => state.add_table_row(catalog),
        Action::Add(RowKind::Join) => Ok(state.add_join_row()),
        Action::Add(RowKind::Where) => Ok(state.add_where_condition()),
        Action::Table { row, table } => state.select_table(catalog, *row, table.as_deref()),
        Action::Columns { row, columns } => {
            state.select_columns(catalog, *row, columns.as_slice())
        }
        Action::JoinEndpoint { row, side, column } => {
            state.set_join_endpoint(catalog, *row, *side, column.as_deref())
        }
        Action::JoinType { row, join_type } => state.set_join_type(*row, *join_type),
        Action::WhereColumn { row, column } => {
            state.set_where_column(catalog, *row, column.as_deref())
        }
        Action::WhereOperator { row, operator } => state.set_where_operator(*row, *operator),
        Action::WhereValue { row, value } => state.set_where_value(*row, value),
        Action::GroupBy(column) => state.set_group_by(catalog, column.as_deref()),
        Action::OrderBy(column) => state.set_order_column(catalog, column.as_deref()),
        Action::Direction(direction) => Ok(state.set_order_direction(*direction)),
        Action::Limit(limit) => state.set_limit(*limit),
        Action::Offset(offset) => state.set_offset(*offset),
        Action::Reset => Ok(BuilderState::new()),
        Action::Options | Action::Show | Action::Generate | Action::Help | Action::Quit => {
            Ok(state.clone())
        }
    }
}

/// What the caller should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// An in-memory builder session. Nothing outlives it.
pub struct Session<'a> {
    catalog: &'a SchemaCatalog,
    state: BuilderState,
}

impl<'a> Session<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            state: BuilderState::new(),
        }
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// Handle one line. Errors are reported and leave the state unchanged.
    pub fn step(&mut self, line: &str) -> Flow {
        let action = match parse_line(line) {
            Ok(Some(action)) => action,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                print_warning(&e.to_string());
                return Flow::Continue;
            }
        };

        match apply(self.catalog, &self.state, &action) {
            Ok(next) => self.state = next,
            Err(e) => {
                print_notification(&e.to_string());
                return Flow::Continue;
            }
        }

        let qa = QueryAssembler::new(self.catalog);
        match action {
            Action::Quit => return Flow::Quit,
            Action::Help => println!("{SESSION_HELP}"),
            Action::Show => println!("{:#?}", self.state),
            Action::Options => self.print_options(&qa),
            Action::Generate => match qa.generate(&self.state) {
                Ok(Some(sql)) => print_sql(&sql),
                Ok(None) => print_warning("no join has a type yet; nothing to show"),
                Err(e) => print_notification(&e.to_string()),
            },
            Action::Reset => print_success("state reset"),
            _ => print_success("ok"),
        }
        Flow::Continue
    }

    fn print_options(&self, qa: &QueryAssembler<'_>) {
        let list = |v: Vec<String>| {
            if v.is_empty() {
                "(none)".to_string()
            } else {
                v.join(", ")
            }
        };
        print_info(&format!("tables:  {}", list(qa.table_options(&self.state))));
        print_info(&format!(
            "joins:   {}",
            list(qa.join_endpoint_options(&self.state))
        ));
        print_info(&format!("columns: {}", list(qa.qualified_columns(&self.state))));
    }
}

pub fn run(args: SessionArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_demo(args.config)?;
    let mut session = Session::new(&project.catalog);

    print_header("visql session");
    if project.is_demo {
        print_info("using the built-in demo catalog");
    }
    print_info("type `help` for actions, `quit` to leave");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("visql> ");
        stdout.flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        if session.step(&line?) == Flow::Quit {
            break;
        }
    }

    tracing::debug!(
        rows = session.state().tables.len(),
        "session ended; state discarded"
    );
    Ok(())
}

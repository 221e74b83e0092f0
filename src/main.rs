use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use clap::Parser;
use idtable::{
    Id, IdTable, IdTableConfig, DEFAULT_ID_BASE, DEFAULT_ID_LIMIT, DEFAULT_INITIAL_GROWTH,
};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Drives an id table from line commands on stdin.
///
/// Commands: alloc [label], alloc_at <id> [label], lookup <id>, free <id>,
/// base <n>, limit <n>, stats, list, table_free, table_alloc.
#[derive(Parser, Debug)]
#[command(name = "idtable", version)]
struct Cli {
    #[arg(long, default_value_t = DEFAULT_ID_BASE)]
    base: Id,

    #[arg(long, default_value_t = DEFAULT_ID_LIMIT)]
    limit: Id,

    /// Slots in the first chunk
    #[arg(long, default_value_t = DEFAULT_INITIAL_GROWTH)]
    growth: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Alloc(Option<String>),
    AllocAt(Id, Option<String>),
    Lookup(Id),
    Free(Id),
    Base(Id),
    Limit(Id),
    Stats,
    List,
    TableFree,
    TableAlloc,
}

impl Command {
    /// `Ok(None)` for blank lines.
    fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };

        let mut id = |usage: &str| -> anyhow::Result<Id> {
            let word = words.next().with_context(|| format!("usage: {usage}"))?;
            word.parse()
                .with_context(|| format!("{name}: bad number {word:?}"))
        };

        let command = match name {
            "alloc" => Command::Alloc(None),
            "alloc_at" => Command::AllocAt(id("alloc_at <id> [label]")?, None),
            "lookup" => Command::Lookup(id("lookup <id>")?),
            "free" => Command::Free(id("free <id>")?),
            "base" => Command::Base(id("base <base>")?),
            "limit" => Command::Limit(id("limit <limit>")?),
            "stats" => Command::Stats,
            "list" => Command::List,
            "table_free" => Command::TableFree,
            "table_alloc" => Command::TableAlloc,
            _ => bail!("unknown command {name}"),
        };

        let label = words.next().map(str::to_owned);
        Ok(Some(match command {
            Command::Alloc(_) => Command::Alloc(label),
            Command::AllocAt(id, _) => Command::AllocAt(id, label),
            other => other,
        }))
    }
}

struct Shell {
    config: IdTableConfig,
    table: Option<IdTable<String>>,
}

impl Shell {
    fn new(config: IdTableConfig) -> anyhow::Result<Self> {
        let table = IdTable::with_config(config)?;

        Ok(Self {
            config,
            table: Some(table),
        })
    }

    fn table(&mut self) -> anyhow::Result<&mut IdTable<String>> {
        self.table.as_mut().context("table already freed")
    }

    fn run(&mut self, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Alloc(label) => {
                let (id, _) = self
                    .table()?
                    .alloc_with(|id| label.unwrap_or_else(|| format!("entry-{id}")))?;
                writeln!(out, "alloced id={id}")?;
            }
            Command::AllocAt(id, label) => {
                let label = label.unwrap_or_else(|| format!("entry-{id}"));
                self.table()?.alloc_at(id, label)?;
                writeln!(out, "alloced id={id}")?;
            }
            Command::Lookup(id) => match self.table()?.lookup(id) {
                Some(label) => writeln!(out, "found id={id}, label={label}")?,
                None => bail!("lookup {id} failed"),
            },
            Command::Free(id) => {
                if !self.table()?.free(id) {
                    bail!("free {id} failed");
                }
                writeln!(out, "freed id={id}")?;
            }
            Command::Base(base) => self.table()?.set_base(base),
            Command::Limit(limit) => self.table()?.set_limit(limit),
            Command::Stats => {
                let stats = self.table()?.stats();
                writeln!(out, "{stats:?}")?;
            }
            Command::List => {
                let mut live: Vec<(Id, String)> = self
                    .table()?
                    .iter()
                    .map(|(id, label)| (id, label.clone()))
                    .collect();
                live.sort_unstable();
                for (id, label) in live {
                    writeln!(out, "{id} {label}")?;
                }
            }
            Command::TableFree => {
                let table = self.table.take().context("table already freed")?;
                let mut finalized = Vec::new();
                table.destroy(|id, _| finalized.push(id));
                finalized.sort_unstable();
                writeln!(out, "finalized {finalized:?}")?;
            }
            Command::TableAlloc => {
                if self.table.is_some() {
                    bail!("table already alloced");
                }
                self.table = Some(IdTable::with_config(self.config)?);
            }
        }

        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let console_log = tracing_subscriber::fmt::Layer::new()
        .with_ansi(true)
        .with_writer(io::stderr);
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(console_log);
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();
    let config = IdTableConfig::default()
        .with_base(cli.base)
        .with_limit(cli.limit)
        .with_initial_growth(cli.growth);
    let mut shell = Shell::new(config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let result = Command::parse(&line).and_then(|command| match command {
            Some(command) => shell.run(command, &mut out),
            None => Ok(()),
        });
        if let Err(e) = result {
            warn!("{e:#}");
        }
    }

    Ok(())
}

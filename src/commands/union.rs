use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::cli::{Cli, UnionArgs};
use crate::config::UnionConfig;
use crate::function::{Argument, PolygonsUnion};
use crate::io::arrow::{decode_column, encode_column};
use crate::io::fs::{assert_not_stdout, open_for_write};
use crate::io::json::{self, JsonInput};

fn argument(input: JsonInput, rows: usize) -> Result<Argument> {
    Ok(match input {
        JsonInput::Column(column) => Argument::Column(Arc::new(encode_column(&column)?)),
        JsonInput::Row(mp) => Argument::constant(&mp, rows)?,
    })
}

pub fn run(cli: &Cli, args: &UnionArgs) -> Result<()> {
    assert_not_stdout(&args.output)?;

    let mut config = match &args.config {
        Some(path) => UnionConfig::from_path(path)?,
        None => UnionConfig::default(),
    };
    config.strict |= args.strict;

    let function = PolygonsUnion::new(args.domain.into(), config);
    info!(
        function = function.name(),
        a = %args.a.display(),
        b = %args.b.display(),
        output = %args.output.display(),
        verbose = cli.verbose,
        "union"
    );

    let a = json::read_from_path(&args.a)?;
    let b = json::read_from_path(&args.b)?;
    let rows = match (a.rows(), b.rows()) {
        (Some(ra), Some(rb)) if ra != rb => bail!("[union] {} has {ra} rows but {} has {rb}", args.a.display(), args.b.display()),
        (Some(rows), _) | (None, Some(rows)) => rows,
        (None, None) => 1,
    };

    let result = function.execute(&[argument(a, rows)?, argument(b, rows)?])
        .with_context(|| format!("[union] {} failed", function.name()))?;
    let rows = decode_column(&result)?;

    let mut sink = open_for_write(&args.output, args.force)?;
    json::write_column(&mut sink, &rows)?;
    sink.finalize()?;

    info!(rows = rows.len(), output = %args.output.display(), "wrote union");
    Ok(())
}

//! Trainer backed by the SNAP `node2vec` program
//!
//! The graph is handed over as a tab-delimited edge list of dense node
//! indices, since `node2vec` only reads integer node ids. The program runs
//! twice with the same walk settings:
//!
//! ```text
//! node2vec [args...] -i:<edges> -o:<walks> -d:D -l:L -r:E -k:W -e:I -p:P -q:Q -ow
//! node2vec [args...] -i:<edges> -o:<vectors> -d:D -l:L -r:E -k:W -e:I -p:P -q:Q
//! ```
//!
//! The first run writes the random walks only; node frequencies are the
//! occurrence counts over that walk corpus. The second run writes word2vec
//! text vectors (`<count> <dim>` header, then `<id> <v1> ... <vd>`). Ids are
//! mapped back to accessions here.
//!
//! `node2vec` has no flags for the negative sample count or the random seed,
//! so those two settings are not passed on.

use super::{check_coverage, EmbeddingTrainer, Hyperparameters, TrainError, TrainResult};
use crate::graph::InteractionGraph;
use crate::vectors::tabbed::{close, open_writer, tab_writer};
use crate::vectors::{KeyedVectors, VectorsError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

const EDGES_FILE: &str = "edges.tsv";
const WALKS_FILE: &str = "walks.txt";
const VECTORS_FILE: &str = "vectors.emb";

/// Runs the external `node2vec` program in a working directory
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl CommandTrainer {
    pub fn new(program: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.into(),
        }
    }

    /// Arguments placed before the generated flags
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn write_edge_list(graph: &InteractionGraph, path: &Path) -> TrainResult<()> {
        let mut writer = tab_writer(open_writer(path)?);
        for (u, v) in graph.edges() {
            writer
                .write_record([u.to_string(), v.to_string()])
                .map_err(VectorsError::from)?;
        }
        close(writer)?;
        Ok(())
    }

    fn command(&self, params: &Hyperparameters, edges: &Path, output: &Path, walks_only: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(flag("-i:", edges))
            .arg(flag("-o:", output))
            .arg(format!("-d:{}", params.dimensions))
            .arg(format!("-l:{}", params.walk_length))
            .arg(format!("-r:{}", params.epochs))
            .arg(format!("-k:{}", params.window))
            .arg(format!("-e:{}", params.iterations))
            .arg(format!("-p:{}", params.p))
            .arg(format!("-q:{}", params.q))
            .stdin(Stdio::null());
        if walks_only {
            cmd.arg("-ow");
        }
        cmd
    }

    fn execute(&self, mut cmd: Command) -> TrainResult<()> {
        let output = cmd.output()?;
        if !output.stdout.is_empty() {
            debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim_end(), "Trainer output");
        }
        if !output.status.success() {
            return Err(TrainError::ProcessFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// `-x:` style flag followed by a path
fn flag(prefix: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(path.as_os_str());
    arg
}

fn malformed(path: &Path, line: usize, message: impl Into<String>) -> TrainError {
    TrainError::MalformedOutput {
        file: path.display().to_string(),
        line,
        message: message.into(),
    }
}

fn parse_node(path: &Path, line: usize, token: &str, node_count: usize) -> TrainResult<usize> {
    match token.parse::<usize>() {
        Ok(node) if node < node_count => Ok(node),
        _ => Err(malformed(path, line, format!("unknown node id {token:?}"))),
    }
}

/// Read word2vec text vectors: returns the declared width and the rows in file order
pub fn read_word2vec_text(path: &Path) -> TrainResult<(usize, Vec<(String, Vec<f32>)>)> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines().enumerate();

    let (_, header) = lines.next().ok_or_else(|| malformed(path, 1, "empty file"))?;
    let header = header?;
    let mut fields = header.split_whitespace();
    let (Some(count), Some(width), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(malformed(path, 1, format!("expected `<count> <dim>`, got {header:?}")));
    };
    let count: usize = count.parse().map_err(|_| malformed(path, 1, "bad vector count"))?;
    let width: usize = width.parse().map_err(|_| malformed(path, 1, "bad dimensionality"))?;

    let mut rows = Vec::with_capacity(count);
    for (idx, line) in lines {
        let line = line?;
        let mut fields = line.split_whitespace();
        let Some(token) = fields.next() else {
            continue;
        };
        let vector = fields
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| malformed(path, idx + 1, e.to_string()))?;
        if vector.len() != width {
            return Err(malformed(
                path,
                idx + 1,
                format!("{} components, expected {width}", vector.len()),
            ));
        }
        rows.push((token.to_string(), vector));
    }

    if rows.len() != count {
        return Err(malformed(
            path,
            1,
            format!("header declares {count} vectors, found {}", rows.len()),
        ));
    }
    Ok((width, rows))
}

/// Count node occurrences in a walk file (one walk of node ids per line)
pub fn read_walk_counts(path: &Path, node_count: usize) -> TrainResult<Vec<u64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut counts = vec![0u64; node_count];

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        for token in line.split_whitespace() {
            counts[parse_node(path, idx + 1, token, node_count)?] += 1;
        }
    }
    Ok(counts)
}

impl EmbeddingTrainer for CommandTrainer {
    fn fit(&self, graph: &InteractionGraph, params: &Hyperparameters) -> TrainResult<KeyedVectors> {
        params.validate()?;
        fs::create_dir_all(&self.work_dir)?;

        let edges = self.work_dir.join(EDGES_FILE);
        let walks = self.work_dir.join(WALKS_FILE);
        let vectors = self.work_dir.join(VECTORS_FILE);
        Self::write_edge_list(graph, &edges)?;

        info!(
            program = %self.program,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dimensions = params.dimensions,
            "Training embeddings"
        );
        self.execute(self.command(params, &edges, &walks, true))?;
        let counts = read_walk_counts(&walks, graph.node_count())?;
        debug!(walks = %walks.display(), "Counted walk corpus");

        self.execute(self.command(params, &edges, &vectors, false))?;
        let (width, rows) = read_word2vec_text(&vectors)?;

        let mut by_node: Vec<Option<Vec<f32>>> = vec![None; graph.node_count()];
        for (idx, (token, vector)) in rows.into_iter().enumerate() {
            let node = parse_node(&vectors, idx + 2, &token, graph.node_count())?;
            by_node[node] = Some(vector);
        }

        let mut table = Vec::with_capacity(graph.node_count());
        for (node, (accession, vector)) in graph.accessions().zip(by_node).enumerate() {
            let vector = vector.ok_or_else(|| TrainError::MissingNode(accession.to_string()))?;
            table.push((accession.to_string(), counts[node], vector));
        }

        let model = KeyedVectors::from_rows(width, table)?;
        check_coverage(graph, params, &model)?;
        Ok(model)
    }
}

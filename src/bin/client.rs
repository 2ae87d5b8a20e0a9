use clap::{Parser, ValueEnum};
use quill_index::config::{BPlusTreeConfig, ExtendibleHashConfig};
use quill_index::utils::util::{
    pretty_format_hash_directory, pretty_format_index_tree, pretty_format_row_ids,
};
use quill_index::{
    BPlusTreeIndex, BitmapIndex, ExtendibleHashIndex, Index, IndexCatalog, Operator,
    QueryEvaluator, QueryNode, QuillIndexError, QuillIndexResult, RowId, ScalarValue,
};

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum IndexKind {
    Bitmap,
    Btree,
    Hash,
}

#[derive(Debug, Parser, PartialEq)]
#[clap(author, version, about, long_about= None)]
struct Args {
    #[clap(long, value_enum, help = "Index structure to build")]
    index: IndexKind,
    #[clap(
        long,
        value_delimiter = ',',
        help = "Comma separated attribute values; the row id is the position"
    )]
    values: Vec<String>,
    #[clap(long, default_value = "equals", help = "Comparison (equals|lt|gt|range)")]
    op: Operator,
    #[clap(long, help = "Literal compared against")]
    value: String,
    #[clap(long, help = "Upper literal for range, exclusive")]
    second_value: Option<String>,
    #[clap(long, help = "Negate the predicate")]
    not: bool,
    #[clap(long, help = "Largest row id, defaults to the last value's position")]
    max_row_id: Option<RowId>,
    #[clap(long, help = "B+Tree order")]
    order: Option<usize>,
    #[clap(long, help = "Initial global depth of the hash directory")]
    global_depth: Option<u32>,
    #[clap(long, help = "Entries per hash bucket")]
    bucket_capacity: Option<usize>,
    #[clap(long, help = "Print the index structure")]
    show: bool,
}

const ATTRIBUTE: &str = "value";

fn build_predicate(args: &Args) -> QuillIndexResult<QueryNode> {
    let predicate = match args.op {
        Operator::Equals => QueryNode::equals(ATTRIBUTE, &args.value),
        Operator::Lt => QueryNode::less_than(ATTRIBUTE, &args.value),
        Operator::Gt => QueryNode::greater_than(ATTRIBUTE, &args.value),
        Operator::Range => {
            let high = args.second_value.as_deref().ok_or_else(|| {
                QuillIndexError::InvalidPredicate("range needs --second-value".to_string())
            })?;
            QueryNode::range(ATTRIBUTE, &args.value, high)
        }
        other => {
            return Err(QuillIndexError::InvalidPredicate(format!(
                "{} is not a comparison",
                other
            )))
        }
    };
    Ok(if args.not {
        QueryNode::not(predicate)
    } else {
        predicate
    })
}

fn populate(index: &mut dyn Index, values: &[String]) -> QuillIndexResult<()> {
    for (row_id, literal) in values.iter().enumerate() {
        index.insert(ScalarValue::from_literal(literal), row_id as RowId)?;
    }
    Ok(())
}

/// Builds the requested index and renders its structure.
fn build_index(args: &Args, max_row_id: RowId) -> QuillIndexResult<(Box<dyn Index>, String)> {
    Ok(match args.index {
        IndexKind::Bitmap => {
            let mut index = BitmapIndex::new(ATTRIBUTE, max_row_id);
            populate(&mut index, &args.values)?;
            let shape = format!(
                "{} with {} distinct keys over rows [0, {}]",
                index.pretty_name(),
                index.key_count(),
                index.max_row_id()
            );
            (Box::new(index) as Box<dyn Index>, shape)
        }
        IndexKind::Btree => {
            let mut config = BPlusTreeConfig::default();
            if let Some(order) = args.order {
                config = config.with_order(order);
            }
            let mut index = BPlusTreeIndex::try_new(ATTRIBUTE, config)?;
            populate(&mut index, &args.values)?;
            let shape = pretty_format_index_tree(&index)?;
            (Box::new(index) as Box<dyn Index>, shape)
        }
        IndexKind::Hash => {
            let mut config = ExtendibleHashConfig::default();
            if let Some(depth) = args.global_depth {
                config = config.with_initial_global_depth(depth);
            }
            if let Some(capacity) = args.bucket_capacity {
                config = config.with_bucket_capacity(capacity);
            }
            let mut index = ExtendibleHashIndex::try_new(ATTRIBUTE, config)?;
            populate(&mut index, &args.values)?;
            let shape = pretty_format_hash_directory(&index).to_string();
            (Box::new(index) as Box<dyn Index>, shape)
        }
    })
}

fn run(args: &Args) -> QuillIndexResult<()> {
    let max_row_id = args
        .max_row_id
        .unwrap_or_else(|| args.values.len().saturating_sub(1) as RowId);
    let predicate = build_predicate(args)?;
    let (index, shape) = build_index(args, max_row_id)?;

    let mut catalog = IndexCatalog::new();
    catalog.register(index);
    let evaluator = QueryEvaluator::new(&catalog);
    let row_ids = evaluator.evaluate_query(Some(&predicate), max_row_id)?;

    if args.show {
        println!("{}", shape);
    }
    println!("{}", predicate);
    println!("{}", pretty_format_row_ids(&row_ids));
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

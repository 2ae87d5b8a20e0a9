use comfy_table::Cell;
use std::collections::VecDeque;

use crate::error::QuillIndexResult;
use crate::storage::index::{BPlusTreeIndex, ExtendibleHashIndex};
use crate::storage::page::{BPlusTreeNode, RowId};

const TABLE_PRESET: &str = "||--+-++|    ++++++";

fn new_table() -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.load_preset(TABLE_PRESET);
    table
}

pub fn pretty_format_row_ids(row_ids: &[RowId]) -> comfy_table::Table {
    let mut table = new_table();
    table.set_header(vec![Cell::new("row_id")]);
    for row_id in row_ids {
        table.add_row(vec![Cell::new(row_id)]);
    }
    table
}

pub fn pretty_format_index_tree(index: &BPlusTreeIndex) -> QuillIndexResult<String> {
    let mut display = String::new();

    if index.is_empty() {
        display.push_str("Empty tree.");
        return Ok(display);
    }
    // level order
    let mut curr_queue = VecDeque::new();
    curr_queue.push_back(index.get_root_node_id());

    let mut level_index = 1;
    loop {
        if curr_queue.is_empty() {
            return Ok(display);
        }
        let mut next_queue = VecDeque::new();

        display.push_str(&format!("B+ Tree Level No.{}:\n", level_index));

        let mut level_table = new_table();
        let mut level_header = vec![];
        let mut level_row = vec![];

        while let Some(node_id) = curr_queue.pop_front() {
            match index.node(node_id)? {
                BPlusTreeNode::Internal(internal) => {
                    let mut node_table = new_table();
                    node_table.set_header(
                        std::iter::once(Cell::new(""))
                            .chain(internal.keys.iter().map(|k| Cell::new(k))),
                    );
                    node_table.add_row(internal.children.iter().map(|c| Cell::new(c)));

                    level_header.push(Cell::new(format!(
                        "node_id={}, size: {}/{}",
                        node_id,
                        internal.children.len(),
                        index.get_order()
                    )));
                    level_row.push(Cell::new(node_table));

                    next_queue.extend(internal.children.iter().copied());
                }
                BPlusTreeNode::Leaf(leaf) => {
                    let mut node_table = new_table();
                    node_table.set_header(leaf.array.iter().map(|(k, _)| Cell::new(k)));
                    node_table.add_row(leaf.array.iter().map(|(_, row_id)| Cell::new(row_id)));

                    let next = leaf
                        .next_node_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    level_header.push(Cell::new(format!(
                        "node_id={}, size: {}/{}, next_node_id={}",
                        node_id,
                        leaf.len(),
                        index.get_order(),
                        next
                    )));
                    level_row.push(Cell::new(node_table));
                }
            }
        }
        level_table.set_header(level_header);
        level_table.add_row(level_row);
        display.push_str(&format!("{level_table}\n"));

        level_index += 1;
        curr_queue = next_queue;
    }
}

/// One row per directory slot with the bucket it points to.
pub fn pretty_format_hash_directory(index: &ExtendibleHashIndex) -> comfy_table::Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new(format!("slot (global depth {})", index.get_global_depth())),
        Cell::new("bucket"),
        Cell::new("local depth"),
        Cell::new("size"),
        Cell::new("entries"),
    ]);
    for (slot, (bucket_id, bucket)) in index
        .directory()
        .iter()
        .zip(index.get_buckets())
        .enumerate()
    {
        let entries = bucket
            .array
            .iter()
            .map(|(k, row_id)| format!("{k}:{row_id}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(format!("{:0width$b}", slot, width = index.get_global_depth() as usize)),
            Cell::new(bucket_id),
            Cell::new(bucket.local_depth()),
            Cell::new(format!(
                "{}/{}",
                bucket.header.current_size, bucket.header.max_size
            )),
            Cell::new(entries),
        ]);
    }
    table
}

use std::path::Path;

use humansize::{file_size_opts as options, FileSize};
use iso_box::{IsoFile, Stream, TreeNode};
use serde_json::{json, Value};

use crate::error::{Error, Result};

pub fn run(path: &Path, json: bool) -> Result<()> {
    let mut file = IsoFile::open(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    print!("{}", render(&mut file, json)?);
    Ok(())
}

pub fn render<S: Stream>(file: &mut IsoFile<S>, json: bool) -> Result<String> {
    let root = file.root();
    let tree = file.tree(&root)?;
    let len = file.len();

    if json {
        let value = json!({
            "size": len,
            "boxes": nest(&tree, len, &mut 0, 0),
        });
        Ok(format!("{:#}\n", value))
    } else {
        Ok(table(&tree, len))
    }
}

fn format_size(size: u64) -> String {
    size.file_size(options::BINARY)
        .unwrap_or_else(|_| size.to_string())
}

fn table(tree: &[TreeNode], len: u64) -> String {
    let mut out = format!("{:>10}  {:>12}  {:4}  Box\n", "Offset", "Size", "Last");
    out.push_str(&"-".repeat(48));
    out.push('\n');

    for TreeNode { depth, node } in tree {
        let last = if node.end() == len { "*" } else { "" };
        out.push_str(&format!(
            "{:>#10x}  {:>12}  {:4}  {}{}\n",
            node.offset(),
            format_size(node.size()),
            last,
            "  ".repeat(*depth),
            node.tag()
        ));
    }

    out.push_str(&"-".repeat(48));
    out.push('\n');
    out.push_str(&format!("{:>10}  {:>12}  {:4}  Total\n", "", format_size(len), ""));
    out
}

/// Rebuilds the nesting of a depth first walk, consuming entries at `depth`
/// from `tree[*at]` onwards.
fn nest(tree: &[TreeNode], len: u64, at: &mut usize, depth: usize) -> Vec<Value> {
    let mut out = vec![];
    while let Some(TreeNode { depth: d, node }) = tree.get(*at) {
        if *d < depth {
            break;
        }
        *at += 1;
        let children = nest(tree, len, at, depth + 1);

        let mut entry = json!({
            "type": node.tag().to_string(),
            "offset": node.offset(),
            "size": node.size(),
            "last": node.end() == len,
        });
        if !children.is_empty() {
            entry["children"] = Value::Array(children);
        }
        out.push(entry);
    }
    out
}

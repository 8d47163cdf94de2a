//! Order merging
//!
//! Every legacy buildpack that ran a supply step leaves the order declared
//! by its own descriptor behind as `order<N>.toml`, where `N` is its deps
//! index. Finalize combines those fragments into the single order the
//! detector consumes.

use crate::error::{ShimError, ShimResult};
use crate::metadata::Order;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const FRAGMENT_PREFIX: &str = "order";
const FRAGMENT_SUFFIX: &str = ".toml";

/// One order fragment left by a supply step
#[derive(Debug, Clone)]
pub struct OrderFragment {
    /// Deps index of the buildpack that wrote it
    pub index: usize,
    pub path: PathBuf,
    pub order: Order,
}

/// Path of the fragment written by the buildpack at `index`
pub fn fragment_path(order_dir: &Path, index: usize) -> PathBuf {
    order_dir.join(format!("{}{}{}", FRAGMENT_PREFIX, index, FRAGMENT_SUFFIX))
}

/// Deps index encoded in a fragment file name, if it is one
fn fragment_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(FRAGMENT_PREFIX)?
        .strip_suffix(FRAGMENT_SUFFIX)?
        .parse()
        .ok()
}

/// Find and parse all fragments, lowest deps index first.
///
/// A missing order dir yields no fragments rather than an error.
pub fn discover_fragments(order_dir: &Path) -> ShimResult<Vec<OrderFragment>> {
    if !order_dir.is_dir() {
        debug!("Order dir {} does not exist", order_dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(order_dir)
        .map_err(|e| ShimError::io(format!("reading {}", order_dir.display()), e))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| ShimError::io(format!("reading {}", order_dir.display()), e))?;
        let name = entry.file_name();
        if let Some(index) = name.to_str().and_then(fragment_index) {
            found.push((index, entry.path()));
        }
    }
    found.sort_by_key(|(index, _)| *index);

    found
        .into_iter()
        .map(|(index, path)| {
            let order = Order::from_file(&path)?;
            debug!(
                "Order fragment {} has {} group(s)",
                path.display(),
                order.groups.len()
            );
            Ok(OrderFragment { index, path, order })
        })
        .collect()
}

/// Combine fragments in the sequence given. Fails if there are none.
pub fn merge_fragments(fragments: Vec<OrderFragment>, order_dir: &Path) -> ShimResult<Order> {
    if fragments.is_empty() {
        return Err(ShimError::NoFragmentsFound {
            dir: order_dir.to_path_buf(),
        });
    }
    Ok(Order::combine(fragments.into_iter().map(|f| f.order)))
}

/// Discover and merge all fragments in an order dir
pub fn merge_order_dir(order_dir: &Path) -> ShimResult<Order> {
    let fragments = discover_fragments(order_dir)?;
    merge_fragments(fragments, order_dir)
}

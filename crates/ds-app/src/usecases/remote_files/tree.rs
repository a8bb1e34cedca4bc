//! Depth-first traversal over flat list/stat primitives.
//!
//! The wire has no tree operations, so copy and delete of whole directories
//! are built here: a [`TreeNodes`] source answers "what is this" and "what is
//! inside", and a [`NodeAction`] decides what to do at each node. The same
//! walk drives download, upload and delete.

/// Kind of a node as reported by its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// How a failing child affects the rest of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The failed branch stops; siblings still run; the walk reports failure.
    ContinueSiblings,
    /// The first failure stops the whole walk.
    AbortTree,
}

pub trait TreeNodes {
    type Path;

    fn kind(&mut self, path: &Self::Path) -> Option<NodeKind>;

    /// Child names, without `.`/`..`. `None` if listing failed.
    fn child_names(&mut self, path: &Self::Path) -> Option<Vec<String>>;

    fn child_path(&self, parent: &Self::Path, name: &str) -> Self::Path;

    fn name_of(&self, path: &Self::Path) -> String;
}

/// Per-node behaviour. `relative` is the node's path from the walk root's
/// parent, root name included, so destinations can mirror the source layout.
pub trait NodeAction<N: TreeNodes> {
    /// Pre-order hook for directories. Returning `false` skips the subtree.
    fn enter_directory(&mut self, nodes: &mut N, path: &N::Path, relative: &[String]) -> bool;

    fn visit_file(&mut self, nodes: &mut N, path: &N::Path, relative: &[String]) -> bool;

    /// Post-order hook, run only when every child succeeded.
    fn leave_directory(&mut self, nodes: &mut N, path: &N::Path, relative: &[String]) -> bool;
}

/// Walk the tree rooted at `root`; `true` only if every node succeeded.
pub fn walk<N, A>(nodes: &mut N, action: &mut A, root: &N::Path, policy: FailurePolicy) -> bool
where
    N: TreeNodes,
    A: NodeAction<N>,
{
    let mut relative = vec![nodes.name_of(root)];
    visit(nodes, action, root, &mut relative, policy)
}

fn visit<N, A>(
    nodes: &mut N,
    action: &mut A,
    path: &N::Path,
    relative: &mut Vec<String>,
    policy: FailurePolicy,
) -> bool
where
    N: TreeNodes,
    A: NodeAction<N>,
{
    match nodes.kind(path) {
        None => false,
        Some(NodeKind::File) => action.visit_file(nodes, path, relative),
        Some(NodeKind::Directory) => {
            if !action.enter_directory(nodes, path, relative) {
                return false;
            }
            let Some(names) = nodes.child_names(path) else {
                return false;
            };

            let mut all_ok = true;
            for name in names {
                let child = nodes.child_path(path, &name);
                relative.push(name);
                let child_ok = visit(nodes, action, &child, relative, policy);
                relative.pop();

                if !child_ok {
                    all_ok = false;
                    if policy == FailurePolicy::AbortTree {
                        return false;
                    }
                }
            }

            all_ok && action.leave_directory(nodes, path, relative)
        }
    }
}
